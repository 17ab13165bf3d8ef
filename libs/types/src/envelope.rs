//! Inbound wire format and envelope validation
//!
//! An `Envelope` is the raw JSON unit producers POST to `/messages`:
//! metadata (channel, sequence number, time, kind) plus a kind-specific
//! body. Decoding is strict — fields unknown to the protocol are an error —
//! but the body decodes as the union of every kind's fields, so a field
//! belonging to another kind rides along and is ignored. The envelope
//! converts into a `RocketMessage`, the validated form the reconciliation
//! engine consumes; all payload preconditions are checked during that
//! conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The five message kinds producers emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    RocketLaunched,
    RocketSpeedIncreased,
    RocketSpeedDecreased,
    RocketExploded,
    RocketMissionChanged,
}

impl MessageKind {
    /// Wire string, also used as a logging label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::RocketLaunched => "RocketLaunched",
            MessageKind::RocketSpeedIncreased => "RocketSpeedIncreased",
            MessageKind::RocketSpeedDecreased => "RocketSpeedDecreased",
            MessageKind::RocketExploded => "RocketExploded",
            MessageKind::RocketMissionChanged => "RocketMissionChanged",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope metadata common to every message kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    pub channel: String,
    pub message_number: u64,
    pub message_time: DateTime<Utc>,
    pub message_type: MessageKind,
}

/// Raw inbound message envelope
///
/// The body stays an opaque JSON value until the kind from the metadata
/// selects which payload shape to decode it as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub metadata: Metadata,
    pub message: serde_json::Value,
}

/// Union of every kind's payload fields, matching the producer wire format.
///
/// Fields from other kinds may ride along on any message and are ignored;
/// only a field no kind defines is a decode error. Missing fields take
/// their zero value and are caught by the per-kind precondition checks.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct WirePayload {
    #[serde(rename = "type")]
    rocket_type: String,
    launch_speed: u64,
    mission: String,
    by: u64,
    reason: String,
    new_mission: String,
}

/// Validated kind-specific message content
///
/// One arm per message kind; the reconciler applies these as a total
/// function, so every invariant on the fields holds by construction:
/// strings are non-empty and speed deltas are at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Launched {
        rocket_type: String,
        launch_speed: u64,
        mission: String,
    },
    SpeedIncreased {
        by: u64,
    },
    SpeedDecreased {
        by: u64,
    },
    Exploded {
        reason: String,
    },
    MissionChanged {
        new_mission: String,
    },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Launched { .. } => MessageKind::RocketLaunched,
            MessageBody::SpeedIncreased { .. } => MessageKind::RocketSpeedIncreased,
            MessageBody::SpeedDecreased { .. } => MessageKind::RocketSpeedDecreased,
            MessageBody::Exploded { .. } => MessageKind::RocketExploded,
            MessageBody::MissionChanged { .. } => MessageKind::RocketMissionChanged,
        }
    }

    /// Whether this body is a launch (the only way out of terminal state).
    pub fn is_launch(&self) -> bool {
        matches!(self, MessageBody::Launched { .. })
    }

    fn from_wire(kind: MessageKind, value: serde_json::Value) -> Result<Self, ValidationError> {
        let p: WirePayload =
            serde_json::from_value(value).map_err(|e| ValidationError::MalformedPayload {
                kind: kind.as_str(),
                detail: e.to_string(),
            })?;

        match kind {
            MessageKind::RocketLaunched => {
                if p.rocket_type.is_empty() {
                    return Err(ValidationError::MissingRocketType);
                }
                if p.mission.is_empty() {
                    return Err(ValidationError::MissingMission);
                }
                Ok(MessageBody::Launched {
                    rocket_type: p.rocket_type,
                    launch_speed: p.launch_speed,
                    mission: p.mission,
                })
            }
            MessageKind::RocketSpeedIncreased => {
                if p.by == 0 {
                    return Err(ValidationError::InvalidSpeedDelta);
                }
                Ok(MessageBody::SpeedIncreased { by: p.by })
            }
            MessageKind::RocketSpeedDecreased => {
                if p.by == 0 {
                    return Err(ValidationError::InvalidSpeedDelta);
                }
                Ok(MessageBody::SpeedDecreased { by: p.by })
            }
            MessageKind::RocketExploded => {
                if p.reason.is_empty() {
                    return Err(ValidationError::MissingReason);
                }
                Ok(MessageBody::Exploded { reason: p.reason })
            }
            MessageKind::RocketMissionChanged => {
                if p.new_mission.is_empty() {
                    return Err(ValidationError::MissingNewMission);
                }
                Ok(MessageBody::MissionChanged {
                    new_mission: p.new_mission,
                })
            }
        }
    }
}

/// A fully validated message, ready for the reconciliation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RocketMessage {
    /// Channel (rocket) identifier, non-empty
    pub channel: String,
    /// Producer-assigned sequence number, at least 1
    pub number: u64,
    /// Producer message time
    pub time: DateTime<Utc>,
    /// Validated kind-specific content
    pub body: MessageBody,
}

impl Envelope {
    /// Validate this envelope into a `RocketMessage`.
    ///
    /// Enforces the metadata rules (non-empty channel, sequence number at
    /// least 1) and the kind-specific payload preconditions. Presence of
    /// `messageTime` is already guaranteed by strict decoding.
    pub fn into_message(self) -> Result<RocketMessage, ValidationError> {
        if self.metadata.channel.is_empty() {
            return Err(ValidationError::EmptyChannel);
        }
        if self.metadata.message_number == 0 {
            return Err(ValidationError::InvalidMessageNumber);
        }

        let body = MessageBody::from_wire(self.metadata.message_type, self.message)?;

        Ok(RocketMessage {
            channel: self.metadata.channel,
            number: self.metadata.message_number,
            time: self.metadata.message_time,
            body,
        })
    }
}
