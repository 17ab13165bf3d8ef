//! Rocket state records and state transitions
//!
//! `RocketState` is the authoritative per-channel record the reconciliation
//! engine mutates; `RocketSummary` is the flattened projection the listing
//! endpoint returns. Transitions are total functions over the message sum
//! type: preconditions are enforced during envelope validation, so `apply`
//! cannot fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::MessageBody;

/// Derived lifecycle status of a rocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RocketStatus {
    /// Flying (or not yet launched)
    Active,
    /// Terminal state; only a relaunch leaves it
    Exploded,
}

impl RocketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RocketStatus::Active => "Active",
            RocketStatus::Exploded => "Exploded",
        }
    }
}

impl std::fmt::Display for RocketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative state of a single rocket
///
/// One record per channel. `last_applied` is internal ordering bookkeeping
/// and never appears on the wire. Timestamps stay `None` until the first
/// message that sets them is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocketState {
    /// Channel identifier, identical to the producer's channel string
    pub id: String,
    /// Rocket model (e.g. "Falcon-9"); set by launch
    #[serde(rename = "type")]
    pub rocket_type: String,
    /// Current speed; subtraction clamps at zero
    pub speed: u64,
    /// Current mission name
    pub mission: String,
    /// Terminal flag; cleared only by a relaunch
    pub exploded: bool,
    /// Explosion reason, meaningful only while `exploded`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Message time of the most recently applied message
    pub updated_at: Option<DateTime<Utc>>,
    /// Message time of the most recent launch
    pub created_at: Option<DateTime<Utc>>,
    /// Highest sequence number already applied; starts at 0
    #[serde(skip)]
    pub last_applied: u64,
}

impl RocketState {
    /// Zero-value state for a channel that has not applied anything yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rocket_type: String::new(),
            speed: 0,
            mission: String::new(),
            exploded: false,
            reason: String::new(),
            updated_at: None,
            created_at: None,
            last_applied: 0,
        }
    }

    /// Derived status projection used by listings.
    pub fn status(&self) -> RocketStatus {
        if self.exploded {
            RocketStatus::Exploded
        } else {
            RocketStatus::Active
        }
    }

    /// Apply one message body to this state.
    ///
    /// Pure transition: ordering, duplicate, and terminal-state rules are
    /// the reconciler's responsibility, and payload preconditions were
    /// enforced at validation. A launch on an exploded rocket is a relaunch
    /// and clears the terminal state.
    pub fn apply(&mut self, body: MessageBody, at: DateTime<Utc>) {
        match body {
            MessageBody::Launched {
                rocket_type,
                launch_speed,
                mission,
            } => {
                self.rocket_type = rocket_type;
                self.mission = mission;
                self.speed = launch_speed;
                self.created_at = Some(at);
                self.exploded = false;
                self.reason.clear();
            }
            MessageBody::SpeedIncreased { by } => {
                self.speed = self.speed.saturating_add(by);
            }
            MessageBody::SpeedDecreased { by } => {
                // Clamp at zero rather than going negative
                self.speed = self.speed.saturating_sub(by);
            }
            MessageBody::Exploded { reason } => {
                self.exploded = true;
                self.reason = reason;
            }
            MessageBody::MissionChanged { new_mission } => {
                self.mission = new_mission;
            }
        }
    }

    /// Flatten into the listing projection.
    pub fn summary(&self) -> RocketSummary {
        RocketSummary {
            id: self.id.clone(),
            rocket_type: self.rocket_type.clone(),
            speed: self.speed,
            mission: self.mission.clone(),
            status: self.status(),
            updated_at: self.updated_at,
        }
    }
}

/// Simplified rocket record for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocketSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub rocket_type: String,
    pub speed: u64,
    pub mission: String,
    pub status: RocketStatus,
    pub updated_at: Option<DateTime<Utc>>,
}
