//! Per-channel reconciler
//!
//! Applies one channel's messages in strict sequence order: duplicates are
//! dropped, future arrivals are buffered, and an exploded rocket accepts
//! nothing but a relaunch. The caller holds the channel lock for the whole
//! submission, so everything here is plain single-threaded state machinery.

use tracing::{debug, warn};

use types::envelope::RocketMessage;
use types::rocket::{RocketState, RocketSummary};

use crate::buffer::MessageBuffer;

/// Outcome of submitting one message to a channel
///
/// `Applied` and `Buffered` are accepted; everything else means the message
/// was definitively discarded. Rejections are semantic no-ops, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Applied in order, possibly draining buffered successors too.
    Applied,
    /// Future message, held until the gap in front of it fills.
    Buffered,
    /// Sequence number at or below the applied prefix.
    Duplicate,
    /// Non-relaunch message addressed to an exploded rocket.
    TerminalRejected,
    /// Ordering buffer at capacity.
    BufferFull,
}

impl SubmitOutcome {
    /// Whether the message was applied or buffered.
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Applied | SubmitOutcome::Buffered)
    }
}

/// State machine for one channel: the rocket state plus its ordering buffer.
pub struct Reconciler {
    state: RocketState,
    buffer: MessageBuffer,
}

impl Reconciler {
    pub fn new(id: impl Into<String>, buffer_capacity: usize) -> Self {
        Self {
            state: RocketState::new(id),
            buffer: MessageBuffer::new(buffer_capacity),
        }
    }

    pub fn state(&self) -> &RocketState {
        &self.state
    }

    pub fn summary(&self) -> RocketSummary {
        self.state.summary()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Submit one message to this channel.
    ///
    /// The terminal gate runs first: an exploded rocket discards everything
    /// except a launch, without buffering. Then duplicates are dropped, the
    /// next expected number is applied immediately (draining any buffered
    /// successors), and anything further ahead is buffered.
    pub fn submit(&mut self, msg: RocketMessage) -> SubmitOutcome {
        let n = msg.number;
        let next = self.state.last_applied + 1;

        if self.state.exploded && !msg.body.is_launch() {
            debug!(
                channel = %self.state.id,
                number = n,
                kind = %msg.body.kind(),
                "discarding non-relaunch message for exploded rocket"
            );
            return SubmitOutcome::TerminalRejected;
        }

        if n < next {
            debug!(
                channel = %self.state.id,
                number = n,
                last_applied = self.state.last_applied,
                "dropping duplicate message"
            );
            return SubmitOutcome::Duplicate;
        }

        if n == next {
            self.apply(msg);
            self.drain();
            return SubmitOutcome::Applied;
        }

        // Future message. Sequence numbers are unique per channel, so a
        // buffered twin means this arrival is a duplicate.
        if self.buffer.contains(n) {
            debug!(channel = %self.state.id, number = n, "duplicate of buffered message");
            return SubmitOutcome::Duplicate;
        }
        if !self.buffer.push(msg) {
            warn!(
                channel = %self.state.id,
                number = n,
                buffered = self.buffer.len(),
                "ordering buffer full, rejecting future message"
            );
            return SubmitOutcome::BufferFull;
        }

        debug!(
            channel = %self.state.id,
            number = n,
            expected = next,
            buffered = self.buffer.len(),
            "buffered out-of-order message"
        );
        SubmitOutcome::Buffered
    }

    /// Apply an in-sequence message and advance the applied prefix.
    fn apply(&mut self, msg: RocketMessage) {
        debug!(
            channel = %self.state.id,
            number = msg.number,
            kind = %msg.body.kind(),
            "applying message"
        );

        let at = msg.time;
        self.state.apply(msg.body, at);
        self.state.last_applied = msg.number;
        self.state.updated_at = Some(at);

        if self.state.exploded {
            self.prune();
        }
    }

    /// Apply buffered messages while they continue the sequence.
    ///
    /// Stops on a gap. An explosion mid-drain prunes the buffer down to
    /// relaunch candidates; a retained relaunch that is next in sequence
    /// keeps the drain going, so a buffered relaunch is never stranded.
    fn drain(&mut self) {
        while let Some(msg) = self.buffer.pop_if(self.state.last_applied + 1) {
            self.apply(msg);
        }
    }

    /// Discard buffered messages an explosion made irrelevant.
    fn prune(&mut self) {
        let before = self.buffer.len();
        self.buffer.retain_relaunches();
        let dropped = before - self.buffer.len();
        if dropped > 0 {
            debug!(
                channel = %self.state.id,
                dropped,
                retained = self.buffer.len(),
                "pruned buffer after explosion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use types::envelope::MessageBody;

    fn ts(n: u64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap()
    }

    fn msg(number: u64, body: MessageBody) -> RocketMessage {
        RocketMessage {
            channel: "ch-1".to_string(),
            number,
            time: ts(number),
            body,
        }
    }

    fn launch(number: u64, speed: u64) -> RocketMessage {
        msg(
            number,
            MessageBody::Launched {
                rocket_type: "Falcon-9".to_string(),
                launch_speed: speed,
                mission: "ARTEMIS".to_string(),
            },
        )
    }

    fn speed_up(number: u64, by: u64) -> RocketMessage {
        msg(number, MessageBody::SpeedIncreased { by })
    }

    fn explode(number: u64) -> RocketMessage {
        msg(
            number,
            MessageBody::Exploded {
                reason: "boom".to_string(),
            },
        )
    }

    fn reconciler() -> Reconciler {
        Reconciler::new("ch-1", 10_000)
    }

    #[test]
    fn test_in_order_application() {
        let mut rec = reconciler();
        assert_eq!(rec.submit(launch(1, 100)), SubmitOutcome::Applied);
        assert_eq!(rec.submit(speed_up(2, 50)), SubmitOutcome::Applied);

        assert_eq!(rec.state().speed, 150);
        assert_eq!(rec.state().last_applied, 2);
        assert_eq!(rec.state().updated_at, Some(ts(2)));
    }

    #[test]
    fn test_future_message_buffered_then_drained() {
        let mut rec = reconciler();
        assert_eq!(rec.submit(speed_up(2, 1000)), SubmitOutcome::Buffered);
        assert_eq!(rec.state().last_applied, 0);
        assert_eq!(rec.state().speed, 0);

        assert_eq!(rec.submit(launch(1, 500)), SubmitOutcome::Applied);
        assert_eq!(rec.state().last_applied, 2);
        assert_eq!(rec.state().speed, 1500);
        assert_eq!(rec.buffered(), 0);
    }

    #[test]
    fn test_duplicate_applied_message_rejected() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        let snapshot = rec.state().clone();

        assert_eq!(rec.submit(launch(1, 999)), SubmitOutcome::Duplicate);
        assert_eq!(rec.state(), &snapshot);
    }

    #[test]
    fn test_duplicate_buffered_message_rejected() {
        let mut rec = reconciler();
        assert_eq!(rec.submit(speed_up(3, 10)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(speed_up(3, 999)), SubmitOutcome::Duplicate);
        assert_eq!(rec.buffered(), 1);
    }

    #[test]
    fn test_explosion_prunes_buffer() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        assert_eq!(rec.submit(speed_up(3, 10)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(explode(2)), SubmitOutcome::Applied);

        assert!(rec.state().exploded);
        assert_eq!(rec.state().reason, "boom");
        assert_eq!(rec.state().speed, 100);
        assert_eq!(rec.state().last_applied, 2);
        assert_eq!(rec.buffered(), 0);
    }

    #[test]
    fn test_exploded_rocket_rejects_non_relaunch() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        rec.submit(explode(2));

        assert_eq!(rec.submit(speed_up(3, 10)), SubmitOutcome::TerminalRejected);
        // Nothing buffered either
        assert_eq!(rec.buffered(), 0);
    }

    #[test]
    fn test_relaunch_reenters_active() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        rec.submit(explode(2));

        assert_eq!(rec.submit(launch(3, 10)), SubmitOutcome::Applied);
        assert!(!rec.state().exploded);
        assert_eq!(rec.state().speed, 10);
        assert_eq!(rec.state().last_applied, 3);
    }

    #[test]
    fn test_stale_relaunch_rejected_as_duplicate() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        rec.submit(explode(2));

        // Terminal gate lets launches through, but the duplicate rule
        // still applies to stale sequence numbers.
        assert_eq!(rec.submit(launch(1, 10)), SubmitOutcome::Duplicate);
        assert!(rec.state().exploded);
    }

    #[test]
    fn test_buffered_relaunch_applies_after_explosion_drain() {
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        assert_eq!(rec.submit(explode(2)), SubmitOutcome::Applied);
        assert_eq!(rec.submit(launch(3, 42)), SubmitOutcome::Applied);
        assert_eq!(rec.state().speed, 42);

        // Now the same shape arriving fully out of order: the relaunch is
        // buffered ahead of the explosion and survives the prune.
        let mut rec = reconciler();
        rec.submit(launch(1, 100));
        assert_eq!(rec.submit(launch(3, 42)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(speed_up(4, 5)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(explode(2)), SubmitOutcome::Applied);

        // Explosion applied, prune dropped the speed-up, retained relaunch
        // drained straight through.
        assert!(!rec.state().exploded);
        assert_eq!(rec.state().speed, 42);
        assert_eq!(rec.state().last_applied, 3);
        assert_eq!(rec.buffered(), 0);
    }

    #[test]
    fn test_buffer_full_rejects() {
        let mut rec = Reconciler::new("ch-1", 2);
        assert_eq!(rec.submit(speed_up(2, 1)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(speed_up(3, 1)), SubmitOutcome::Buffered);
        assert_eq!(rec.submit(speed_up(4, 1)), SubmitOutcome::BufferFull);
    }

    #[test]
    fn test_gap_stops_drain() {
        let mut rec = reconciler();
        rec.submit(speed_up(3, 10));
        rec.submit(speed_up(5, 20));
        rec.submit(launch(1, 100));
        // 2 is still missing: only 1 applied
        assert_eq!(rec.state().last_applied, 1);
        assert_eq!(rec.buffered(), 2);

        rec.submit(speed_up(2, 1));
        // 2 fills the gap, 3 drains, 5 still waits on 4
        assert_eq!(rec.state().last_applied, 3);
        assert_eq!(rec.state().speed, 111);
        assert_eq!(rec.buffered(), 1);
    }

    #[test]
    fn test_updated_at_tracks_message_time_not_arrival_order() {
        let mut rec = reconciler();
        rec.submit(speed_up(2, 10));
        rec.submit(launch(1, 100));
        // Drain applied 2 last, so updatedAt carries message 2's time.
        assert_eq!(rec.state().updated_at, Some(ts(2)));
        assert_eq!(rec.state().created_at, Some(ts(1)));
    }
}
