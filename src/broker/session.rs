use crate::broker::topic::Topic;

/// Milliseconds a session may go without a heartbeat before a publish scan
/// drops it.
pub const SESSION_TIMEOUT_MS: i64 = 10_000;

/// Broker-side record of one remote endpoint.
///
/// A fresh session carries the all-zero topic and a zeroed heartbeat:
/// it receives nothing and counts as expired until the endpoint actually
/// heartbeats. Subscribing alone never confers liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    /// Topic from the endpoint's most recent subscribe.
    pub topic: Topic,
    /// Liveness timestamp in unix milliseconds, as last acknowledged.
    pub last_heartbeat_ms: i64,
}

impl Session {
    /// Records a heartbeat and returns the acknowledged timestamp.
    ///
    /// A claim ahead of the broker clock is clamped to `now_ms`; claims
    /// from the past are taken as-is.
    pub fn record_heartbeat(&mut self, claimed_ms: i64, now_ms: i64) -> i64 {
        self.last_heartbeat_ms = claimed_ms.min(now_ms);
        self.last_heartbeat_ms
    }

    /// Whether this session has outlived the heartbeat timeout at `now_ms`.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms - self.last_heartbeat_ms > SESSION_TIMEOUT_MS
    }
}
