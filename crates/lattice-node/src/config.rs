/// Configuration for a [`Node`](crate::Node).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use lattice_node::NodeConfig;
///
/// let config = NodeConfig::new()
///     .announce_interval(Duration::from_secs(30))
///     .scrub_interval(Duration::from_secs(600));
/// ```
use std::time::Duration;

/// Maximum age after which a heartbeat no longer counts as live.
pub const DEFAULT_LIVENESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Protocol tag for tunnel streams.
pub const SERVICE_PROTOCOL: &str = "/lattice/service/0.1";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interval between ledger announce ticks (heartbeat, publish, grant).
    pub(crate) announce_interval: Duration,
    /// Minimum time between scrub checks on one node's local clock.
    pub(crate) scrub_interval: Duration,
    /// Liveness TTL. Fixed at 15 minutes in the protocol; override only
    /// to shorten test runs.
    pub(crate) liveness_ttl: Duration,
    /// Protocol tag used when dialing and handling tunnel streams.
    pub(crate) protocol: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self {
            announce_interval: Duration::from_secs(10),
            scrub_interval: Duration::from_secs(10 * 60),
            liveness_ttl: DEFAULT_LIVENESS_TTL,
            protocol: SERVICE_PROTOCOL.to_string(),
        }
    }

    /// Set the announce interval (default: 10 s). Must be non-zero.
    pub fn announce_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "announce interval must be > 0");
        self.announce_interval = interval;
        self
    }

    /// Set the scrub interval (default: 10 min).
    pub fn scrub_interval(mut self, interval: Duration) -> Self {
        self.scrub_interval = interval;
        self
    }

    /// Override the liveness TTL (default: 15 min; tests only).
    pub fn liveness_ttl(mut self, ttl: Duration) -> Self {
        self.liveness_ttl = ttl;
        self
    }

    /// Set the tunnel protocol tag.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }
}
