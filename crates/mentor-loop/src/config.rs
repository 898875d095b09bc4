use std::time::Duration;

use mentor_core::ClientConfig;

/// Timing knobs for streaming replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Longest gap allowed between two chunks of a streamed reply.
    pub stream_idle_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            stream_idle_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&ClientConfig> for LoopConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            stream_idle_timeout: Duration::from_secs(config.stream_idle_timeout_secs.max(1)),
        }
    }
}
