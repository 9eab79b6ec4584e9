use std::num::NonZeroU32;
use std::time::Duration;

/// Configuration for the server listen loop.
#[derive(Debug, Clone, Default)]
pub struct ListenConfig {
    /// Give up after this many identifiers. `None` retries until a pipe is created.
    pub max_attempts: Option<NonZeroU32>,
}

impl ListenConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = NonZeroU32::new(attempts);
        self
    }
}

/// Configuration for client connection.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Wait for the server to create the pipe instead of failing immediately.
    pub wait_for_server: bool,
    /// Delay between connection attempts while waiting.
    pub retry_interval: Duration,
    /// Upper bound on the wait. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            wait_for_server: true,
            retry_interval: Duration::from_millis(25),
            timeout: None,
        }
    }
}

impl ConnectConfig {
    pub fn with_wait_for_server(mut self, wait: bool) -> Self {
        self.wait_for_server = wait;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
