use crate::codec::DEFAULT_MAX_BODY_SIZE;
use std::time::Duration;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Per connection settings, handed to every [`HttpConnection`](super::HttpConnection) the
/// server creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    read_timeout: Duration,
    write_timeout: Duration,
    read_buffer_size: usize,
    max_body_size: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { read_timeout: DEFAULT_READ_TIMEOUT, write_timeout: DEFAULT_WRITE_TIMEOUT, read_buffer_size: DEFAULT_READ_BUFFER_SIZE, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }
}

impl ConnectionConfig {
    /// How long to wait for the next complete request, idle keep-alive time included.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// How long writing one whole response may take.
    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    #[must_use]
    pub fn with_read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    /// Requests with a larger body are answered with `400` and the connection closes.
    #[must_use]
    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }
}
