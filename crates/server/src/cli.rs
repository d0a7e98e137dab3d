use clap::Parser;
use std::time::Duration;
use tracing::Level;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "simple-http-server")]
#[command(about = "A minimal HTTP/1.1 server")]
#[command(version)]
pub struct Cli {
    #[arg(long = "host", default_value = "127.0.0.1")]
    #[arg(help = "Address to bind")]
    pub host: String,

    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    #[arg(help = "Port to listen on")]
    pub port: u16,

    #[arg(long = "read-timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    #[arg(help = "Seconds to wait for the next request on a connection")]
    pub read_timeout: u64,

    #[arg(long = "write-timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    #[arg(help = "Seconds allowed for writing one response")]
    pub write_timeout: u64,

    #[arg(long = "max-body-size", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    #[arg(help = "Largest request body accepted, in bytes")]
    pub max_body_size: u64,

    #[arg(long = "log-level", default_value_t = Level::INFO)]
    #[arg(help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Level,
}

impl Cli {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }
}
