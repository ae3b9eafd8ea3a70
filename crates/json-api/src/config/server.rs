//! Listener Config

use std::time::Duration;

use clap::Args;

/// Where the ordering API listens and how long it drains on shutdown.
#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Interface the ordering API binds to
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the ordering API binds to
    #[arg(short, long, env = "SERVER_PORT", default_value = "8698")]
    pub port: u16,

    /// Seconds in-flight checkouts get to finish after a shutdown signal
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,
}

impl ServerRuntimeConfig {
    /// `host:port` for the listener.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Listener {
        #[command(flatten)]
        server: ServerRuntimeConfig,
    }

    #[test]
    fn listener_settings_come_from_flags() -> TestResult {
        let listener = Listener::try_parse_from([
            "tiffin-json",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--shutdown-grace-secs",
            "5",
        ])?;

        assert_eq!(listener.server.socket_addr(), "127.0.0.1:9000");
        assert_eq!(listener.server.shutdown_grace(), Duration::from_secs(5));

        Ok(())
    }
}
