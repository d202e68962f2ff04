use anyhow::{Context, bail};
use clap::Parser;
use core::num::NonZeroUsize;
use std::net::SocketAddr;

/// Runtime configuration for the `hashgen-server` binary.
///
/// These settings control the listener, the worker pool used by the
/// concurrent endpoint, and request limits. All values are parsed from CLI
/// arguments or environment variables (a `.env` file is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashgen-server",
    version,
    about = "An HTTP service returning batches of random SHA-512 digests"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Number of base workers a concurrent batch is split across.
    ///
    /// Each batch additionally spawns one remainder worker for the share that
    /// does not divide evenly. Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Maximum number of digests allowed per request.
    ///
    /// Every digest of a batch is held in memory until the response is sent,
    /// so this bounds per-request memory.
    ///
    /// Environment variable: `MAX_ALLOWED_HASHES`
    #[arg(long, env = "MAX_ALLOWED_HASHES", default_value_t = 1_000_000)]
    pub max_allowed_hashes: usize,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub num_workers: NonZeroUsize,
    pub max_allowed_hashes: usize,
    pub shutdown_timeout: u64,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr = args
            .server_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("SERVER_ADDR ({}) is not a socket address", args.server_addr))?;

        let num_workers = args.num_workers.unwrap_or_else(num_cpus::get);
        let Some(num_workers) = NonZeroUsize::new(num_workers) else {
            bail!("NUM_WORKERS must be greater than 0");
        };

        if args.max_allowed_hashes == 0 {
            bail!("MAX_ALLOWED_HASHES must be greater than 0");
        }

        Ok(Self {
            server_addr,
            num_workers,
            max_allowed_hashes: args.max_allowed_hashes,
            shutdown_timeout: args.shutdown_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["hashgen-server"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn explicit_values_are_used() {
        let config = ServerConfig::try_from(args(&[
            "--server-addr",
            "127.0.0.1:9000",
            "--num-workers",
            "8",
            "--max-allowed-hashes",
            "50",
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.num_workers.get(), 8);
        assert_eq!(config.max_allowed_hashes, 50);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = ServerConfig::try_from(args(&["--num-workers", "0"])).unwrap_err();
        assert!(err.to_string().contains("NUM_WORKERS"));
    }

    #[test]
    fn zero_max_rejected() {
        let err = ServerConfig::try_from(args(&["--max-allowed-hashes", "0"])).unwrap_err();
        assert!(err.to_string().contains("MAX_ALLOWED_HASHES"));
    }

    #[test]
    fn bad_address_rejected() {
        let err = ServerConfig::try_from(args(&["--server-addr", "not-an-addr"])).unwrap_err();
        assert!(err.to_string().contains("SERVER_ADDR"));
    }
}
