//! TTLKV - A JSON Key-Value Store with Time-To-Live
//!
//! This is the main entry point for the TTLKV server.
//! It sets up logging, the storage engine, the expiry sweeper and the HTTP listener.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;
use ttlkv::expiry::{ExpirationEngine, ExpirySweeper, SweeperConfig};
use ttlkv::http::{serve, AppState};
use ttlkv::storage::StorageEngine;

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Time between background sweeps
    sweep_interval: Duration,
    /// Wait before retrying a failed sweep
    retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let sweeper = SweeperConfig::default();
        Self {
            host: ttlkv::DEFAULT_HOST.to_string(),
            port: ttlkv::DEFAULT_PORT,
            sweep_interval: sweeper.interval,
            retry_backoff: sweeper.retry_backoff,
        }
    }
}

/// What the command line asked for
#[derive(Debug, PartialEq)]
enum Command {
    Run(Config),
    Help,
    Version,
}

impl Config {
    /// Parse configuration from command-line arguments, exiting on error
    fn from_args() -> Command {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match Config::parse(&args) {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("Error: {}", msg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    fn parse(args: &[String]) -> Result<Command, String> {
        let mut config = Config::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--help" => return Ok(Command::Help),
                "--version" | "-v" => return Ok(Command::Version),
                "--host" | "-h" | "--port" | "-p" | "--sweep-interval" | "--retry-backoff" => {
                    let value = args
                        .get(i + 1)
                        .ok_or_else(|| format!("{} requires a value", flag))?;
                    match flag {
                        "--host" | "-h" => config.host = value.clone(),
                        "--port" | "-p" => {
                            config.port = value
                                .parse()
                                .map_err(|_| format!("invalid port number '{}'", value))?
                        }
                        "--sweep-interval" => config.sweep_interval = parse_secs(flag, value)?,
                        _ => config.retry_backoff = parse_secs(flag, value)?,
                    }
                    i += 2;
                }
                _ => return Err(format!("unknown argument: {}", flag)),
            }
        }

        Ok(Command::Run(config))
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn sweeper(&self) -> SweeperConfig {
        SweeperConfig {
            interval: self.sweep_interval,
            retry_backoff: self.retry_backoff,
        }
    }
}

/// Whole seconds, at least one.
fn parse_secs(flag: &str, value: &str) -> Result<Duration, String> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(format!("{} expects a positive number of seconds, got '{}'", flag, value)),
    }
}

fn print_help() {
    println!(
        r#"
TTLKV - A JSON Key-Value Store with Time-To-Live

USAGE:
    ttlkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>              Port to listen on (default: 8000)
        --sweep-interval <SECS>    Seconds between expiry sweeps (default: 60)
        --retry-backoff <SECS>     Seconds to wait after a failed sweep (default: 5)
    -v, --version                  Print version information
        --help                     Print this help message

Log verbosity follows RUST_LOG (default: info).

EXAMPLES:
    $ curl -X POST localhost:8000/kv/session -d '{{"value": {{"user": 7}}, "ttl": 30}}'
    {{"status":"ok","action":"created","key":"session","expires_at":"..."}}
    $ curl localhost:8000/kv/session
    {{"key":"session","value":{{"user":7}},"ttl_remaining":29}}
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args() {
        Command::Run(config) => config,
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("TTLKV version {}", ttlkv::VERSION);
            return Ok(());
        }
    };

    // Set up logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!("TTLKV v{} starting", ttlkv::VERSION);

    // Create the storage engine (shared by the handlers and the sweeper)
    let store = Arc::new(StorageEngine::new());
    let engine = Arc::new(ExpirationEngine::new(store).with_span(info_span!("engine")));
    info!("Storage engine initialized");

    // Start the background expiry sweeper
    let sweeper =
        ExpirySweeper::start_with_span(Arc::clone(&engine), config.sweeper(), info_span!("sweeper"));

    let state = Arc::new(AppState::new(engine, sweeper.stats()));

    let listener = TcpListener::bind(config.bind_address()).await?;

    let served = serve(listener, state, shutdown_signal()).await;

    // The sweeper finishes any sweep in flight and exits.
    sweeper.shutdown().await;

    if let Err(e) = &served {
        error!("Server error: {}", e);
    }
    served?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping server..."),
        Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.retry_backoff, Duration::from_secs(5));
        assert_eq!(Config::parse(&[]).unwrap(), Command::Run(config));
    }

    #[test]
    fn test_all_options() {
        let parsed = Config::parse(&args(&[
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--sweep-interval",
            "10",
            "--retry-backoff",
            "2",
        ]))
        .unwrap();

        let Command::Run(config) = parsed else {
            panic!("expected a run command");
        };
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.sweeper().interval, Duration::from_secs(10));
        assert_eq!(config.sweeper().retry_backoff, Duration::from_secs(2));
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(Config::parse(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(Config::parse(&args(&["-v"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Config::parse(&args(&["--port"])).is_err());
        assert!(Config::parse(&args(&["--port", "http"])).is_err());
        assert!(Config::parse(&args(&["--sweep-interval", "0"])).is_err());
        assert!(Config::parse(&args(&["--retry-backoff", "-3"])).is_err());
        assert!(Config::parse(&args(&["--verbose"])).is_err());
    }
}
