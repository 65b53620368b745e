//! Logging setup for the CLI.
//!
//! Mining results go to stdout; diagnostics go to stderr through
//! `tracing-subscriber`, off unless `-v` or `RUST_LOG` asks for them.

use clap::Args;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Increase logging verbosity (-v = error, -vv = warn, -vvv = info, -vvvv = debug, -vvvvv =
    /// trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored log output
    #[arg(long = "log-no-color", global = true)]
    pub log_no_color: bool,
}

impl LogArgs {
    /// The filter used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        let level = match self.verbose {
            0 => return "off".into(),
            1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            _ => Level::TRACE,
        };
        format!("hook_miner={level}")
    }

    /// Installs the global subscriber. `RUST_LOG` takes precedence over `-v`.
    pub fn init(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.filter_directive())
        };

        fmt()
            .with_env_filter(filter)
            .with_target(self.verbose >= 4)
            .with_thread_names(self.verbose >= 4)
            .with_writer(std::io::stderr)
            .with_ansi(!self.log_no_color)
            .init();
    }
}
