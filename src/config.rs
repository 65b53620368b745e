//! Runtime configuration for hook address mining.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use crate::crypto::{parse_bytecode, parse_type, parse_value, Address, ConstructorArgs};
use crate::error::InputError;
use crate::logging::LogArgs;
use crate::matcher::FlagSet;
use crate::worker::{SaltBase, DEFAULT_CHECK_INTERVAL};
use crate::{MiningRequest, CREATE2_DEFAULT_FACTORY};

/// Hook Address Miner
///
/// Mines a CREATE2 salt so the deployed hook's address encodes exactly the
/// requested permission flags in its lowest 14 bits.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Comma-separated hook flags (e.g. BEFORE_SWAP,AFTER_SWAP) or a 0x bit pattern
    #[arg(short, long, default_value = "")]
    pub flags: String,

    /// Creation bytecode as hex (0x for empty)
    #[arg(short, long, conflicts_with = "bytecode_file")]
    pub bytecode: Option<String>,

    /// File containing the creation bytecode as hex
    #[arg(long)]
    pub bytecode_file: Option<PathBuf>,

    /// Constructor argument as <type>:<value>, repeatable (e.g. address:0x..., uint24:3000)
    #[arg(short = 'a', long = "arg")]
    pub args: Vec<String>,

    /// CREATE2 factory address (default: deterministic deployment proxy)
    #[arg(long)]
    pub factory: Option<String>,

    /// Put this address in salt bytes 0-19 (for factories that check msg.sender)
    #[arg(short, long)]
    pub deployer: Option<String>,

    /// Randomize salt bytes 20-23 so separate sessions search different salts
    #[arg(long, default_value = "false")]
    pub random_salt: bool,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Attempts per worker between cancellation checks
    #[arg(long, default_value_t = DEFAULT_CHECK_INTERVAL)]
    pub check_interval: u64,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Give up after this many seconds (default: run until found)
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub log: LogArgs,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// How long the progress loop should block for the next result. A pending
    /// deadline cuts the wait short; once the pool is stopped only the
    /// workers' final reports are left, so the full report interval applies.
    pub fn next_wait(&self, deadline: Option<Instant>, stopped: bool, now: Instant) -> Duration {
        match deadline {
            Some(d) if !stopped => self
                .report_interval()
                .min(d.saturating_duration_since(now)),
            _ => self.report_interval(),
        }
    }

    /// Validates the configuration without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "check_interval must be at least 1".into(),
            ));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "report_interval must be at least 1 second".into(),
            ));
        }
        if self.bytecode.is_none() && self.bytecode_file.is_none() {
            return Err(ConfigError::InvalidConfig(
                "one of --bytecode or --bytecode-file is required".into(),
            ));
        }

        self.flag_set()?;
        self.factory_address()?;
        self.salt_base()?;
        self.constructor_args()?;
        if let Some(ref code) = self.bytecode {
            parse_bytecode(code)?;
        }
        Ok(())
    }

    pub fn flag_set(&self) -> Result<FlagSet, InputError> {
        self.flags.parse()
    }

    pub fn factory_address(&self) -> Result<Address, InputError> {
        match self.factory {
            Some(ref f) => f.parse(),
            None => Ok(CREATE2_DEFAULT_FACTORY),
        }
    }

    /// Salt base from `--deployer` and `--random-salt`.
    pub fn salt_base(&self) -> Result<SaltBase, InputError> {
        let mut base = SaltBase::zero();
        if let Some(ref d) = self.deployer {
            base = base.with_deployer(&d.parse()?);
        }
        if self.random_salt {
            base = base.with_random_segment();
        }
        Ok(base)
    }

    /// Parses every `--arg <type>:<value>`.
    pub fn constructor_args(&self) -> Result<ConstructorArgs, InputError> {
        let mut args = ConstructorArgs::new();
        for raw in &self.args {
            let (ty, value) = raw.split_once(':').ok_or_else(|| InputError::InvalidValue {
                ty: "constructor argument".into(),
                value: raw.clone(),
            })?;
            let ty = parse_type(ty)?;
            let value = parse_value(&ty, value)?;
            args.push(ty, value);
        }
        Ok(args)
    }

    /// Creation bytecode, read from `--bytecode-file` if given.
    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        match (&self.bytecode, &self.bytecode_file) {
            (Some(code), _) => Ok(parse_bytecode(code)?),
            (None, Some(path)) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(parse_bytecode(&text)?)
            }
            (None, None) => Err(ConfigError::InvalidConfig("no bytecode given".into())),
        }
    }

    /// Builds the mining request described by the command line.
    pub fn mining_request(&self) -> Result<MiningRequest, ConfigError> {
        Ok(MiningRequest::new(self.flag_set()?, self.bytecode_bytes()?)
            .with_constructor_args(self.constructor_args()?)
            .with_factory(self.factory_address()?)
            .with_salt_base(self.salt_base()?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
