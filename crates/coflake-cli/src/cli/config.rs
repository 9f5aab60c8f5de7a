use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use coflake::{CUSTOM_EPOCH, GeneratorConfig, RollbackPolicy, RolloverPolicy, SnowflakeId};

/// Runtime configuration for the `coflake` binary.
///
/// Every generator setting can come from a flag or an environment variable
/// (including a `.env` file), or from a JSON file passed with `--config`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "coflake",
    version,
    about = "Mint and inspect coordinated Snowflake IDs"
)]
pub struct CliArgs {
    /// Machine slot packed into every ID, 0 to 1023.
    ///
    /// Environment variable: `COFLAKE_MACHINE_ID`
    #[arg(long, env = "COFLAKE_MACHINE_ID", default_value_t = 0, allow_negative_numbers = true, global = true)]
    pub machine_id: i64,

    /// Custom epoch in Unix milliseconds. Must not be in the future.
    ///
    /// Environment variable: `COFLAKE_EPOCH`
    #[arg(long, env = "COFLAKE_EPOCH", default_value_t = CUSTOM_EPOCH, global = true)]
    pub epoch: u64,

    /// Namespace for coordinator keys.
    ///
    /// Environment variable: `COFLAKE_PREFIX`
    #[arg(long, env = "COFLAKE_PREFIX", default_value_t = String::from("coflake"), global = true)]
    pub prefix: String,

    /// Expiry set on each per-millisecond counter, at least 1000.
    ///
    /// Environment variable: `COFLAKE_KEY_TTL_MS`
    #[arg(long, env = "COFLAKE_KEY_TTL_MS", default_value_t = 1000, global = true)]
    pub key_ttl_ms: u64,

    /// Bound on the wait for the next millisecond.
    ///
    /// Environment variable: `COFLAKE_WAIT_TIMEOUT_MS`
    #[arg(long, env = "COFLAKE_WAIT_TIMEOUT_MS", default_value_t = 100, global = true)]
    pub wait_timeout_ms: u64,

    /// What to emit once a millisecond's sequence space is used up.
    ///
    /// Environment variable: `COFLAKE_ROLLOVER`
    #[arg(long, env = "COFLAKE_ROLLOVER", value_enum, default_value_t = RolloverArg::EmitZero, global = true)]
    pub rollover: RolloverArg,

    /// How to react when the clock moves backwards.
    ///
    /// Environment variable: `COFLAKE_ROLLBACK`
    #[arg(long, env = "COFLAKE_ROLLBACK", value_enum, default_value_t = RollbackArg::Ignore, global = true)]
    pub rollback: RollbackArg,

    /// JSON generator configuration. Replaces the generator flags above.
    ///
    /// Environment variable: `COFLAKE_CONFIG`
    #[arg(long, env = "COFLAKE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format (stderr).
    ///
    /// Environment variable: `COFLAKE_LOG_FORMAT`
    #[arg(long, env = "COFLAKE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mint IDs against an in-process coordinator and print one per line.
    Mint {
        /// How many IDs to mint.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Decimal)]
        format: OutputFormat,
    },
    /// Print the fields of an ID given in decimal or base32.
    Decode {
        id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Decimal,
    /// 20-digit zero-padded decimal
    Padded,
    /// 13-character Crockford base32
    Base32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverArg {
    EmitZero,
    Reacquire,
}

impl From<RolloverArg> for RolloverPolicy {
    fn from(arg: RolloverArg) -> Self {
        match arg {
            RolloverArg::EmitZero => Self::EmitZero,
            RolloverArg::Reacquire => Self::Reacquire,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackArg {
    Ignore,
    Reject,
    Stall,
}

impl From<RollbackArg> for RollbackPolicy {
    fn from(arg: RollbackArg) -> Self {
        match arg {
            RollbackArg::Ignore => Self::Ignore,
            RollbackArg::Reject => Self::Reject,
            RollbackArg::Stall => Self::Stall,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub generator: GeneratorConfig,
    pub log_format: LogFormat,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let generator = match &args.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid generator config in {}", path.display()))?
            }
            None => generator_from_flags(&args)?,
        };

        if let Command::Mint { count: 0, .. } = args.command {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            generator,
            log_format: args.log_format,
            command: args.command,
        })
    }
}

fn generator_from_flags(args: &CliArgs) -> anyhow::Result<GeneratorConfig> {
    let max_machine_id = SnowflakeId::max_machine_id();
    if u64::try_from(args.machine_id).map_or(true, |id| id > max_machine_id) {
        bail!(
            "COFLAKE_MACHINE_ID ({}) is outside the machine ID space (0..={})",
            args.machine_id,
            max_machine_id
        );
    }

    if args.key_ttl_ms < 1000 {
        bail!(
            "COFLAKE_KEY_TTL_MS ({}) must be at least 1000",
            args.key_ttl_ms
        );
    }

    Ok(
        GeneratorConfig::new(args.machine_id, args.epoch, args.prefix.clone())
            .with_key_ttl(Duration::from_millis(args.key_ttl_ms))
            .with_wait_timeout(Duration::from_millis(args.wait_timeout_ms))
            .with_rollover(args.rollover.into())
            .with_rollback(args.rollback.into()),
    )
}
