use std::io::Write;

use anyhow::Context;
use coflake::{CoordinatedGenerator, DecodedId, MemoryCoordinator, MonotonicClock, SnowflakeId};

use crate::cli::config::{CliConfig, Command, OutputFormat};

/// Runs the parsed subcommand, writing results to `out`.
pub fn run(config: &CliConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Mint { count, format } => mint(config, *count, *format, out),
        Command::Decode { id } => decode(config, id, out),
    }
}

#[tracing::instrument(level = "debug", skip(config, out))]
fn mint(
    config: &CliConfig,
    count: u64,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let generator = CoordinatedGenerator::new(
        MemoryCoordinator::new(),
        MonotonicClock::new(),
        config.generator.clone(),
    )
    .context("invalid generator configuration")?;

    for _ in 0..count {
        let id = generator.generate()?;
        match format {
            OutputFormat::Decimal => writeln!(out, "{id}")?,
            OutputFormat::Padded => writeln!(out, "{}", id.to_padded_string())?,
            OutputFormat::Base32 => writeln!(out, "{}", id.encode())?,
        }
    }

    tracing::debug!(count, "minted");
    Ok(())
}

fn decode(config: &CliConfig, input: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let id = parse_id(input)?;
    let decoded = DecodedId::new(id, config.generator.epoch);

    writeln!(out, "id: {id}")?;
    writeln!(out, "base32: {}", id.encode())?;
    writeln!(out, "{decoded}")?;
    Ok(())
}

/// Accepts plain or zero-padded decimal, otherwise Crockford base32.
fn parse_id(input: &str) -> anyhow::Result<SnowflakeId> {
    let input = input.trim();
    let id = if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        input.parse()
    } else {
        SnowflakeId::decode(input)
    };
    id.with_context(|| format!("`{input}` is not a valid ID"))
}

#[cfg(test)]
mod tests {
    use coflake::GeneratorConfig;

    use super::*;
    use crate::cli::config::LogFormat;

    const EPOCH: u64 = 1_600_000_000_000;

    fn config(command: Command) -> CliConfig {
        CliConfig {
            generator: GeneratorConfig::new(5, EPOCH, "test"),
            log_format: LogFormat::Pretty,
            command,
        }
    }

    fn output(command: Command) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(&config(command), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn mint_prints_sorted_unique_ids() {
        let text = output(Command::Mint {
            count: 100,
            format: OutputFormat::Decimal,
        })
        .unwrap();

        let ids: Vec<SnowflakeId> = text.lines().map(|line| line.parse().unwrap()).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids.iter().all(|id| id.machine_id() == 5));
    }

    #[test]
    fn mint_formats() {
        let padded = output(Command::Mint {
            count: 1,
            format: OutputFormat::Padded,
        })
        .unwrap();
        assert_eq!(padded.trim_end().len(), 20);

        let base32 = output(Command::Mint {
            count: 1,
            format: OutputFormat::Base32,
        })
        .unwrap();
        assert_eq!(base32.trim_end().len(), 13);
        assert_eq!(SnowflakeId::decode(base32.trim_end()).unwrap().machine_id(), 5);
    }

    #[test]
    fn decode_prints_fields() {
        let raw = (100_000_000_000_u64 << 22) | (5 << 12) | 1;
        let id = SnowflakeId::from_raw(raw);

        for input in [raw.to_string(), id.to_padded_string(), id.encode().to_string()] {
            let text = output(Command::Decode { id: input }).unwrap();
            assert!(text.contains(&format!("id: {raw}")), "{text}");
            assert!(
                text.contains("timestamp=1700000000000ms machine_id=5 sequence=1"),
                "{text}"
            );
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(output(Command::Decode { id: "nope".into() }).is_err());
        assert!(output(Command::Decode { id: "".into() }).is_err());
    }
}
