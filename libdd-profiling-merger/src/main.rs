// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod series_dir;

use anyhow::Context;
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use libdd_profiling_merge::storage::Label;
use libdd_profiling_merge::{MergeConfig, MergedProfile, Merger};
use series_dir::DirSeriesSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "DD_LOG_LEVEL";

fn cli() -> Command {
    command!()
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("a series directory, one file per sample named <timestamp>[.<ext>]")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("label")
                .long("label")
                .help("a name=value label added to every input series")
                .action(ArgAction::Append)
                .value_parser(Label::from_str)
                .required(false),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .help("the earliest timestamp to merge, inclusive")
                .value_parser(value_parser!(i64))
                .required(false),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .help("the latest timestamp to merge, inclusive")
                .value_parser(value_parser!(i64))
                .required(false),
        )
        .arg(
            Arg::new("batch-size")
                .short('b')
                .long("batch-size")
                .help("how many samples to decode and combine at a time")
                .value_parser(value_parser!(NonZeroUsize))
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("the path to save the merged pprof to")
                .value_parser(value_parser!(PathBuf))
                .required(false),
        )
}

fn init_logging() -> anyhow::Result<()> {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_owned());
    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("could not parse {LOG_LEVEL_ENV}={level:?}"))?;
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    Ok(())
}

/// Environment configuration, with the command line taking precedence.
fn config(matches: &ArgMatches) -> anyhow::Result<MergeConfig> {
    let mut config = MergeConfig::from_env()?;
    if let Some(batch_size) = matches.get_one::<NonZeroUsize>("batch-size") {
        config.batch_size = *batch_size;
    }
    Ok(config)
}

fn series_set(matches: &ArgMatches) -> DirSeriesSet {
    let inputs = matches
        .get_many::<PathBuf>("input")
        .into_iter()
        .flatten()
        .cloned();
    let labels = matches
        .get_many::<Label>("label")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    DirSeriesSet::new(inputs, labels).with_time_range(
        matches.get_one::<i64>("start").copied(),
        matches.get_one::<i64>("end").copied(),
    )
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_logging()?;

    let merger = Merger::new(config(&matches)?);
    debug!(config = ?merger.config(), "configured merge");

    // Nothing cancels this token; the process is interrupted instead.
    let cancel = CancellationToken::new();
    let before = Instant::now();
    let output = merger.merge(&cancel, series_set(&matches))?;
    let duration = before.elapsed();

    let profile = match output.profile {
        MergedProfile::Empty => {
            println!("No samples matched; nothing to merge.");
            return Ok(());
        }
        MergedProfile::Profile(profile) => profile,
    };

    println!(
        "Merged {} stored samples in {} batches in {} ms.",
        output.stats.samples,
        output.stats.batches,
        duration.as_millis()
    );
    println!("Number of distinct samples: {}.", profile.samples_len());
    for (kind, unit) in profile.sample_types() {
        println!("Sample type: {kind}/{unit}");
    }
    if !output.warnings.is_empty() {
        println!("{} storage warnings.", output.warnings.len());
    }

    if let Some(file) = matches.get_one::<PathBuf>("output") {
        println!("Writing out pprof to file {}", file.display());
        let encoded = merger.serialize(&profile)?;
        std::fs::write(file, encoded)
            .with_context(|| format!("failed to write {}", file.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_repeated_inputs_and_labels() {
        let matches = cli()
            .try_get_matches_from([
                "merger", "-i", "a", "--input", "b", "--label", "service=web", "--label",
                "env=prod", "--start", "10", "--end", "20", "-b", "4", "-o", "out.pprof",
            ])
            .unwrap();
        let inputs: Vec<_> = matches.get_many::<PathBuf>("input").unwrap().collect();
        assert_eq!(vec![&PathBuf::from("a"), &PathBuf::from("b")], inputs);
        let labels: Vec<_> = matches.get_many::<Label>("label").unwrap().collect();
        assert_eq!(
            vec![&Label::new("service", "web"), &Label::new("env", "prod")],
            labels
        );
        assert_eq!(Some(&10), matches.get_one::<i64>("start"));
        assert_eq!(Some(&20), matches.get_one::<i64>("end"));
        assert_eq!(4, config(&matches).unwrap().batch_size.get());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(cli().try_get_matches_from(["merger"]).is_err());
        assert!(cli()
            .try_get_matches_from(["merger", "-i", "a", "-b", "0"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["merger", "-i", "a", "--label", "no-equals"])
            .is_err());
    }
}
