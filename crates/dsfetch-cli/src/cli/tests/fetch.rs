//! Tests for the fetch subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand, DEFAULT_OUTPUT};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["dsfetch", "fetch", "sft_urls.txt"]) {
        CliCommand::Fetch {
            manifest,
            output,
            limit,
            workers,
            timeout,
            json,
        } => {
            assert_eq!(manifest, Path::new("sft_urls.txt"));
            assert_eq!(output, Path::new(DEFAULT_OUTPUT));
            assert_eq!(limit, 0);
            assert!(workers.is_none());
            assert!(timeout.is_none());
            assert!(!json);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_overrides() {
    match parse(&[
        "dsfetch",
        "fetch",
        "urls.txt",
        "--output",
        "/data/pref",
        "--limit",
        "500",
        "--workers",
        "8",
        "--timeout",
        "15",
        "--json",
    ]) {
        CliCommand::Fetch {
            output,
            limit,
            workers,
            timeout,
            json,
            ..
        } => {
            assert_eq!(output, Path::new("/data/pref"));
            assert_eq!(limit, 500);
            assert_eq!(workers, Some(8));
            assert_eq!(timeout, Some(15));
            assert!(json);
        }
        _ => panic!("expected Fetch with overrides"),
    }
}

#[test]
fn cli_parse_fetch_short_output() {
    match parse(&["dsfetch", "fetch", "urls.txt", "-o", "out"]) {
        CliCommand::Fetch { output, .. } => assert_eq!(output, Path::new("out")),
        _ => panic!("expected Fetch with -o"),
    }
}

#[test]
fn cli_fetch_requires_manifest() {
    assert!(Cli::try_parse_from(["dsfetch", "fetch"]).is_err());
}

#[test]
fn cli_fetch_rejects_non_numeric_workers() {
    assert!(Cli::try_parse_from(["dsfetch", "fetch", "u.txt", "--workers", "many"]).is_err());
}
