#![forbid(unsafe_code)]

use std::process::exit;

use serde_querybind::{Budget, check_budget, parse_query};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read a query string and print its budget summary. This tool allows to check approximate
/// budget requirements for your forms and to validate key syntax. Single parameter is the
/// query string, or `@file` to read it from a file.
fn main() {
    init_tracing();

    let arg = match std::env::args().nth(1).ok_or(
        "This program calculates budget to decode the given query string, \
        can also be used as key syntax validator. Expected a query string (or @file) as the first argument",
    ) {
        Ok(arg) => arg,
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    };

    let query = match arg.strip_prefix('@') {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => content.trim_end().to_owned(),
            Err(err) => {
                eprintln!("Failed to read {path}: {err}");
                exit(2);
            }
        },
        None => arg,
    };

    let map = parse_query(&query);
    debug!(keys = map.len(), "parsed query");

    match check_budget(&map, &Budget::default()) {
        Ok(report) => {
            println!("Budget report:\n{report:#?}");
            if let Some(breach) = report.breached {
                eprintln!("budget exceeded: {breach}");
                exit(3);
            }
        }
        Err(err) => {
            eprintln!("invalid query:\n{err}");
            exit(3);
        }
    }
}
