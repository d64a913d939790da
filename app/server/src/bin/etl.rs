//! Build the cleaned dataset file from the raw disaster CSV.
//!
//! Usage: `etl [RAW_CSV] [CLEAN_CSV]`

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let raw = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data").join("NaturalDisasters.csv"));
    let clean = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data").join("DisastersCleaned.csv"));

    match disaster_qa::etl::run(&raw, &clean) {
        Ok(report) => {
            println!(
                "Wrote {} rows to {} ({} dropped)",
                report.rows_written,
                clean.display(),
                report.rows_dropped()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ETL failed - {}", e);
            ExitCode::FAILURE
        }
    }
}
