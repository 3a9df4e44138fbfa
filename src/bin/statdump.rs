//! Command-line entry point: merges two record dumps and stores the result.
//!
//! Usage: `statdump <first> <second> <output>`. Argument count other than
//! three is checked before handing off to `clap`, so the exact usage
//! message and `-1` exit code (truncated to 255 on POSIX, an unavoidable
//! quirk of that convention) match the original behaviour rather than
//! whatever `clap` would print on its own.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

use statdump::pipeline;
use statdump::status::Status;

const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "statdump", about = "Merge two record dumps and store the result")]
struct Args {
    first: PathBuf,
    second: PathBuf,
    output: PathBuf,
}

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.len() != 4 {
        eprintln!(
            "Program must have 3 arguments with application (total 4) in format: \
             statdump firstStoredPath secondStoredPath resultPath. [args count:{}]",
            raw_args.len()
        );
        return ExitCode::from(255);
    }

    configure_tracing();

    let args = Args::parse();

    // `codec::store` maps and truncates an existing file; it never creates
    // one (spec.md §4.2: "the file must pre-exist (creation is the CLI's
    // responsibility)"). Create-or-truncate it here before handing off.
    if let Err(err) = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&args.output)
    {
        eprintln!("cannot create output file {}: {err}", args.output.display());
        return ExitCode::from(255);
    }

    match pipeline::run(&args.first, &args.second, &args.output, DEFAULT_PREVIEW_ROWS) {
        Ok(records) => {
            println!("Success serialize data [records:{}]", records.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let status = status_of(&err);
            error!(%status, "pipeline failed: {err}");
            ExitCode::from(255)
        }
    }
}

fn status_of(err: &pipeline::PipelineError) -> Status {
    match err {
        pipeline::PipelineError::Load(e) => Status::from(e),
        pipeline::PipelineError::Join(e) => Status::from(e),
        pipeline::PipelineError::Store(e) => Status::from(e),
        pipeline::PipelineError::TableView(e) => Status::from(e),
    }
}

fn configure_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();
}
