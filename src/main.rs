use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use threadsift::analyzer::{ThreadLogAnalyzer, ToolIssueSet, touches_any_file};
use threadsift::cli::Args;
use threadsift::error::{Error, Result};
use threadsift::formatter::{emit, emit_json, load_json, render_text_to_string};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "threadsift=info".into()),
        )
        .init();
}

fn collect_issues(args: &Args) -> Result<ToolIssueSet> {
    let config = args.analysis_config();

    let Some(path) = &args.from_json else {
        return Ok(ThreadLogAnalyzer::new(config).analyze());
    };

    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.clone(),
        source,
    })?;
    let mut set = load_json(&text)?;
    if !config.only_files.is_empty() {
        set.retain_issues(|issue| touches_any_file(issue, &config.only_files));
    }
    Ok(set)
}

fn run(args: &Args) -> Result<()> {
    let set = collect_issues(args)?;

    let report =
        render_text_to_string(&set, &args.report_options()).map_err(|source| Error::Write {
            path: args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("<stdout>")),
            source,
        })?;
    emit(&report, args.output.as_deref())?;

    if let Some(path) = &args.json {
        emit_json(&set, path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
