//! krazy2view CLI binary entry point.
//! Delegates to the library for progress replay and report parsing and
//! prints results.

use anyhow::{bail, Context};
use clap::Parser;
use krazy2view::cli::{Cli, Commands};
use krazy2view::config::{self, Effective};
use krazy2view::job::AnalysisRun;
use krazy2view::models::CurrentResults;
use krazy2view::output::{self, ProgressPrinter};
use krazy2view::progress::ProgressParser;
use krazy2view::utils::{self, error_prefix, note_prefix, warn_prefix};
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "krazy2view=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Progress {
            repo_root,
            log,
            checkers,
            chunk_size,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                None,
                output.as_deref(),
                checkers,
                chunk_size,
                &[],
            )?;
            note_missing_config(&eff);
            let Some(checkers) = eff.checkers else {
                eprintln!(
                    "{} Number of checkers is not configured. Pass --checkers or add it to krazy2view.toml.",
                    error_prefix()
                );
                std::process::exit(2);
            };

            let data = fs::read(&log).with_context(|| format!("reading status log {log}"))?;
            let mut parser = ProgressParser::new();
            parser.configure(checkers)?;
            let mut events = Vec::new();
            parser.start(&mut events);
            for chunk in data.chunks(eff.chunk_size) {
                parser.feed(chunk, &mut events)?;
            }
            warn_unconsumed(&parser.pending(), &eff.output);
            parser.finish(&mut events);
            output::print_progress(&events, &eff.output);
        }
        Commands::Analyze {
            repo_root,
            working_dir,
            reports,
            progress_log,
            checkers,
            chunk_size,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                working_dir.as_deref(),
                output.as_deref(),
                checkers,
                chunk_size,
                &reports,
            )?;
            note_missing_config(&eff);
            let paths = config::expand_reports(&eff)?;
            if paths.is_empty() {
                eprintln!(
                    "{} No krazy2 report found. Pass --report or set `reports` in krazy2view.toml.",
                    error_prefix()
                );
                std::process::exit(2);
            }
            if fs::read_dir(&eff.working_dir).is_err() {
                bail!(
                    "working directory {} does not exist or is not readable",
                    eff.working_dir.display()
                );
            }

            let checkers = match (eff.checkers, progress_log.is_some()) {
                (Some(n), _) => n,
                (None, false) => 1,
                (None, true) => {
                    eprintln!(
                        "{} Replaying progress needs --checkers or `checkers` in krazy2view.toml.",
                        error_prefix()
                    );
                    std::process::exit(2);
                }
            };

            let current = CurrentResults::new();
            let mut printer = ProgressPrinter::new(&eff.output, progress_log.is_some());
            let mut run = AnalysisRun::new(&eff.working_dir.to_string_lossy(), checkers)?;
            run.start(&mut printer);

            if let Some(log) = &progress_log {
                let data = fs::read(log).with_context(|| format!("reading status log {log}"))?;
                for chunk in data.chunks(eff.chunk_size) {
                    run.feed_progress(chunk, &mut printer)?;
                }
            }

            for path in &paths {
                let text = match fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(e) => {
                        run.finish(false, &mut printer, &current);
                        return Err(e).with_context(|| format!("reading report {}", path.display()));
                    }
                };
                for chunk in utils::str_chunks(&text, eff.chunk_size) {
                    run.feed_report(chunk);
                }
            }

            let outcome = run.finish(true, &mut printer, &current);
            let Some(results) = current.current() else {
                bail!("analysis finished without results");
            };
            output::print_results(&results, &outcome.diagnostics, &eff.repo_root, &eff.output);
            if !results.issues().is_empty() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn note_missing_config(eff: &Effective) {
    if !eff.config_found && eff.output != "json" {
        eprintln!("{} No krazy2view.toml found; using defaults.", note_prefix());
    }
}

fn warn_unconsumed(pending: &str, output: &str) {
    let pending = pending.trim();
    if pending.is_empty() || output == "json" {
        return;
    }
    let preview: String = pending.chars().take(60).collect();
    eprintln!(
        "{} status output was not recognized and stays unconsumed: {}",
        warn_prefix(),
        preview
    );
}
