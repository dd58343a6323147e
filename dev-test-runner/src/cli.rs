//! Minimal CLI: fixtures → decode → re-encode → compare
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::fixture::{Fixture, Outcome};
use crate::models;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// run JSON fixture files through the demo key-mapped records
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// print swallowed field errors and other debug events to stderr
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run every fixture found in the inputs
    Run(RunSettings),
    /// list the record names a fixture may refer to
    Records,
}

#[derive(Args, Debug, Clone)]
struct RunSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// only run fixtures whose name contains this string
    #[arg(long)]
    filter: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RunSettings {
    fn load_fixtures(&self) -> Result<Vec<(PathBuf, Fixture)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read fixture file {}", source_path.display()))?;
            let fixtures: Vec<Fixture> = json_keymap::json::from_str_with_path(&source)
                .with_context(|| format!("failed to parse fixture file {}", source_path.display()))?;
            out.extend(
                fixtures
                    .into_iter()
                    .filter(|f| self.filter.as_deref().is_none_or(|needle| f.name.contains(needle)))
                    .map(|f| (source_path.clone(), f)),
            );
        }
        Ok(out)
    }

    fn run(&self) -> Result<bool> {
        models::install_converters();
        let fixtures = self.load_fixtures()?;
        if fixtures.is_empty() {
            bail!("no fixtures matched the given inputs");
        }

        let outcomes: Vec<Outcome> = fixtures.par_iter().map(|(_, fixture)| fixture.check()).collect();

        let mut failed = 0usize;
        for ((path, fixture), outcome) in fixtures.iter().zip(&outcomes) {
            let origin = path.display().to_string();
            match outcome {
                Outcome::Pass => {
                    eprintln!("{} {} {}", "✓".green(), fixture.name, origin.dimmed());
                }
                Outcome::Fail(reason) => {
                    failed += 1;
                    eprintln!("{} {} {}", "✗".red(), fixture.name.bold(), origin.dimmed());
                    eprintln!("    {}", reason.dimmed());
                }
            }
        }

        let passed = outcomes.len() - failed;
        eprintln!(
            "{} passed, {} failed",
            passed.to_string().green(),
            if failed == 0 { failed.to_string().normal() } else { failed.to_string().red() },
        );
        Ok(failed == 0)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when at least one fixture failed.
    pub fn run(&self) -> Result<bool> {
        if self.verbose {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(std::io::stderr)
                .init();
        }
        match &self.cmd {
            Command::Run(settings) => settings.run(),
            Command::Records => {
                for name in models::names() {
                    println!("{name}");
                }
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}
