// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11y-audit CLI - accessibility audit of static HTML files

use a11y_audit::config::load_config;
use a11y_audit::report::format::{generate_report, OutputFormat};
use a11y_audit::scanner;
use a11y_audit::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Rule-based accessibility audit engine
#[derive(Parser)]
#[command(name = "a11y-audit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an HTML file
    Check {
        /// HTML file to audit
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Comma-separated rule ids to run (all rules if not specified)
        #[arg(long, value_delimiter = ',')]
        rules: Option<Vec<String>>,

        /// Per-rule timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Run rules one after another
        #[arg(long)]
        sequential: bool,

        /// Configuration file (YAML or TOML)
        #[arg(long, default_value = "a11y-audit.yml")]
        config: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Label reported as the audit target (defaults to the file path)
        #[arg(long)]
        target: Option<String>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the available rules
    Rules,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("a11y_audit=debug")
    } else {
        EnvFilter::new("a11y_audit=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            file,
            format,
            rules,
            timeout_ms,
            sequential,
            config,
            output,
            target,
            verbose,
        } => {
            init_logging(verbose);
            let config = load_config(&config)?;

            let mut options = config.audit_options();
            if rules.is_some() {
                options.rules = rules;
            }
            if let Some(ms) = timeout_ms {
                options.per_rule_timeout = Duration::from_millis(ms);
            }
            if sequential {
                options.concurrency = false;
            }

            let engine = Engine::new(config.registry());
            let report = scanner::audit_file(&engine, &file, target.as_deref(), &options)?;
            let rendered = generate_report(&report, format.into());
            write_output(&rendered, output.as_deref())?;

            if report.has_high() {
                std::process::exit(1);
            }
        }

        Commands::Rules => {
            let engine = Engine::with_defaults();
            for rule in engine.registry().iter() {
                println!(
                    "{:<22} {:<7} {}",
                    rule.id(),
                    rule.default_severity().as_str(),
                    rule.description()
                );
            }
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&std::path::Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
