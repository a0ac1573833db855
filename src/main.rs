use anyhow::{bail, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use pathquill::config::Config;
use pathquill::document::node::DocumentFormat;
use pathquill::file::loader::{load_document_file, load_document_from_stdin};
use pathquill::treepath::{OutputFormat, RenderOptions, Report, Validator};

/// pathquill - query JSON, YAML and XML documents by path
#[derive(Parser)]
#[command(name = "pathquill")]
#[command(version)]
#[command(about = "Query JSON, YAML and XML documents with JSONPath/XPath-style paths", long_about = None)]
struct Cli {
    /// Path expression, e.g. `$.store.book[*].title` or `//item/@id`
    query: String,

    /// Document to query (omit to read from stdin)
    file: Option<String>,

    /// Document format (default: from the file name, else sniffed)
    #[arg(short, long)]
    format: Option<DocumentFormat>,

    /// Report format: text, json or yaml
    #[arg(short, long)]
    output: Option<OutputFormat>,

    /// Maximum nodes recursive descent may visit (0 for no limit)
    #[arg(long)]
    budget: Option<usize>,

    /// Print at most this many matches
    #[arg(long)]
    max_results: Option<usize>,

    /// Print paths without values
    #[arg(long)]
    paths_only: bool,

    /// Treat QUERY as a canonical path and print the value stored there
    #[arg(long)]
    resolve: bool,

    /// Only check the expression syntax; no document is read
    #[arg(long)]
    validate: bool,
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_env("PATHQUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

/// Runs one invocation; `Ok(false)` means the query itself failed.
fn run(cli: Cli) -> Result<bool> {
    if cli.validate {
        let validation = Validator::validate(&cli.query);
        return match validation.error {
            None => {
                println!("valid");
                Ok(true)
            }
            Some(error) => {
                println!("invalid: {}", error);
                Ok(false)
            }
        };
    }

    let config = Config::load();
    let output = cli.output.unwrap_or(config.output);
    let budget = match cli.budget {
        Some(0) => None,
        Some(budget) => Some(budget),
        None => config.budget(),
    };
    let options = RenderOptions {
        paths_only: cli.paths_only || config.paths_only,
        max_results: cli.max_results.or(config.max_results),
    };

    let document = match &cli.file {
        Some(path) => load_document_file(path, cli.format)?,
        None if io::stdin().is_terminal() => {
            bail!("No input: pass a FILE or pipe a document on stdin")
        }
        None => load_document_from_stdin(cli.format)?,
    };

    let engine = document.engine().with_node_budget(budget);
    let result = if cli.resolve {
        document.resolve(&engine, &cli.query)
    } else {
        document.query_with(&engine, &cli.query)
    };

    let rendered = Report::from_result(&result).render(output, options)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    Ok(result.success)
}
