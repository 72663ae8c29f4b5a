use std::process;

use clap::Parser;
use colored::Colorize;
use kmerbatch::{
    cli::{Args, Command, KmersArgs, SearchArgs},
    config::{KmerConfig, SearchConfig},
    error::KmerBatchError,
    extract, orchestrator,
};

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    #[cfg(feature = "tracing")]
    init_tracing();

    let args = Args::parse();

    let result = match args.command {
        Command::Kmers(kmers) => run_kmers(kmers),
        Command::Search(search) => run_search(search),
    };

    if let Err(e) = result {
        eprintln!(
            "{}\n {}",
            "Application error:".blue().bold(),
            e.to_string().blue()
        );
        if matches!(e, KmerBatchError::MissingParameters { .. }) {
            eprintln!();
            eprintln!("{}\n {}", "Help menu:".blue().bold(), "$ kmerbatch --help".bold());
        }
        process::exit(1);
    }
}

fn run_kmers(args: KmersArgs) -> Result<(), KmerBatchError> {
    let config = KmerConfig::try_from(args)?;
    let verbose = config.verbose;

    extract::run(&config, |progress| {
        if verbose {
            eprintln!("{}", progress.records);
        }
    })?;
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<(), KmerBatchError> {
    let verbose = args.verbose;
    let json = args.json;
    let config = SearchConfig::from(args);
    config.validate()?;

    if verbose {
        if let Some(query) = &config.query {
            eprintln!("{}: {}", "query".bold(), query.display().to_string().blue());
        }
        if let Some(output) = config.output_path() {
            eprintln!("{}: {}", "output".bold(), output.display().to_string().blue());
        }
        eprintln!(
            "{}: {} per chunk, {} concurrent",
            "searches".bold(),
            config.chunk_size,
            config.jobs
        );
    }

    let summary = orchestrator::run(&config, |progress| {
        if verbose {
            eprintln!("{progress}");
        }
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if verbose {
        eprintln!(
            "{}: {} hits from {} searches written to {}",
            "done".bold(),
            summary.hits,
            summary.searches,
            summary.output.display().to_string().underline()
        );
    }
    Ok(())
}
