//! Substring query over the merged emote catalog.
//!
//! Prints codes containing the query, ranked by descending id count.
//! Exit codes: 1 when no query is given, 2 when more than one is.

use anyhow::{Context, Result};
use clap::Parser;
use shared::{emote_image_url, Catalog, Config, DataPaths, ImageScale};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Substring to look up in emote codes
    query: Option<String>,

    /// Extra positional arguments are rejected
    #[arg(hide = true)]
    extra: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Also print the CDN image URL of each match's first id
    #[arg(long)]
    urls: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(query) = args.query.clone() else {
        eprintln!("Usage: emote-query [query]");
        return ExitCode::from(1);
    };

    if !args.extra.is_empty() {
        eprintln!("Too many arguments");
        return ExitCode::from(2);
    }

    match run(&query, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(query: &str, args: &Args) -> Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let catalog_path = DataPaths::new(config.data_dir()).catalog_file();
    let content = std::fs::read_to_string(&catalog_path).with_context(|| {
        format!(
            "Failed to read catalog {} (run the crawler and merger first)",
            catalog_path.display()
        )
    })?;
    let catalog: Catalog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog {}", catalog_path.display()))?;

    let matches = catalog.search(query);
    if matches.is_empty() {
        println!("No emotes matched {:?}", query);
        return Ok(());
    }

    for m in &matches {
        if args.urls {
            let url = m
                .ids
                .first()
                .map(|id| emote_image_url(id, ImageScale::X1))
                .unwrap_or_default();
            println!("{:<20} {:>6}  {}", m.code, m.ids.len(), url);
        } else {
            println!("{:<20} {:>6}", m.code, m.ids.len());
        }
    }

    Ok(())
}
