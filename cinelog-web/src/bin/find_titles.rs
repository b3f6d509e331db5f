//! find-titles - search the catalog from the command line
//!
//! Same matching as the chat-bot `!` command: a phrase wrapped in double
//! quotes must appear as written, otherwise every word must appear somewhere
//! in the title.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cinelog_common::catalog_file::load_titles;
use cinelog_common::config::{load_toml_config, resolve_catalog_path, resolve_data_folder};
use cinelog_common::titles::find_titles;

/// At most this many titles are printed
const MAX_RESULTS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "find-titles")]
#[command(about = "Search the movie catalog by title")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "CINELOG_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog file (defaults to the service's catalog)
    #[arg(long, env = "CINELOG_CATALOG")]
    catalog: Option<PathBuf>,

    /// Words to search for; wrap in quotes for an exact phrase
    #[arg(required = true)]
    phrase: Vec<String>,
}

/// Strip the chat command prefix (`!` and surrounding spaces)
fn command_phrase(words: &[String]) -> String {
    words
        .join(" ")
        .trim_matches(|c: char| c == '!' || c.is_whitespace())
        .to_string()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref());
    let data_folder = resolve_data_folder(None, &toml_config);
    let catalog_path = resolve_catalog_path(args.catalog.as_deref(), &data_folder, &toml_config);

    let titles = load_titles(&catalog_path)
        .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;

    let phrase = command_phrase(&args.phrase);
    let matches = find_titles(&phrase, &titles);

    if matches.is_empty() {
        println!("No movie found for phrase {}.", phrase);
    } else {
        for title in matches.iter().take(MAX_RESULTS) {
            println!("{}", title);
        }
    }

    Ok(())
}
