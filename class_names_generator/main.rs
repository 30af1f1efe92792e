use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cosplay_classifier::ClassNames;

/// Writes the class names artifact from a dataset laid out as one directory per character.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset root; every sub-directory name becomes a class
    dataset: PathBuf,

    /// Output file; the extension selects numpy (.npy), JSON (.json), bincode (.bin) or plain text
    #[arg(default_value = "class_names.npy")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let names = list_categories(&args.dataset)?;
    log::info!("found {} categories in {}", names.len(), args.dataset.display());

    let class_names = ClassNames::new(names)
        .with_context(|| format!("no usable categories in {}", args.dataset.display()))?;
    class_names
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("saved class names to {}", args.output.display());

    Ok(())
}

// Sorted so output positions are stable across filesystems.
fn list_categories(dataset: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = std::fs::read_dir(dataset)
        .with_context(|| format!("failed to read dataset directory {}", dataset.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("skipping non UTF-8 directory {:?}", name),
        }
    }
    names.sort();
    Ok(names)
}
