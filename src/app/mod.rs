use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use mbfilter::filter::{Predicate, compile_filter};
use mbfilter::style::{StyleConfig, StyleRules};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter JSON file (a single filter array)
    #[arg(short, long, conflicts_with = "style")]
    pub filter: Option<PathBuf>,

    /// Style document JSON file (compiles every layer's filter)
    #[arg(short, long)]
    pub style: Option<PathBuf>,

    /// Feature attributes file, one JSON object per line
    #[arg(short, long)]
    pub attrs: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    match (&cli.filter, &cli.style) {
        (Some(filter), None) => run_filter(filter, cli.attrs.as_deref()),
        (None, Some(style)) => run_style(style, cli.attrs.as_deref()),
        _ => bail!("exactly one of --filter or --style is required"),
    }
}

fn run_filter(path: &Path, attrs: Option<&Path>) -> Result<()> {
    let predicate = load_filter(path)?;
    println!("{}", predicate);

    if let Some(attrs_path) = attrs {
        let mut matched = 0usize;
        let mut total = 0usize;
        for_each_feature(attrs_path, |feature| {
            let result = predicate.evaluate(feature);
            matched += result as usize;
            total += 1;
            println!("{}", result);
            Ok(())
        })?;
        tracing::info!("{} of {} feature(s) matched", matched, total);
    }

    Ok(())
}

fn run_style(path: &Path, attrs: Option<&Path>) -> Result<()> {
    let config = StyleConfig::load(path)
        .with_context(|| format!("failed to load style document {}", path.display()))?;
    let rules = StyleRules::compile(&config)?;
    tracing::info!("compiled {} layer(s)", rules.layers.len());

    for layer in &rules.layers {
        match &layer.predicate {
            Some(predicate) => println!("{}: {}", layer.id, predicate),
            None => println!("{}: <no filter>", layer.id),
        }
    }

    if let Some(attrs_path) = attrs {
        for_each_feature(attrs_path, |feature| {
            println!("{}", rules.matching_layers(feature).join(","));
            Ok(())
        })?;
    }

    Ok(())
}

fn load_filter(path: &Path) -> Result<Predicate> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read filter {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("filter {} is not valid JSON", path.display()))?;
    let predicate = compile_filter(&json)
        .with_context(|| format!("failed to compile filter {}", path.display()))?;
    Ok(predicate)
}

/// Stream features from a JSONL file, one attribute object per line.
fn for_each_feature<F>(path: &Path, mut handle: F) -> Result<()>
where
    F: FnMut(&serde_json::Map<String, serde_json::Value>) -> Result<()>,
{
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open attributes {}", path.display()))?;

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("invalid JSON on line {}", lineno + 1))?;
        let Some(object) = value.as_object() else {
            bail!("line {} is not a JSON object", lineno + 1);
        };
        handle(object)?;
    }

    Ok(())
}
