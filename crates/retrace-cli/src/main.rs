//! Operator CLI for inspecting and converting sourcemaps and obfuscation
//! mappings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use retrace::{DumpOptions, View, ViewOrIndex, from_json};

/// Inspect sourcemaps, convert them to memdb blobs, and resolve
/// obfuscated symbols.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a JSON sourcemap into a memdb blob.
    Convert {
        /// The JSON sourcemap to convert.
        input: PathBuf,
        /// Where to write the memdb blob.
        output: PathBuf,
        /// Leave embedded source contents out of the blob.
        #[arg(long)]
        skip_source_contents: bool,
        /// Leave token names out of the blob.
        #[arg(long)]
        skip_names: bool,
    },
    /// Look up a minified location in a sourcemap (JSON or memdb).
    Lookup {
        /// A `.map`/`.json` sourcemap or a `.memdb` blob.
        map: PathBuf,
        /// The minified location as `line:column` (0-based).
        position: String,
    },
    /// Resolve an obfuscated `class` or `class:member` path.
    Resolve {
        /// The obfuscation mapping file.
        mapping: PathBuf,
        /// The obfuscated path, e.g. `a.b:c`.
        path: String,
        /// Line number to disambiguate overloaded members.
        #[arg(long)]
        line: Option<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Convert {
            input,
            output,
            skip_source_contents,
            skip_names,
        } => convert(&input, &output, skip_source_contents, skip_names),
        Command::Lookup { map, position } => lookup(&map, &position),
        Command::Resolve {
            mapping,
            path,
            line,
        } => resolve(&mapping, &path, line),
    }
}

fn open_view(path: &Path) -> Result<View> {
    if path.extension().is_some_and(|ext| ext == "memdb") {
        return View::memdb_from_path(path)
            .with_context(|| format!("failed to open memdb {}", path.display()));
    }
    let buffer = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match from_json(&buffer, true)? {
        ViewOrIndex::View(view) => Ok(view),
        ViewOrIndex::Index(_) => {
            bail!("{} is an indexed sourcemap with external sections", path.display())
        }
    }
}

fn convert(input: &Path, output: &Path, skip_source_contents: bool, skip_names: bool) -> Result<()> {
    let view = open_view(input)?;
    let blob = view.dump_memdb(DumpOptions {
        with_source_contents: !skip_source_contents,
        with_names: !skip_names,
    })?;
    fs::write(output, &blob)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{} tokens, {} sources -> {} ({} bytes)",
        view.get_token_count(),
        view.get_source_count(),
        output.display(),
        blob.len()
    );
    Ok(())
}

fn lookup(map: &Path, position: &str) -> Result<()> {
    let (line, col) = position
        .split_once(':')
        .and_then(|(l, c)| Some((l.parse::<i64>().ok()?, c.parse::<i64>().ok()?)))
        .context("position must be line:column")?;

    let view = open_view(map)?;
    match view.lookup_token(line, col) {
        Some(token) => {
            println!(
                "{}:{}:{}{}",
                token.src.unwrap_or("<unknown>"),
                token.src_line,
                token.src_col,
                token.name.map(|n| format!(" ({n})")).unwrap_or_default()
            );
        }
        None => println!("no token at {line}:{col}"),
    }
    Ok(())
}

fn resolve(mapping: &Path, path: &str, line: Option<u32>) -> Result<()> {
    let mapping = retrace::ProguardMapping::from_path(mapping)
        .with_context(|| format!("failed to read {}", mapping.display()))?;
    println!("{}", mapping.remap(path, line));
    Ok(())
}
