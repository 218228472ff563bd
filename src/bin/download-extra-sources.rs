//! download-extra-sources - fetch a conda recipe's `extra.sources`
//!
//! Run from `build.sh`, inside the work directory conda-build created:
//!
//!   download-extra-sources                       uses $RECIPE_DIR and the cwd
//!   download-extra-sources --provider fetch-src  override the provider command

use anyhow::{Context, Result};
use clap::Parser;
use extra_sources::config::{ConfigToml, ProviderToml};
use extra_sources::{RunOptions, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "download-extra-sources")]
#[command(about = "Download and extract the extra sources listed in a recipe's meta.yaml")]
#[command(version)]
struct Cli {
    /// Recipe directory containing meta.yaml
    #[arg(long, env = "RECIPE_DIR")]
    recipe_dir: PathBuf,

    /// Directory to resolve the work directory from (default: current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Source provider command (overrides config files)
    #[arg(long, env = "EXTRA_SOURCES_PROVIDER")]
    provider: Option<String>,

    /// Extra config file, applied after the global and per-recipe ones
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Don't take the build folder lock
    #[arg(long)]
    no_lock: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = match cli.cwd {
        Some(dir) => std::fs::canonicalize(&dir)
            .with_context(|| format!("Failed to resolve {}", dir.display()))?,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut config = ConfigToml::load(&cli.recipe_dir, cli.config.as_deref())?;
    if let Some(bin) = cli.provider {
        config.merge(ConfigToml {
            provider: Some(ProviderToml {
                bin: Some(bin),
                ..Default::default()
            }),
            lock: None,
        });
    }
    if cli.no_lock {
        config.lock = Some(false);
    }

    let provider = config.command_provider()?;
    let options = RunOptions {
        cwd,
        recipe_dir: cli.recipe_dir,
        lock: config.lock_enabled(),
    };

    let summary = extra_sources::run(&options, &provider)?;
    output::info(&format!(
        "{} extra source(s) fetched into {}",
        summary.fetched.len(),
        summary.layout.work_dir.display()
    ));
    Ok(())
}
