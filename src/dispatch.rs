//! Extra-source dispatch
//!
//! Resolve the layout once, then hand every `extra.sources` entry to the
//! provider in recipe order. The first failure stops the run; sources that
//! were already extracted stay on disk.

use crate::layout::{self, Placement, WorkLayout};
use crate::lock;
use crate::metadata::RecipeMetadata;
use crate::output;
use crate::provider::{ProvideConfig, SourceProvider};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory the build script was started from.
    pub cwd: PathBuf,
    /// Directory holding `meta.yaml`.
    pub recipe_dir: PathBuf,
    /// Hold the build folder lock while fetching.
    pub lock: bool,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub layout: WorkLayout,
    pub real_work_dir: PathBuf,
    /// Sources handed to the provider, in order.
    pub fetched: Vec<String>,
}

/// Load the recipe, work out the layout and fetch every extra source.
pub fn run(options: &RunOptions, provider: &dyn SourceProvider) -> Result<DispatchSummary> {
    output::action("Getting extra source packages");

    let meta = RecipeMetadata::load(&options.recipe_dir)?;
    output::info(&package_label(&meta)?);
    output::rule();
    output::field("cwd", options.cwd.display());

    let layout = layout::resolve(&options.cwd)?;
    let real_work_dir = layout::real_work_dir(&layout)
        .with_context(|| format!("Failed to read {}", layout.work_dir.display()))?;

    output::field("work dir", real_work_dir.display());
    output::field("croot", layout.croot.display());
    output::field("build id", &layout.build_id);
    output::field("src dir", layout.subdir.display());

    let _lock = if options.lock {
        Some(lock::acquire_build_lock(&layout.build_dir())?)
    } else {
        None
    };

    let fetched = fetch_extra_sources(&meta, &layout, provider)?;

    output::success("Extra source packages downloaded and extracted");
    list_dir(&real_work_dir)?;

    Ok(DispatchSummary {
        layout,
        real_work_dir,
        fetched,
    })
}

/// Hand each `extra.sources` entry to `provider`, one at a time.
///
/// Each source gets a view of the recipe whose `source` section is exactly
/// that entry. Where sources go is decided once, before the first one is
/// fetched. Each target directory is created before the provider runs.
pub fn fetch_extra_sources(
    meta: &RecipeMetadata,
    layout: &WorkLayout,
    provider: &dyn SourceProvider,
) -> Result<Vec<String>> {
    let sources = meta.extra_sources()?;
    if sources.is_empty() {
        output::warning(&format!(
            "{} declares no extra.sources, nothing to fetch",
            meta.path().display()
        ));
    }

    let placement = Placement::probe(layout)
        .with_context(|| format!("Failed to read {}", layout.work_dir.display()))?;
    let total = sources.len();
    let mut fetched = Vec::with_capacity(total);

    for (i, (name, descriptor)) in sources.into_iter().enumerate() {
        println!();
        output::action_numbered(i + 1, total, &format!("Extra source: {}", name));
        output::rule();

        let view = meta.with_source(descriptor);
        let target = placement.target(layout, &name);
        std::fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        output::field("work dir", target.display());

        let config = ProvideConfig {
            name: name.clone(),
            croot: layout.croot.clone(),
            build_id: layout.build_id.clone(),
            work_dir: target,
            verbose: true,
        };
        provider
            .provide(&view, &config)
            .with_context(|| format!("Failed to provide extra source '{}'", name))?;

        output::rule();
        fetched.push(name);
    }

    Ok(fetched)
}

/// `name` or `name version`
fn package_label(meta: &RecipeMetadata) -> Result<String> {
    let name = meta.name()?;
    Ok(match meta.version() {
        Some(version) => format!("{} {}", name, version),
        None => name,
    })
}

fn list_dir(dir: &Path) -> Result<()> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    names.sort();

    output::info(&format!("Work directory contents ({})", dir.display()));
    output::rule();
    for name in names {
        output::detail(&name);
    }
    Ok(())
}
