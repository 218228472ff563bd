//! Source provider: the host tool that downloads, verifies and extracts
//!
//! This crate never touches archives or the network itself. For each extra
//! source it hands a derived recipe and a [`ProvideConfig`] to a
//! [`SourceProvider`]. The stock implementation, [`CommandProvider`], runs a
//! configured host-tool command.

use crate::metadata::MetadataView;
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything the provider needs to know about where a source goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideConfig {
    /// Key of the source in `extra.sources`.
    pub name: String,
    pub croot: PathBuf,
    pub build_id: String,
    /// Directory the source should be extracted into.
    pub work_dir: PathBuf,
    pub verbose: bool,
}

/// Fetches and extracts one source section.
pub trait SourceProvider {
    fn provide(&self, meta: &MetadataView<'_>, config: &ProvideConfig) -> Result<()>;
}

/// Runs an external command once per source.
///
/// The derived recipe is written to a temporary `meta.yaml`. The command runs
/// in the target directory and sees:
///
/// | variable                | value                          |
/// |-------------------------|--------------------------------|
/// | `EXTRA_SOURCE_NAME`     | key in `extra.sources`         |
/// | `EXTRA_SOURCE_META`     | path of the derived `meta.yaml`|
/// | `EXTRA_SOURCE_WORK_DIR` | target directory               |
/// | `CROOT`                 | build root                     |
/// | `BUILD_ID`              | build folder name              |
/// | `VERBOSE`               | `1` or `0`                     |
/// | `RECIPE_DIR`            | directory of the original recipe |
///
/// Arguments may contain `{name}`, `{meta}`, `{work_dir}`, `{croot}` and
/// `{build_id}` placeholders.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    bin: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandProvider {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    fn build_command(
        &self,
        meta_path: &Path,
        recipe_dir: Option<&Path>,
        config: &ProvideConfig,
    ) -> Command {
        let placeholders = [
            ("{name}", config.name.clone()),
            ("{meta}", meta_path.display().to_string()),
            ("{work_dir}", config.work_dir.display().to_string()),
            ("{croot}", config.croot.display().to_string()),
            ("{build_id}", config.build_id.clone()),
        ];

        let mut cmd = Command::new(&self.bin);
        cmd.args(self.args.iter().map(|arg| {
            placeholders
                .iter()
                .fold(arg.clone(), |acc, (key, value)| acc.replace(key, value))
        }));
        cmd.current_dir(&config.work_dir);

        cmd.env("EXTRA_SOURCE_NAME", &config.name)
            .env("EXTRA_SOURCE_META", meta_path)
            .env("EXTRA_SOURCE_WORK_DIR", &config.work_dir)
            .env("CROOT", &config.croot)
            .env("BUILD_ID", &config.build_id)
            .env("VERBOSE", if config.verbose { "1" } else { "0" });
        if let Some(dir) = recipe_dir {
            cmd.env("RECIPE_DIR", dir);
        }
        cmd.envs(&self.env);

        cmd
    }
}

impl SourceProvider for CommandProvider {
    fn provide(&self, meta: &MetadataView<'_>, config: &ProvideConfig) -> Result<()> {
        let staging = tempfile::Builder::new()
            .prefix("extra-source-")
            .tempdir()
            .context("Failed to create staging directory")?;
        let meta_path = staging.path().join("meta.yaml");
        std::fs::write(&meta_path, meta.to_yaml()?)
            .with_context(|| format!("Failed to write {}", meta_path.display()))?;

        let recipe_dir = meta.base().path().parent();
        let status = self
            .build_command(&meta_path, recipe_dir, config)
            .status()
            .with_context(|| format!("Failed to start source provider '{}'", self.bin))?;

        if !status.success() {
            bail!(
                "source provider '{}' failed for {} (exit code: {:?})",
                self.bin,
                config.name,
                status.code()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecipeMetadata;
    use tempfile::TempDir;

    const META: &str = "package:\n  name: pkg\nextra:\n  sources:\n    cfe:\n      url: http://x/cfe.tar.xz\n";

    fn setup() -> (TempDir, RecipeMetadata, ProvideConfig) {
        let dir = TempDir::new().unwrap();
        let recipe_dir = dir.path().join("recipe");
        std::fs::create_dir_all(&recipe_dir).unwrap();
        std::fs::write(recipe_dir.join("meta.yaml"), META).unwrap();
        let meta = RecipeMetadata::load(&recipe_dir).unwrap();

        let work_dir = dir.path().join("bld").join("id").join("work").join("cfe");
        std::fs::create_dir_all(&work_dir).unwrap();
        let config = ProvideConfig {
            name: "cfe".into(),
            croot: dir.path().join("bld"),
            build_id: "id".into(),
            work_dir,
            verbose: true,
        };
        (dir, meta, config)
    }

    #[test]
    fn test_command_sees_environment() {
        let (_dir, meta, config) = setup();
        let sources = meta.extra_sources().unwrap();
        let view = meta.with_source(sources[0].1);

        let provider = CommandProvider::new("sh").args([
            "-c",
            "echo \"$EXTRA_SOURCE_NAME $BUILD_ID $VERBOSE $EXTRA_SOURCE_WORK_DIR\" > out.txt; cp \"$EXTRA_SOURCE_META\" meta.yaml",
        ]);
        provider.provide(&view, &config).unwrap();

        let out = std::fs::read_to_string(config.work_dir.join("out.txt")).unwrap();
        assert_eq!(
            out.trim(),
            format!("cfe id 1 {}", config.work_dir.display())
        );
        let derived = std::fs::read_to_string(config.work_dir.join("meta.yaml")).unwrap();
        assert!(derived.contains("http://x/cfe.tar.xz"));
    }

    #[test]
    fn test_placeholders_expanded() {
        let (_dir, meta, config) = setup();
        let sources = meta.extra_sources().unwrap();
        let view = meta.with_source(sources[0].1);

        let provider = CommandProvider::new("sh").args([
            "-c",
            "echo \"$1\" > args.txt",
            "sh",
            "{name}:{build_id}",
        ]);
        provider.provide(&view, &config).unwrap();

        let out = std::fs::read_to_string(config.work_dir.join("args.txt")).unwrap();
        assert_eq!(out.trim(), "cfe:id");
    }

    #[test]
    fn test_extra_env_passed() {
        let (_dir, meta, config) = setup();
        let sources = meta.extra_sources().unwrap();
        let view = meta.with_source(sources[0].1);

        let provider = CommandProvider::new("sh")
            .args(["-c", "test \"$MIRROR\" = http://mirror"])
            .envs([("MIRROR", "http://mirror")]);
        assert!(provider.provide(&view, &config).is_ok());
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let (_dir, meta, config) = setup();
        let sources = meta.extra_sources().unwrap();
        let view = meta.with_source(sources[0].1);

        let err = CommandProvider::new("sh")
            .args(["-c", "exit 42"])
            .provide(&view, &config)
            .unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_missing_binary_is_error() {
        let (_dir, meta, config) = setup();
        let sources = meta.extra_sources().unwrap();
        let view = meta.with_source(sources[0].1);

        let err = CommandProvider::new("/nonexistent/provider")
            .provide(&view, &config)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
