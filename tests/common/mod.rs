//! Shared helpers for integration tests.

#![allow(dead_code)]

use anyhow::{Result, bail};
use extra_sources::{MetadataView, ProvideConfig, SourceProvider};
use serde_yaml::Value;
use std::cell::RefCell;
use std::path::PathBuf;
use tempfile::TempDir;

/// Recipe with two extra sources, in the order cfe, lld.
pub const MULTISRC_META: &str = r#"
package:
  name: multisrc-example
  version: "0.1"

source:
  fn: llvm-3.8.0.src.tar.xz
  url: http://llvm.org/releases/3.8.0/llvm-3.8.0.src.tar.xz
  md5: 07a7a74f3c6bd65de4702bf941b511a0

extra:
  sources:
    cfe:
      fn: cfe-3.8.0.src.tar.xz
      url: http://llvm.org/releases/3.8.0/cfe-3.8.0.src.tar.xz
      md5: cc99e7019bb74e6459e80863606250c5
    lld:
      fn: lld-3.8.0.src.tar.xz
      url: http://llvm.org/releases/3.8.0/lld-3.8.0.src.tar.xz
"#;

/// Recipe whose extra.sources is present but empty.
pub const EMPTY_EXTRA_META: &str = r#"
package:
  name: single
source:
  url: http://example.com/single.tar.gz
extra:
  sources: {}
"#;

/// A conda-bld style tree: `<tmp>/conda-bld/<build_id>/work` plus a recipe dir.
pub struct TestEnv {
    pub dir: TempDir,
    pub recipe_dir: PathBuf,
    pub work_dir: PathBuf,
}

impl TestEnv {
    pub fn new(meta: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let recipe_dir = dir.path().join("recipe");
        let work_dir = dir.path().join("conda-bld").join("llvm_1461234").join("work");
        std::fs::create_dir_all(&recipe_dir).unwrap();
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(recipe_dir.join("meta.yaml"), meta).unwrap();
        Self {
            dir,
            recipe_dir,
            work_dir,
        }
    }

    pub fn croot(&self) -> PathBuf {
        self.dir.path().join("conda-bld")
    }

    /// Simulate conda-build having extracted the primary source.
    pub fn extract_primary(&self, name: &str) -> PathBuf {
        let path = self.work_dir.join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

/// Records every call; fails on the source named in `fail_on`.
#[derive(Default)]
pub struct RecordingProvider {
    pub calls: RefCell<Vec<(Value, ProvideConfig)>>,
    pub fail_on: Option<String>,
}

impl RecordingProvider {
    pub fn failing_on(name: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(name.to_string()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(_, c)| c.name.clone())
            .collect()
    }
}

impl SourceProvider for RecordingProvider {
    fn provide(&self, meta: &MetadataView<'_>, config: &ProvideConfig) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((meta.source().clone(), config.clone()));
        if self.fail_on.as_deref() == Some(config.name.as_str()) {
            bail!("checksum mismatch for {}", config.name);
        }
        Ok(())
    }
}
