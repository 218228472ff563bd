//! Work directory layout inference
//!
//! conda-build does not tell build scripts where its work directory lives,
//! so it is recovered from the current directory: walk up until a segment
//! named `work`, the segment above it is the build id, and everything above
//! that is the build root (`croot`).
//!
//! ```text
//! /opt/conda/conda-bld/llvm_1461234/work/llvm-3.8.0.src
//! \_________________/ \__________/ \__/ \____________/
//!        croot           build_id  work     subdir
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory name conda-build extracts the primary source into.
pub const WORK_DIR_NAME: &str = "work";

/// Errors from [`resolve`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("current directory is not absolute: {}", .0.display())]
    NotAbsolute(PathBuf),

    #[error("no 'work' directory above {}; run this from inside the build work directory", .0.display())]
    MarkerNotFound(PathBuf),

    #[error("'work' directory has no build id above it: {}", .0.display())]
    MissingBuildId(PathBuf),

    #[error("build id above 'work' is not valid UTF-8: {}", .0.display())]
    NonUtf8BuildId(PathBuf),
}

/// Directories recovered from the current working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    /// Build root holding one folder per build id.
    pub croot: PathBuf,
    /// Name of the folder for this build.
    pub build_id: String,
    /// `<croot>/<build_id>/work`
    pub work_dir: PathBuf,
    /// Where the current directory sits below `work_dir` (empty at `work_dir`).
    pub subdir: PathBuf,
}

impl WorkLayout {
    /// `<croot>/<build_id>`
    pub fn build_dir(&self) -> PathBuf {
        self.croot.join(&self.build_id)
    }
}

/// Recover the build layout from an absolute path inside the work directory.
///
/// The deepest segment named `work` is taken as the work directory. No
/// filesystem access happens here.
pub fn resolve(cwd: &Path) -> Result<WorkLayout, LayoutError> {
    if !cwd.is_absolute() {
        return Err(LayoutError::NotAbsolute(cwd.to_path_buf()));
    }

    let mut segments: Vec<Component> = cwd.components().collect();
    let mut below = Vec::new();

    loop {
        match segments.pop() {
            Some(Component::Normal(name)) if name == WORK_DIR_NAME => break,
            Some(Component::RootDir) | Some(Component::Prefix(_)) | None => {
                return Err(LayoutError::MarkerNotFound(cwd.to_path_buf()));
            }
            Some(seg) => below.push(seg),
        }
    }

    let build_id = match segments.pop() {
        Some(Component::Normal(name)) => name
            .to_str()
            .ok_or_else(|| LayoutError::NonUtf8BuildId(cwd.to_path_buf()))?
            .to_string(),
        _ => return Err(LayoutError::MissingBuildId(cwd.to_path_buf())),
    };

    let croot: PathBuf = segments.iter().collect();
    let subdir: PathBuf = below.iter().rev().collect();
    let work_dir = croot.join(&build_id).join(WORK_DIR_NAME);

    Ok(WorkLayout {
        croot,
        build_id,
        work_dir,
        subdir,
    })
}

/// The only non-hidden entry of `dir`, if there is exactly one and it is a directory.
///
/// conda-build descends into such a directory after extracting, so its
/// presence changes where the build actually happens.
pub fn single_subdir(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut visible = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            visible.push(entry.path());
        }
    }

    if visible.len() != 1 {
        return Ok(None);
    }
    let only = visible.remove(0);
    Ok(only.is_dir().then_some(only))
}

/// Directory the build actually runs in: the single extracted directory if
/// there is one, otherwise the work directory itself.
pub fn real_work_dir(layout: &WorkLayout) -> io::Result<PathBuf> {
    Ok(single_subdir(&layout.work_dir)?.unwrap_or_else(|| layout.work_dir.clone()))
}

/// Where extra sources go, decided once from the work directory's state
/// before any extra source is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The primary source extracted into a single directory: extra sources
    /// are extracted into the work directory next to it.
    Shared,
    /// Every extra source gets its own `<work>/<name>` folder.
    PerSource,
}

impl Placement {
    pub fn probe(layout: &WorkLayout) -> io::Result<Self> {
        Ok(match single_subdir(&layout.work_dir)? {
            Some(_) => Placement::Shared,
            None => Placement::PerSource,
        })
    }

    /// Target directory for the extra source `name`.
    pub fn target(self, layout: &WorkLayout, name: &str) -> PathBuf {
        match self {
            Placement::Shared => layout.work_dir.clone(),
            Placement::PerSource => layout.work_dir.join(name),
        }
    }
}
