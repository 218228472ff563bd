//! Fetch the extra sources of a conda recipe
//!
//! conda-build fetches exactly one `source` per recipe. Recipes that need
//! more (LLVM with clang and lld, for instance) list the rest under
//! `extra.sources`:
//!
//! ```yaml
//! package:
//!   name: multisrc-example
//!   version: "0.1"
//!
//! source:
//!   fn: llvm-3.8.0.src.tar.xz
//!   url: http://llvm.org/releases/3.8.0/llvm-3.8.0.src.tar.xz
//!   md5: 07a7a74f3c6bd65de4702bf941b511a0
//!
//! extra:
//!   sources:
//!     cfe:
//!       fn: cfe-3.8.0.src.tar.xz
//!       url: http://llvm.org/releases/3.8.0/cfe-3.8.0.src.tar.xz
//!       md5: cc99e7019bb74e6459e80863606250c5
//! ```
//!
//! and call `download-extra-sources` from `build.sh`. The tool works out the
//! build's work directory from the current directory ([`layout`]), then hands
//! each extra source to a [`provider::SourceProvider`] with a recipe view
//! whose `source` is that entry ([`dispatch`]). Downloading, checksum
//! verification and extraction are the provider's job.
//!
//! # Layout
//!
//! - `<croot>/<build_id>/work` is found by walking up to the deepest `work`
//!   segment. Running from anywhere else is an error.
//! - A source goes into `work/` while it holds a single extracted directory,
//!   otherwise into `work/<name>`.

pub mod config;
pub mod dispatch;
pub mod layout;
pub mod lock;
pub mod metadata;
pub mod output;
pub mod provider;

pub use dispatch::{DispatchSummary, RunOptions, fetch_extra_sources, run};
pub use layout::{LayoutError, WorkLayout};
pub use metadata::{MetadataView, RecipeMetadata};
pub use provider::{CommandProvider, ProvideConfig, SourceProvider};
