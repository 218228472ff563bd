//! Recipe metadata (`meta.yaml`)
//!
//! Only the parts of conda's metadata this tool needs: the package name, raw
//! section access, and a view of the recipe with its `source` section swapped
//! for one of the `extra.sources` entries.
//!
//! Recipes may use the jinja `{% set %}` idiom for versions:
//!
//! ```yaml
//! {% set version = "3.8.0" %}
//! package:
//!   name: llvm
//!   version: {{ version }}
//! ```
//!
//! `set` statements are collected and `{{ name }}` expressions expanded
//! before the YAML is parsed. Any other statement (`if`, `for`, ...) and any
//! filter is rejected with its line number.

use anyhow::{Context, Result, bail};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File names conda-build accepts for recipe metadata, in lookup order.
pub const META_FILE_NAMES: [&str; 2] = ["meta.yaml", "meta.yml"];

/// Parsed recipe metadata.
#[derive(Debug, Clone)]
pub struct RecipeMetadata {
    path: PathBuf,
    meta: Mapping,
}

impl RecipeMetadata {
    /// Load the metadata file from a recipe directory.
    pub fn load(recipe_dir: &Path) -> Result<Self> {
        let path = META_FILE_NAMES
            .iter()
            .map(|name| recipe_dir.join(name))
            .find(|p| p.is_file())
            .with_context(|| {
                format!(
                    "no {} found in recipe directory {}",
                    META_FILE_NAMES.join(" or "),
                    recipe_dir.display()
                )
            })?;

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text, path)
    }

    /// Parse metadata text. `path` is only used for error messages.
    pub fn parse(text: &str, path: PathBuf) -> Result<Self> {
        let rendered = render_jinja(text)
            .with_context(|| format!("Failed to render {}", path.display()))?;

        let meta = match serde_yaml::from_str::<Value>(&rendered)
            .with_context(|| format!("Failed to parse {}", path.display()))?
        {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => bail!("{} is not a YAML mapping", path.display()),
        };

        Ok(Self { path, meta })
    }

    /// Path of the metadata file this was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `package.name`
    pub fn name(&self) -> Result<String> {
        package_field(&self.meta, "name")
            .with_context(|| format!("{} has no package.name", self.path.display()))
    }

    /// `package.version`, if declared.
    pub fn version(&self) -> Option<String> {
        package_field(&self.meta, "version")
    }

    /// A top-level section such as `source`, `build` or `extra`.
    pub fn get_section(&self, name: &str) -> Option<&Value> {
        self.meta.get(name)
    }

    /// Entries of `extra.sources` in the order the recipe lists them.
    ///
    /// A recipe without `extra` or `extra.sources` has none.
    pub fn extra_sources(&self) -> Result<Vec<(String, &Value)>> {
        let Some(sources) = self.get_section("extra").and_then(|extra| extra.get("sources")) else {
            return Ok(Vec::new());
        };

        let sources = match sources {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Vec::new()),
            _ => bail!(
                "extra.sources in {} must map names to source sections",
                self.path.display()
            ),
        };

        sources
            .iter()
            .map(|(key, descriptor)| {
                let name = scalar_string(key).with_context(|| {
                    format!("extra.sources key {:?} is not a plain name", key)
                })?;
                Ok((name, descriptor))
            })
            .collect()
    }

    /// This recipe with `source` replaced by `source`. The original is untouched.
    pub fn with_source<'a>(&'a self, source: &'a Value) -> MetadataView<'a> {
        MetadataView { base: self, source }
    }
}

/// A recipe seen through an overridden `source` section.
///
/// Every other section is read from the borrowed original.
#[derive(Debug, Clone, Copy)]
pub struct MetadataView<'a> {
    base: &'a RecipeMetadata,
    source: &'a Value,
}

impl<'a> MetadataView<'a> {
    pub fn base(&self) -> &'a RecipeMetadata {
        self.base
    }

    pub fn name(&self) -> Result<String> {
        self.base.name()
    }

    /// The overriding source section.
    pub fn source(&self) -> &'a Value {
        self.source
    }

    pub fn get_section(&self, name: &str) -> Option<&'a Value> {
        if name == "source" {
            Some(self.source)
        } else {
            self.base.get_section(name)
        }
    }

    /// Render the view as a standalone `meta.yaml` document.
    pub fn to_yaml(&self) -> Result<String> {
        let mut meta = Mapping::with_capacity(self.base.meta.len() + 1);
        let mut replaced = false;
        for (key, value) in &self.base.meta {
            if key.as_str() == Some("source") {
                meta.insert(key.clone(), self.source.clone());
                replaced = true;
            } else {
                meta.insert(key.clone(), value.clone());
            }
        }
        if !replaced {
            meta.insert(Value::from("source"), self.source.clone());
        }
        serde_yaml::to_string(&meta).context("Failed to serialize recipe metadata")
    }
}

fn package_field(meta: &Mapping, field: &str) -> Option<String> {
    meta.get("package")
        .and_then(|p| p.get(field))
        .and_then(scalar_string)
}

/// Strings, numbers and booleans as text. `version: 0.1` parses as a float.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Expand `{% set %}` variables and drop the statement lines. Any other
/// statement is an error.
fn render_jinja(text: &str) -> Result<String> {
    let mut vars: HashMap<String, String> = HashMap::new();
    let mut out = String::with_capacity(text.len());

    for (lineno, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(stmt) = trimmed
            .strip_prefix("{%")
            .and_then(|s| s.strip_suffix("%}"))
        {
            let stmt = stmt.trim_matches('-').trim();
            match parse_set(stmt) {
                Some((name, value)) => {
                    vars.insert(name, value);
                }
                None => bail!(
                    "line {}: unsupported template statement '{{% {} %}}'",
                    lineno + 1,
                    stmt
                ),
            }
            out.push('\n');
            continue;
        }
        if line.contains("{%") {
            bail!(
                "line {}: template statements must stand on their own line",
                lineno + 1
            );
        }

        out.push_str(
            &expand_line(line, &vars).with_context(|| format!("line {}", lineno + 1))?,
        );
        out.push('\n');
    }

    Ok(out)
}

/// `set name = "value"` -> `(name, value)`
fn parse_set(stmt: &str) -> Option<(String, String)> {
    let rest = stmt.strip_prefix("set")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, value) = rest.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value);

    Some((name.to_string(), unquoted.to_string()))
}

fn expand_line(line: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .context("unterminated '{{' expression")?;
        let expr = after[..end].trim();
        match vars.get(expr) {
            Some(value) => out.push_str(value),
            None => bail!("unsupported template expression '{{{{ {} }}}}'", expr),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
