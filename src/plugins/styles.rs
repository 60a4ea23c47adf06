//! better-postcss: copies stylesheets into `public/css`, resolving `var(--name)`
//! against the configured variables

use anyhow::{Context as _, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{BuildContext, Plugin};

lazy_static! {
    static ref CSS_VAR: Regex = Regex::new(r"var\(\s*--([A-Za-z0-9_-]+)\s*\)").unwrap();
}

/// Output directory for stylesheets, relative to the public dir
pub const CSS_DIR: &str = "css";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StylesOptions {
    /// Stylesheet directory, relative to the site root
    pub dir: String,
    pub variables: BTreeMap<String, String>,
}

impl Default for StylesOptions {
    fn default() -> Self {
        Self {
            dir: "styles".to_string(),
            variables: BTreeMap::new(),
        }
    }
}

impl StylesOptions {
    /// `.css` files under the style dir with their public URLs, sorted
    pub fn stylesheets(&self, base_dir: &Path) -> Vec<(PathBuf, String)> {
        let root = base_dir.join(&self.dir);
        if !root.is_dir() {
            return Vec::new();
        }

        let mut sheets: Vec<(PathBuf, String)> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "css"))
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&root).ok()?;
                let url = format!(
                    "/{}/{}",
                    CSS_DIR,
                    relative.to_string_lossy().replace('\\', "/")
                );
                Some((e.path().to_path_buf(), url))
            })
            .collect();
        sheets.sort_by(|a, b| a.1.cmp(&b.1));
        sheets
    }

    /// Substitute known variables; unknown ones are left for the browser
    pub fn process(&self, css: &str) -> String {
        CSS_VAR
            .replace_all(css, |caps: &Captures| match self.variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

pub struct StylesPlugin {
    options: StylesOptions,
}

impl StylesPlugin {
    pub fn new(options: StylesOptions) -> Self {
        Self { options }
    }
}

impl Plugin for StylesPlugin {
    fn name(&self) -> &'static str {
        "better-postcss"
    }

    fn on_post_build(&self, ctx: &BuildContext) -> Result<()> {
        let sheets = self.options.stylesheets(&ctx.site.base_dir);
        for (source, url) in &sheets {
            let css = fs::read_to_string(source)
                .with_context(|| format!("failed to read stylesheet {:?}", source))?;
            let dest = ctx.site.public_dir.join(url.trim_start_matches('/'));
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, self.options.process(&css))?;
        }
        tracing::debug!("Copied {} stylesheets", sheets.len());
        Ok(())
    }
}
