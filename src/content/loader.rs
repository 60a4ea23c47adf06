//! Content loader - reads markdown files from every configured source directory

use anyhow::Result;
use chrono::Local;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{ContentNode, FrontMatter, MarkdownRenderer};
use crate::helpers::{is_safe_site_path, normalize_path};
use crate::plugins::{RemarkOptions, SourceOptions};
use crate::Site;

/// Syntax highlighting theme used when remark-prismjs is enabled
const HIGHLIGHT_THEME: &str = "base16-ocean.dark";

/// Loads content nodes from the source directories
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: Option<MarkdownRenderer>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        let renderer = site.plugins.remark.as_ref().map(renderer_for);
        Self { site, renderer }
    }

    /// Load every markdown node, newest first
    pub fn load(&self) -> Result<Vec<ContentNode>> {
        let Some(renderer) = &self.renderer else {
            tracing::warn!("transformer-remark is not configured, no markdown will be loaded");
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for source in &self.site.plugins.sources {
            let dir = self.site.base_dir.join(&source.path);
            if !dir.exists() {
                tracing::warn!("Source directory {:?} ({}) does not exist", dir, source.name);
                continue;
            }

            for entry in WalkDir::new(&dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || !is_markdown_file(path) {
                    continue;
                }
                match load_node(renderer, source, &dir, path) {
                    Ok(node) => nodes.push(node),
                    Err(e) => tracing::warn!("Failed to load {:?}: {}", path, e),
                }
            }
        }

        nodes.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::debug!("Loaded {} content nodes", nodes.len());

        Ok(nodes)
    }
}

/// Markdown renderer configured from the remark sub-plugins
fn renderer_for(options: &RemarkOptions) -> MarkdownRenderer {
    let renderer = MarkdownRenderer::new().with_smart_punctuation(options.smartypants);
    if options.prismjs {
        renderer.with_highlighting(HIGHLIGHT_THEME)
    } else {
        renderer
    }
}

/// Load a single node from a file
fn load_node(
    renderer: &MarkdownRenderer,
    source: &SourceOptions,
    source_dir: &Path,
    path: &Path,
) -> Result<ContentNode> {
    let content = fs::read_to_string(path)?;
    let (fm, body) = FrontMatter::parse(&content)?;

    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    let relative_str = relative.to_string_lossy().replace('\\', "/");

    let date = match fm.parse_date() {
        Some(date) => date,
        None => fs::metadata(path)?
            .modified()
            .map(chrono::DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now()),
    };

    let title = fm.title.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    });

    let slug = match fm.path.as_deref() {
        Some(explicit) if is_safe_site_path(explicit) => normalize_path(explicit),
        Some(explicit) => anyhow::bail!("path {:?} leaves the output directory", explicit),
        None => slug_for(relative),
    };

    let layout = fm
        .layout
        .clone()
        .unwrap_or_else(|| default_layout(relative).to_string());

    let mut node = ContentNode::new(&title, date, &slug);
    node.layout = layout;
    node.draft = fm.draft;
    node.description = fm.description.unwrap_or_default();
    node.html = renderer.render(body)?;
    node.tags = fm.tags;
    node.category = fm.category;
    node.source = relative_str;
    node.full_source = path.to_path_buf();
    node.source_name = source.name.clone();
    node.extra = fm.extra;

    Ok(node)
}

/// Slug from a path relative to the source directory:
/// `posts/hello/index.md` -> `/posts/hello/`, `about.md` -> `/about/`
pub fn slug_for(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| c.as_os_str().to_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem != "index" {
        parts.push(stem.to_string());
    }

    normalize_path(&parts.join("/"))
}

/// Files under a top-level `posts/` directory default to the post layout
fn default_layout(relative: &Path) -> &'static str {
    let first = relative
        .components()
        .next()
        .and_then(|c| c.as_os_str().to_str());
    match first {
        Some("posts") if relative.components().count() > 1 => "post",
        _ => "page",
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
