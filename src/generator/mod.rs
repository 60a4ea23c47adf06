//! Generator module - renders loaded content into the public directory

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::content::{
    group_by_category, group_by_tag, published_pages, published_posts, ContentNode,
};
use crate::helpers::{absolute_url, output_file};
use crate::images::AssetPipeline;
use crate::layout::{Head, LayoutRenderer, Pagination};
use crate::plugins::BuildContext;
use crate::Site;

/// Static site generator using the built-in layout
pub struct Generator {
    site: Site,
    renderer: LayoutRenderer,
    stylesheets: Vec<String>,
    /// Pages written by the current build, keyed by output file
    written: RefCell<HashMap<PathBuf, String>>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = LayoutRenderer::new()?;
        let stylesheets = site
            .plugins
            .styles
            .as_ref()
            .map(|styles| {
                styles
                    .stylesheets(&site.base_dir)
                    .into_iter()
                    .map(|(_, url)| url)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            site: site.clone(),
            renderer,
            stylesheets,
            written: RefCell::new(HashMap::new()),
        })
    }

    /// Generate the entire site; returns the number of pages written
    pub fn generate(&self, nodes: &[ContentNode]) -> Result<usize> {
        self.reset_public_dir()?;
        self.written.borrow_mut().clear();

        self.copy_static_files()?;

        // Asset rewriting happens before any page or feed sees the HTML
        let nodes = self.process_assets(nodes);
        let ctx = BuildContext {
            site: &self.site,
            nodes: &nodes,
        };

        let posts = published_posts(&nodes);
        let mut written = 0;

        written += self.generate_index_pages(&posts, &ctx)?;
        written += self.generate_post_pages(&posts, &ctx)?;
        written += self.generate_page_pages(&published_pages(&nodes), &ctx)?;
        written += self.generate_term_pages(&posts, &ctx)?;

        self.site.plugins.post_build(&ctx)?;

        Ok(written)
    }

    /// Start every build from an empty public directory so removed content
    /// does not linger or end up in the precache manifest
    fn reset_public_dir(&self) -> Result<()> {
        let public_dir = &self.site.public_dir;
        if public_dir.exists() {
            let public = public_dir.canonicalize()?;
            let base = self.site.base_dir.canonicalize()?;
            if base.starts_with(&public) {
                bail!(
                    "public directory {:?} contains the site itself, refusing to clear it",
                    public_dir
                );
            }
            fs::remove_dir_all(public_dir)?;
        }
        fs::create_dir_all(public_dir)?;
        Ok(())
    }

    /// Run the image pipeline and linked-file copying over every node
    fn process_assets(&self, nodes: &[ContentNode]) -> Vec<ContentNode> {
        let remark = self.site.plugins.remark.as_ref();
        let pipeline = AssetPipeline::new(
            &self.site.public_dir,
            remark.and_then(|r| r.images.as_ref()),
            self.site.plugins.sharp,
            remark.map_or(false, |r| r.copy_linked_files),
        );

        let mut processed = nodes.to_vec();
        if pipeline.is_noop() {
            return processed;
        }
        for node in processed.iter_mut() {
            node.html = pipeline.process_html(&node.html, node.asset_dir());
        }
        processed
    }

    /// Base `<head>` data shared by every page
    fn head(&self, title: Option<&str>, path: &str) -> Head {
        let meta = &self.site.config.site_metadata;
        Head {
            title: match title {
                Some(title) => format!("{} - {}", title, meta.title),
                None => meta.title.clone(),
            },
            site_title: meta.title.clone(),
            description: meta.subtitle.clone(),
            canonical_url: absolute_url(&meta.site_url, path),
            og_type: "website".to_string(),
            meta_tags: self.site.plugins.helmet,
            feeds: self
                .site
                .plugins
                .feeds
                .iter()
                .map(|f| f.output.clone())
                .collect(),
            stylesheets: self.stylesheets.clone(),
        }
    }

    /// Wrap a content region in the default layout, run page hooks and write it
    fn write_page(
        &self,
        path: &str,
        head: &Head,
        content: &str,
        ctx: &BuildContext,
    ) -> Result<()> {
        let sidebar = self
            .renderer
            .render_sidebar(&self.site.config.site_metadata, path)?;
        let html = self.renderer.render_default(head, &sidebar, content)?;
        let html = self.site.plugins.page_html(html, ctx)?;

        let relative = PathBuf::from(output_file(path));
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            bail!("page path {:?} leaves the public directory", path);
        }
        self.claim_output(&relative, &head.title)?;

        let output_path = self.site.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Record that `title` owns an output file; two pages on one path is an error
    fn claim_output(&self, relative: &Path, title: &str) -> Result<()> {
        let mut written = self.written.borrow_mut();
        if let Some(previous) = written.get(relative) {
            bail!(
                "\"{}\" and \"{}\" both render to {:?}",
                previous,
                title,
                relative
            );
        }
        written.insert(relative.to_path_buf(), title.to_string());
        Ok(())
    }

    /// Generate index pages (with pagination)
    fn generate_index_pages(&self, posts: &[&ContentNode], ctx: &BuildContext) -> Result<usize> {
        let per_page = self.site.config.per_page.max(1);
        let total_pages = posts.len().div_ceil(per_page).max(1);

        for page_num in 1..=total_pages {
            let start = (page_num - 1) * per_page;
            let end = (start + per_page).min(posts.len());
            let pagination = Pagination::new(page_num, total_pages);

            let content = self
                .renderer
                .render_index(&posts[start..end], &pagination)?;
            let path = pagination.path();
            let title = (page_num > 1).then(|| format!("Page {}", page_num));
            self.write_page(&path, &self.head(title.as_deref(), &path), &content, ctx)?;
        }

        tracing::info!("Generated {} index pages", total_pages);
        Ok(total_pages)
    }

    /// Generate individual post pages
    fn generate_post_pages(&self, posts: &[&ContentNode], ctx: &BuildContext) -> Result<usize> {
        let shortname = &self.site.config.site_metadata.disqus_shortname;

        for post in posts {
            let content = self.renderer.render_post(post, shortname)?;
            let mut head = self.head(Some(post.title.as_str()), &post.slug);
            head.og_type = "article".to_string();
            if !post.description.is_empty() {
                head.description = post.description.clone();
            }
            self.write_page(&post.slug, &head, &content, ctx)?;
        }

        tracing::info!("Generated {} posts", posts.len());
        Ok(posts.len())
    }

    /// Generate standalone pages
    fn generate_page_pages(&self, pages: &[&ContentNode], ctx: &BuildContext) -> Result<usize> {
        for page in pages {
            let content = self.renderer.render_page(page)?;
            let mut head = self.head(Some(page.title.as_str()), &page.slug);
            if !page.description.is_empty() {
                head.description = page.description.clone();
            }
            self.write_page(&page.slug, &head, &content, ctx)?;
        }

        tracing::info!("Generated {} pages", pages.len());
        Ok(pages.len())
    }

    /// Generate one listing per tag and per category
    fn generate_term_pages(&self, posts: &[&ContentNode], ctx: &BuildContext) -> Result<usize> {
        let tags = group_by_tag(posts);
        let categories = group_by_category(posts);

        for (term, term_posts) in tags.values() {
            let heading = format!("Posts tagged \"{}\"", term.name);
            let content = self.renderer.render_term(&heading, term_posts)?;
            let head = self.head(Some(term.name.as_str()), &term.path);
            self.write_page(&term.path, &head, &content, ctx)?;
        }
        for (term, term_posts) in categories.values() {
            let heading = format!("Posts in \"{}\"", term.name);
            let content = self.renderer.render_term(&heading, term_posts)?;
            let head = self.head(Some(term.name.as_str()), &term.path);
            self.write_page(&term.path, &head, &content, ctx)?;
        }

        tracing::info!(
            "Generated {} tag pages and {} category pages",
            tags.len(),
            categories.len()
        );
        Ok(tags.len() + categories.len())
    }

    /// Copy the static directory into the public directory as is
    fn copy_static_files(&self) -> Result<()> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.site.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}
