//! Plugin registry
//!
//! `site.yml` lists plugins by name; [`PluginSet::resolve`] turns that list
//! into typed options plus the hooks that run while pages are written and
//! after the build. Names may carry the `gatsby-` prefix.

mod analytics;
mod catch_links;
mod feed;
mod offline;
mod styles;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{normalize_name, PluginDescriptor};
use crate::content::ContentNode;
use crate::error::Error;
use crate::feed::FeedQuery;
use crate::images::ImageOptions;
use crate::Site;

pub use analytics::{AnalyticsOptions, AnalyticsPlugin};
pub use catch_links::CatchLinksPlugin;
pub use feed::FeedPlugin;
pub use offline::OfflinePlugin;
pub use styles::{StylesOptions, StylesPlugin};

/// State handed to plugin hooks
pub struct BuildContext<'a> {
    pub site: &'a Site,
    /// Every loaded node, drafts included
    pub nodes: &'a [ContentNode],
}

/// Build-time extension point. Both hooks default to doing nothing.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite a finished page before it is written to disk
    fn on_page_html(&self, html: String, _ctx: &BuildContext) -> Result<String> {
        Ok(html)
    }

    /// Runs once every page and asset has been written
    fn on_post_build(&self, _ctx: &BuildContext) -> Result<()> {
        Ok(())
    }

    /// Post-build hooks of finalizing plugins run after all others
    fn finalizes(&self) -> bool {
        false
    }
}

/// A content directory to load markdown from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceOptions {
    pub path: String,
    #[serde(default = "default_source_name")]
    pub name: String,
}

fn default_source_name() -> String {
    "pages".to_string()
}

/// Markdown transformation settings from transformer-remark and its sub-plugins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemarkOptions {
    pub images: Option<ImageOptions>,
    pub prismjs: bool,
    pub copy_linked_files: bool,
    pub smartypants: bool,
}

impl RemarkOptions {
    fn from_descriptors(plugins: &[PluginDescriptor]) -> Result<Self, Error> {
        let mut options = RemarkOptions::default();
        for descriptor in plugins {
            match descriptor.name() {
                "remark-images" => options.images = Some(parse_options(descriptor)?),
                "remark-prismjs" => options.prismjs = true,
                "remark-copy-linked-files" => options.copy_linked_files = true,
                "remark-smartypants" => options.smartypants = true,
                other => return Err(Error::UnknownRemarkPlugin(other.to_string())),
            }
        }
        Ok(options)
    }
}

#[derive(Deserialize)]
struct RawRemarkOptions {
    #[serde(default)]
    plugins: Vec<PluginDescriptor>,
}

/// One feed document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedOptions {
    #[serde(default = "default_feed_output")]
    pub output: String,
    /// Channel title; defaults to the site title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub query: FeedQuery,
}

fn default_feed_output() -> String {
    "/rss.xml".to_string()
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            output: default_feed_output(),
            title: None,
            query: FeedQuery::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawFeedOptions {
    #[serde(default = "default_feeds")]
    feeds: Vec<FeedOptions>,
}

fn default_feeds() -> Vec<FeedOptions> {
    vec![FeedOptions::default()]
}

/// Resolved plugin configuration
#[derive(Clone, Default)]
pub struct PluginSet {
    pub sources: Vec<SourceOptions>,
    pub remark: Option<RemarkOptions>,
    pub feeds: Vec<FeedOptions>,
    /// Raster image processing (plugin-sharp / transformer-sharp)
    pub sharp: bool,
    /// Per-page description and Open Graph tags (plugin-react-helmet)
    pub helmet: bool,
    pub styles: Option<StylesOptions>,
    hooks: Vec<Arc<dyn Plugin>>,
}

impl PluginSet {
    /// Resolve descriptors in declaration order
    pub fn resolve(descriptors: &[PluginDescriptor]) -> Result<Self, Error> {
        let mut set = PluginSet::default();

        for descriptor in descriptors {
            match descriptor.name() {
                "source-filesystem" => set.sources.push(parse_options(descriptor)?),
                "transformer-remark" => {
                    let raw: RawRemarkOptions = parse_options(descriptor)?;
                    set.remark = Some(RemarkOptions::from_descriptors(&raw.plugins)?);
                }
                "plugin-feed" => {
                    let raw: RawFeedOptions = parse_options(descriptor)?;
                    set.feeds.extend(raw.feeds.iter().cloned());
                    set.hooks.push(Arc::new(FeedPlugin::new(raw.feeds)));
                }
                "plugin-sharp" | "transformer-sharp" => set.sharp = true,
                "plugin-google-analytics" => {
                    let options: AnalyticsOptions = parse_options(descriptor)?;
                    set.hooks.push(Arc::new(AnalyticsPlugin::new(options)));
                }
                "plugin-offline" => set.hooks.push(Arc::new(OfflinePlugin)),
                "plugin-catch-links" => set.hooks.push(Arc::new(CatchLinksPlugin)),
                "plugin-react-helmet" => set.helmet = true,
                "better-postcss" | "plugin-postcss" => {
                    let options: StylesOptions = parse_options(descriptor)?;
                    set.styles = Some(options.clone());
                    set.hooks.push(Arc::new(StylesPlugin::new(options)));
                }
                other => return Err(Error::UnknownPlugin(other.to_string())),
            }
            tracing::debug!("Resolved plugin {}", descriptor.resolve);
        }

        Ok(set)
    }

    /// Hooks in declaration order
    pub fn hooks(&self) -> &[Arc<dyn Plugin>] {
        &self.hooks
    }

    /// Names of the active hook plugins, in declaration order
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Pass a page through every `on_page_html` hook
    pub fn page_html(&self, html: String, ctx: &BuildContext) -> Result<String> {
        self.hooks
            .iter()
            .try_fold(html, |html, hook| hook.on_page_html(html, ctx))
    }

    /// Run post-build hooks: declaration order, finalizing plugins last
    pub fn post_build(&self, ctx: &BuildContext) -> Result<()> {
        let (last, first): (Vec<_>, Vec<_>) = self.hooks.iter().partition(|h| h.finalizes());
        for hook in first.into_iter().chain(last) {
            tracing::debug!("Running post-build hook {}", hook.name());
            hook.on_post_build(ctx)?;
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.hooks.iter().any(|h| h.name() == name)
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("sources", &self.sources)
            .field("remark", &self.remark)
            .field("feeds", &self.feeds)
            .field("sharp", &self.sharp)
            .field("helmet", &self.helmet)
            .field("styles", &self.styles)
            .field("hooks", &self.hook_names())
            .finish()
    }
}

/// Deserialize a descriptor's options into their typed form
fn parse_options<T: DeserializeOwned>(descriptor: &PluginDescriptor) -> Result<T, Error> {
    serde_yaml::from_value(descriptor.options.clone()).map_err(|source| {
        Error::InvalidPluginOptions {
            name: descriptor.resolve.clone(),
            source,
        }
    })
}
