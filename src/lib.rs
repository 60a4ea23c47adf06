//! folio: a static blog generator driven by a plugin list
//!
//! A site is a directory holding `site.yml`, markdown under the configured
//! source directories and a `static/` tree. [`Site::generate`] renders it into
//! `public/`: index and post pages through the built-in layout, an RSS feed,
//! processed images and an offline service worker, depending on which plugins
//! `site.yml` enables.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod generator;
pub mod helpers;
pub mod images;
pub mod layout;
pub mod offline;
pub mod plugins;
pub mod server;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Config file name, relative to the site root
pub const CONFIG_FILE: &str = "site.yml";

/// A site rooted at a directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Resolved plugin list
    pub plugins: plugins::PluginSet,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Files copied verbatim into the public directory
    pub static_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`; a missing `site.yml` means the default config
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Self::with_config(base_dir, config)
    }

    /// Build a site from an already parsed config
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Result<Self> {
        let plugins = plugins::PluginSet::resolve(&config.plugins)
            .with_context(|| format!("invalid plugin list in {}", CONFIG_FILE))?;
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            plugins,
            base_dir,
            public_dir,
            static_dir,
        })
    }

    /// Initialize a new site
    pub fn init(&self) -> Result<()> {
        commands::init::run(self)
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, layout: Option<&str>) -> Result<PathBuf> {
        commands::new::run(self, title, layout)
    }
}
