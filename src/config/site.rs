//! Site configuration (site.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::PluginDescriptor;
use crate::error::Error;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_metadata: SiteMetadata,

    /// Plugins in declaration order
    pub plugins: Vec<PluginDescriptor>,

    /// Posts per index page
    pub per_page: usize,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_metadata: SiteMetadata::default(),
            plugins: default_plugins(),
            per_page: 10,
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, which serde(default) does not cover
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Site metadata shared by every page and the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMetadata {
    /// Bare host name, e.g. `davidwells.io`
    pub url: String,
    /// Absolute site URL without a trailing slash
    pub site_url: String,
    pub title: String,
    pub subtitle: String,
    pub copyright: String,
    pub disqus_shortname: String,
    pub menu: Vec<MenuItem>,
    pub author: Author,
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            url: "davidwells.io".to_string(),
            site_url: "https://davidwells.io".to_string(),
            title: "David Wells".to_string(),
            subtitle: "Serverless Architectures".to_string(),
            copyright: "© All rights reserved.".to_string(),
            disqus_shortname: "davidwells".to_string(),
            menu: vec![
                MenuItem::new("Blog", "/blog"),
                MenuItem::new("Talks", "/talks"),
                MenuItem::new("About me", "/about/"),
                MenuItem::new("Contact me", "/contact/"),
            ],
            author: Author::default(),
        }
    }
}

/// A navigation menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub label: String,
    pub path: String,
}

impl MenuItem {
    pub fn new(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

/// Author contact fields, `#` meaning "not set"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub telegram: String,
    pub twitter: String,
    pub github: String,
    pub rss: String,
    pub vk: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "David Wells".to_string(),
            email: "#".to_string(),
            telegram: "#".to_string(),
            twitter: "#".to_string(),
            github: "#".to_string(),
            rss: "#".to_string(),
            vk: "#".to_string(),
        }
    }
}

impl Author {
    /// Contact links that are actually set, as (label, href) pairs
    pub fn links(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("email", &self.email),
            ("telegram", &self.telegram),
            ("twitter", &self.twitter),
            ("github", &self.github),
            ("rss", &self.rss),
            ("vk", &self.vk),
        ];

        fields
            .into_iter()
            .filter(|(_, value)| !value.is_empty() && value.as_str() != "#")
            .map(|(label, value)| {
                let href = match label {
                    "email" if !value.starts_with("mailto:") => format!("mailto:{}", value),
                    "telegram" if !value.contains("://") => format!("https://t.me/{}", value),
                    "twitter" if !value.contains("://") => {
                        format!("https://twitter.com/{}", value)
                    }
                    "github" if !value.contains("://") => format!("https://github.com/{}", value),
                    "vk" if !value.contains("://") => format!("https://vk.com/{}", value),
                    _ => value.clone(),
                };
                (label, href)
            })
            .collect()
    }
}

/// The plugin list the site ships with
fn default_plugins() -> Vec<PluginDescriptor> {
    let yaml = r#"
- resolve: gatsby-better-postcss
  options:
    dir: styles
- resolve: gatsby-source-filesystem
  options:
    path: content
    name: pages
- resolve: gatsby-plugin-feed
  options:
    feeds:
      - output: /rss.xml
- resolve: gatsby-transformer-remark
  options:
    plugins:
      - resolve: gatsby-remark-images
        options:
          max_width: 960
      - gatsby-remark-prismjs
      - gatsby-remark-copy-linked-files
      - gatsby-remark-smartypants
- gatsby-transformer-sharp
- gatsby-plugin-sharp
- resolve: gatsby-plugin-google-analytics
  options:
    tracking_id: UA-29316392-1
- gatsby-plugin-offline
- gatsby-plugin-catch-links
- gatsby-plugin-react-helmet
"#;
    serde_yaml::from_str(yaml).unwrap_or_default()
}
