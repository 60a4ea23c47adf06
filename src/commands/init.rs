//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::{Site, CONFIG_FILE};

const CONFIG_TEMPLATE: &str = r##"# folio site configuration
site_metadata:
  url: example.com
  site_url: https://example.com
  title: My Blog
  subtitle: Notes and essays
  copyright: "© All rights reserved."
  disqus_shortname: ""
  menu:
    - label: Blog
      path: /
    - label: About me
      path: /about/
  author:
    name: John Doe
    email: "#"
    github: "#"
    twitter: "#"

per_page: 10

plugins:
  - resolve: gatsby-better-postcss
    options:
      dir: styles
  - resolve: gatsby-source-filesystem
    options:
      path: content
      name: pages
  - gatsby-plugin-feed
  - resolve: gatsby-transformer-remark
    options:
      plugins:
        - resolve: gatsby-remark-images
          options:
            max_width: 960
        - gatsby-remark-prismjs
        - gatsby-remark-copy-linked-files
        - gatsby-remark-smartypants
  - gatsby-plugin-sharp
  - gatsby-plugin-offline
  - gatsby-plugin-catch-links
  - gatsby-plugin-react-helmet
"##;

const STYLESHEET: &str = r#"body {
  font-family: var(--font);
  color: #222;
}

.wrapper {
  display: flex;
}
"#;

/// Initialize a new site in the given directory; existing files are kept
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content/posts/hello-world"))?;
    fs::create_dir_all(target_dir.join("content/pages/about"))?;
    fs::create_dir_all(target_dir.join("static"))?;
    fs::create_dir_all(target_dir.join("styles"))?;

    let now = chrono::Local::now();
    let hello = format!(
        r#"---
title: Hello World
date: "{}"
layout: post
draft: false
description: The first post on this site
category: General
tags:
  - meta
---

This is your very first post. Edit `content/posts/hello-world/index.md`
or create another one with `folio new "My New Post"`.
"#,
        now.format("%Y-%m-%dT%H:%M:%S%:z")
    );

    let about = r#"---
title: About me
layout: page
path: /about/
---

Tell readers who you are.
"#;

    let files = [
        (CONFIG_FILE.to_string(), CONFIG_TEMPLATE.to_string()),
        ("content/posts/hello-world/index.md".to_string(), hello),
        ("content/pages/about/index.md".to_string(), about.to_string()),
        ("styles/main.css".to_string(), STYLESHEET.to_string()),
    ];

    for (relative, content) in files {
        let path = target_dir.join(&relative);
        if path.exists() {
            tracing::warn!("Skipping existing {}", relative);
            continue;
        }
        fs::write(&path, content)?;
    }

    Ok(())
}

/// Run the init command with an existing site
pub fn run(site: &Site) -> Result<()> {
    init_site(&site.base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.site_metadata.title, "My Blog");
        assert_eq!(site.plugins.sources.len(), 1);
        assert!(site.plugins.styles.is_some());
        assert!(dir.path().join("content/posts/hello-world/index.md").exists());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "per_page: 3\n").unwrap();
        init_site(dir.path()).unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.per_page, 3);
    }
}
