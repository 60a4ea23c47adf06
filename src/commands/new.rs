//! Create a new post or page

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Scaffold for new nodes; posts start out as drafts
const SCAFFOLD: &str = r#"---
title: "{{ title }}"
date: "{{ date }}"
layout: {{ layout }}
path: "{{ path }}"
draft: {{ draft }}
description: ""
category: ""
tags: []
---
"#;

/// Create `<source>/<posts|pages>/<slug>/index.md` in the first source directory
pub fn create_node(site: &Site, title: &str, layout: &str) -> Result<PathBuf> {
    let source = site
        .plugins
        .sources
        .first()
        .map(|s| s.path.as_str())
        .unwrap_or("content");

    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} does not produce a usable slug", title);
    }

    let section = if layout == "post" { "posts" } else { "pages" };
    let target_dir = site.base_dir.join(source).join(section).join(&slug);
    let file_path = target_dir.join("index.md");

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }
    fs::create_dir_all(&target_dir)?;

    let now = chrono::Local::now();
    let content = SCAFFOLD
        .replace("{{ title }}", &title.replace('"', "\\\""))
        .replace("{{ date }}", &now.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        .replace("{{ layout }}", layout)
        .replace("{{ path }}", &format!("/{}/{}/", section, slug))
        .replace("{{ draft }}", if layout == "post" { "true" } else { "false" });

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Run the new command
pub fn run(site: &Site, title: &str, layout: Option<&str>) -> Result<PathBuf> {
    create_node(site, title, layout.unwrap_or("post"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use tempfile::TempDir;

    #[test]
    fn test_new_post_is_draft() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = run(&site, "Hello \"Serverless\" World", None).unwrap();
        assert_eq!(
            path,
            dir.path().join("content/posts/hello-serverless-world/index.md")
        );

        let text = fs::read_to_string(&path).unwrap();
        let (fm, body) = FrontMatter::parse(&text).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello \"Serverless\" World"));
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert!(fm.draft);
        assert_eq!(fm.path.as_deref(), Some("/posts/hello-serverless-world/"));
        assert!(fm.parse_date().is_some());
        assert!(body.trim().is_empty());
    }

    #[test]
    fn test_new_page_and_duplicate() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = run(&site, "About", Some("page")).unwrap();
        assert!(path.ends_with("content/pages/about/index.md"));
        assert!(run(&site, "About", Some("page")).is_err());
    }
}
