//! End-to-end builds of small sites in temporary directories

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use folio::Site;

const CONFIG: &str = r#"
site_metadata:
  url: blog.example.com
  site_url: https://blog.example.com
  title: Example Blog
  subtitle: Field notes
  author:
    name: Ada
    github: ada
plugins:
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
            max_width: 100
        - gatsby-remark-copy-linked-files
        - gatsby-remark-smartypants
  - gatsby-plugin-sharp
  - resolve: gatsby-plugin-google-analytics
    options:
      tracking_id: UA-123
  - gatsby-plugin-offline
  - gatsby-plugin-catch-links
  - gatsby-plugin-react-helmet
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "site.yml", CONFIG);
    write(
        root,
        "content/posts/first/index.md",
        r#"---
title: First Post
date: "2017-01-10"
description: The very first one
tags: [serverless]
---

Hello from the first post. See [the slides](./slides.pdf).

![Diagram](./diagram.png)
"#,
    );
    write(root, "content/posts/first/slides.pdf", "%PDF-1.4");
    image::RgbImage::new(300, 150)
        .save(root.join("content/posts/first/diagram.png"))
        .unwrap();

    write(
        root,
        "content/posts/second/index.md",
        r#"---
title: "Second & Better"
date: "2017-02-20T08:30:00+00:00"
description: A follow-up
category: Tools
---

More words, [home](https://blog.example.com/about/).
"#,
    );
    write(
        root,
        "content/posts/unfinished/index.md",
        r#"---
title: Unfinished
date: "2017-03-01"
draft: true
---

Not ready.
"#,
    );
    write(
        root,
        "content/pages/about/index.md",
        r#"---
title: About
path: /about/
---

About this blog.
"#,
    );
    write(root, "static/favicon.ico", "icon");

    dir
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join("public").join(relative)).unwrap()
}

#[test]
fn test_feed_contains_published_posts_only() {
    let dir = sample_site();
    Site::new(dir.path()).unwrap().generate().unwrap();

    let rss = read(dir.path(), "rss.xml");
    assert_eq!(rss.matches("<item>").count(), 2);
    assert!(!rss.contains("Unfinished"));

    // Newest first
    assert!(rss.find("Second & Better").unwrap() < rss.find("First Post").unwrap());

    assert!(rss.contains("<link>https://blog.example.com/posts/first/</link>"));
    assert!(rss.contains(
        "<guid isPermaLink=\"true\">https://blog.example.com/posts/first/</guid>"
    ));
    assert!(rss.contains("<description><![CDATA[The very first one]]></description>"));
    assert!(rss.contains("<content:encoded><![CDATA["));
}

#[test]
fn test_pages_posts_and_terms_are_written() {
    let dir = sample_site();
    Site::new(dir.path()).unwrap().generate().unwrap();
    let public = dir.path().join("public");

    assert!(public.join("index.html").exists());
    assert!(public.join("posts/first/index.html").exists());
    assert!(public.join("posts/second/index.html").exists());
    assert!(!public.join("posts/unfinished/index.html").exists());
    assert!(public.join("about/index.html").exists());
    assert!(public.join("tags/serverless/index.html").exists());
    assert!(public.join("categories/tools/index.html").exists());
    assert_eq!(read(dir.path(), "favicon.ico"), "icon");

    let index = read(dir.path(), "index.html");
    assert!(index.contains("<title>Example Blog</title>"));
    assert!(index.contains(r#"href="/posts/second/""#));
    assert!(!index.contains("Unfinished"));
}

#[test]
fn test_page_hooks_and_assets() {
    let dir = sample_site();
    Site::new(dir.path()).unwrap().generate().unwrap();

    let post = read(dir.path(), "posts/first/index.html");
    assert!(post.contains("gtag/js?id=UA-123"));
    assert!(post.contains("serviceWorker.register('/sw.js')"));
    assert!(post.contains(r#"<meta name="description" content="The very first one">"#));

    // Resized image and copied attachment under public/static
    assert!(post.contains(r#"width="100""#));
    assert!(post.contains(r#"height="50""#));
    assert!(!post.contains("./diagram.png"));
    assert!(!post.contains("./slides.pdf"));
    assert!(post.contains("/static/"));

    let second = read(dir.path(), "posts/second/index.html");
    assert!(second.contains(r#"href="/about/""#));
    assert!(!second.contains("https://blog.example.com/about/"));
}

#[test]
fn test_service_worker_precaches_output() {
    let dir = sample_site();
    Site::new(dir.path()).unwrap().generate().unwrap();

    let worker = read(dir.path(), "sw.js");
    assert!(worker.contains("\"url\": \"/\""));
    assert!(worker.contains("\"url\": \"/rss.xml\""));
    assert!(worker.contains("\"url\": \"/posts/first/\""));
    assert!(!worker.contains("\"url\": \"/sw.js\""));
}

#[test]
fn test_unknown_plugin_fails_site_load() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "site.yml", "plugins:\n  - gatsby-plugin-sitemap\n");

    let err = Site::new(dir.path()).err().unwrap();
    assert!(format!("{:#}", err).contains("plugin-sitemap"));
}

#[test]
fn test_clean_after_generate() {
    let dir = sample_site();
    let site = Site::new(dir.path()).unwrap();
    site.generate().unwrap();
    assert!(dir.path().join("public/index.html").exists());

    site.clean().unwrap();
    assert!(!dir.path().join("public").exists());
    assert!(dir.path().join("content/posts/first/index.md").exists());
}

#[test]
fn test_regenerate_drops_deleted_posts() {
    let dir = sample_site();
    let site = Site::new(dir.path()).unwrap();
    site.generate().unwrap();
    assert!(dir.path().join("public/posts/second/index.html").exists());

    fs::remove_dir_all(dir.path().join("content/posts/second")).unwrap();
    site.generate().unwrap();

    assert!(!dir.path().join("public/posts/second").exists());
    assert!(!dir.path().join("public/categories/tools").exists());
    let worker = read(dir.path(), "sw.js");
    assert!(!worker.contains("/posts/second/"));
    assert!(worker.contains("\"url\": \"/posts/first/\""));
    assert!(!read(dir.path(), "rss.xml").contains("Second & Better"));
}
