//! Page layout: embedded Tera templates composing a sidebar and a content region
//!
//! Every page is rendered in two steps: the content region is rendered from
//! its own template (`post.html`, `page.html`, ...), then
//! [`LayoutRenderer::render_default`] wraps it together with the sidebar in
//! the base document.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteMetadata;
use crate::content::{ContentNode, Term};
use crate::helpers::{escape_html, excerpt};

/// Template renderer with the built-in templates loaded
pub struct LayoutRenderer {
    tera: Tera,
}

/// Everything that goes into `<head>`
#[derive(Debug, Clone, Default, Serialize)]
pub struct Head {
    pub title: String,
    pub site_title: String,
    pub description: String,
    pub canonical_url: String,
    pub og_type: String,
    /// Emit description/Open Graph tags
    pub meta_tags: bool,
    pub feeds: Vec<String>,
    pub stylesheets: Vec<String>,
}

/// A node as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub slug: String,
    pub description: String,
    pub html: String,
    pub tags: Vec<Term>,
    pub category: Option<Term>,
}

impl From<&ContentNode> for NodeView {
    fn from(node: &ContentNode) -> Self {
        Self {
            title: node.title.clone(),
            date: node.date.format("%B %-d, %Y").to_string(),
            date_iso: node.date.to_rfc3339(),
            slug: node.slug.clone(),
            description: node.description.clone(),
            html: node.html.clone(),
            tags: node
                .tags
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| Term::new(t, "tags"))
                .collect(),
            category: node
                .category
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(|c| Term::new(c, "categories")),
        }
    }
}

/// Index pagination links
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: usize,
    pub total: usize,
    pub prev_link: String,
    pub next_link: String,
}

impl Pagination {
    /// Page 1 lives at `/`, page n at `/page/n/`
    pub fn new(current: usize, total: usize) -> Self {
        let link = |n: usize| {
            if n == 1 {
                "/".to_string()
            } else {
                format!("/page/{}/", n)
            }
        };
        Self {
            current,
            total,
            prev_link: if current > 1 { link(current - 1) } else { String::new() },
            next_link: if current < total { link(current + 1) } else { String::new() },
        }
    }

    pub fn path(&self) -> String {
        if self.current == 1 {
            "/".to_string()
        } else {
            format!("/page/{}/", self.current)
        }
    }
}

#[derive(Serialize)]
struct SidebarLink {
    label: &'static str,
    href: String,
}

impl LayoutRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Text is escaped in the templates through the `esc` filter
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("base.html", include_str!("templates/base.html")),
            ("default.html", include_str!("templates/default.html")),
            ("index.html", include_str!("templates/index.html")),
            ("post.html", include_str!("templates/post.html")),
            ("page.html", include_str!("templates/page.html")),
            ("term.html", include_str!("templates/term.html")),
            (
                "partials/sidebar.html",
                include_str!("templates/partials/sidebar.html"),
            ),
        ])?;

        tera.register_filter("esc", esc_filter);
        tera.register_filter("excerpt", excerpt_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Sidebar region: title, menu, author links, copyright
    pub fn render_sidebar(&self, site: &SiteMetadata, current_path: &str) -> Result<String> {
        let links: Vec<SidebarLink> = site
            .author
            .links()
            .into_iter()
            .map(|(label, href)| SidebarLink { label, href })
            .collect();

        let mut context = Context::new();
        context.insert("site", site);
        context.insert("links", &links);
        context.insert("current_path", current_path);
        self.render("partials/sidebar.html", &context)
    }

    /// The default layout: base document wrapping the sidebar and content regions
    pub fn render_default(&self, head: &Head, sidebar: &str, content: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("head", head);
        context.insert("sidebar", sidebar);
        context.insert("content", content);
        self.render("default.html", &context)
    }

    pub fn render_post(&self, node: &ContentNode, disqus_shortname: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("post", &NodeView::from(node));
        context.insert("disqus_shortname", disqus_shortname);
        self.render("post.html", &context)
    }

    pub fn render_page(&self, node: &ContentNode) -> Result<String> {
        let mut context = Context::new();
        context.insert("page", &NodeView::from(node));
        self.render("page.html", &context)
    }

    pub fn render_index(&self, posts: &[&ContentNode], pagination: &Pagination) -> Result<String> {
        let views: Vec<NodeView> = posts.iter().map(|p| NodeView::from(*p)).collect();
        let mut context = Context::new();
        context.insert("posts", &views);
        context.insert("pagination", pagination);
        self.render("index.html", &context)
    }

    /// Listing of the posts filed under one tag or category
    pub fn render_term(&self, heading: &str, posts: &[&ContentNode]) -> Result<String> {
        let views: Vec<NodeView> = posts.iter().map(|p| NodeView::from(*p)).collect();
        let mut context = Context::new();
        context.insert("heading", heading);
        context.insert("posts", &views);
        self.render("term.html", &context)
    }
}

/// Tera filter: HTML-escape strings, pass other values through
fn esc_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    match value {
        tera::Value::String(s) => Ok(tera::Value::String(escape_html(s))),
        other => Ok(other.clone()),
    }
}

/// Tera filter: plain-text excerpt of an HTML string
fn excerpt_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("excerpt", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("excerpt", "length", usize, val),
        None => 150,
    };
    Ok(tera::Value::String(excerpt(&s, length)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn sample_post() -> ContentNode {
        let date = Local.with_ymd_and_hms(2017, 6, 4, 10, 0, 0).unwrap();
        let mut node = ContentNode::new("Going <Serverless>", date, "/posts/going-serverless/");
        node.layout = "post".to_string();
        node.html = "<p>Lambda all the things</p>".to_string();
        node.tags = vec!["AWS".to_string()];
        node.category = Some("Architecture".to_string());
        node
    }

    #[test]
    fn test_default_layout_composes_regions() {
        let renderer = LayoutRenderer::new().unwrap();
        let head = Head {
            title: "Home".to_string(),
            ..Head::default()
        };
        let html = renderer
            .render_default(&head, "<nav>SIDE</nav>", "<p>MAIN</p>")
            .unwrap();

        assert!(html.contains("<title>Home</title>"));
        let sidebar = html.find("<nav>SIDE</nav>").unwrap();
        let content = html.find("<p>MAIN</p>").unwrap();
        assert!(sidebar < content);
        assert!(html.contains(r#"<aside class="sidebar">"#));
        assert!(html.contains(r#"<main class="content">"#));
    }

    #[test]
    fn test_default_layout_is_pure() {
        let renderer = LayoutRenderer::new().unwrap();
        let head = Head::default();
        let a = renderer.render_default(&head, "s", "c").unwrap();
        let b = renderer.render_default(&head, "s", "c").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_meta_tags_only_when_enabled() {
        let renderer = LayoutRenderer::new().unwrap();
        let mut head = Head {
            title: "T".to_string(),
            description: "About serverless".to_string(),
            ..Head::default()
        };
        let without = renderer.render_default(&head, "", "").unwrap();
        assert!(!without.contains("og:title"));

        head.meta_tags = true;
        let with = renderer.render_default(&head, "", "").unwrap();
        assert!(with.contains(r#"<meta name="description" content="About serverless">"#));
        assert!(with.contains("og:title"));
    }

    #[test]
    fn test_sidebar_menu_and_links() {
        let renderer = LayoutRenderer::new().unwrap();
        let mut site = SiteMetadata::default();
        site.author.github = "davidwells".to_string();
        let html = renderer.render_sidebar(&site, "/about/").unwrap();

        assert!(html.contains("David Wells"));
        assert!(html.contains(r#"href="/blog""#));
        assert!(html.contains("menu__list-item-link menu__list-item-link--active\">About me"));
        assert!(html.contains("https://github.com/davidwells"));
        assert!(html.contains("© All rights reserved."));
        let blog = html.find("Blog").unwrap();
        let talks = html.find("Talks").unwrap();
        assert!(blog < talks);
    }

    #[test]
    fn test_post_escapes_title_but_not_body() {
        let renderer = LayoutRenderer::new().unwrap();
        let html = renderer.render_post(&sample_post(), "davidwells").unwrap();
        assert!(html.contains("Going &lt;Serverless&gt;"));
        assert!(html.contains("<p>Lambda all the things</p>"));
        assert!(html.contains(r#"href="/tags/aws/""#));
        assert!(html.contains(r#"href="/categories/architecture/""#));
        assert!(html.contains(r#"data-shortname="davidwells""#));
        assert!(html.contains("June 4, 2017"));
    }

    #[test]
    fn test_index_pagination() {
        let renderer = LayoutRenderer::new().unwrap();
        let post = sample_post();
        let html = renderer
            .render_index(&[&post], &Pagination::new(2, 3))
            .unwrap();
        assert!(html.contains(r#"href="/posts/going-serverless/""#));
        assert!(html.contains(r#"href="/" rel="prev""#));
        assert!(html.contains(r#"href="/page/3/" rel="next""#));

        let empty = renderer.render_index(&[], &Pagination::new(1, 1)).unwrap();
        assert!(empty.contains("No posts yet."));
        assert!(!empty.contains("pagination"));
    }

    #[test]
    fn test_pagination_links() {
        let first = Pagination::new(1, 2);
        assert_eq!(first.prev_link, "");
        assert_eq!(first.next_link, "/page/2/");
        assert_eq!(first.path(), "/");
        assert_eq!(Pagination::new(2, 2).path(), "/page/2/");
    }
}
