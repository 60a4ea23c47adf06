//! Content nodes and the taxonomy built from them

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A parsed markdown file
#[derive(Debug, Clone, Serialize)]
pub struct ContentNode {
    pub title: String,

    /// Publication date
    pub date: DateTime<Local>,

    /// `post` or `page` (or any custom layout name)
    pub layout: String,

    pub draft: bool,

    pub description: String,

    /// Rendered HTML
    pub html: String,

    /// Root-relative URL path, always starting with `/`
    pub slug: String,

    pub tags: Vec<String>,

    pub category: Option<String>,

    /// Source file path relative to its source directory
    pub source: String,

    /// Full source file path
    #[serde(skip)]
    pub full_source: PathBuf,

    /// Name of the source-filesystem entry the file came from
    pub source_name: String,

    /// Custom front-matter fields
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl ContentNode {
    /// Create a node with minimal required fields
    pub fn new(title: &str, date: DateTime<Local>, slug: &str) -> Self {
        Self {
            title: title.to_string(),
            date,
            layout: "page".to_string(),
            draft: false,
            description: String::new(),
            html: String::new(),
            slug: slug.to_string(),
            tags: Vec::new(),
            category: None,
            source: String::new(),
            full_source: PathBuf::new(),
            source_name: String::new(),
            extra: HashMap::new(),
        }
    }

    pub fn is_post(&self) -> bool {
        self.layout == "post"
    }

    /// Directory relative asset references resolve against
    pub fn asset_dir(&self) -> &Path {
        self.full_source.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Published posts, newest first
pub fn published_posts(nodes: &[ContentNode]) -> Vec<&ContentNode> {
    let mut posts: Vec<_> = nodes.iter().filter(|n| n.is_post() && !n.draft).collect();
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    posts
}

/// Published non-post nodes
pub fn published_pages(nodes: &[ContentNode]) -> Vec<&ContentNode> {
    nodes
        .iter()
        .filter(|n| !n.is_post() && !n.draft)
        .collect()
}

/// A tag or category with the posts filed under it
#[derive(Debug, Clone, Serialize)]
pub struct Term {
    pub name: String,
    pub slug: String,
    pub path: String,
    pub count: usize,
}

impl Term {
    pub fn new(name: &str, dir: &str) -> Self {
        let slug = slug::slugify(name);
        let path = format!("/{}/{}/", dir.trim_matches('/'), slug);
        Self {
            name: name.to_string(),
            slug,
            path,
            count: 0,
        }
    }
}

/// Group posts by tag, keyed by tag slug
pub fn group_by_tag<'a>(posts: &[&'a ContentNode]) -> BTreeMap<String, (Term, Vec<&'a ContentNode>)> {
    let mut groups: BTreeMap<String, (Term, Vec<&ContentNode>)> = BTreeMap::new();
    for post in posts {
        let mut seen = HashSet::new();
        for tag in post.tags.iter().filter(|t| !t.trim().is_empty()) {
            let term = Term::new(tag, "tags");
            if term.slug.is_empty() || !seen.insert(term.slug.clone()) {
                continue;
            }
            let entry = groups
                .entry(term.slug.clone())
                .or_insert_with(|| (term, Vec::new()));
            entry.0.count += 1;
            entry.1.push(*post);
        }
    }
    groups
}

/// Group posts by category, keyed by category slug
pub fn group_by_category<'a>(
    posts: &[&'a ContentNode],
) -> BTreeMap<String, (Term, Vec<&'a ContentNode>)> {
    let mut groups: BTreeMap<String, (Term, Vec<&ContentNode>)> = BTreeMap::new();
    for post in posts {
        let Some(category) = post.category.as_deref().filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        let term = Term::new(category, "categories");
        if term.slug.is_empty() {
            continue;
        }
        let entry = groups
            .entry(term.slug.clone())
            .or_insert_with(|| (term, Vec::new()));
        entry.0.count += 1;
        entry.1.push(*post);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn node(title: &str, day: u32, layout: &str, draft: bool, tags: &[&str]) -> ContentNode {
        let date = Local.with_ymd_and_hms(2017, 5, day, 12, 0, 0).unwrap();
        let mut node = ContentNode::new(title, date, &format!("/posts/{}/", slug::slugify(title)));
        node.layout = layout.to_string();
        node.draft = draft;
        node.tags = tags.iter().map(|t| t.to_string()).collect();
        node
    }

    #[test]
    fn test_published_posts_sorted_and_filtered() {
        let nodes = vec![
            node("Old", 1, "post", false, &[]),
            node("Draft", 20, "post", true, &[]),
            node("New", 10, "post", false, &[]),
            node("About", 15, "page", false, &[]),
        ];
        let posts: Vec<_> = published_posts(&nodes).iter().map(|n| n.title.clone()).collect();
        assert_eq!(posts, vec!["New", "Old"]);
        let pages: Vec<_> = published_pages(&nodes).iter().map(|n| n.title.clone()).collect();
        assert_eq!(pages, vec!["About"]);
    }

    #[test]
    fn test_group_by_tag() {
        let nodes = vec![
            node("A", 1, "post", false, &["AWS Lambda", "serverless"]),
            node("B", 2, "post", false, &["serverless", " "]),
        ];
        let posts = published_posts(&nodes);
        let groups = group_by_tag(&posts);
        assert_eq!(groups.len(), 2);
        let (term, tagged) = &groups["serverless"];
        assert_eq!(term.count, 2);
        assert_eq!(term.path, "/tags/serverless/");
        assert_eq!(tagged.len(), 2);
        assert_eq!(groups["aws-lambda"].0.name, "AWS Lambda");
    }

    #[test]
    fn test_duplicate_tags_count_post_once() {
        let nodes = vec![
            node("A", 1, "post", false, &["AWS", "aws", "AWS"]),
            node("B", 2, "post", false, &["aws"]),
        ];
        let posts = published_posts(&nodes);
        let groups = group_by_tag(&posts);
        assert_eq!(groups.len(), 1);
        let (term, tagged) = &groups["aws"];
        assert_eq!(term.count, 2);
        assert_eq!(tagged.len(), 2);
    }

    #[test]
    fn test_group_by_category() {
        let mut a = node("A", 1, "post", false, &[]);
        a.category = Some("Talks".to_string());
        let b = node("B", 2, "post", false, &[]);
        let nodes = vec![a, b];
        let posts = published_posts(&nodes);
        let groups = group_by_category(&posts);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["talks"].0.path, "/categories/talks/");
    }
}
