//! RSS feed: node selection, the entry serializer and the XML writer

mod rss;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::SiteMetadata;
use crate::content::ContentNode;
use crate::helpers::absolute_url;

pub use rss::{render_rss, Channel};

/// Which nodes a feed contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedQuery {
    /// Maximum number of entries
    pub limit: usize,
    /// Only nodes with this layout
    pub layout: String,
    pub include_drafts: bool,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: 1000,
            layout: "post".to_string(),
            include_drafts: false,
        }
    }
}

impl FeedQuery {
    /// Matching nodes, newest first, at most `limit`
    pub fn select<'a>(&self, nodes: &'a [ContentNode]) -> Vec<&'a ContentNode> {
        let mut selected: Vec<_> = nodes
            .iter()
            .filter(|n| n.layout == self.layout)
            .filter(|n| self.include_drafts || !n.draft)
            .collect();
        selected.sort_by(|a, b| b.date.cmp(&a.date));
        selected.truncate(self.limit);
        selected
    }
}

/// One syndicated item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub date: DateTime<Local>,
    pub layout: String,
    pub draft: bool,
    pub description: String,
    pub url: String,
    pub guid: String,
    /// Rendered HTML, emitted as `content:encoded`
    pub content_encoded: String,
}

/// Map a content node to a feed entry.
///
/// `url` is `site_url + slug` and `guid` is the same string; everything else
/// is copied from the node as is.
pub fn serialize(node: &ContentNode, site: &SiteMetadata) -> FeedEntry {
    let url = absolute_url(&site.site_url, &node.slug);
    FeedEntry {
        title: node.title.clone(),
        date: node.date,
        layout: node.layout.clone(),
        draft: node.draft,
        description: node.description.clone(),
        guid: url.clone(),
        url,
        content_encoded: node.html.clone(),
    }
}

/// Select and serialize in one go
pub fn entries(query: &FeedQuery, nodes: &[ContentNode], site: &SiteMetadata) -> Vec<FeedEntry> {
    query
        .select(nodes)
        .into_iter()
        .map(|node| serialize(node, site))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site(site_url: &str) -> SiteMetadata {
        SiteMetadata {
            site_url: site_url.to_string(),
            ..SiteMetadata::default()
        }
    }

    fn post(slug: &str, day: u32) -> ContentNode {
        let date = Local.with_ymd_and_hms(2018, 3, day, 9, 30, 0).unwrap();
        let mut node = ContentNode::new("Title", date, slug);
        node.layout = "post".to_string();
        node.description = "A description".to_string();
        node.html = "<p>Body</p>".to_string();
        node
    }

    #[test]
    fn test_serialize_derives_url_and_guid() {
        let node = post("/posts/hello/", 1);
        let entry = serialize(&node, &site("https://davidwells.io"));
        assert_eq!(entry.url, "https://davidwells.io/posts/hello/");
        assert_eq!(entry.guid, entry.url);
        assert_eq!(entry.description, node.description);
        assert_eq!(entry.date, node.date);
        assert_eq!(entry.content_encoded, "<p>Body</p>");
    }

    #[test]
    fn test_serialize_is_plain_concatenation() {
        for (site_url, slug) in [
            ("https://a.io", "/x/"),
            ("https://a.io/", "/x/"),
            ("http://b.dev/blog", "/2017/post"),
            ("", "/only-slug/"),
        ] {
            let entry = serialize(&post(slug, 2), &site(site_url));
            assert_eq!(entry.url, format!("{}{}", site_url, slug));
            assert_eq!(entry.guid, entry.url);
        }
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let node = post("/posts/same/", 3);
        let metadata = site("https://davidwells.io");
        assert_eq!(serialize(&node, &metadata), serialize(&node, &metadata));
    }

    #[test]
    fn test_query_filters_drafts_and_layout() {
        let mut draft = post("/posts/draft/", 5);
        draft.draft = true;
        let mut page = post("/about/", 6);
        page.layout = "page".to_string();
        let nodes = vec![post("/posts/old/", 1), draft, page, post("/posts/new/", 4)];

        let slugs: Vec<_> = FeedQuery::default()
            .select(&nodes)
            .iter()
            .map(|n| n.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["/posts/new/", "/posts/old/"]);

        let with_drafts = FeedQuery {
            include_drafts: true,
            ..FeedQuery::default()
        };
        assert_eq!(with_drafts.select(&nodes).len(), 3);
    }

    #[test]
    fn test_query_limit() {
        let nodes: Vec<_> = (1..=5).map(|d| post(&format!("/p/{}/", d), d)).collect();
        let query = FeedQuery {
            limit: 2,
            ..FeedQuery::default()
        };
        let slugs: Vec<_> = query.select(&nodes).iter().map(|n| n.slug.clone()).collect();
        assert_eq!(slugs, vec!["/p/5/", "/p/4/"]);
    }
}
