//! RSS 2.0 writer

use chrono::{DateTime, Local};

use super::FeedEntry;
use crate::helpers::{cdata, escape_xml};

/// Channel-level feed metadata
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    /// Site URL
    pub link: String,
    /// Absolute URL of the feed document itself
    pub feed_url: String,
    pub description: String,
    pub last_build_date: DateTime<Local>,
}

/// Render an RSS document with one `<item>` per entry, in the given order
pub fn render_rss(channel: &Channel, entries: &[FeedEntry]) -> String {
    let mut feed = String::new();
    feed.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    feed.push_str(concat!(
        "<rss version=\"2.0\" ",
        "xmlns:content=\"http://purl.org/rss/1.0/modules/content/\" ",
        "xmlns:atom=\"http://www.w3.org/2005/Atom\" ",
        "xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n"
    ));
    feed.push_str("  <channel>\n");
    feed.push_str(&format!("    <title>{}</title>\n", cdata(&channel.title)));
    feed.push_str(&format!(
        "    <description>{}</description>\n",
        cdata(&channel.description)
    ));
    feed.push_str(&format!("    <link>{}</link>\n", escape_xml(&channel.link)));
    feed.push_str(&format!(
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_xml(&channel.feed_url)
    ));
    feed.push_str(&format!(
        "    <generator>{} {}</generator>\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    feed.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        channel.last_build_date.to_rfc2822()
    ));

    for entry in entries {
        feed.push_str("    <item>\n");
        feed.push_str(&format!("      <title>{}</title>\n", cdata(&entry.title)));
        feed.push_str(&format!(
            "      <description>{}</description>\n",
            cdata(&entry.description)
        ));
        feed.push_str(&format!("      <link>{}</link>\n", escape_xml(&entry.url)));
        feed.push_str(&format!(
            "      <guid isPermaLink=\"true\">{}</guid>\n",
            escape_xml(&entry.guid)
        ));
        feed.push_str(&format!(
            "      <pubDate>{}</pubDate>\n",
            entry.date.to_rfc2822()
        ));
        feed.push_str(&format!(
            "      <content:encoded>{}</content:encoded>\n",
            cdata(&entry.content_encoded)
        ));
        feed.push_str("    </item>\n");
    }

    feed.push_str("  </channel>\n");
    feed.push_str("</rss>\n");
    feed
}
