//! plugin-catch-links: absolute links back into the site become root-relative

use anyhow::Result;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{BuildContext, Plugin};

lazy_static! {
    static ref LINK_HREF: Regex =
        Regex::new(r#"(?i)(<a\b[^>]*?\bhref\s*=\s*")([^"]*)(")"#).unwrap();
}

pub struct CatchLinksPlugin;

/// Rewrite `<a href>` values that start with `site_url`
pub fn catch_links(html: &str, site_url: &str) -> String {
    let site_url = site_url.trim_end_matches('/');
    if site_url.is_empty() {
        return html.to_string();
    }

    LINK_HREF
        .replace_all(html, |caps: &Captures| {
            let href = &caps[2];
            match href.strip_prefix(site_url) {
                Some(rest) if rest.is_empty() => format!("{}/{}", &caps[1], &caps[3]),
                Some(rest) if rest.starts_with(['/', '?', '#']) => {
                    format!("{}{}{}", &caps[1], rest, &caps[3])
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

impl Plugin for CatchLinksPlugin {
    fn name(&self) -> &'static str {
        "plugin-catch-links"
    }

    fn on_page_html(&self, html: String, ctx: &BuildContext) -> Result<String> {
        Ok(catch_links(&html, &ctx.site.config.site_metadata.site_url))
    }
}
