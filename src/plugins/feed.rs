//! plugin-feed: writes one RSS document per configured feed

use anyhow::{Context as _, Result};
use chrono::Local;
use std::fs;

use super::{BuildContext, FeedOptions, Plugin};
use crate::feed::{self, render_rss, Channel};
use crate::helpers::absolute_url;

pub struct FeedPlugin {
    feeds: Vec<FeedOptions>,
}

impl FeedPlugin {
    pub fn new(feeds: Vec<FeedOptions>) -> Self {
        Self { feeds }
    }
}

impl Plugin for FeedPlugin {
    fn name(&self) -> &'static str {
        "plugin-feed"
    }

    fn on_post_build(&self, ctx: &BuildContext) -> Result<()> {
        let meta = &ctx.site.config.site_metadata;

        for options in &self.feeds {
            let entries = feed::entries(&options.query, ctx.nodes, meta);
            let channel = Channel {
                title: options.title.clone().unwrap_or_else(|| meta.title.clone()),
                link: meta.site_url.clone(),
                feed_url: absolute_url(&meta.site_url, &options.output),
                description: meta.subtitle.clone(),
                last_build_date: Local::now(),
            };

            let path = ctx.site.public_dir.join(options.output.trim_start_matches('/'));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, render_rss(&channel, &entries))
                .with_context(|| format!("failed to write feed {:?}", path))?;

            tracing::info!("Generated {} ({} entries)", options.output, entries.len());
        }

        Ok(())
    }
}
