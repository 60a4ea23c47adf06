//! plugin-offline: service worker registration and precache manifest

use anyhow::Result;

use super::{BuildContext, Plugin};
use crate::offline;

pub struct OfflinePlugin;

impl Plugin for OfflinePlugin {
    fn name(&self) -> &'static str {
        "plugin-offline"
    }

    fn on_page_html(&self, html: String, _ctx: &BuildContext) -> Result<String> {
        Ok(offline::inject_registration(&html))
    }

    fn on_post_build(&self, ctx: &BuildContext) -> Result<()> {
        let count = offline::write_service_worker(&ctx.site.public_dir)?;
        tracing::info!("Generated {} ({} precached files)", offline::SERVICE_WORKER, count);
        Ok(())
    }

    // The manifest has to see every file the other hooks write
    fn finalizes(&self) -> bool {
        true
    }
}
