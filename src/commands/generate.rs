//! Generate static files

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::content::loader::ContentLoader;
use crate::generator::Generator;
use crate::{Site, CONFIG_FILE};

/// Load content and render the whole site
pub fn run(site: &Site) -> Result<()> {
    let start = Instant::now();

    let nodes = ContentLoader::new(site).load()?;
    let drafts = nodes.iter().filter(|n| n.draft).count();
    tracing::info!("Loaded {} nodes ({} drafts)", nodes.len(), drafts);

    let generator = Generator::new(site)?;
    let pages = generator.generate(&nodes)?;

    let duration = start.elapsed();
    tracing::info!("Generated {} pages in {:.2}s", pages, duration.as_secs_f64());

    Ok(())
}

/// Watch sources, static files and the config; regenerate on change
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    for dir in watched_dirs(site) {
        watcher.watch(&dir, notify::RecursiveMode::Recursive)?;
    }

    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut site = site.clone();
    let mut last_rebuild = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                // Our own output must not trigger another build
                if event.paths.iter().all(|p| p.starts_with(&site.public_dir)) {
                    continue;
                }
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, regenerating...");
                    if event.paths.iter().any(|p| p.ends_with(CONFIG_FILE)) {
                        match Site::new(&site.base_dir) {
                            Ok(reloaded) => site = reloaded,
                            Err(e) => tracing::error!("Failed to reload config: {:#}", e),
                        }
                    }
                    if let Err(e) = run(&site) {
                        tracing::error!("Generation failed: {:#}", e);
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Existing directories whose contents feed the build
pub fn watched_dirs(site: &Site) -> Vec<std::path::PathBuf> {
    let mut dirs: Vec<_> = site
        .plugins
        .sources
        .iter()
        .map(|s| site.base_dir.join(&s.path))
        .collect();
    dirs.push(site.static_dir.clone());
    if let Some(styles) = &site.plugins.styles {
        dirs.push(site.base_dir.join(&styles.dir));
    }
    dirs.retain(|d| d.is_dir());
    dirs.dedup();
    dirs
}
