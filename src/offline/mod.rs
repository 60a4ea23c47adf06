//! Offline support: a cache-first service worker with a precache manifest

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::helpers::hash_file;

/// Service worker file name, relative to the public dir
pub const SERVICE_WORKER: &str = "sw.js";

/// Registration snippet injected before `</body>`
pub const REGISTER_SCRIPT: &str = r#"<script>
if ('serviceWorker' in navigator) {
  window.addEventListener('load', function() {
    navigator.serviceWorker.register('/sw.js');
  });
}
</script>"#;

const WORKER_TEMPLATE: &str = r#"const CACHE_NAME = '__CACHE_NAME__';
const PRECACHE = __MANIFEST__;

self.addEventListener('install', function(event) {
  event.waitUntil(
    caches.open(CACHE_NAME)
      .then(function(cache) { return cache.addAll(PRECACHE.map(function(e) { return e.url; })); })
      .then(function() { return self.skipWaiting(); })
  );
});

self.addEventListener('activate', function(event) {
  event.waitUntil(
    caches.keys().then(function(keys) {
      return Promise.all(keys.filter(function(key) { return key !== CACHE_NAME; })
        .map(function(key) { return caches.delete(key); }));
    }).then(function() { return self.clients.claim(); })
  );
});

self.addEventListener('fetch', function(event) {
  if (event.request.method !== 'GET') return;
  event.respondWith(
    caches.match(event.request, { ignoreSearch: true }).then(function(cached) {
      return cached || fetch(event.request).then(function(response) {
        if (response.ok && new URL(event.request.url).origin === self.location.origin) {
          var copy = response.clone();
          caches.open(CACHE_NAME).then(function(cache) { cache.put(event.request, copy); });
        }
        return response;
      });
    })
  );
});
"#;

/// One precached file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub url: String,
    pub revision: String,
}

/// Every file under the public dir except the worker itself, sorted by URL.
/// `index.html` files are listed under their directory URL.
pub fn precache_manifest(public_dir: &Path) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(public_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path
            .strip_prefix(public_dir)?
            .to_string_lossy()
            .replace('\\', "/");
        if relative == SERVICE_WORKER {
            continue;
        }

        let url = if relative == "index.html" {
            "/".to_string()
        } else {
            match relative.strip_suffix("/index.html") {
                Some(dir) => format!("/{}/", dir),
                None => format!("/{}", relative),
            }
        };
        entries.push(ManifestEntry {
            url,
            revision: hash_file(path)?,
        });
    }

    entries.sort_by(|a, b| a.url.cmp(&b.url));
    Ok(entries)
}

/// Render the worker script for a manifest
pub fn render_service_worker(manifest: &[ManifestEntry]) -> Result<String> {
    let manifest_json = serde_json::to_string_pretty(manifest)?;
    let cache_name = format!(
        "{}-{:016x}",
        env!("CARGO_PKG_NAME"),
        crate::helpers::hash_bytes(manifest_json.as_bytes())
    );
    Ok(WORKER_TEMPLATE
        .replace("__CACHE_NAME__", &cache_name)
        .replace("__MANIFEST__", &manifest_json))
}

/// Write `sw.js` into the public dir; returns the number of precached files
pub fn write_service_worker(public_dir: &Path) -> Result<usize> {
    let manifest = precache_manifest(public_dir)?;
    let script = render_service_worker(&manifest)?;
    fs::write(public_dir.join(SERVICE_WORKER), script)?;
    Ok(manifest.len())
}

/// Inject the registration snippet into a page
pub fn inject_registration(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}\n{}", &html[..pos], REGISTER_SCRIPT, &html[pos..]),
        None => format!("{}{}", html, REGISTER_SCRIPT),
    }
}
