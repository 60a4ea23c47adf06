//! Image pipeline and linked-file copying for rendered markdown
//!
//! Local `<img>` sources are copied (and, with sharp enabled, resized down to
//! `max_width`) into `public/static/<hash>/`, and the tags are rewritten to
//! point at the copies. With copy-linked-files enabled, relative `<a href>`
//! targets get the same treatment.

use anyhow::{Context as _, Result};
use image::imageops::FilterType;
use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::{Captures, NoExpand, Regex};
use std::fs;
use std::path::{Path, PathBuf};

use crate::helpers::{escape_html, hash_file, is_relative_file_ref, strip_query};

lazy_static! {
    static ref IMG_TAG: Regex = Regex::new(r#"(?i)<img\b[^>]*>"#).unwrap();
    static ref SRC_ATTR: Regex = Regex::new(r#"(?i)\bsrc\s*=\s*"([^"]*)""#).unwrap();
    static ref ANCHOR_HREF: Regex =
        Regex::new(r#"(?i)(<a\b[^>]*?\bhref\s*=\s*")([^"]*)(")"#).unwrap();
}

/// Directory under the public dir that processed assets land in
pub const STATIC_PREFIX: &str = "static";

/// Formats the resizer will touch; everything else is copied as is
const RESIZABLE: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tiff"];

/// Options of the remark-images sub-plugin
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub max_width: u32,
    /// Wrap each processed image in a link to the full-size original
    pub link_images_to_original: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 960,
            link_images_to_original: true,
        }
    }
}

/// Rewrites asset references in one node's HTML
pub struct AssetPipeline<'a> {
    public_dir: &'a Path,
    images: Option<&'a ImageOptions>,
    resize: bool,
    copy_linked_files: bool,
}

/// Where an asset ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAsset {
    /// Root-relative URL of the copy
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Root-relative URL of the untouched original, when it differs from `url`
    pub original_url: Option<String>,
}

impl<'a> AssetPipeline<'a> {
    pub fn new(
        public_dir: &'a Path,
        images: Option<&'a ImageOptions>,
        resize: bool,
        copy_linked_files: bool,
    ) -> Self {
        Self {
            public_dir,
            images,
            resize,
            copy_linked_files,
        }
    }

    /// True when neither images nor linked files are handled
    pub fn is_noop(&self) -> bool {
        self.images.is_none() && !self.copy_linked_files
    }

    /// Rewrite `html` rendered from a markdown file living in `asset_dir`
    pub fn process_html(&self, html: &str, asset_dir: &Path) -> String {
        let mut output = html.to_string();

        if let Some(options) = self.images {
            output = IMG_TAG
                .replace_all(&output, |caps: &Captures| {
                    self.rewrite_img(&caps[0], asset_dir, options)
                })
                .into_owned();
        }

        if self.copy_linked_files {
            output = ANCHOR_HREF
                .replace_all(&output, |caps: &Captures| {
                    let href = &caps[2];
                    let rewritten = self
                        .resolve_local(href, asset_dir)
                        .filter(|path| !is_markdown(path))
                        .and_then(|path| match self.copy_file(&path) {
                            Ok(url) => Some(url),
                            Err(e) => {
                                tracing::warn!("Failed to copy linked file {:?}: {}", path, e);
                                None
                            }
                        });
                    match rewritten {
                        Some(url) => format!("{}{}{}", &caps[1], escape_html(&url), &caps[3]),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
        }

        output
    }

    fn rewrite_img(&self, tag: &str, asset_dir: &Path, options: &ImageOptions) -> String {
        let Some(src) = SRC_ATTR.captures(tag).map(|c| c[1].to_string()) else {
            return tag.to_string();
        };
        let Some(path) = self.resolve_local(&src, asset_dir) else {
            if is_relative_file_ref(&src) {
                tracing::warn!("Image {:?} referenced from {:?} not found", src, asset_dir);
            }
            return tag.to_string();
        };

        let asset = match self.process_image(&path, options.max_width) {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!("Failed to process image {:?}: {:#}", path, e);
                return tag.to_string();
            }
        };

        let src_attr = format!("src=\"{}\"", escape_html(&asset.url));
        let mut rewritten = SRC_ATTR.replace(tag, NoExpand(&src_attr)).into_owned();
        let mut extra = String::new();
        if let (Some(w), Some(h)) = (asset.width, asset.height) {
            if !tag.contains("width=") {
                extra.push_str(&format!(" width=\"{}\" height=\"{}\"", w, h));
            }
        }
        if !tag.contains("loading=") {
            extra.push_str(" loading=\"lazy\"");
        }
        let close = if rewritten.ends_with("/>") { 2 } else { 1 };
        rewritten.insert_str(rewritten.len() - close, &extra);

        match (&asset.original_url, options.link_images_to_original) {
            (Some(original), true) => format!(
                r#"<a class="image-link" href="{}" target="_blank" rel="noopener">{}</a>"#,
                escape_html(original),
                rewritten
            ),
            _ => rewritten,
        }
    }

    /// Resolve a relative reference to an existing local file
    fn resolve_local(&self, url: &str, asset_dir: &Path) -> Option<PathBuf> {
        if !is_relative_file_ref(url) {
            return None;
        }
        let decoded = percent_decode_str(strip_query(url)).decode_utf8().ok()?;
        let path = asset_dir.join(decoded.as_ref());
        path.is_file().then_some(path)
    }

    /// Copy (and maybe shrink) one image into the static dir
    pub fn process_image(&self, path: &Path, max_width: u32) -> Result<ProcessedAsset> {
        let original_url = self.copy_file(path)?;
        let resizable = extension(path)
            .map(|e| RESIZABLE.contains(&e.as_str()))
            .unwrap_or(false);

        if !resizable {
            return Ok(ProcessedAsset {
                url: original_url,
                width: None,
                height: None,
                original_url: None,
            });
        }

        let (width, height) = image::image_dimensions(path)
            .with_context(|| format!("reading dimensions of {:?}", path))?;

        if !self.resize || width <= max_width {
            return Ok(ProcessedAsset {
                url: original_url,
                width: Some(width),
                height: Some(height),
                original_url: None,
            });
        }

        let new_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
        let (dest, url) = self.static_target(path, Some(max_width))?;
        if !dest.exists() {
            let img = image::open(path).with_context(|| format!("decoding {:?}", path))?;
            let resized = img.resize(max_width, new_height, FilterType::Lanczos3);
            resized
                .save(&dest)
                .with_context(|| format!("writing {:?}", dest))?;
            tracing::debug!("Resized {:?} to {}x{}", path, max_width, new_height);
        }

        Ok(ProcessedAsset {
            url,
            width: Some(max_width),
            height: Some(new_height),
            original_url: Some(original_url),
        })
    }

    /// Copy a file under `static/<hash>/` and return its URL
    fn copy_file(&self, path: &Path) -> Result<String> {
        let (dest, url) = self.static_target(path, None)?;
        if !dest.exists() {
            fs::copy(path, &dest).with_context(|| format!("copying {:?}", path))?;
        }
        Ok(url)
    }

    fn static_target(&self, path: &Path, width: Option<u32>) -> Result<(PathBuf, String)> {
        let hash = hash_file(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset");
        let file_name = match (width, extension(path)) {
            (Some(w), Some(ext)) => format!("{}-{}w.{}", stem, w, ext),
            (None, Some(ext)) => format!("{}.{}", stem, ext),
            (_, None) => stem.to_string(),
        };

        let dir = self.public_dir.join(STATIC_PREFIX).join(&hash);
        fs::create_dir_all(&dir)?;
        let url = format!("/{}/{}/{}", STATIC_PREFIX, hash, file_name);
        Ok((dir.join(file_name), url))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_markdown(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("md" | "markdown"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_resizes_wide_images() {
        let src = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        write_png(&src.path().join("wide.png"), 200, 100);

        let options = ImageOptions {
            max_width: 50,
            link_images_to_original: true,
        };
        let pipeline = AssetPipeline::new(public.path(), Some(&options), true, false);
        let html = pipeline.process_html(r#"<p><img src="./wide.png" alt="Wide"></p>"#, src.path());

        assert!(html.contains(r#"width="50" height="25""#), "{}", html);
        assert!(html.contains(r#"alt="Wide""#));
        assert!(html.contains("wide-50w.png"));
        assert!(html.contains(r#"class="image-link""#));
        assert!(html.contains(r#"loading="lazy""#));

        let resized = walkdir::WalkDir::new(public.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name() == "wide-50w.png")
            .expect("resized image written");
        assert_eq!(image::image_dimensions(resized.path()).unwrap(), (50, 25));
    }

    #[test]
    fn test_small_images_copied_unchanged() {
        let src = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        write_png(&src.path().join("small.png"), 20, 10);

        let options = ImageOptions::default();
        let pipeline = AssetPipeline::new(public.path(), Some(&options), true, false);
        let html = pipeline.process_html(r#"<img src="small.png" alt="">"#, src.path());

        assert!(html.starts_with("<img src=\"/static/"));
        assert!(html.contains(r#"width="20" height="10""#));
        assert!(!html.contains("image-link"));
    }

    #[test]
    fn test_without_sharp_originals_are_kept() {
        let src = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        write_png(&src.path().join("wide.png"), 200, 100);

        let options = ImageOptions {
            max_width: 50,
            link_images_to_original: true,
        };
        let pipeline = AssetPipeline::new(public.path(), Some(&options), false, false);
        let html = pipeline.process_html(r#"<img src="wide.png">"#, src.path());

        assert!(html.contains(r#"width="200" height="100""#));
        assert!(!html.contains("-50w"));
    }

    #[test]
    fn test_remote_and_missing_images_untouched() {
        let src = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        let options = ImageOptions::default();
        let pipeline = AssetPipeline::new(public.path(), Some(&options), true, false);

        let remote = r#"<img src="https://example.com/a.png">"#;
        assert_eq!(pipeline.process_html(remote, src.path()), remote);

        let missing = r#"<img src="nope.png">"#;
        assert_eq!(pipeline.process_html(missing, src.path()), missing);
    }

    #[test]
    fn test_copy_linked_files() {
        let src = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        fs::write(src.path().join("slides.pdf"), b"%PDF-1.4").unwrap();
        fs::write(src.path().join("other.md"), b"# other").unwrap();

        let pipeline = AssetPipeline::new(public.path(), None, false, true);
        let html = pipeline.process_html(
            r#"<a href="slides.pdf">Slides</a> <a href="other.md">Other</a> <a href="/about/">About</a>"#,
            src.path(),
        );

        assert!(html.contains(r#"<a href="/static/"#));
        assert!(html.contains("/slides.pdf\">Slides</a>"));
        assert!(html.contains(r#"<a href="other.md">Other</a>"#));
        assert!(html.contains(r#"<a href="/about/">About</a>"#));
    }
}
