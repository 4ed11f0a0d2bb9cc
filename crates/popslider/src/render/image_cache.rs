use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};
use eframe::egui;

/// Attachments larger than this are not worth showing in a popup.
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

enum Entry {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

pub enum ImageState {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

type Delivery = (String, Result<egui::ColorImage>);

/// Downloads slide images in the background and keeps their textures.
pub struct ImageCache {
    site_url: String,
    access_token: Option<String>,
    entries: RefCell<HashMap<String, Entry>>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl ImageCache {
    pub fn new(site_url: String, access_token: Option<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            site_url,
            access_token,
            entries: RefCell::new(HashMap::new()),
            tx,
            rx,
        }
    }

    pub fn get_or_load(&self, ctx: &egui::Context, image_url: &str) -> ImageState {
        self.collect(ctx);

        let mut entries = self.entries.borrow_mut();
        match entries.get(image_url) {
            Some(Entry::Ready(texture)) => return ImageState::Ready(texture.clone()),
            Some(Entry::Loading) => return ImageState::Loading,
            Some(Entry::Failed) => return ImageState::Failed,
            None => {}
        }

        let Some(resolved) = resolve_image_url(&self.site_url, image_url) else {
            tracing::warn!(image_url, "cannot resolve slide image against site URL");
            entries.insert(image_url.to_string(), Entry::Failed);
            return ImageState::Failed;
        };

        let key = image_url.to_string();
        let site_url = self.site_url.clone();
        let token = self.access_token.clone();
        let tx = self.tx.clone();
        let repaint = ctx.clone();
        let spawned = std::thread::Builder::new()
            .name("slide-image".to_string())
            .spawn(move || {
                let result = download_image(&resolved, &site_url, token.as_deref());
                if tx.send((key, result)).is_ok() {
                    repaint.request_repaint();
                }
            });

        match spawned {
            Ok(_) => {
                entries.insert(image_url.to_string(), Entry::Loading);
                ImageState::Loading
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not start image download");
                entries.insert(image_url.to_string(), Entry::Failed);
                ImageState::Failed
            }
        }
    }

    /// Turn finished downloads into textures.
    fn collect(&self, ctx: &egui::Context) {
        let mut entries = self.entries.borrow_mut();
        while let Ok((key, result)) = self.rx.try_recv() {
            let entry = match result {
                Ok(image) => {
                    Entry::Ready(ctx.load_texture(&key, image, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    tracing::warn!(image_url = %key, "slide image unavailable: {e:#}");
                    Entry::Failed
                }
            };
            entries.insert(key, entry);
        }
    }
}

/// Resolve a (usually server-relative) attachment URL against the site.
pub fn resolve_image_url(site_url: &str, image_url: &str) -> Option<String> {
    let base = url::Url::parse(site_url.trim()).ok()?;
    base.join(image_url).ok().map(String::from)
}

/// The site token, but only for URLs on the site's own origin.
pub fn credential_for<'a>(
    site_url: &str,
    target_url: &str,
    access_token: Option<&'a str>,
) -> Option<&'a str> {
    let site = url::Url::parse(site_url.trim()).ok()?;
    let target = url::Url::parse(target_url).ok()?;
    if site.origin() == target.origin() {
        access_token
    } else {
        None
    }
}

fn download_image(
    url: &str,
    site_url: &str,
    access_token: Option<&str>,
) -> Result<egui::ColorImage> {
    let mut request = ureq::get(url);
    match credential_for(site_url, url, access_token) {
        Some(token) => {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        None if access_token.is_some() => {
            tracing::debug!(url, "image is off the site origin; sending it without credentials");
        }
        None => {}
    }
    let bytes = request
        .call()
        .with_context(|| format!("Failed to download {url}"))?
        .body_mut()
        .with_config()
        .limit(MAX_IMAGE_BYTES)
        .read_to_vec()
        .with_context(|| format!("Failed to read {url}"))?;
    decode_image(&bytes)
}

pub fn decode_image(bytes: &[u8]) -> Result<egui::ColorImage> {
    let rgba = image::load_from_memory(bytes)
        .context("Unsupported or corrupt image")?
        .to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_server_relative_url() {
        assert_eq!(
            resolve_image_url(
                "https://contoso.sharepoint.com/sites/hr",
                "/sites/hr/Lists/News/Attachments/1/banner.png"
            )
            .as_deref(),
            Some("https://contoso.sharepoint.com/sites/hr/Lists/News/Attachments/1/banner.png")
        );
    }

    #[test]
    fn test_resolve_absolute_url_passes_through() {
        assert_eq!(
            resolve_image_url("https://contoso.sharepoint.com", "https://cdn.example/a.png")
                .as_deref(),
            Some("https://cdn.example/a.png")
        );
    }

    #[test]
    fn test_resolve_encodes_spaces() {
        assert_eq!(
            resolve_image_url("https://contoso.sharepoint.com", "/Lists/A/Attachments/1/my pic.png")
                .as_deref(),
            Some("https://contoso.sharepoint.com/Lists/A/Attachments/1/my%20pic.png")
        );
    }

    #[test]
    fn test_resolve_needs_absolute_site() {
        assert_eq!(resolve_image_url("contoso", "/a.png"), None);
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_credential_only_for_site_origin() {
        let site = "https://contoso.sharepoint.com/sites/hr";
        assert_eq!(
            credential_for(site, "https://contoso.sharepoint.com/sites/hr/a.png", Some("t")),
            Some("t")
        );
        assert_eq!(
            credential_for(site, "https://contoso.sharepoint.com/other/a.png", Some("t")),
            Some("t")
        );
        assert_eq!(credential_for(site, "https://cdn.example/a.png", Some("t")), None);
        assert_eq!(
            credential_for(site, "http://contoso.sharepoint.com/sites/hr/a.png", Some("t")),
            None
        );
        assert_eq!(
            credential_for(site, "https://contoso.sharepoint.com:8443/a.png", Some("t")),
            None
        );
        assert_eq!(credential_for("contoso", "https://contoso/a.png", Some("t")), None);
    }

    #[test]
    fn test_foreign_image_host_gets_no_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/a.png")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_body(png_bytes())
            .create();

        let image_url = resolve_image_url(
            "https://contoso.sharepoint.com/sites/hr",
            &format!("{}/a.png", server.url()),
        )
        .unwrap();
        let decoded = download_image(
            &image_url,
            "https://contoso.sharepoint.com/sites/hr",
            Some("site-secret"),
        )
        .unwrap();
        mock.assert();
        assert_eq!(decoded.size, [3, 2]);
    }

    #[test]
    fn test_site_image_gets_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sites/hr/Attachments/1/a.png")
            .match_header("authorization", "Bearer site-secret")
            .with_status(200)
            .with_body(png_bytes())
            .create();

        let site = format!("{}/sites/hr", server.url());
        let image_url = resolve_image_url(&site, "/sites/hr/Attachments/1/a.png").unwrap();
        download_image(&image_url, &site, Some("site-secret")).unwrap();
        mock.assert();
    }

    #[test]
    fn test_decode_png() {
        let bytes = png_bytes();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.size, [3, 2]);
        assert_eq!(decoded.pixels[0], egui::Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
