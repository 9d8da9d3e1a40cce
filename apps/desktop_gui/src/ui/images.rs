//! Decoded images, their texture cache, and the drawn placeholder artwork.

use std::collections::{HashMap, HashSet};

use client_core::{AppSnapshot, CatalogView, Placeholder};
use eframe::egui;

const MAX_IMAGE_EDGE: u32 = 1024;

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE).to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(DecodedImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub fn placeholder_color(placeholder: &Placeholder) -> egui::Color32 {
    let [r, g, b] = placeholder.rgb();
    egui::Color32::from_rgb(r, g, b)
}

pub enum ImageSlot {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

/// Textures keyed by the URL they were fetched from.
#[derive(Default)]
pub struct ImageCache {
    slots: HashMap<String, ImageSlot>,
}

impl ImageCache {
    pub fn get(&self, url: &str) -> Option<&ImageSlot> {
        self.slots.get(url)
    }

    /// True when `url` has never been requested; marks it as loading.
    pub fn begin_fetch(&mut self, url: &str) -> bool {
        if self.slots.contains_key(url) {
            return false;
        }
        self.slots.insert(url.to_string(), ImageSlot::Loading);
        true
    }

    pub fn store(&mut self, ctx: &egui::Context, url: String, image: DecodedImage) {
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
        let texture = ctx.load_texture(url.clone(), color_image, egui::TextureOptions::LINEAR);
        self.slots.insert(url, ImageSlot::Ready(texture));
    }

    pub fn mark_failed(&mut self, url: String) {
        self.slots.insert(url, ImageSlot::Failed);
    }

    /// Drops textures the snapshot no longer points at, such as charts
    /// replaced by a newer cache-busted URL.
    pub fn retain_for(&mut self, snapshot: &AppSnapshot) {
        let live = live_image_urls(snapshot);
        self.slots.retain(|url, _| live.contains(url));
    }
}

pub fn live_image_urls(snapshot: &AppSnapshot) -> HashSet<String> {
    let mut live: HashSet<String> = [
        snapshot.charts.registrations.as_ref(),
        snapshot.charts.event_registrations.as_ref(),
    ]
    .into_iter()
    .flatten()
    .map(|source| source.url.to_string())
    .collect();
    if let CatalogView::Cards(cards) = snapshot.catalog_view() {
        live.extend(
            cards
                .into_iter()
                .filter(|card| card.has_server_image())
                .map(|card| card.image_src),
        );
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([57u8, 255, 20, 255]));
        let mut out = Cursor::new(Vec::new());
        buffer
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decodes_png_into_rgba() {
        let decoded = decode_image(&png_bytes(4, 3)).expect("decode");
        assert_eq!((decoded.width, decoded.height), (4, 3));
        assert_eq!(decoded.rgba.len(), 4 * 3 * 4);
        assert_eq!(&decoded.rgba[..4], &[57, 255, 20, 255]);
    }

    #[test]
    fn oversized_images_are_scaled_down() {
        let decoded = decode_image(&png_bytes(2048, 512)).expect("decode");
        assert_eq!(decoded.width, 1024);
        assert!(decoded.height <= 256);
    }

    #[test]
    fn html_error_page_is_not_an_image() {
        assert!(decode_image(b"<html>404 Not Found</html>").is_err());
    }

    #[test]
    fn placeholder_colors_match_palette() {
        assert_eq!(
            placeholder_color(&Placeholder::for_index(0)),
            egui::Color32::from_rgb(0x39, 0xff, 0x14)
        );
        assert_eq!(
            placeholder_color(&Placeholder::for_index(5)),
            egui::Color32::from_rgb(0x99, 0x45, 0xff)
        );
    }

    #[test]
    fn fetch_is_requested_once_per_url() {
        let mut cache = ImageCache::default();
        assert!(cache.begin_fetch("http://127.0.0.1:5000/static/a.png"));
        assert!(!cache.begin_fetch("http://127.0.0.1:5000/static/a.png"));
        cache.mark_failed("http://127.0.0.1:5000/static/a.png".into());
        assert!(matches!(
            cache.get("http://127.0.0.1:5000/static/a.png"),
            Some(ImageSlot::Failed)
        ));
    }
}
