// src/card/photo.rs
//! Remote photo fetch + decode to premultiplied RGBA.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Refuse photos larger than this; share cards never need more.
const MAX_PHOTO_BYTES: usize = 8 * 1024 * 1024;

/// Decoded bitmap ready for the rasterizer.
pub struct PhotoBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

pub struct PhotoFetcher {
    http: reqwest::Client,
}

impl Default for PhotoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("cdlt-news/0.1 (+github.com/cdlt-news/cdlt-news)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self { http }
    }

    pub async fn fetch(&self, url: &str) -> Result<PhotoBitmap> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("photo request failed")?
            .error_for_status()
            .context("photo HTTP status")?;

        if let Some(len) = resp.content_length() {
            if len as usize > MAX_PHOTO_BYTES {
                return Err(anyhow!("photo exceeds size cap ({len} bytes)"));
            }
        }
        let bytes = resp.bytes().await.context("photo body read failed")?;
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(anyhow!("photo exceeds size cap ({} bytes)", bytes.len()));
        }

        decode_photo(&bytes)
    }
}

/// Decode image bytes and premultiply in place.
pub fn decode_photo(bytes: &[u8]) -> Result<PhotoBitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode photo from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PhotoBitmap {
        width,
        height,
        rgba8_premul,
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        } else if a < 255 {
            px[0] = ((px[0] as u16 * a) / 255) as u8;
            px[1] = ((px[1] as u16 * a) / 255) as u8;
            px[2] = ((px[2] as u16 * a) / 255) as u8;
        }
    }
}
