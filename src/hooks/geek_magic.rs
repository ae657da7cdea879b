//! Push the album cover to a GeekMagic desktop display.
//!
//! The device only shows JPEG (or GIF) images sized for its 240x240 screen,
//! so covers are resized and re-encoded before upload.

use std::io::Cursor;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::Hook;
use crate::config::GeekMagicConfig;
use crate::error::{Error, Result};
use crate::track::Track;

const COVER_SIZE: u32 = 240;
const DEFAULT_COVER_FILE_NAME: &str = "cover.jpg";
const UPLOAD_DIR: &str = "/image/";

#[derive(Debug, Deserialize)]
struct SpaceInfo {
    free: u64,
    total: u64,
}

pub struct GeekMagicHook {
    http: Client,
    base_url: String,
    cover_file_name: String,
    last_cover_url: Option<String>,
}

impl GeekMagicHook {
    /// # Errors
    ///
    /// Fails when the device URL is missing or not a valid URL.
    pub fn new(config: GeekMagicConfig) -> Result<Self> {
        let raw = config.url.trim();
        if raw.is_empty() {
            return Err(Error::config("geek-magic hook requires a device url"));
        }
        Url::parse(raw)
            .map_err(|e| Error::config(format!("geek-magic url '{raw}' is invalid: {e}")))?;

        Ok(Self {
            http: Client::new(),
            base_url: raw.trim_end_matches('/').to_string(),
            cover_file_name: config
                .cover_file_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_COVER_FILE_NAME.to_string()),
            last_cover_url: None,
        })
    }

    async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::task::spawn_blocking(move || encode_cover(&bytes))
            .await
            .map_err(|e| Error::hook("GeekMagic", format!("image task failed: {e}")))?
    }

    async fn space(&self) -> Result<SpaceInfo> {
        Ok(self
            .http
            .get(format!("{}/space.json", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn upload(&self, jpeg: Vec<u8>) -> Result<()> {
        let part = Part::bytes(jpeg)
            .file_name(self.cover_file_name.clone())
            .mime_str("image/jpeg")?;
        let form = Form::new().part("image", part);

        self.http
            .post(format!("{}/doUpload", self.base_url))
            .query(&[("dir", UPLOAD_DIR)])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Resize to fill the screen and re-encode as JPEG.
fn encode_cover(bytes: &[u8]) -> Result<Vec<u8>> {
    let cover = image::load_from_memory(bytes)?
        .resize_to_fill(COVER_SIZE, COVER_SIZE, FilterType::Lanczos3);

    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(cover.to_rgb8()).write_to(&mut jpeg, ImageFormat::Jpeg)?;
    Ok(jpeg.into_inner())
}

#[async_trait]
impl Hook for GeekMagicHook {
    fn name(&self) -> &'static str {
        "GeekMagic"
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()> {
        let Some(cover_url) = track.cover_url() else {
            debug!("Track has no cover, skipping");
            return Ok(());
        };
        if self.last_cover_url.as_deref() == Some(cover_url) {
            debug!("Cover already on the device, skipping");
            return Ok(());
        }

        let jpeg = self.fetch_cover(cover_url).await?;
        let space = self.space().await?;
        if space.free < jpeg.len() as u64 {
            return Err(Error::hook(
                self.name(),
                format!(
                    "not enough space on device ({} of {} bytes free, {} needed)",
                    space.free,
                    space.total,
                    jpeg.len()
                ),
            ));
        }

        self.upload(jpeg).await?;
        info!(file = %self.cover_file_name, "Cover sent to GeekMagic");
        self.last_cover_url = Some(cover_url.to_string());
        Ok(())
    }
}
