// src/publisher.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;

const MEDIA_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Status body: title, newline, article link.
pub fn compose_status(title: &str, link: &str) -> String {
    format!("{title}\n{link}")
}

#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Fetch an image and upload it to the posting API, returning the media
    /// handle. `None` on any failure: a lost image never blocks the post.
    async fn upload_media(&self, image_url: &str) -> Option<String>;

    /// Create the status, attaching the media handle when present.
    async fn post_status(&self, title: &str, link: &str, media_id: Option<&str>) -> Result<()>;
}

/// Bearer-authenticated client for the Mastodon statuses/media endpoints.
#[derive(Clone)]
pub struct MastodonClient {
    instance: String,
    access_token: String,
    visibility: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

impl MastodonClient {
    pub fn new(instance: String, access_token: String, visibility: String) -> Self {
        Self {
            instance,
            access_token,
            visibility,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.instance, path)
    }

    async fn try_upload(&self, image_url: &str) -> Result<String> {
        let img = self
            .client
            .get(image_url)
            .timeout(MEDIA_TIMEOUT)
            .send()
            .await
            .context("image fetch")?
            .error_for_status()
            .context("image fetch status")?;

        let content_type = img
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());
        let filename = filename_for(&content_type);

        // Stream the bytes straight through to the upload; large media is
        // never buffered in memory.
        let part = Part::stream(Body::wrap_stream(img.bytes_stream()))
            .file_name(filename)
            .mime_str(&content_type)
            .context("image content type")?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url("/api/v1/media"))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .timeout(MEDIA_TIMEOUT)
            .send()
            .await
            .context("media upload")?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "media upload failed: {}",
                api_error_detail(resp).await
            ));
        }
        let media: MediaResponse = resp.json().await.context("media upload response")?;
        Ok(media.id)
    }
}

#[async_trait]
impl StatusPublisher for MastodonClient {
    async fn upload_media(&self, image_url: &str) -> Option<String> {
        match self.try_upload(image_url).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = ?e, url = image_url, "media upload failed, posting text-only");
                None
            }
        }
    }

    async fn post_status(&self, title: &str, link: &str, media_id: Option<&str>) -> Result<()> {
        let mut params = vec![
            ("status".to_string(), compose_status(title, link)),
            ("visibility".to_string(), self.visibility.clone()),
        ];
        if let Some(id) = media_id {
            params.push(("media_ids[]".to_string(), id.to_string()));
        }

        let resp = self
            .client
            .post(self.url("/api/v1/statuses"))
            .bearer_auth(&self.access_token)
            .form(&params)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .context("status post")?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "status post rejected: {}",
                api_error_detail(resp).await
            ));
        }
        Ok(())
    }
}

/// Pull the server's `{"error": ...}` message out of a failed response,
/// falling back to the bare status code.
async fn api_error_detail(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<ApiError>().await {
        Ok(e) => format!("{status}: {}", e.error),
        Err(_) => status.to_string(),
    }
}

fn filename_for(content_type: &str) -> String {
    let ext = match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    };
    format!("article.{ext}")
}
