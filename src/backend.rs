//! The annotation backend as consumed by the client: list images, save one
//! bounding box, and fetch image bytes from the static route.

use std::io::Read;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::model::{AnnotationSubmission, CatalogResponse, ImageDescriptor};

/// Largest image body accepted from the static route.
const MAX_IMAGE_BYTES: u64 = 256 * 1024 * 1024;

pub trait Backend: Send + Sync {
    fn list_images(&self) -> Result<Vec<ImageDescriptor>, BackendError>;

    /// Returns the backend's acknowledgement, which is only checked for being JSON.
    fn save_annotation(
        &self,
        submission: &AnnotationSubmission,
    ) -> Result<serde_json::Value, BackendError>;

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, BackendError>;
}

// ── Body Contract ───────────────────────────────────────────────────────────

/// `GET /list` succeeds only on exactly 200 with an `{"images": [...]}` body.
pub fn parse_catalog(
    status: u16,
    url: &str,
    body: &str,
) -> Result<Vec<ImageDescriptor>, BackendError> {
    if status != 200 {
        return Err(BackendError::Status {
            status,
            url: url.to_string(),
        });
    }
    let response: CatalogResponse = serde_json::from_str(body)?;
    Ok(response.images)
}

/// `POST /save_annotations` succeeds on any 2xx whose body is valid JSON.
pub fn parse_ack(status: u16, url: &str, body: &str) -> Result<serde_json::Value, BackendError> {
    if !(200..300).contains(&status) {
        return Err(BackendError::Status {
            status,
            url: url.to_string(),
        });
    }
    Ok(serde_json::from_str(body)?)
}

// ── HTTP ────────────────────────────────────────────────────────────────────

pub struct HttpBackend {
    config: BackendConfig,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

fn transport_error(url: &str, err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(status, _) => BackendError::Status {
            status,
            url: url.to_string(),
        },
        ureq::Error::Transport(t) => BackendError::Transport(t.to_string()),
    }
}

impl Backend for HttpBackend {
    fn list_images(&self) -> Result<Vec<ImageDescriptor>, BackendError> {
        let url = self.config.list_url();
        log::debug!("GET {}", url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let body = response.into_string()?;
        parse_catalog(status, &url, &body)
    }

    fn save_annotation(
        &self,
        submission: &AnnotationSubmission,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.config.save_url();
        let payload = serde_json::to_string(submission)?;
        log::debug!("POST {} {}", url, payload);
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&payload)
            .map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let body = response.into_string()?;
        parse_ack(status, &url, &body)
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        log::debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| transport_error(url, e))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_IMAGE_BYTES)
            .read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
