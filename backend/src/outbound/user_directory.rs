//! Reqwest-backed requester directory adapter.
//!
//! The directory exposes `GET {base}/api/v1/usuarios/{document}` and answers
//! with the registered user, of which only the `id` is read. A 404 and a zero
//! identifier both mean nobody is registered under the document.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::ports::{RequesterLookup, RequesterLookupError};
use crate::domain::{DocumentNumber, RequesterId};

const USERS_PATH: [&str; 3] = ["api", "v1", "usuarios"];

#[derive(Debug, Deserialize)]
struct DirectoryUserDto {
    #[serde(default)]
    id: Option<u64>,
}

/// Requester lookup over the user directory's HTTP API.
pub struct HttpRequesterLookup {
    client: Client,
    base_url: Url,
}

impl HttpRequesterLookup {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl RequesterLookup for HttpRequesterLookup {
    async fn find_by_document(
        &self,
        document: DocumentNumber,
    ) -> Result<Option<RequesterId>, RequesterLookupError> {
        let url = user_url(&self.base_url, document)?;
        debug!(%document, "querying requester directory");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%document, "no requester registered for document");
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            warn!(%document, error = %error, "requester directory lookup failed");
            return Err(error);
        }
        parse_requester(body.as_ref())
    }
}

fn user_url(base: &Url, document: DocumentNumber) -> Result<Url, RequesterLookupError> {
    let mut url = base.clone();
    let document = document.to_string();
    url.path_segments_mut()
        .map_err(|()| RequesterLookupError::query(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(USERS_PATH)
        .push(&document);
    Ok(url)
}

fn parse_requester(body: &[u8]) -> Result<Option<RequesterId>, RequesterLookupError> {
    let user: DirectoryUserDto = serde_json::from_slice(body)
        .map_err(|err| RequesterLookupError::query(format!("undecodable user: {err}")))?;
    Ok(user.id.filter(|id| *id != 0).map(RequesterId::new))
}

fn map_transport_error(error: reqwest::Error) -> RequesterLookupError {
    RequesterLookupError::connection(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RequesterLookupError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::BAD_GATEWAY
        | StatusCode::GATEWAY_TIMEOUT
        | StatusCode::REQUEST_TIMEOUT => RequesterLookupError::connection(message),
        _ => RequesterLookupError::query(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 120;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
