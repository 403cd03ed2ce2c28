//! Async HTTP client for the face-registration backend.
//!
//! One method per backend operation. Failures are split the way the
//! control panel needs them: [`ClientError::Api`] for a well-formed
//! failure envelope (the server's message travels verbatim), everything
//! else is a transport-level failure the UI reports generically.

use futures::Stream;
use reqwest::multipart;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use shared::{
    domain::{FaceId, FaceRecord},
    error::{ApiError, ErrorCode},
    protocol::{Ack, FaceListing, RecognitionToggled},
};

pub mod mjpeg;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned HTTP {status} with no readable failure payload")]
    UnexpectedStatus { status: u16 },
    #[error("malformed response payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// True for failures where no application-level message exists and the
    /// UI should show its generic wording instead.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::UnexpectedStatus { .. } | Self::MalformedPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Image bytes queued for registration, either a captured frame or a
/// user-picked file.
#[derive(Debug, Clone)]
pub struct RegistrationImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl RegistrationImage {
    pub fn captured_frame(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: "captured_face.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }
}

/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct FaceApiClient {
    http: Client,
    base_url: String,
}

impl FaceApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn start_camera(&self) -> Result<Ack> {
        debug!("backend: start_camera");
        let response = self.http.post(self.endpoint("/start_camera")).send().await?;
        read_ack(response).await
    }

    pub async fn stop_camera(&self) -> Result<Ack> {
        debug!("backend: stop_camera");
        let response = self.http.post(self.endpoint("/stop_camera")).send().await?;
        read_ack(response).await
    }

    pub async fn toggle_recognition(&self) -> Result<RecognitionToggled> {
        debug!("backend: toggle_recognition");
        let response = self
            .http
            .post(self.endpoint("/toggle_recognition"))
            .send()
            .await?;
        let status = response.status().as_u16();
        let toggled: RecognitionToggled = read_payload(response).await?;
        if toggled.ack.success {
            Ok(toggled)
        } else {
            Err(api_failure(status, &toggled.ack))
        }
    }

    /// Requests a still frame from the live camera. The backend answers
    /// with raw JPEG bytes on success and a JSON failure envelope when the
    /// camera is off or the read failed.
    pub async fn capture_frame(&self) -> Result<Vec<u8>> {
        debug!("backend: capture_frame");
        let response = self.http.get(self.endpoint("/capture_face")).send().await?;
        let status = response.status().as_u16();
        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("image/"));
        if is_image {
            return Ok(response.bytes().await?.to_vec());
        }
        match serde_json::from_slice::<Ack>(&response.bytes().await?) {
            Ok(ack) => Err(api_failure(status, &ack)),
            Err(_) => Err(ClientError::UnexpectedStatus { status }),
        }
    }

    /// Registers `name` with the given image via multipart upload. Used
    /// for both confirmed captures and file uploads; the older backend's
    /// separate `/upload_face` endpoint is folded into this one.
    pub async fn register_face(&self, name: &str, image: RegistrationImage) -> Result<Ack> {
        debug!(name, filename = %image.filename, "backend: register_face");
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.mime_type)?;
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .part("face_image", part);
        let response = self
            .http
            .post(self.endpoint("/register_face"))
            .multipart(form)
            .send()
            .await?;
        read_ack(response).await
    }

    pub async fn list_faces(&self) -> Result<Vec<FaceRecord>> {
        debug!("backend: list_faces");
        let response = self
            .http
            .get(self.endpoint("/get_registered_faces"))
            .send()
            .await?;
        let status = response.status().as_u16();
        let listing: FaceListing = read_payload(response).await?;
        if listing.success {
            Ok(listing.faces)
        } else {
            let message = listing
                .message
                .unwrap_or_else(|| "face listing failed".to_string());
            Err(ApiError::new(ErrorCode::from_http_status(status), message).into())
        }
    }

    pub async fn delete_face(&self, id: FaceId) -> Result<Ack> {
        debug!(face_id = id.0, "backend: delete_face");
        let response = self
            .http
            .delete(self.endpoint(&format!("/delete_face/{}", id.0)))
            .send()
            .await?;
        read_ack(response).await
    }

    pub async fn reset_database(&self) -> Result<Ack> {
        debug!("backend: reset_database");
        let response = self
            .http
            .post(self.endpoint("/reset_database"))
            .send()
            .await?;
        read_ack(response).await
    }

    /// Fetches a registered face's reference image by the server-relative
    /// path from the listing.
    pub async fn fetch_image(&self, image_path: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.endpoint(image_path))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Live-feed URL with a cache-busting timestamp, mirroring how the
    /// original page re-requests the stream.
    pub fn video_feed_url(&self) -> String {
        format!(
            "{}?ts={}",
            self.endpoint("/video_feed"),
            chrono::Utc::now().timestamp_millis()
        )
    }

    /// Opens the MJPEG live feed and yields one JPEG frame per item.
    pub async fn open_video_feed(
        &self,
    ) -> Result<impl Stream<Item = std::result::Result<Vec<u8>, reqwest::Error>>> {
        let response = self
            .http
            .get(self.video_feed_url())
            .send()
            .await?
            .error_for_status()?;
        Ok(mjpeg::frames(response.bytes_stream()))
    }
}

fn api_failure(http_status: u16, ack: &Ack) -> ClientError {
    ApiError::new(
        ErrorCode::from_http_status(http_status),
        ack.message_or("request failed").to_string(),
    )
    .into()
}

/// Reads a response envelope, turning a failure envelope into
/// [`ClientError::Api`] and a bodyless error status into a transport
/// failure. Both envelope conventions are accepted by the `Ack` parser.
async fn read_ack(response: reqwest::Response) -> Result<Ack> {
    let status = response.status().as_u16();
    let ack: Ack = read_payload(response).await?;
    if ack.success {
        Ok(ack)
    } else {
        Err(api_failure(status, &ack))
    }
}

async fn read_payload<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;
    match serde_json::from_slice(&bytes) {
        Ok(payload) => Ok(payload),
        Err(_) if !status.is_success() => Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
        }),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
