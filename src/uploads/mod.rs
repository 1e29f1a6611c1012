// Content upload client
//
// Binary assets and token metadata are pinned through the upload service's
// HTTP API. A successful pin returns the content identifier and its
// `ipfs://` URI. Metadata is validated locally before any request is sent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UPLOAD_ENDPOINT: &str = "https://uploads.pinata.cloud/v3/files";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload service credentials are not configured")]
    MissingCredentials,

    #[error("metadata requires name and image")]
    InvalidMetadata,

    #[error("upload service error ({status}): {detail}")]
    Service { status: u16, detail: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected upload response: {0}")]
    Decode(String),
}

/// Token metadata document pinned alongside the asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    /// URI of the pinned asset
    pub image: String,
}

impl TokenMetadata {
    fn validate(&self) -> Result<(), UploadError> {
        if self.name.is_empty() || self.image.is_empty() {
            return Err(UploadError::InvalidMetadata);
        }
        Ok(())
    }
}

/// Result of a successful pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinResult {
    pub cid: String,
    /// `ipfs://<cid>`
    pub uri: String,
}

/// Pinning access used by the NFT creation workflow
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn pin_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<PinResult, UploadError>;

    async fn pin_metadata(&self, metadata: &TokenMetadata) -> Result<PinResult, UploadError>;
}

/// Upload service client
pub struct PinClient {
    jwt: String,
    gateway: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    cid: String,
}

impl PinClient {
    /// Create a client, failing when the JWT is absent so the feature
    /// degrades at construction instead of crashing later
    pub fn new(jwt: Option<String>, gateway: Option<String>) -> Result<Self, UploadError> {
        let jwt = jwt.filter(|j| !j.is_empty()).ok_or(UploadError::MissingCredentials)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            jwt,
            gateway,
            client,
        })
    }

    /// HTTPS gateway form of a pinned content identifier
    pub fn gateway_url(&self, cid: &str) -> Option<String> {
        self.gateway
            .as_ref()
            .map(|host| format!("https://{host}/ipfs/{cid}"))
    }

    async fn pin(&self, part: Part) -> Result<PinResult, UploadError> {
        let form = Form::new().part("file", part).text("network", "public");

        let response = self
            .client
            .post(UPLOAD_ENDPOINT)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Service {
                status: status.as_u16(),
                detail: body,
            });
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|_| UploadError::Decode(body))?;
        Ok(pin_result(parsed.data.cid))
    }
}

#[async_trait]
impl ContentStore for PinClient {
    async fn pin_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<PinResult, UploadError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        self.pin(part).await
    }

    async fn pin_metadata(&self, metadata: &TokenMetadata) -> Result<PinResult, UploadError> {
        metadata.validate()?;
        let bytes = serde_json::to_vec(metadata)
            .map_err(|e| UploadError::Decode(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name("metadata.json".to_string())
            .mime_str("application/json")?;
        self.pin(part).await
    }
}

/// Derive the URI form returned to callers
pub fn ipfs_uri(cid: &str) -> String {
    format!("ipfs://{cid}")
}

fn pin_result(cid: String) -> PinResult {
    let uri = ipfs_uri(&cid);
    PinResult { cid, uri }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_without_name_or_image_is_rejected_locally() {
        let missing_image = TokenMetadata {
            name: "Lion".to_string(),
            description: "roars".to_string(),
            image: String::new(),
        };
        assert!(matches!(
            missing_image.validate(),
            Err(UploadError::InvalidMetadata)
        ));

        let missing_name = TokenMetadata {
            name: String::new(),
            description: String::new(),
            image: "ipfs://bafy".to_string(),
        };
        assert!(matches!(
            missing_name.validate(),
            Err(UploadError::InvalidMetadata)
        ));
    }

    #[test]
    fn missing_jwt_fails_at_construction() {
        assert!(matches!(
            PinClient::new(None, None),
            Err(UploadError::MissingCredentials)
        ));
        assert!(matches!(
            PinClient::new(Some(String::new()), None),
            Err(UploadError::MissingCredentials)
        ));
    }

    #[test]
    fn uri_and_gateway_forms() {
        assert_eq!(ipfs_uri("bafybeigdyr"), "ipfs://bafybeigdyr");

        let client = PinClient::new(
            Some("jwt".to_string()),
            Some("violet-rainbow.mypinata.cloud".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.gateway_url("bafybeigdyr").unwrap(),
            "https://violet-rainbow.mypinata.cloud/ipfs/bafybeigdyr"
        );
    }
}
