//! Text Recognition Client
//!
//! Out-of-process OCR: the session only needs the capability "extract text
//! regions from an image". The sidecar binary is invoked per image and
//! prints one JSON document on stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// OCR errors
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR binary not found")]
    BinaryMissing,
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("OCR failed (exit {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("invalid OCR response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for OcrError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => OcrError::BinaryMissing,
            _ => OcrError::Io(err),
        }
    }
}

/// A recognized text region
#[derive(Debug, Clone, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub score: f64,
    /// Region corner points, clockwise from top-left
    #[serde(rename = "box", default)]
    pub box_points: Vec<[i32; 2]>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    code: i32,
    #[serde(default)]
    data: Vec<TextRegion>,
}

/// Capability: extract text regions from an image
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<Vec<TextRegion>, OcrError>;
}

/// Client for a local OCR sidecar binary
pub struct OcrClient {
    binary: PathBuf,
    timeout: Duration,
}

impl OcrClient {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrClient {
    async fn recognize(&self, image: &Path) -> Result<Vec<TextRegion>, OcrError> {
        debug!("recognizing text in {:?}", image);

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .arg(image)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| OcrError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(OcrError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the sidecar's JSON document. A non-success code with no regions is
/// an ordinary empty result, not an error.
fn parse_response(stdout: &str) -> Result<Vec<TextRegion>, OcrError> {
    let response: OcrResponse = serde_json::from_str(stdout.trim())?;
    if response.code != 100 {
        debug!("OCR returned code {}, no regions", response.code);
        return Ok(Vec::new());
    }
    Ok(response.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let stdout = r#"{"code":100,"data":[
            {"text":"Sign In","score":0.98,"box":[[10,20],[110,20],[110,50],[10,50]]}
        ]}"#;
        let regions = parse_response(stdout).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "Sign In");
        assert_eq!(regions[0].box_points[0], [10, 20]);
    }

    #[test]
    fn test_parse_response_no_text() {
        let regions = parse_response(r#"{"code":101,"data":[]}"#).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_parse_response_invalid() {
        assert!(parse_response("not json").is_err());
    }
}
