//! Wire types shared with the conversion service
//!
//! The conversion service speaks JSON over HTTP:
//! - `POST /download_and_convert` submits a conversion job
//! - `POST /download` exchanges the returned file token for bytes
//!
//! Serializable with serde for JSON over HTTP

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoints
// ============================================================================

pub const CONVERT_ENDPOINT: &str = "/download_and_convert";
pub const DOWNLOAD_ENDPOINT: &str = "/download";

// ============================================================================
// Formats
// ============================================================================

/// Destination format the service can produce
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DstFormat {
    Zarr,
    Mat,
    Npz,
}

impl DstFormat {
    /// Every format, in menu order
    pub const ALL: [DstFormat; 3] = [DstFormat::Zarr, DstFormat::Mat, DstFormat::Npz];

    /// Value sent as `dst_format`
    pub fn as_str(self) -> &'static str {
        match self {
            DstFormat::Zarr => "zarr",
            DstFormat::Mat => "mat",
            DstFormat::Npz => "npz",
        }
    }

    /// Label shown on menu entries
    pub fn label(self) -> &'static str {
        match self {
            DstFormat::Zarr => "ZARR",
            DstFormat::Mat => "MAT",
            DstFormat::Npz => "NPZ",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl std::fmt::Display for DstFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Body of `POST /download_and_convert`
///
/// `path` is present for single-file requests and omitted for whole-dataset
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertRequest {
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub dst_format: DstFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConvertStatus {
    Success,
    Error,
}

/// Response of `POST /download_and_convert`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertResponse {
    pub status: ConvertStatus,
    /// Opaque token to hand back to `/download`
    #[serde(default)]
    pub file: Option<String>,
    /// Name the service suggests for the converted artifact
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ConvertResponse {
    pub fn success(file: impl Into<String>) -> Self {
        Self {
            status: ConvertStatus::Success,
            file: Some(file.into()),
            filename: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ConvertStatus::Error,
            file: None,
            filename: None,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Download
// ============================================================================

/// Body of `POST /download`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadRequest {
    pub file: String,
}

// ============================================================================
// Tests
// ============================================================================
