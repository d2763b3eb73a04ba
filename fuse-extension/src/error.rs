use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service URL must start with http:// or https://, got '{0}'")]
    InvalidServiceUrl(String),
    #[error("invalid {key} '{value}': expected a non-negative integer")]
    InvalidNumber { key: &'static str, value: String },
    #[error("no file extensions are whitelisted")]
    EmptyWhitelist,
}

/// A URL that does not address a convertible resource.
///
/// Never shown to the user; the caller skips the resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceParseError {
    #[error("not a dataset file URL: {0}")]
    NotAFileUrl(String),
    #[error("no dataset id in page URL: {0}")]
    NoDatasetId(String),
}

/// Terminal failure of one conversion round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Network failure, non-2xx or undecodable reply at the JSON stage.
    #[error("conversion service unreachable: {0}")]
    Transport(String),
    /// The service answered `status: error`.
    #[error("conversion rejected: {0}")]
    Rejected(String),
    /// The service answered `status: success` without a file token.
    #[error("conversion response carried no file token")]
    MissingToken,
    /// `/download` failed or answered non-2xx.
    #[error("artifact download failed: {0}")]
    Download(String),
    /// The browser save could not be triggered.
    #[error("could not save artifact: {0}")]
    Save(String),
}

impl ConversionError {
    /// Text shown in the danger notification.
    pub fn user_message(&self) -> String {
        match self {
            ConversionError::Transport(_) => {
                "Could not reach the conversion service. Is it running?".to_string()
            }
            ConversionError::Rejected(message) => format!("Conversion failed: {message}"),
            ConversionError::MissingToken => {
                "Conversion failed: the service did not return a file".to_string()
            }
            ConversionError::Download(_) => "Failed to download the converted file".to_string(),
            ConversionError::Save(_) => "Could not save the converted file".to_string(),
        }
    }
}
