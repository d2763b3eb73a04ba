use shared_types::{CONVERT_ENDPOINT, DOWNLOAD_ENDPOINT};

use crate::error::ConfigError;

pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_LINK_PREFIX: &str = "/datasets";
pub const DEFAULT_DATASET_LABEL: &str = "Download Full Dataset";
pub const DEFAULT_DEBOUNCE_MS: u32 = 250;
pub const DEFAULT_SUCCESS_TOAST_MS: u32 = 4_000;
pub const DEFAULT_FAILURE_TOAST_MS: u32 = 6_000;

/// Time-series formats the service knows how to map.
pub const DATA_EXTENSIONS: &[&str] = &[
    ".mat", ".smr", ".csv", ".adicht", ".hdf5", ".h5", ".ets", ".abf", ".rhd", ".nev", ".ns5",
    ".ns2", ".ns1", ".smrx", ".wav", ".acq", ".tbk", ".tdx", ".tev", ".tin", ".tnt", ".tsq",
    ".eeg", ".vmrk", ".vhdr", ".sev", ".sam", ".pss", ".psmethod",
];

/// Imaging formats the service knows how to convert.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".tif", ".tiff", ".czi", ".nd2", ".lsm", ".jpx", ".svs", ".ims", ".png", ".jpg", ".jpeg",
    ".bmp", ".vsi", ".jp2", ".roi", ".dm3", ".pxp", ".ipf", ".lif", ".ima", ".mrxs", ".obj",
    ".avi", ".exf", ".cxd",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuseConfig {
    /// Base URL of the conversion service
    pub service_base_url: String,
    /// href prefix an anchor needs before it is considered at all
    pub link_prefix: String,
    /// Exact text of the host's whole-dataset download label
    pub dataset_label: String,
    pub data_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    /// Quiet period before a burst of host mutations triggers a rebuild
    pub debounce_ms: u32,
    pub success_toast_ms: u32,
    pub failure_toast_ms: u32,
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            service_base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            dataset_label: DEFAULT_DATASET_LABEL.to_string(),
            data_extensions: DATA_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            success_toast_ms: DEFAULT_SUCCESS_TOAST_MS,
            failure_toast_ms: DEFAULT_FAILURE_TOAST_MS,
        }
    }
}

impl FuseConfig {
    /// Defaults, overridden by values baked in at build time.
    ///
    /// `SPARC_FUSE_SERVICE_URL` and `SPARC_FUSE_DEBOUNCE_MS` are read with
    /// `option_env!`, so they must be set when the wasm bundle is compiled.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::with_overrides(
            option_env!("SPARC_FUSE_SERVICE_URL"),
            option_env!("SPARC_FUSE_DEBOUNCE_MS"),
        )
    }

    fn with_overrides(
        service_url: Option<&str>,
        debounce_ms: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = service_url {
            config.service_base_url = url.trim().to_string();
        }
        if let Some(raw) = debounce_ms {
            config.debounce_ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "SPARC_FUSE_DEBOUNCE_MS",
                    value: raw.to_string(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.service_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidServiceUrl(url.clone()));
        }
        if self.data_extensions.is_empty() && self.image_extensions.is_empty() {
            return Err(ConfigError::EmptyWhitelist);
        }
        Ok(())
    }

    pub fn convert_url(&self) -> String {
        self.endpoint(CONVERT_ENDPOINT)
    }

    pub fn download_url(&self) -> String {
        self.endpoint(DOWNLOAD_ENDPOINT)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.service_base_url.trim_end_matches('/'), path)
    }

    /// Case-sensitive suffix test against both whitelists.
    ///
    /// Query strings and fragments are not stripped: `data.mat?dl=1` does not
    /// match `.mat`.
    pub fn is_convertible_href(&self, href: &str) -> bool {
        self.data_extensions
            .iter()
            .chain(self.image_extensions.iter())
            .any(|ext| href.ends_with(ext.as_str()))
    }
}
