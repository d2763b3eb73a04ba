use std::sync::OnceLock;

use regex::Regex;
use shared_types::{ConvertRequest, DstFormat};
use uuid::Uuid;

use crate::error::ResourceParseError;

static FILE_URL_PATTERN: OnceLock<Regex> = OnceLock::new();
static DATASET_URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn file_url_pattern() -> &'static Regex {
    FILE_URL_PATTERN.get_or_init(|| {
        Regex::new(r"/datasets/file/(\d+)/(\d+)\?path=files/(.+)$").expect("valid file pattern")
    })
}

fn dataset_url_pattern() -> &'static Regex {
    DATASET_URL_PATTERN
        .get_or_init(|| Regex::new(r"/datasets/(\d+)").expect("valid dataset pattern"))
}

/// One file inside a published dataset version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub dataset_id: String,
    pub version_id: String,
    /// Path below the dataset's `files/` root
    pub path: String,
}

/// Something the user can ask to have converted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    File(FileRef),
    Dataset { dataset_id: String },
}

impl ResourceRef {
    pub fn dataset_id(&self) -> &str {
        match self {
            ResourceRef::File(file) => &file.dataset_id,
            ResourceRef::Dataset { dataset_id } => dataset_id,
        }
    }

    /// Short human name used in notifications
    pub fn display_name(&self) -> String {
        match self {
            ResourceRef::File(file) => file
                .path
                .rsplit('/')
                .next()
                .unwrap_or(&file.path)
                .to_string(),
            ResourceRef::Dataset { dataset_id } => format!("dataset {dataset_id}"),
        }
    }
}

/// Parse `/datasets/file/<datasetId>/<versionId>?path=files/<path>`.
///
/// The pattern is searched anywhere in `url`, so absolute hrefs parse the
/// same as relative ones.
pub fn parse_file_url(url: &str) -> Result<FileRef, ResourceParseError> {
    let caps = file_url_pattern()
        .captures(url)
        .ok_or_else(|| ResourceParseError::NotAFileUrl(url.to_string()))?;

    Ok(FileRef {
        dataset_id: caps[1].to_string(),
        version_id: caps[2].to_string(),
        path: caps[3].to_string(),
    })
}

/// Read the numeric dataset id out of a page URL (`.../datasets/<digits>...`).
pub fn parse_dataset_id(page_url: &str) -> Result<String, ResourceParseError> {
    dataset_url_pattern()
        .captures(page_url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ResourceParseError::NoDatasetId(page_url.to_string()))
}

/// One user request for one conversion round trip.
///
/// Fields are private; the request cannot change once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    request_id: Uuid,
    target: ResourceRef,
    dst_format: DstFormat,
}

impl ConversionRequest {
    pub fn new(target: ResourceRef, dst_format: DstFormat) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            target,
            dst_format,
        }
    }

    /// Log correlation id
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn target(&self) -> &ResourceRef {
        &self.target
    }

    pub fn dst_format(&self) -> DstFormat {
        self.dst_format
    }

    pub fn to_wire(&self) -> ConvertRequest {
        let path = match &self.target {
            ResourceRef::File(file) => Some(file.path.clone()),
            ResourceRef::Dataset { .. } => None,
        };
        ConvertRequest {
            dataset_id: self.target.dataset_id().to_string(),
            path,
            dst_format: self.dst_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_file_path() {
        let parsed = parse_file_url("/datasets/file/42/7?path=files/sub/dir/data.mat").unwrap();
        assert_eq!(
            parsed,
            FileRef {
                dataset_id: "42".to_string(),
                version_id: "7".to_string(),
                path: "sub/dir/data.mat".to_string(),
            }
        );
    }

    #[test]
    fn parses_absolute_href() {
        let parsed =
            parse_file_url("https://sparc.science/datasets/file/436/1?path=files/primary/a.rhd")
                .unwrap();
        assert_eq!(parsed.dataset_id, "436");
        assert_eq!(parsed.path, "primary/a.rhd");
    }

    #[test]
    fn rejects_non_file_urls() {
        for url in [
            "/datasets/436?type=dataset",
            "/datasets/file/abc/1?path=files/a.mat",
            "/datasets/file/1/1?path=docs/a.mat",
            "/datasets/file/1/1?path=files/",
        ] {
            assert!(
                matches!(parse_file_url(url), Err(ResourceParseError::NotAFileUrl(_))),
                "{url} should not parse"
            );
        }
    }

    #[test]
    fn dataset_id_comes_from_page_url() {
        assert_eq!(
            parse_dataset_id("https://sparc.science/datasets/436?type=dataset").unwrap(),
            "436"
        );
        assert!(parse_dataset_id("https://sparc.science/datasets/").is_err());
        assert!(parse_dataset_id("https://sparc.science/about").is_err());
    }

    #[test]
    fn wire_body_includes_path_only_for_files() {
        let file = ResourceRef::File(parse_file_url("/datasets/file/42/7?path=files/x/y.mat").unwrap());
        let body = ConversionRequest::new(file, DstFormat::Mat).to_wire();
        assert_eq!(body.dataset_id, "42");
        assert_eq!(body.path.as_deref(), Some("x/y.mat"));

        let dataset = ResourceRef::Dataset {
            dataset_id: "42".to_string(),
        };
        let body = ConversionRequest::new(dataset, DstFormat::Zarr).to_wire();
        assert_eq!(body.path, None);
        assert_eq!(body.dst_format, DstFormat::Zarr);
    }

    #[test]
    fn display_name_uses_basename() {
        let file = ResourceRef::File(parse_file_url("/datasets/file/1/2?path=files/a/b/c.h5").unwrap());
        assert_eq!(file.display_name(), "c.h5");
        let dataset = ResourceRef::Dataset {
            dataset_id: "9".to_string(),
        };
        assert_eq!(dataset.display_name(), "dataset 9");
    }

    #[test]
    fn each_request_gets_its_own_id() {
        let target = ResourceRef::Dataset {
            dataset_id: "1".to_string(),
        };
        let a = ConversionRequest::new(target.clone(), DstFormat::Npz);
        let b = ConversionRequest::new(target, DstFormat::Npz);
        assert_ne!(a.request_id(), b.request_id());
    }
}
