//! Finds the convertible resources on a page.
//!
//! Works on a [`PageSnapshot`] rather than the live document so the matching
//! rules can be exercised without a browser. `dom::scan` produces the
//! snapshot.

use crate::config::FuseConfig;
use crate::resource::parse_dataset_id;

/// One `<a>` element as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnchorSnapshot {
    /// Resolved URL (the `href` property); identity of the resource
    pub href: String,
    /// The literal `href` attribute, used for the prefix test
    pub raw_href: String,
    /// Whether the anchor sits inside a `<tr>`
    pub in_table_row: bool,
    /// Whether that row's last cell has a container to attach a control to
    pub has_trailing_cell: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSnapshot {
    pub page_url: String,
    pub anchors: Vec<AnchorSnapshot>,
    /// Trimmed text of every candidate label element, in document order
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub anchor_index: usize,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetTarget {
    pub label_index: usize,
    pub dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchedResources {
    pub file_targets: Vec<FileTarget>,
    pub dataset_target: Option<DatasetTarget>,
}

pub fn match_resources(snapshot: &PageSnapshot, config: &FuseConfig) -> MatchedResources {
    let file_targets = snapshot
        .anchors
        .iter()
        .enumerate()
        .filter(|(_, anchor)| is_file_anchor(anchor, config))
        .map(|(anchor_index, anchor)| FileTarget {
            anchor_index,
            href: anchor.href.clone(),
        })
        .collect();

    MatchedResources {
        file_targets,
        dataset_target: match_dataset(snapshot, config),
    }
}

fn is_file_anchor(anchor: &AnchorSnapshot, config: &FuseConfig) -> bool {
    anchor.raw_href.starts_with(&config.link_prefix)
        && anchor.in_table_row
        && anchor.has_trailing_cell
        && config.is_convertible_href(&anchor.href)
}

fn match_dataset(snapshot: &PageSnapshot, config: &FuseConfig) -> Option<DatasetTarget> {
    let label_index = snapshot
        .labels
        .iter()
        .position(|text| text.trim() == config.dataset_label)?;

    match parse_dataset_id(&snapshot.page_url) {
        Ok(dataset_id) => Some(DatasetTarget {
            label_index,
            dataset_id,
        }),
        Err(e) => {
            log::debug!("dataset label present but {e}");
            None
        }
    }
}
