use std::collections::HashSet;

use shared_types::DstFormat;

use crate::matcher::MatchedResources;
use crate::resource::{parse_file_url, ResourceRef};

pub const CONTROL_ID_PREFIX: &str = "sparc-fuse-";

/// Compact per-file control that opens the shared flyout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileControl {
    pub element_id: String,
    pub anchor_index: usize,
    pub resource: ResourceRef,
}

/// Inline format strip next to the whole-dataset label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetControl {
    pub label_index: usize,
    pub resource: ResourceRef,
    pub formats: [DstFormat; 3],
}

/// Desired set of injected controls for one page state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlPlan {
    pub dataset: Option<DatasetControl>,
    pub files: Vec<FileControl>,
}

impl ControlPlan {
    pub fn len(&self) -> usize {
        self.files.len() + usize::from(self.dataset.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn control_id(href: &str) -> String {
    format!("{CONTROL_ID_PREFIX}{href}")
}

/// Map matched resources to the controls that should exist.
///
/// Targets whose URL does not parse are dropped, and duplicate URLs collapse
/// onto the first anchor that carries them.
pub fn plan_controls(matched: &MatchedResources) -> ControlPlan {
    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(matched.file_targets.len());

    for target in &matched.file_targets {
        if !seen.insert(target.href.as_str()) {
            continue;
        }
        match parse_file_url(&target.href) {
            Ok(file) => files.push(FileControl {
                element_id: control_id(&target.href),
                anchor_index: target.anchor_index,
                resource: ResourceRef::File(file),
            }),
            Err(e) => log::debug!("skipping anchor {}: {e}", target.anchor_index),
        }
    }

    let dataset = matched.dataset_target.as_ref().map(|target| DatasetControl {
        label_index: target.label_index,
        resource: ResourceRef::Dataset {
            dataset_id: target.dataset_id.clone(),
        },
        formats: DstFormat::ALL,
    });

    ControlPlan { dataset, files }
}
