use shared_types::DstFormat;

use crate::resource::{ConversionRequest, ResourceRef};

/// Ownership of the single shared flyout menu.
///
/// At most one resource is active, and only while the flyout is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlyoutState {
    is_open: bool,
    active: Option<ResourceRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyoutTransition {
    Opened,
    Closed,
}

/// Page coordinates for the flyout's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyoutPosition {
    pub left: f64,
    pub top: f64,
}

/// Viewport rectangle of the control that opened the flyout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub left: f64,
    pub bottom: f64,
}

impl FlyoutState {
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn active(&self) -> Option<&ResourceRef> {
        self.active.as_ref()
    }

    /// Activate `resource`, or close if it already owns the open flyout.
    ///
    /// Opening for a different resource takes ownership from the previous one.
    pub fn toggle(&mut self, resource: ResourceRef) -> FlyoutTransition {
        if self.is_open && self.active.as_ref() == Some(&resource) {
            self.close();
            return FlyoutTransition::Closed;
        }
        self.is_open = true;
        self.active = Some(resource);
        FlyoutTransition::Opened
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.active = None;
    }

    /// Request for the active resource in `format`; `None` while closed.
    pub fn resolve(&self, format: DstFormat) -> Option<ConversionRequest> {
        if !self.is_open {
            return None;
        }
        self.active
            .clone()
            .map(|resource| ConversionRequest::new(resource, format))
    }
}

/// The flyout hangs from the control's bottom-left corner, in page space.
pub fn anchor_position(rect: AnchorRect, scroll_x: f64, scroll_y: f64) -> FlyoutPosition {
    FlyoutPosition {
        left: rect.left + scroll_x,
        top: rect.bottom + scroll_y,
    }
}
