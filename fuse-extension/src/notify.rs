/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl ToastKind {
    pub fn css_class(self) -> &'static str {
        match self {
            ToastKind::Success => "sparc-fuse-toast--success",
            ToastKind::Info => "sparc-fuse-toast--info",
            ToastKind::Warning => "sparc-fuse-toast--warning",
            ToastKind::Danger => "sparc-fuse-toast--danger",
        }
    }
}

/// Shows transient status messages. Only the newest one stays visible.
///
/// `duration_ms == 0` keeps the message up until the next `notify`.
pub trait Notifier {
    fn notify(&self, message: &str, kind: ToastKind, duration_ms: u32);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub generation: u64,
    pub message: String,
    pub kind: ToastKind,
    /// `None` for messages that wait to be replaced
    pub duration_ms: Option<u32>,
}

/// The one visible notification and its expiry bookkeeping.
#[derive(Debug, Default)]
pub struct NotificationSlot {
    generation: u64,
    current: Option<Toast>,
}

impl NotificationSlot {
    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    /// Replace whatever is showing. Returns the new toast.
    pub fn show(&mut self, message: &str, kind: ToastKind, duration_ms: u32) -> &Toast {
        self.generation += 1;
        self.current.insert(Toast {
            generation: self.generation,
            message: message.to_string(),
            kind,
            duration_ms: (duration_ms > 0).then_some(duration_ms),
        })
    }

    /// Dismiss the toast of `generation` if it is still the visible one.
    ///
    /// Expiry timers of replaced toasts fire into a no-op here.
    pub fn expire(&mut self, generation: u64) -> bool {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|toast| toast.generation == generation && toast.duration_ms.is_some());
        if is_current {
            self.current = None;
        }
        is_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_toast_replaces_previous() {
        let mut slot = NotificationSlot::default();
        slot.show("Converting a.mat", ToastKind::Info, 0);
        slot.show("Saved a.npz", ToastKind::Success, 4_000);

        let current = slot.current().unwrap();
        assert_eq!(current.message, "Saved a.npz");
        assert_eq!(current.kind, ToastKind::Success);
    }

    #[test]
    fn persistent_toast_ignores_expiry() {
        let mut slot = NotificationSlot::default();
        let generation = slot.show("Converting", ToastKind::Info, 0).generation;
        assert!(!slot.expire(generation));
        assert!(slot.current().is_some());
    }

    #[test]
    fn stale_timer_does_not_dismiss_replacement() {
        let mut slot = NotificationSlot::default();
        let first = slot.show("first", ToastKind::Warning, 1_000).generation;
        let second = slot.show("second", ToastKind::Danger, 1_000).generation;

        assert!(!slot.expire(first));
        assert_eq!(slot.current().unwrap().message, "second");
        assert!(slot.expire(second));
        assert!(slot.current().is_none());
    }
}
