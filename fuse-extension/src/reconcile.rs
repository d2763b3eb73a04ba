//! Keeps injected controls in step with a host page that rewrites itself.

/// Change notifications exposed by the host environment.
///
/// Implementations call `callback` once per burst of host mutations, after
/// `debounce_ms` without further changes.
pub trait HostMutations {
    fn on_host_mutation(&self, callback: Box<dyn FnMut()>, debounce_ms: u32);
}

pub struct Reconciler;

impl Reconciler {
    /// Run `rebuild` now, then after every settled burst of host mutations.
    ///
    /// The first run covers content that was already rendered before
    /// observation began.
    pub fn start<H, F>(host: &H, debounce_ms: u32, mut rebuild: F)
    where
        H: HostMutations + ?Sized,
        F: FnMut() + 'static,
    {
        rebuild();
        host.on_host_mutation(Box::new(rebuild), debounce_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeHost {
        callback: RefCell<Option<Box<dyn FnMut()>>>,
        debounce_ms: Cell<u32>,
    }

    impl FakeHost {
        fn mutate(&self) {
            if let Some(callback) = self.callback.borrow_mut().as_mut() {
                callback();
            }
        }
    }

    impl HostMutations for FakeHost {
        fn on_host_mutation(&self, callback: Box<dyn FnMut()>, debounce_ms: u32) {
            *self.callback.borrow_mut() = Some(callback);
            self.debounce_ms.set(debounce_ms);
        }
    }

    #[test]
    fn rebuilds_once_at_startup_without_mutations() {
        let host = FakeHost::default();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();

        Reconciler::start(&host, 250, move || counter.set(counter.get() + 1));

        assert_eq!(runs.get(), 1);
        assert_eq!(host.debounce_ms.get(), 250);
    }

    #[test]
    fn every_settled_burst_rebuilds() {
        let host = FakeHost::default();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();

        Reconciler::start(&host, 10, move || counter.set(counter.get() + 1));
        host.mutate();
        host.mutate();

        assert_eq!(runs.get(), 3);
    }
}
