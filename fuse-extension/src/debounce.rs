/// Collapses a burst of events into one trailing action.
///
/// Every event bumps the generation; a timer armed for an older generation
/// finds it superseded when it fires.
#[derive(Debug, Default)]
pub struct Debouncer {
    generation: u64,
}

impl Debouncer {
    /// Record an event and return the generation its timer should settle.
    pub fn touch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// True when no event arrived after the one that armed this timer.
    pub fn settle(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
