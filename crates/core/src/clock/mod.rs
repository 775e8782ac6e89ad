/// Monotonic session clock measured in whole milliseconds.
///
/// The application advances it from wall time once per frame; tests advance
/// it manually so that debounce windows, gain fades, and staged transition
/// delays are fully deterministic.
#[derive(Debug, Default, Clone)]
pub struct SessionClock {
    elapsed_ms: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the elapsed session time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Moves the clock forward. The clock never runs backwards.
    pub fn advance(&mut self, delta_ms: u64) {
        self.elapsed_ms += delta_ms;
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }
}
