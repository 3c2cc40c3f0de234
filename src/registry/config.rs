//! Registry configuration

/// Default mailbox capacity per subscriber
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Largest mailbox capacity accepted
pub const MAX_MAILBOX_CAPACITY: usize = 1 << 16;

/// Room registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Always a power of two in `1..=MAX_MAILBOX_CAPACITY`
    mailbox_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber mailbox capacity
    ///
    /// Clamped to `1..=MAX_MAILBOX_CAPACITY` and rounded up to the next power
    /// of two, which is the capacity the underlying channel actually enforces.
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.clamp(1, MAX_MAILBOX_CAPACITY).next_power_of_two();
        self
    }

    /// Messages buffered per subscriber before the oldest is dropped
    pub fn capacity(&self) -> usize {
        self.mailbox_capacity
    }
}
