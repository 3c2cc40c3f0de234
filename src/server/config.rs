//! Service configuration

use crate::registry::RegistryConfig;

/// Default limit on a message body, in bytes
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 4096;

/// Default limit on a room ID, in bytes
pub const DEFAULT_MAX_ROOM_ID_LEN: usize = 128;

/// Chat service configuration options
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Room registry settings
    pub registry: RegistryConfig,

    /// Longest accepted message body, in bytes
    pub max_content_bytes: usize,

    /// Longest accepted room ID, in bytes
    pub max_room_id_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            max_room_id_len: DEFAULT_MAX_ROOM_ID_LEN,
        }
    }
}

impl ServiceConfig {
    /// Set the per-subscriber mailbox capacity
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.registry = self.registry.mailbox_capacity(capacity);
        self
    }

    /// Set the message body limit
    pub fn max_content_bytes(mut self, max: usize) -> Self {
        self.max_content_bytes = max;
        self
    }

    /// Set the room ID length limit
    pub fn max_room_id_len(mut self, max: usize) -> Self {
        self.max_room_id_len = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::config::DEFAULT_MAILBOX_CAPACITY;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();

        assert_eq!(config.registry.capacity(), DEFAULT_MAILBOX_CAPACITY);
        assert_eq!(config.max_content_bytes, DEFAULT_MAX_CONTENT_BYTES);
        assert_eq!(config.max_room_id_len, DEFAULT_MAX_ROOM_ID_LEN);
    }

    #[test]
    fn test_builder_mailbox_capacity() {
        let config = ServiceConfig::default().mailbox_capacity(10);

        assert_eq!(config.registry.capacity(), 16);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ServiceConfig::default()
            .mailbox_capacity(8)
            .max_content_bytes(256)
            .max_room_id_len(32);

        assert_eq!(config.registry.capacity(), 8);
        assert_eq!(config.max_content_bytes, 256);
        assert_eq!(config.max_room_id_len, 32);
    }
}
