//! Persistence seam for the wheel [`Configuration`].
//!
//! The record is always written whole; a stored record that cannot be decoded
//! loads as the default configuration.

use alloc::vec::Vec;

use crate::utils::controllers::mapper::Configuration;

/// Errors raised while persisting a configuration.
#[derive(Debug)]
pub enum StoreError {
    Encode(serde_json::Error),
    /// Backend refused the write (flash full, bus fault, ...).
    Backend,
}

/// Load/save/reset of the persisted configuration record.
pub trait ConfigStore {
    /// Return the stored record, or the default when nothing valid is stored.
    fn load(&mut self) -> Configuration;

    fn save(
        &mut self,
        config: &Configuration,
    ) -> Result<(), StoreError>;

    fn reset(&mut self) -> Result<(), StoreError> {
        self.save(&Configuration::default())
    }
}

/// RAM-backed store holding the JSON-encoded record.
///
/// Encodes exactly what a flash-backed store would write, so round trips go
/// through the same serialization.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw stored record, e.g. one read out of flash.
    pub fn with_record(record: Vec<u8>) -> Self {
        MemoryStore {
            record: Some(record),
        }
    }

    pub fn record(&self) -> Option<&[u8]> {
        self.record.as_deref()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&mut self) -> Configuration {
        let Some(bytes) = self.record.as_deref() else {
            tracing::info!("no stored configuration, using defaults");
            return Configuration::default();
        };
        match serde_json::from_slice::<Configuration>(bytes) {
            Ok(config) => {
                tracing::info!(?config, "configuration loaded");
                config
            }
            Err(error) => {
                tracing::warn!(?error, "stored configuration unreadable, using defaults");
                Configuration::default()
            }
        }
    }

    fn save(
        &mut self,
        config: &Configuration,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(config).map_err(StoreError::Encode)?;
        self.record = Some(bytes);
        tracing::info!(?config, "configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::controllers::mapper::{DriveMode, MotorMapper};

    #[test]
    fn test_empty_store_loads_default() {
        assert_eq!(MemoryStore::new().load(), Configuration::default());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut mapper = MotorMapper::default();
        mapper.set_mapping(1, 4);
        mapper.set_mapping(4, 1);
        mapper.set_invert(2, true);
        mapper.set_invert(3, true);
        mapper.set_mode(DriveMode::Tank);

        let mut store = MemoryStore::new();
        store.save(mapper.config()).unwrap();
        assert_eq!(store.load(), *mapper.config());
    }

    #[test]
    fn test_corrupt_record_loads_default() {
        let mut store = MemoryStore::with_record(b"{\"mapping\":[1,2".to_vec());
        assert_eq!(store.load(), Configuration::default());

        let mut store = MemoryStore::with_record(
            br#"{"mapping":[0,2,3,4],"invert":[false,false,false,false],"mode":"omni"}"#.to_vec(),
        );
        assert_eq!(store.load(), Configuration::default());
    }

    #[test]
    fn test_reset_persists_default() {
        let mut config = Configuration::default();
        config.mode = DriveMode::Tank;
        let mut store = MemoryStore::new();
        store.save(&config).unwrap();
        store.reset().unwrap();
        assert_eq!(store.load(), Configuration::default());
    }
}
