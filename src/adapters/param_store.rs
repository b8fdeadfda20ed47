//! In-memory parameter store.
//!
//! Implements [`ConfigPort`] by keeping the configuration as a `postcard`
//! blob, the same encoding a flash-backed store would write.  Configs are
//! validated before they are accepted.

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::RscConfig;
use crate::error::ConfigError;

/// Parameter store holding one encoded [`RscConfig`].
#[derive(Debug, Default)]
pub struct MemoryParamStore {
    blob: Option<Vec<u8>>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes as-is, bypassing validation.
    pub fn with_raw_blob(bytes: Vec<u8>) -> Self {
        Self { blob: Some(bytes) }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_none()
    }

    /// Drop the stored config; the next load returns defaults.
    pub fn erase(&mut self) {
        self.blob = None;
    }
}

impl ConfigPort for MemoryParamStore {
    fn load(&self) -> Result<RscConfig, ConfigError> {
        let Some(bytes) = &self.blob else {
            info!("param store: no stored config, using defaults");
            return Ok(RscConfig::default());
        };

        let cfg: RscConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("param store: stored config invalid ({e})");
            return Err(e);
        }
        info!("param store: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&mut self, config: &RscConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("param store: config saved ({} bytes)", bytes.len());
        self.blob = Some(bytes);
        Ok(())
    }
}
