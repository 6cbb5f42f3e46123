//! TOML configuration.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:3000"
//!
//! [emitter]
//! chunk_size = 4096
//! ```
//!
//! Every key is optional; missing ones take the defaults shown above.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::emit::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub emitter: EmitterConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitterConfig {
    /// Upper bound on the bytes read from a body per write. Must be > 0.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_addr() }
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self { chunk_size: default_chunk_size() }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Config = toml::from_str(source)
            .map_err(|e| Error::Config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.emitter.chunk_size == 0 {
            return Err(Error::Config("emitter.chunk_size must be greater than zero".to_owned()));
        }
        Ok(())
    }
}
