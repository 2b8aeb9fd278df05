//! XML serialization: output configuration, the text buffer, and the
//! tree-walking SVG emitter.

pub mod config;
pub(crate) mod svg;
pub(crate) mod xml;

pub use config::{ConfigError, WriteConfig};
