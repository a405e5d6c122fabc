//! Mapping module - binds raw controller slots to semantic event names

pub mod config;
pub mod table;

pub use config::{Config, ConfigError};
pub use table::{AxisNames, ControllerMapping};
