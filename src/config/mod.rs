//! Application configuration backed by a YAML file
//!
//! This module provides:
//! - The typed configuration record and its sections
//! - Named, type-checked field updates that are written straight back to disk
//! - Background reload when the file is edited by another process

mod document;
mod error;
mod fields;
mod schema;
mod store;
mod watcher;

pub use fields::{FieldValue, Section};
pub use schema::{AppSection, DatasetSection};
pub use store::{ConfigEvent, ConfigStore};

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.yaml";
