use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether local changes to a dataset have been synced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SyncStatus {
    /// Updated locally, not yet synced
    #[default]
    Pending,
    /// Updated and synced
    Synced,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "Not synced",
            SyncStatus::Synced => "Synced",
        }
    }
}

/// A dataset shown as a card on the datasets page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub image_count: u32,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    pub status: SyncStatus,
    /// Image displayed on the dataset card
    pub cover: PathBuf,
}

impl DatasetRecord {
    /// New empty dataset, not yet synced
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            image_count: 0,
            created_at: now,
            updated_at: now,
            status: SyncStatus::Pending,
            cover: PathBuf::new(),
        }
    }
}
