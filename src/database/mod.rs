//! Data providers for the datasets and upload pages
//!
//! Only a synthetic provider exists today; the UI depends on the traits so a
//! real backend can be dropped in later.

mod mock;

pub use mock::MockDatabase;

use crate::models::{DatasetRecord, UploadRecord};

/// Source of the dataset cards
pub trait DatasetProvider {
    fn list_datasets(&self) -> Vec<DatasetRecord>;
}

/// Source of the upload history table
pub trait UploadHistoryProvider {
    fn list_upload_history(&self) -> Vec<UploadRecord>;
}
