mod dataset;
mod upload;

pub use dataset::{DatasetRecord, SyncStatus};
pub use upload::{UploadRecord, UploadStatus};
