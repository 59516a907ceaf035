use chrono::{Duration, Local, NaiveDate, TimeZone};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::debug;

use super::{DatasetProvider, UploadHistoryProvider};
use crate::models::{DatasetRecord, SyncStatus, UploadRecord, UploadStatus};

const DATASET_COUNT: u32 = 20;
const HISTORY_COUNT: u64 = 200;

/// Provider returning generated placeholder records
pub struct MockDatabase {
    rng: Mutex<StdRng>,
    cover: PathBuf,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            cover: PathBuf::new(),
        }
    }

    /// Deterministic provider for tests
    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            cover: PathBuf::new(),
        }
    }

    /// Cover image used for every generated dataset
    pub fn with_cover(mut self, cover: impl Into<PathBuf>) -> Self {
        self.cover = cover.into();
        self
    }
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetProvider for MockDatabase {
    fn list_datasets(&self) -> Vec<DatasetRecord> {
        let mut rng = self.rng.lock();
        let now = Local::now();

        let datasets: Vec<DatasetRecord> = (0..DATASET_COUNT)
            .map(|i| DatasetRecord {
                id: i,
                name: format!("Dataset {}", i),
                description: format!("Description {}", i),
                image_count: rng.gen_range(0..i * 1000 + 100),
                created_at: now,
                updated_at: now + Duration::hours(i64::from(i) * 20),
                status: SyncStatus::Synced,
                cover: self.cover.clone(),
            })
            .collect();

        debug!("Generated {} placeholder datasets", datasets.len());
        datasets
    }
}

impl UploadHistoryProvider for MockDatabase {
    fn list_upload_history(&self) -> Vec<UploadRecord> {
        let uploaded_at = NaiveDate::from_ymd_opt(2023, 10, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .and_then(|dt| Local.from_local_datetime(&dt).earliest())
            .unwrap_or_else(Local::now);

        (0..HISTORY_COUNT)
            .map(|i| UploadRecord {
                image_name: format!("image{}", i),
                dataset_name: i.to_string(),
                image_path: PathBuf::from(format!("path/to/image{}", i)),
                size_bytes: i * 1024 * 1024,
                uploaded_at,
                status: if i % 2 == 0 {
                    UploadStatus::Succeeded
                } else {
                    UploadStatus::Failed
                },
            })
            .collect()
    }
}
