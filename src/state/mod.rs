mod app_state;

pub use app_state::{
    ActiveUpload, DatasetPageState, Page, SettingsOutcome, SettingsState, ToastLevel, ToastState,
    UploadState,
};
