mod dataset_page;
mod settings_page;
mod sidebar;
mod toast;
mod upload_page;

pub use dataset_page::{render_create_dataset_dialog, render_dataset_page};
pub use settings_page::render_settings_page;
pub use sidebar::render_sidebar;
pub use toast::render_toasts;
pub use upload_page::render_upload_page;
