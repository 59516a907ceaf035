mod file_ops;

pub use file_ops::stage_file;
