pub mod catalog;
pub mod operations;
pub mod upload;
