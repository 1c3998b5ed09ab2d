pub mod error;
pub mod insights;
pub mod models;
pub mod reducer;
pub mod timer;
