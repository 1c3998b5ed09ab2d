pub mod config;
pub mod credential_store;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod snapshot_repository;
pub mod storage;
pub mod text_generation_client;
