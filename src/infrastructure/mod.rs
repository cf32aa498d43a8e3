pub mod config;
pub mod export;
pub mod import;
pub mod repositories;
pub mod storage;
