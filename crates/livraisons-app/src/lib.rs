//! Application service layer - workspace state, use cases, config

pub mod app;
pub mod config;
pub mod repository;

pub use app::{Notice, NoticeLevel, Workspace};
pub use config::Config;
