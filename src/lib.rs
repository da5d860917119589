pub mod app;
pub mod base;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod menu;
pub mod models;
pub mod ranking;
pub mod season;
pub mod sink;
pub mod source;
pub mod walker;

pub use error::EngineError;
