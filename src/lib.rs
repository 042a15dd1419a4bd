// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod utils;

// Re-export the entry points hosts reach for first
pub use error::AppError;
pub use state::EngineContext;
