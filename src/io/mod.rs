//! File formats owned by the tool: model config JSON, result CSV exports,
//! and the portable forecast JSON.

pub mod config;
pub mod export;
pub mod forecast;
