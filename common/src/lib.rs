// Shared modules for the bridge tracer
pub mod chain;
pub mod config;
pub mod shared;
pub mod utils;
