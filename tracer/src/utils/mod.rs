pub mod calls;
pub mod config;
