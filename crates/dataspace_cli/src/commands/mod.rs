pub mod aggregate;
pub mod config;
pub mod dataset;
