pub mod analyzer;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod service;
