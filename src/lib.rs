pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod services;
