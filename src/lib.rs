pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod geo;
pub mod infra;
pub mod input;
pub mod output;
pub mod runner;
pub mod services;
