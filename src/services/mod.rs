pub mod condition_api;
