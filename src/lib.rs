pub mod app;
pub mod builders;
pub mod cli;
pub mod config;
pub mod errors;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod types;
