pub mod batch;
pub mod classify;
pub mod errors;
pub mod export;
pub mod processor;
pub mod runner;
pub mod sentiment;
pub mod timing;
pub mod utils;
