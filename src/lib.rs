// Library crate exposing modules for the binary, integration tests and benches

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod ranker;
pub mod repository;
pub mod scrape;
pub mod search;
pub mod util;
