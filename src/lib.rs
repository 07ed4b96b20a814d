pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod index;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod profile;
pub mod report;
pub mod table;
pub mod util;
