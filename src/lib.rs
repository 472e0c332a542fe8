pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod io;
pub mod rule_source;
pub mod store;
