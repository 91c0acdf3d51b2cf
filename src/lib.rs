pub mod cache;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod export;
pub mod nfz;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod table;
pub mod tui;
