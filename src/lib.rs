pub mod aggregate;
pub mod cli;
pub mod config;
pub mod core;
pub mod cpu;
pub mod diagnostics;
pub mod engine;
pub mod exit;
pub mod export;
pub mod ingest;
pub mod join;
pub mod rules;
pub mod store;
pub mod tui;
pub mod ui;
