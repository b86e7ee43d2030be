// gmark/src/lib.rs
#![crate_type = "lib"]
#![crate_name = "gmark"]

// Core modules
pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

// Client side
pub mod client;

// CLI modules
pub mod cli;
pub mod config;
pub mod exitcode;
pub mod util;
