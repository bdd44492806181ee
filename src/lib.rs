#![warn(clippy::unwrap_used)]

pub mod batch;
pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod memory;
pub mod parse;
pub mod postgres;
pub mod resolver;
pub mod server;
mod templates;
pub mod utils;
pub mod version;
