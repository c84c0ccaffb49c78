//! Command handlers, kept apart from parsing and configuration merging.

pub mod serve;

pub use serve::ServeCommandHandler;
