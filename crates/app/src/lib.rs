//! Application shell around the Promptcast injection engine: CLI plumbing,
//! configuration, logging, the OS clipboard adapter, the JSONL execution
//! history, and the embedded browser surface.

pub mod clipboard;
pub mod config;
pub mod history;
pub mod notify;
pub mod runtime;
pub mod surface;
pub mod template;
