// Library surface for headless/integration tests and reuse.
// Terminal UI types stay in the binary.
pub mod app_dirs;
pub mod classifier;
pub mod coalescer;
pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod landmarks;
pub mod picker;
pub mod pipeline;
pub mod projection;
pub mod recording;
pub mod replay;
pub mod runtime;
pub mod square;
pub mod status;
