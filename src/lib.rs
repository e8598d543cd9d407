pub mod config;
pub mod demand;
pub mod engine;
pub mod error;
pub mod insights;
pub mod load;
pub mod output;
pub mod stderr_buffer;
pub mod supply;
pub mod synth;
pub mod tui;
