// Library root: exposes the batch pipeline so the binary and integration
// tests share one implementation.

pub mod config;
pub mod input;
pub mod output;
pub mod run;
