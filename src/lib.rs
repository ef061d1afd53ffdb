// Library surface for the binary and for headless/integration tests.
// Terminal rendering stays in the binary.
pub mod analytics;
pub mod app_dirs;
pub mod config;
pub mod course;
pub mod error;
pub mod hint;
pub mod morse;
pub mod pool;
pub mod progress;
pub mod runtime;
pub mod scores;
pub mod selector;
pub mod session;
pub mod word;
