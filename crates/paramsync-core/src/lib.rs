pub mod chunk;
pub mod config;
pub mod diff;
pub mod envfile;
pub mod error;
pub mod keys;
pub mod progress;
pub mod retry;
pub mod store;
pub mod sync;
pub mod types;
