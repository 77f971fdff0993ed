//! Track pipeline library - shared modules for all stage binaries.

pub mod context;
pub mod download;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod resolve;
pub mod runner;
pub mod safety;
pub mod search;
pub mod store;
pub mod verify;
