pub mod codec;
pub mod common;
pub mod error;
pub mod helpers;
pub mod import;
pub mod message;
pub mod persist;
pub mod render;
pub mod state;
pub mod undo;
pub mod update;
