pub mod commands;
mod exec;
pub mod writer;

pub use commands::BatchCommand;
pub use writer::{BatchWriter, WriteStats};
