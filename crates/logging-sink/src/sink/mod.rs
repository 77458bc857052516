//! crates/logging-sink/src/sink/mod.rs
//! Handler implementations.

mod memory;
mod null;
mod rotating;
mod stream;

pub use memory::MemoryHandler;
pub use null::NullHandler;
pub use rotating::RotatingFileHandler;
pub use stream::StreamHandler;
