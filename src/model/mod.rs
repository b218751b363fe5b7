//! Value types marshaled out of native memory.
//!
//! Every value here is an owned copy; nothing borrows from buffers owned
//! by the engine.

mod info;
mod span;

pub use info::PageInfo;
pub use span::TextSpan;
