//! Core types for valthera.

mod behavior;
mod context;
mod decision;
mod evaluation;
mod message;
mod recommendation;
mod score;

pub use behavior::*;
pub use context::*;
pub use decision::*;
pub use evaluation::*;
pub use message::*;
pub use recommendation::*;
pub use score::*;
