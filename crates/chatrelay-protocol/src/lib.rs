//! Wire types for the downstream chat API and the upstream provider APIs.
//!
//! Only the fields chatrelay reads or writes are modelled; unknown fields are
//! ignored on decode.

pub mod chat;
pub mod gemini;
pub mod openai;

pub use chat::{ChatRole, ConversationTurn};
