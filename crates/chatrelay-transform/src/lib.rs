//! Text transformations applied around an upstream call: the attribution
//! override, history windowing with outbound sanitization, reply rewriting
//! and chat-title prompts.

pub mod attribution;
pub mod rewrite;
pub mod sanitize;
pub mod title;
pub mod window;

pub use attribution::{AttributionOverride, latest_user_prompt};
pub use rewrite::{RewriteRule, RuleSet, rewrite};
pub use sanitize::Sanitizer;
pub use window::{BoundedConversation, WindowError, WindowPolicy, window};
