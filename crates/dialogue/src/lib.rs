//! # Dialogue Crate
//!
//! The conversation data model for the recommender: turns and roles, the
//! role-tagged context fed to the models, the per-turn action option set,
//! and the penalty state threaded through a conversation.
//!
//! ## Components
//!
//! - **types**: `Role`, `Turn`, `ConversationContext`
//! - **context**: `ContextBuilder` for the tagged, separator-joined string
//! - **options**: `OptionSet` (last entry reserved for "recommend") and
//!   `PenaltyState` (additive bias against repeating an action)
//!
//! ## Example Usage
//!
//! ```
//! use dialogue::{ContextBuilder, OptionSet, PenaltyState, Turn};
//!
//! let history = vec![Turn::user("hi"), Turn::system("hello!")];
//! let builder = ContextBuilder::new("</s>");
//! let texts: Vec<String> = history.iter().map(|t| t.text.clone()).collect();
//! assert_eq!(builder.build(&texts), "User: hi</s>System: hello!");
//!
//! let options = OptionSet::builtin();
//! let state = PenaltyState::fresh(options.len());
//! assert!(state.matches(options.len()));
//! ```

pub mod context;
pub mod options;
pub mod types;

// Re-export commonly used types
pub use context::ContextBuilder;
pub use options::{ActionChoice, OptionSet, PenaltyState, CHOICE_PENALTY};
pub use types::{ConversationContext, Role, Turn};
