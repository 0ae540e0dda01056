//! Semantic facts about a parsed statement

mod context;

pub use context::{StatementContext, StatementKind};
