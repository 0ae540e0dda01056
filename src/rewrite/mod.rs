//! SQL rewrite: tokens, per-pass context, and the merge engine
//!
//! A rewrite pass accumulates substitution instructions (tokens over the
//! SQL text, value substitutions over the parameter slots) from a chain
//! of decorators, then merges them deterministically into one SQL unit.

mod context;
mod engine;
mod token;

use crate::error::Result;
use crate::semantic::StatementContext;

pub use context::RewriteContext;
pub use engine::{SqlUnit, count_placeholders};
pub use token::SqlToken;

/// A rewrite decorator contributes tokens and parameter substitutions to
/// a rewrite context. Decorators compose by ordered registration; none
/// may mutate another's contributions.
pub trait RewriteDecorator {
    fn decorate(
        &self,
        statement: &StatementContext,
        context: &mut RewriteContext<'_>,
    ) -> Result<()>;
}
