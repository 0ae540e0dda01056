//! Per-execution rewrite workspace

use super::engine;
use super::token::SqlToken;
use crate::error::{Error, Result};
use crate::rewrite::SqlUnit;
use crate::types::Value;
use std::collections::HashMap;

/// The mutable workspace for one rewrite pass: the original SQL text and
/// parameters, plus the accumulated tokens and parameter substitutions.
///
/// Tokens are validated for overlap as they are added; parameter
/// substitutions replace a slot's value but never the placeholder count.
/// `finalize` is idempotent until a new contribution invalidates the
/// cached result.
pub struct RewriteContext<'a> {
    sql: &'a str,
    parameters: &'a [Value],
    tokens: Vec<SqlToken>,
    substitutions: HashMap<usize, Value>,
    finalized: Option<SqlUnit>,
}

impl<'a> RewriteContext<'a> {
    pub fn new(sql: &'a str, parameters: &'a [Value]) -> Self {
        Self {
            sql,
            parameters,
            tokens: Vec::new(),
            substitutions: HashMap::new(),
            finalized: None,
        }
    }

    /// The original SQL text.
    pub fn sql(&self) -> &str {
        self.sql
    }

    /// The original parameters, before any substitution.
    pub fn parameters(&self) -> &[Value] {
        self.parameters
    }

    /// Adds a text substitution token. Fails fast if it overlaps a token
    /// already contributed, or falls outside the SQL text.
    pub fn add_token(&mut self, token: SqlToken) -> Result<()> {
        if token.start > token.stop || token.stop > self.sql.len() {
            return Err(Error::Internal(format!(
                "token range [{}, {}) outside SQL of length {}",
                token.start,
                token.stop,
                self.sql.len()
            )));
        }
        if !self.sql.is_char_boundary(token.start) || !self.sql.is_char_boundary(token.stop) {
            return Err(Error::Internal(format!(
                "token range [{}, {}) not on character boundaries",
                token.start, token.stop
            )));
        }
        if let Some(existing) = self.tokens.iter().find(|t| t.overlaps(&token)) {
            return Err(Error::TokenOverlap(
                existing.start,
                existing.stop,
                token.start,
                token.stop,
            ));
        }
        self.tokens.push(token);
        self.finalized = None;
        Ok(())
    }

    /// Registers a replacement value for the given parameter slot. A slot
    /// may be substituted at most once per pass.
    pub fn add_parameter_substitution(&mut self, slot: usize, value: Value) -> Result<()> {
        if slot >= self.parameters.len() {
            return Err(Error::Internal(format!(
                "parameter substitution for slot {slot}, but only {} parameters bound",
                self.parameters.len()
            )));
        }
        if self.substitutions.insert(slot, value).is_some() {
            return Err(Error::Internal(format!(
                "parameter slot {slot} substituted twice in one rewrite pass"
            )));
        }
        self.finalized = None;
        Ok(())
    }

    /// Merges the accumulated tokens and substitutions into a SQL unit.
    /// Idempotent: calling it again without new contributions returns the
    /// same unit.
    pub fn finalize(&mut self) -> Result<SqlUnit> {
        if let Some(unit) = &self.finalized {
            return Ok(unit.clone());
        }
        let unit = engine::merge(self.sql, self.parameters, &self.tokens, &self.substitutions)?;
        self.finalized = Some(unit.clone());
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Span;

    #[test]
    fn overlapping_tokens_fail_fast() {
        let mut ctx = RewriteContext::new("SELECT a FROM t", &[]);
        ctx.add_token(SqlToken::replacing(Span::new(7, 8), "b")).unwrap();
        let err = ctx
            .add_token(SqlToken::replacing(Span::new(7, 8), "c"))
            .unwrap_err();
        assert!(matches!(err, Error::TokenOverlap(7, 8, 7, 8)));
    }

    #[test]
    fn out_of_range_token_is_internal_error() {
        let mut ctx = RewriteContext::new("SELECT 1", &[]);
        let err = ctx
            .add_token(SqlToken::replacing(Span::new(5, 99), "x"))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn duplicate_substitution_fails() {
        let params = vec![Value::I64(1)];
        let mut ctx = RewriteContext::new("SELECT ?", &params);
        ctx.add_parameter_substitution(0, Value::I64(2)).unwrap();
        assert!(ctx.add_parameter_substitution(0, Value::I64(3)).is_err());
    }

    #[test]
    fn finalize_is_idempotent() {
        let params = vec![Value::from("secret")];
        let mut ctx = RewriteContext::new("SELECT a FROM t WHERE b = ?", &params);
        ctx.add_token(SqlToken::replacing(Span::new(7, 8), "a_cipher"))
            .unwrap();
        let first = ctx.finalize().unwrap();
        let second = ctx.finalize().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sql, "SELECT a_cipher FROM t WHERE b = ?");
    }
}
