//! Token merge engine
//!
//! Merges the original SQL text with the accumulated tokens (ascending
//! source offset, one O(n) walk) and the original parameters with the
//! accumulated substitutions (ascending slot index) into one SQL unit.
//! Identical inputs always produce byte-identical units.

use super::token::SqlToken;
use crate::error::{Error, Result};
use crate::types::Value;
use std::collections::HashMap;

/// The immutable result of one rewrite pass: final SQL text and final
/// ordered parameter values, ready for backend execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlUnit {
    pub sql: String,
    pub parameters: Vec<Value>,
}

/// Merges tokens and parameter substitutions into a SQL unit.
///
/// Post-condition: the number of `?` placeholders in the merged text
/// equals the merged parameter count. A mismatch means a decorator broke
/// the slot/placeholder pairing and is surfaced as a fatal
/// rewrite-consistency error, never silently patched.
pub fn merge(
    sql: &str,
    parameters: &[Value],
    tokens: &[SqlToken],
    substitutions: &HashMap<usize, Value>,
) -> Result<SqlUnit> {
    // Stable sort: insertions at the same offset keep registration order.
    let mut ordered: Vec<&SqlToken> = tokens.iter().collect();
    ordered.sort_by_key(|t| (t.start, t.stop));

    let mut merged = String::with_capacity(sql.len());
    let mut cursor = 0;
    for token in ordered {
        merged.push_str(&sql[cursor..token.start]);
        merged.push_str(&token.replacement);
        cursor = token.stop;
    }
    merged.push_str(&sql[cursor..]);

    let merged_parameters: Vec<Value> = parameters
        .iter()
        .enumerate()
        .map(|(slot, original)| match substitutions.get(&slot) {
            Some(replacement) => replacement.clone(),
            None => original.clone(),
        })
        .collect();

    let placeholders = count_placeholders(&merged);
    if placeholders != merged_parameters.len() {
        return Err(Error::PlaceholderMismatch {
            placeholders,
            parameters: merged_parameters.len(),
        });
    }

    Ok(SqlUnit {
        sql: merged,
        parameters: merged_parameters,
    })
}

/// Counts `?` placeholders in SQL text, ignoring occurrences inside
/// single-quoted string literals ('' is the quote escape).
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    for c in sql.chars() {
        match c {
            '\'' => in_string = !in_string,
            '?' if !in_string => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Span;

    fn token(start: usize, stop: usize, replacement: &str) -> SqlToken {
        SqlToken::replacing(Span::new(start, stop), replacement)
    }

    #[test]
    fn merges_tokens_in_offset_order() {
        let sql = "SELECT ssn FROM users WHERE ssn = ?";
        let tokens = vec![token(28, 31, "ssn_cipher"), token(7, 10, "ssn_cipher")];
        let params = vec![Value::from("x")];
        let unit = merge(sql, &params, &tokens, &HashMap::new()).unwrap();
        assert_eq!(unit.sql, "SELECT ssn_cipher FROM users WHERE ssn_cipher = ?");
        assert_eq!(unit.parameters, params);
    }

    #[test]
    fn insertion_tokens_merge_in_registration_order() {
        let sql = "INSERT INTO t (a) VALUES (?)";
        let tokens = vec![
            SqlToken::inserting(16, ", b"),
            SqlToken::inserting(16, ", c"),
        ];
        let params = vec![Value::I64(1)];
        let unit = merge(sql, &params, &tokens, &HashMap::new()).unwrap();
        assert_eq!(unit.sql, "INSERT INTO t (a, b, c) VALUES (?)");
    }

    #[test]
    fn substitutions_apply_in_slot_order() {
        let sql = "INSERT INTO t VALUES (?, ?)";
        let params = vec![Value::I64(1), Value::from("plain")];
        let mut subs = HashMap::new();
        subs.insert(1, Value::Bytea(vec![1, 2, 3]));
        let unit = merge(sql, &params, &[], &subs).unwrap();
        assert_eq!(
            unit.parameters,
            vec![Value::I64(1), Value::Bytea(vec![1, 2, 3])]
        );
    }

    #[test]
    fn placeholder_parity_is_enforced() {
        // A token that swallows a placeholder without adjusting parameters
        // must be caught.
        let sql = "SELECT a FROM t WHERE b = ?";
        let tokens = vec![token(22, 27, "b = 1")];
        let params = vec![Value::I64(1)];
        let err = merge(sql, &params, &tokens, &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::PlaceholderMismatch {
                placeholders: 0,
                parameters: 1
            }
        ));
    }

    #[test]
    fn determinism() {
        let sql = "SELECT ssn FROM users WHERE ssn = ?";
        let tokens = vec![token(7, 10, "ssn_cipher"), token(28, 31, "ssn_cipher")];
        let params = vec![Value::from("x")];
        let a = merge(sql, &params, &tokens, &HashMap::new()).unwrap();
        let b = merge(sql, &params, &tokens, &HashMap::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn placeholders_inside_strings_are_ignored() {
        assert_eq!(count_placeholders("SELECT '?' FROM t WHERE a = ?"), 1);
        assert_eq!(count_placeholders("SELECT 'it''s?' FROM t"), 0);
        assert_eq!(count_placeholders("? ? ?"), 3);
    }
}
