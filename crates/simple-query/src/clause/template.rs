//! Placeholder substitution for caller-written SQL fragments.
//!
//! `?` placeholders are filled positionally and `:name` placeholders by name. Values are
//! rendered as escaped literals for the target dialect. Placeholders inside quoted strings
//! or quoted identifiers are left alone, as are `::type` casts.

use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Substitute `?` placeholders with `values`, in order.
pub(crate) fn render_positional(
    dialect: &Dialect,
    template: &str,
    values: &[Value],
) -> QueryResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut used = 0usize;
    let mut error = None;

    scan(template, &mut out, |token, out| match token {
        Token::Question => {
            if let Some(value) = values.get(used) {
                if let Err(e) = dialect.write_literal(value, out) {
                    error.get_or_insert(e);
                }
            }
            used += 1;
        }
        Token::Named(name) => {
            out.push(':');
            out.push_str(name);
        }
    });

    if let Some(e) = error {
        return Err(e);
    }
    if used != values.len() {
        return Err(QueryError::invalid_argument(format!(
            "wrong number of bind variables ({} for {}) in: {template}",
            values.len(),
            used
        )));
    }
    Ok(out)
}

/// Substitute `:name` placeholders with the matching entry of `values`.
pub(crate) fn render_named(
    dialect: &Dialect,
    template: &str,
    values: &[(String, Value)],
) -> QueryResult<String> {
    let lookup: HashMap<&str, &Value> = values.iter().map(|(k, v)| (k.as_str(), v)).collect();
    let mut out = String::with_capacity(template.len());
    let mut error = None;

    scan(template, &mut out, |token, out| match token {
        Token::Named(name) => match lookup.get(name) {
            Some(value) => {
                if let Err(e) = dialect.write_literal(value, out) {
                    error.get_or_insert(e);
                }
            }
            None => {
                error.get_or_insert(QueryError::invalid_argument(format!(
                    "missing value for :{name} in: {template}"
                )));
            }
        },
        Token::Question => out.push('?'),
    });

    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

enum Token<'a> {
    Question,
    Named(&'a str),
}

fn scan<'a>(template: &'a str, out: &mut String, mut on_token: impl FnMut(Token<'a>, &mut String)) {
    let bytes = template.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    let mut literal_start = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => {
                quote = Some(b);
                i += 1;
            }
            b'?' => {
                out.push_str(&template[literal_start..i]);
                on_token(Token::Question, out);
                i += 1;
                literal_start = i;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b':' if bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_') =>
            {
                out.push_str(&template[literal_start..i]);
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                    end += 1;
                }
                on_token(Token::Named(&template[start..end]), out);
                i = end;
                literal_start = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&template[literal_start..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_substitution() {
        let sql = render_positional(
            &Dialect::Postgres,
            "founded_year > ? AND name = ?",
            &[2000.into(), "O'Hare".into()],
        )
        .unwrap();
        assert_eq!(sql, "founded_year > 2000 AND name = 'O''Hare'");
    }

    #[test]
    fn positional_count_mismatch() {
        let err = render_positional(&Dialect::Postgres, "a = ? AND b = ?", &[1.into()]).unwrap_err();
        assert!(err.to_string().contains("wrong number of bind variables (1 for 2)"));

        let err = render_positional(&Dialect::Postgres, "a = 1", &[1.into()]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn positional_skips_quoted_question_marks() {
        let sql = render_positional(&Dialect::Postgres, "note <> '?' AND id = ?", &[3.into()]).unwrap();
        assert_eq!(sql, "note <> '?' AND id = 3");
    }

    #[test]
    fn positional_list_expands() {
        let ids: Value = [1, 2, 3].into_iter().collect();
        let sql = render_positional(&Dialect::Postgres, "id IN (?)", &[ids]).unwrap();
        assert_eq!(sql, "id IN (1, 2, 3)");
    }

    #[test]
    fn named_substitution() {
        let sql = render_named(
            &Dialect::Postgres,
            "industry = :industry AND founded_year <= :max_year",
            &[
                ("industry".to_string(), "Tech".into()),
                ("max_year".to_string(), 2010.into()),
            ],
        )
        .unwrap();
        assert_eq!(sql, "industry = 'Tech' AND founded_year <= 2010");
    }

    #[test]
    fn named_keeps_casts_and_quoted_text() {
        let sql = render_named(
            &Dialect::Postgres,
            "created_at::date = :day AND label = ':day'",
            &[("day".to_string(), "2024-01-01".into())],
        )
        .unwrap();
        assert_eq!(sql, "created_at::date = '2024-01-01' AND label = ':day'");
    }

    #[test]
    fn named_missing_value() {
        let err = render_named(&Dialect::Postgres, "a = :a", &[]).unwrap_err();
        assert!(err.to_string().contains("missing value for :a"));
    }
}
