//! Validated SQL identifiers.
//!
//! [`Ident`] is a table or column reference (`users`, `users.name`, `"Users"."Name"`).
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A SQL identifier, possibly dotted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> QueryResult<Self> {
        if s.is_empty() {
            return Err(QueryError::invalid_argument("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(QueryError::invalid_argument(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') if chars.peek().is_none() => {
                        return Err(QueryError::invalid_argument(format!(
                            "Trailing '.' in identifier: {s}"
                        )));
                    }
                    Some('.') => {}
                    Some(c) => {
                        return Err(QueryError::invalid_argument(format!(
                            "Expected '.' between identifier parts, got '{c}' in {s}"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(QueryError::invalid_argument(format!(
                                "Unclosed quoted identifier: {s}"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(QueryError::invalid_argument("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(QueryError::invalid_argument(format!(
                        "Invalid character '{c}' in identifier: {s}"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(QueryError::invalid_argument(format!(
                    "Empty identifier segment: {s}"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Whether the identifier already names its table (`users.id`).
    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// A single unquoted part, usable as a bare SQL name.
    pub fn is_plain(&self) -> bool {
        matches!(self.parts.as_slice(), [IdentPart::Unquoted(_)])
    }

    /// The last part, unquoted (`name` for `users.name`).
    pub fn name(&self) -> &str {
        match self.parts.last() {
            Some(IdentPart::Unquoted(s)) | Some(IdentPart::Quoted(s)) => s,
            None => "",
        }
    }

    /// Prefix this identifier with `table` unless it is already qualified.
    pub fn qualify(self, table: &Ident) -> Self {
        if self.is_qualified() {
            return self;
        }
        let mut parts = table.parts.clone();
        parts.extend(self.parts);
        Self { parts }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Resolve a column reference against a table, the way every clause does it:
/// bare names get the table prefix, dotted names are kept as given.
pub(crate) fn qualified_column(table: &Ident, column: &str) -> QueryResult<String> {
    Ok(Ident::parse(column)?.qualify(table).to_sql())
}
