use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, is_param_boundary,
};
use scanner::{State, scan_identifier};

/// Result of rewriting named parameters into positional `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTranslation<'a> {
    /// SQL with every named token replaced by `?`.
    pub sql: Cow<'a, str>,
    /// Distinct parameter tokens (colon included) in order of first appearance.
    pub names: Vec<String>,
    /// Number of `?` placeholders written, one per token occurrence.
    pub placeholders: usize,
}

/// Rewrite `:name` tokens into `?` for the call-based ODBC API.
///
/// A token is a `:` followed by an identifier, at the start of the text or after whitespace.
/// Every occurrence becomes its own `?`, while `names` keeps each distinct token once, so a
/// repeated name collapses to a single binding slot.
///
/// Quoted literals and comments are skipped via a lightweight state machine:
/// ```rust
/// use dbmaker_middleware::translation::translate_named_params;
///
/// let t = translate_named_params("select ':skip' from t where id = :id -- :note");
/// assert_eq!(t.sql, "select ':skip' from t where id = ? -- :note");
/// assert_eq!(t.names, vec![":id".to_string()]);
/// ```
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_named_params(sql: &str) -> NamedTranslation<'_> {
    let mut out: Option<String> = None;
    let mut copied_to = 0;
    let mut names: Vec<String> = Vec::new();
    let mut placeholders = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b':' if is_param_boundary(bytes, idx) => {
                    if let Some(end) = scan_identifier(bytes, idx + 1) {
                        let token = &sql[idx..end];
                        if !names.iter().any(|known| known == token) {
                            names.push(token.to_string());
                        }
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                        buf.push_str(&sql[copied_to..idx]);
                        buf.push('?');
                        copied_to = end;
                        placeholders += 1;
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }

        idx += 1;
    }

    let sql = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };

    NamedTranslation {
        sql,
        names,
        placeholders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_named_tokens_in_order() {
        let t = translate_named_params("select * from t where a = :a and b = :b_2");
        assert_eq!(t.sql, "select * from t where a = ? and b = ?");
        assert_eq!(t.names, vec![":a", ":b_2"]);
        assert_eq!(t.placeholders, 2);
    }

    #[test]
    fn token_at_start_of_text() {
        let t = translate_named_params(":only");
        assert_eq!(t.sql, "?");
        assert_eq!(t.names, vec![":only"]);
    }

    #[test]
    fn repeated_name_gets_two_placeholders_one_slot() {
        let t = translate_named_params("select * from t where a = :v or b = :v");
        assert_eq!(t.sql, "select * from t where a = ? or b = ?");
        assert_eq!(t.names, vec![":v"]);
        assert_eq!(t.placeholders, 2);
    }

    #[test]
    fn requires_whitespace_before_colon() {
        let t = translate_named_params("select x::int, y from t where (a=:a) and b = :b");
        assert_eq!(t.sql, "select x::int, y from t where (a=:a) and b = ?");
        assert_eq!(t.names, vec![":b"]);
    }

    #[test]
    fn identifier_stops_at_punctuation() {
        let t = translate_named_params("insert into t (a, b) values ( :a, :b)");
        assert_eq!(t.sql, "insert into t (a, b) values ( ?, ?)");
        assert_eq!(t.names, vec![":a", ":b"]);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select ' :x', \" :y\" -- :z\n/* :w /* :v */ */ from t where a = :a";
        let t = translate_named_params(sql);
        assert_eq!(
            t.sql,
            "select ' :x', \" :y\" -- :z\n/* :w /* :v */ */ from t where a = ?"
        );
        assert_eq!(t.names, vec![":a"]);
    }

    #[test]
    fn preserves_multibyte_text() {
        let t = translate_named_params("select 'héllo' , :ünicode, :name from t");
        assert_eq!(t.sql, "select 'héllo' , :ünicode, ? from t");
        assert_eq!(t.names, vec![":name"]);
    }

    #[test]
    fn borrows_when_nothing_to_rewrite() {
        let sql = "select * from t where a = ?";
        let t = translate_named_params(sql);
        assert!(matches!(t.sql, Cow::Borrowed(_)));
        assert!(t.names.is_empty());
        assert_eq!(t.placeholders, 0);
    }
}
