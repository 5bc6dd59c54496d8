//! Rewrites named placeholders (`:name`, optionally `@name`) into
//! positional `?` markers the transport layer's prepared-statement binder
//! understands, recording the names in the order they were rewritten so a
//! caller can map a by-name argument bag onto positional binds. Grounded
//! on the teacher crate's lexing style in `protocol/command/text.rs`
//! (a single forward scan tracking quote state) rather than a regex –
//! the teacher never pulls in a regex dependency for protocol text, and
//! this crate follows that lead.

/// Whether `@name` is rewritten as a placeholder. Left off by default:
/// `@name` is also valid MySQL user-variable syntax (`SET @x = 1`,
/// `SELECT @x`), and a driver that rewrites it unconditionally would
/// silently break any query that legitimately reads or assigns a session
/// variable. Callers that know their queries never reference session
/// variables can opt in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderOptions {
    pub rewrite_colon: bool,
    pub rewrite_at: bool,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        PlaceholderOptions {
            rewrite_colon: true,
            rewrite_at: false,
        }
    }
}

/// The result of rewriting a query's named placeholders: the query with
/// every recognized placeholder replaced by `?`, and the placeholder
/// names in the order their `?` appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenQuery {
    pub sql: String,
    pub names: Vec<String>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites `sql`'s named placeholders into `?` per `options`, tracking
/// exactly four states: inside a single-quoted string, inside a
/// double-quoted string, after a backslash, and normal. `after-backslash`
/// sits above the quote tracking — a backslash escapes the following
/// character unconditionally, whether or not a quote is open, and the
/// quote state (if any) is left untouched by the pair. There is no
/// backtick-identifier state: a colon or `@` inside `` `...` `` is
/// rewritten the same as anywhere else in normal text.
pub fn rewrite_placeholders(sql: &str, options: PlaceholderOptions) -> RewrittenQuery {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();

    #[derive(PartialEq, Eq)]
    enum Quote {
        None,
        Single,
        Double,
    }
    let mut quote = Quote::None;
    let mut after_backslash = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if after_backslash {
            out.push(c);
            after_backslash = false;
            i += 1;
            continue;
        }

        if c == '\\' {
            out.push(c);
            after_backslash = true;
            i += 1;
            continue;
        }

        if quote != Quote::None {
            out.push(c);
            let closing = if quote == Quote::Single { '\'' } else { '"' };
            if c == closing {
                quote = Quote::None;
            }
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            out.push(c);
            quote = if c == '\'' { Quote::Single } else { Quote::Double };
            i += 1;
            continue;
        }

        let prefix = match c {
            ':' if options.rewrite_colon => true,
            '@' if options.rewrite_at => true,
            _ => false,
        };
        if prefix && i + 1 < chars.len() && is_name_start(chars[i + 1]) {
            let mut j = i + 1;
            while j < chars.len() && is_name_continue(chars[j]) {
                j += 1;
            }
            let name: String = chars[i + 1..j].iter().collect();
            names.push(name);
            out.push('?');
            i = j;
            continue;
        }

        out.push(c);
        i += 1;
    }

    RewrittenQuery { sql: out, names }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_placeholders_rewrite_in_order() {
        let rewritten = rewrite_placeholders(
            "SELECT * FROM t WHERE a = :first AND b = :second",
            PlaceholderOptions::default(),
        );
        assert_eq!(rewritten.sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(rewritten.names, vec!["first", "second"]);
    }

    #[test]
    fn colon_inside_string_literal_is_untouched() {
        let rewritten = rewrite_placeholders("SELECT '12:30' FROM t WHERE a = :x", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, "SELECT '12:30' FROM t WHERE a = ?");
        assert_eq!(rewritten.names, vec!["x"]);
    }

    #[test]
    fn at_name_is_left_alone_by_default() {
        let rewritten = rewrite_placeholders("SELECT @x, :y", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, "SELECT @x, ?");
        assert_eq!(rewritten.names, vec!["y"]);
    }

    #[test]
    fn at_name_rewrites_when_opted_in() {
        let options = PlaceholderOptions {
            rewrite_colon: true,
            rewrite_at: true,
        };
        let rewritten = rewrite_placeholders("SELECT @x", options);
        assert_eq!(rewritten.sql, "SELECT ?");
        assert_eq!(rewritten.names, vec!["x"]);
    }

    #[test]
    fn bare_colon_not_followed_by_identifier_is_untouched() {
        let rewritten = rewrite_placeholders("SELECT 1 :: INT", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, "SELECT 1 :: INT");
        assert!(rewritten.names.is_empty());
    }

    #[test]
    fn escaped_quote_inside_literal_does_not_close_early() {
        let rewritten = rewrite_placeholders(r"SELECT 'it\'s :x' WHERE a = :y", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, r"SELECT 'it\'s :x' WHERE a = ?");
        assert_eq!(rewritten.names, vec!["y"]);
    }

    #[test]
    fn backslash_outside_any_quote_escapes_the_placeholder_prefix() {
        let rewritten = rewrite_placeholders(r"SELECT \:x WHERE a = :y", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, r"SELECT \:x WHERE a = ?");
        assert_eq!(rewritten.names, vec!["y"]);
    }

    #[test]
    fn backtick_quoted_identifier_is_not_a_quote_context() {
        let rewritten = rewrite_placeholders("SELECT `a:foo` FROM t", PlaceholderOptions::default());
        assert_eq!(rewritten.sql, "SELECT `a?` FROM t");
        assert_eq!(rewritten.names, vec!["foo"]);
    }
}
