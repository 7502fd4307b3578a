//! Bit-exact backtick/quote escaping for SQL identifiers and literals.
//!
//! Every generated identifier goes through [`quote_ident`]; every literal embedded
//! in diagnostic-only SQL (never in parameterized query text, which always uses `?`
//! placeholders) goes through [`quote_literal`].

/// Back-tick quote a single identifier, doubling any embedded back-tick.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        if c == '`' {
            out.push('`');
        }
        out.push(c);
    }
    out.push('`');
    out
}

/// Back-tick quote `table`.`column`, quoting each part independently.
pub fn quote_qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(column))
}

/// Single-quote a string literal for diagnostic SQL, doubling embedded quotes.
/// Never used for parameterized values — those are always bound as `?` args.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifier() {
        assert_eq!(quote_ident("users"), "`users`");
    }

    #[test]
    fn doubles_embedded_backtick() {
        assert_eq!(quote_ident("weird`col"), "`weird``col`");
    }

    #[test]
    fn qualifies_table_and_column() {
        assert_eq!(quote_qualified("users", "id"), "`users`.`id`");
    }

    #[test]
    fn doubles_embedded_quote_in_literal() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }
}
