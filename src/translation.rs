use std::borrow::Cow;

/// Rewrite `?` and `$N` placeholders into the Data API's named `:N` form.
///
/// `?` markers are numbered left to right (`:1`, `:2`, ...); a `$` becomes `:` so that
/// `$1` reads as `:1`. Markers inside single- or double-quoted text are left alone.
/// Quotes nest: the other quote kind inside a quoted run opens a level that has to be
/// closed first. An unterminated quote stops substitution for the rest of the text.
///
/// With `params_count == 0` the text is returned as-is, even if it contains markers.
/// Returns a borrowed `Cow` when no changes are needed.
///
/// ```rust
/// use redshift_data_middleware::prelude::*;
///
/// let sql = rewrite_placeholders("SELECT * FROM t WHERE a = ? AND b = '?'", 1);
/// assert_eq!(sql, "SELECT * FROM t WHERE a = :1 AND b = '?'");
/// ```
#[must_use]
pub fn rewrite_placeholders(sql: &str, params_count: usize) -> Cow<'_, str> {
    if params_count == 0 {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut quotes: Vec<char> = Vec::new();
    let mut ordinal = 0usize;

    for (idx, c) in sql.char_indices() {
        match quotes.last().copied() {
            Some(open) if c == open => {
                quotes.pop();
            }
            Some(_) => {
                // a different quote kind opens a nested level
                if matches!(c, '\'' | '"') {
                    quotes.push(c);
                }
            }
            None => match c {
                '?' => {
                    ordinal += 1;
                    let buf = out.get_or_insert_with(|| sql[..idx].to_string());
                    buf.push(':');
                    buf.push_str(&ordinal.to_string());
                    continue;
                }
                '$' => {
                    out.get_or_insert_with(|| sql[..idx].to_string()).push(':');
                    continue;
                }
                '\'' | '"' => quotes.push(c),
                _ => {}
            },
        }

        if let Some(ref mut buf) = out {
            buf.push(c);
        }
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(sql),
    }
}
