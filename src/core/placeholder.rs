//! `<%...%>` placeholder syntax.
//!
//! - Template authors write reserved names (`cursor`, `cursor2`, `indent`,
//!   `terminator`, `newline`) or their own slot names between `<%` and `%>`.
//! - Reserved names are normalized to sentinels first, so a caller-chosen
//!   slot can never collide with them.
//! - The model decoder emits the same sentinels for `CRSR` and indentation.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

pub const CURSOR: &str = "cursorb1f6a678ea69447ba5c56ddafba91d6a";
pub const INDENT: &str = "indent4ae5c7a470b94f61a465a87e6d114b5e";
pub const TERMINATOR: &str = "terminator1edac0dd252141c6b1de624e727a41ea";

pub const OPEN: &str = "<%";
pub const CLOSE: &str = "%>";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(&$re).expect("valid placeholder pattern"));
    };
}

pattern!(RESERVED_CURSOR, r"<%\s*cursor(\d*)\s*%>");
pattern!(RESERVED_INDENT, r"<%\s*indent\s*%>");
pattern!(RESERVED_TERMINATOR, r"<%\s*terminator\s*%>");
pattern!(RESERVED_NEWLINE, r"<%\s*newline(\d*)\s*%>");
pattern!(CURSOR_SENTINEL, format!(r"<%{CURSOR}(\d*)%>"));
pattern!(ANY, r"<%(.*?)%>");

pub fn wrap_in_slot(text: &str) -> String {
    format!("{OPEN}{text}{CLOSE}")
}

/// Rewrite reserved placeholder names to their sentinels. `newline` becomes a
/// literal line break.
pub fn normalize_reserved(template: &str) -> String {
    let cursor_replacement = format!("{OPEN}{CURSOR}${{1}}{CLOSE}");
    let s = RESERVED_CURSOR.replace_all(template, cursor_replacement.as_str());
    let s = RESERVED_INDENT.replace_all(&s, wrap_in_slot(INDENT).as_str());
    let s = RESERVED_TERMINATOR.replace_all(&s, wrap_in_slot(TERMINATOR).as_str());
    RESERVED_NEWLINE.replace_all(&s, "\n").into_owned()
}

/// Byte spans of every occurrence of slot `name`, tolerating whitespace
/// inside the delimiters.
pub fn slot_occurrences(template: &str, name: &str) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(close) = template[from..].find(CLOSE).map(|i| from + i) {
        let end = close + CLOSE.len();
        if let Some(open) = template[from..close].rfind(OPEN).map(|i| from + i) {
            let inner = &template[open + OPEN.len()..close];
            if inner.trim_matches(|c: char| c.is_ascii_whitespace()) == name {
                found.push((open, end));
            }
        }
        from = end;
    }
    found
}

/// Replace the n-th occurrence of slot `name` with `values[n]`, reusing the
/// last value once they run out.
pub fn replace_slot(template: &str, name: &str, values: &[String]) -> String {
    let Some(last) = values.last() else {
        return template.to_string();
    };
    let mut out = String::with_capacity(template.len());
    let mut prev = 0;
    for (n, (start, end)) in slot_occurrences(template, name).into_iter().enumerate() {
        out.push_str(&template[prev..start]);
        out.push_str(values.get(n).unwrap_or(last));
        prev = end;
    }
    out.push_str(&template[prev..]);
    out
}

/// Remove every placeholder, leaving the surrounding text.
pub fn strip_all(text: &str) -> Cow<'_, str> {
    ANY.replace_all(text, "")
}

/// Remove every cursor sentinel.
pub fn strip_cursors(text: &str) -> Cow<'_, str> {
    CURSOR_SENTINEL.replace_all(text, "")
}

/// Text with the cursor sentinels removed, and the cursor offset into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub code: String,
    pub cursor: usize,
}

/// Pick the cursor: the highest numeric priority wins (no number is 0), the
/// earliest wins among equals. Without any cursor sentinel the cursor lands at
/// the end of the text.
pub fn resolve_cursor(text: &str) -> Replacement {
    let mut code = String::with_capacity(text.len());
    let mut cursor = None;
    let mut best_priority: i64 = -1;
    let mut last = 0;
    for caps in CURSOR_SENTINEL.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let priority = caps
            .get(1)
            .and_then(|p| p.as_str().parse::<i64>().ok())
            .unwrap_or(0);
        code.push_str(&text[last..m.start()]);
        if priority > best_priority {
            best_priority = priority;
            cursor = Some(code.len());
        }
        last = m.end();
    }
    code.push_str(&text[last..]);
    let cursor = cursor.unwrap_or(code.len());
    Replacement { code, cursor }
}

/// Names of every `<%...%>` still present in `text`.
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    ANY.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reserved() {
        let normalized = normalize_reserved("if (<% cursor %>) {<%indent%>x<%terminator%><%newline%>}");
        assert_eq!(
            normalized,
            format!(
                "if ({}) {{{}x{}\n}}",
                wrap_in_slot(CURSOR),
                wrap_in_slot(INDENT),
                wrap_in_slot(TERMINATOR)
            )
        );
        assert_eq!(
            normalize_reserved("<%cursor2%>"),
            wrap_in_slot(&format!("{CURSOR}2"))
        );
    }

    #[test]
    fn test_resolve_cursor_priority() {
        let text = format!(
            "a{}b{}c{}d",
            wrap_in_slot(CURSOR),
            wrap_in_slot(&format!("{CURSOR}2")),
            wrap_in_slot(&format!("{CURSOR}2"))
        );
        let r = resolve_cursor(&text);
        assert_eq!(r.code, "abcd");
        assert_eq!(r.cursor, 2);
    }

    #[test]
    fn test_resolve_cursor_defaults_to_end() {
        let r = resolve_cursor("foo(bar)");
        assert_eq!(r.cursor, 8);
        let r = resolve_cursor(&format!("foo({})", wrap_in_slot(CURSOR)));
        assert_eq!(r.code, "foo()");
        assert_eq!(r.cursor, 4);
    }

    #[test]
    fn test_replace_slot_reuses_last_value() {
        let out = replace_slot(
            "<%name%> = <% name %> + <%name%>",
            "name",
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(out, "a = b + b");
    }

    #[test]
    fn test_replace_slot_matches_name_literally() {
        let out = replace_slot("<%a.b%> <%axb%>", "a.b", &["1".to_string()]);
        assert_eq!(out, "1 <%axb%>");
        assert_eq!(slot_occurrences("<%x%> <% x %>", "x"), vec![(0, 5), (6, 13)]);
    }

    #[test]
    fn test_unresolved_placeholders() {
        assert_eq!(unresolved_placeholders("x <% name %> y <%z%>"), vec!["name", "z"]);
        assert!(unresolved_placeholders("plain").is_empty());
        assert_eq!(strip_all("a<%x%>b<%y%>"), "ab");
    }
}
