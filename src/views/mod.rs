//! HTML rendering for the editor pages.
//!
//! Pages are assembled with `format!` the same way the list and error
//! bodies are; every user-controlled string goes through [`escape_html`]
//! before it is embedded.

pub mod pages;

/// Escape a value for an HTML text node or a quoted attribute.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Wrap a page body in the shared document shell. `title` is escaped here.
pub(crate) fn layout(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>",
            r#"<html lang="en"><head><meta charset="utf-8" />"#,
            "<title>{title}</title></head>",
            "<body><h1>{title}</h1>{body}</body></html>"
        ),
        title = escape_html(title),
        body = body
    )
}
