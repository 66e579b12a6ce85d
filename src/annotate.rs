//! Dependency-name extraction.
//!
//! Explicit annotations (attached lists and the two-part array form) are
//! always trusted. Bare callables fall back to reflection over their declared
//! source signature, which strict mode disables.

use crate::error::{DiError, DiResult};
use crate::injectable::Injectable;

/// Returns the ordered dependency names of `unit`.
///
/// `name` is the service being built, used to label strict-mode failures.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{annotate::annotate, Injectable};
///
/// let unit = Injectable::annotated(["a", "b"], |_| Ok(()));
/// assert_eq!(annotate(&unit, true, None).unwrap(), vec!["a", "b"]);
///
/// let bare = Injectable::from_source("(x, y) => x", |_| Ok(()));
/// assert_eq!(annotate(&bare, false, None).unwrap(), vec!["x", "y"]);
/// ```
pub fn annotate(unit: &Injectable, strict: bool, name: Option<&str>) -> DiResult<Vec<String>> {
    match unit {
        Injectable::Fn(func) => {
            if let Some(inject) = func.inject() {
                return Ok(inject.to_vec());
            }
            if strict {
                let name = match name {
                    Some(n) if !n.is_empty() => n.to_string(),
                    _ => func.display_name(),
                };
                return Err(DiError::StrictModeViolation { name });
            }
            let names = func
                .reflected()
                .get_or_init(|| func.source().map(reflect_parameters).unwrap_or_default());
            Ok(names.clone())
        }
        Injectable::Array { deps, target } => match target.as_ref() {
            Injectable::Fn(_) => Ok(deps.clone()),
            other => Err(DiError::NotAFunction {
                name: name.unwrap_or("fn").to_string(),
                got: other.kind(),
            }),
        },
        Injectable::Value(_) => Err(DiError::NotAFunction {
            name: name.unwrap_or("fn").to_string(),
            got: "value",
        }),
    }
}

/// Infers parameter names from a declared signature.
///
/// Comments are ignored. Parentheses inside default values and nested
/// arrow-parameter lists are skipped, and for curried arrows only the
/// parameters before the first arrow count. A name wrapped in a matching
/// pair of underscores (`_http_`) is unwrapped; anything else is kept as is.
///
/// ```rust
/// use ferrous_inject::annotate::reflect_parameters;
///
/// assert_eq!(reflect_parameters("function (a, /* b, */ _c_) {}"), vec!["a", "c"]);
/// assert_eq!(reflect_parameters("a => b => c => a + b + c"), vec!["a"]);
/// assert_eq!(reflect_parameters("(a, b = (1, 2)) => a"), vec!["a", "b"]);
/// assert_eq!(reflect_parameters("function (_) {}"), vec!["_"]);
/// ```
pub fn reflect_parameters(source: &str) -> Vec<String> {
    let Some(params) = parameter_text(source) else {
        return Vec::new();
    };
    split_top_level(&params)
        .into_iter()
        .filter_map(parameter_name)
        .collect()
}

/// Raw text of the formal-parameter list, comments removed.
pub(crate) fn parameter_text(source: &str) -> Option<String> {
    let text = strip_comments(source);

    // `a => ...` without parentheses: everything before the first arrow.
    if let Some(arrow) = text.find("=>") {
        let head = &text[..arrow];
        if !head.contains('(') {
            let head = head.trim();
            let head = match head.strip_prefix("async") {
                Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
                _ => head,
            };
            return Some(head.to_string());
        }
    }

    let open = text.find('(')?;
    let mut depth = 0usize;
    for (offset, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[open + 1..open + offset].to_string());
                }
            }
            _ => {}
        }
    }
    // Unbalanced: take everything after the opening parenthesis.
    Some(text[open + 1..].to_string())
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = match after.find('\n') {
                Some(end) => &after[end..],
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(end) => &after[end + 2..],
                None => "",
            };
        } else {
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
            }
            rest = chars.as_str();
        }
    }
    out
}

fn split_top_level(params: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in params.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(&params[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&params[start..]);
    pieces
}

fn parameter_name(raw: &str) -> Option<String> {
    // Drop a default value; `=>` inside it never precedes the first `=`.
    let raw = match raw.find('=') {
        Some(eq) => &raw[..eq],
        None => raw,
    };
    let raw = raw.trim();
    let raw = raw.strip_prefix("...").unwrap_or(raw);
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return None;
    }
    let name = match raw.strip_prefix('_').and_then(|r| r.strip_suffix('_')) {
        Some(inner) if !inner.is_empty() => inner,
        _ => raw,
    };
    Some(name.to_string())
}
