//! Boundary-detecting tokenizer for candidate source text.
//!
//! Extracts the raw text of a named function without parsing the
//! language: it locates the `fn <name>(` header, then walks the body by
//! brace depth, skipping string literals and line comments. Anything
//! between functions is ignored, so candidate files may contain imports,
//! type definitions or other scaffolding the harness does not care about.

use lazy_static::lazy_static;
use regex::Regex;

use tvh_core::HarnessError;

lazy_static! {
    static ref FN_HEADER: Regex = Regex::new(r"\bfn\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();
}

/// Extract the full text of `fn <name>`, header through closing brace.
///
/// Returns `Ok(None)` when no such function exists; `Err` when the
/// function is found but its body never closes.
pub fn extract_function(source: &str, name: &str) -> Result<Option<String>, HarnessError> {
    for caps in FN_HEADER.captures_iter(source) {
        if &caps[1] != name {
            continue;
        }
        let Some(header) = caps.get(0) else {
            continue;
        };
        let Some(open) = source[header.end()..].find('{') else {
            return Err(HarnessError::Source(format!(
                "function '{name}' has no body"
            )));
        };
        let body_start = header.end() + open;
        let Some(body_end) = find_matching_brace(&source[body_start..]) else {
            return Err(HarnessError::Source(format!(
                "unbalanced braces in function '{name}'"
            )));
        };
        return Ok(Some(source[header.start()..body_start + body_end + 1].to_string()));
    }
    Ok(None)
}

/// Offset of the brace matching the one at position 0, or `None` when the
/// input ends at depth > 0.
fn find_matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;
    let mut prev = '\0';
    for (idx, ch) in text.char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
        } else if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else {
            match ch {
                '"' => in_string = true,
                '/' if prev == '/' => in_comment = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        prev = ch;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
use std::collections::HashMap;

fn helper(x: i64) -> i64 {
    x + 1
}

fn clean_transaction_data(data: Table) -> Result<Table, Error> {
    // braces in a comment do not count: { {
    let marker = "}"; // nor in a string
    let mut out = Table::new(data.columns().to_vec());
    for row in data.rows() {
        out.push_row(row.to_vec())?;
    }
    Ok(out)
}
"#;

    #[test]
    fn test_extracts_named_function_only() {
        let text = extract_function(SAMPLE, "clean_transaction_data")
            .unwrap()
            .unwrap();
        assert!(text.starts_with("fn clean_transaction_data"));
        assert!(text.trim_end().ends_with('}'));
        assert!(text.contains("push_row"));
        assert!(!text.contains("fn helper"));
    }

    #[test]
    fn test_missing_function_is_none() {
        assert_eq!(extract_function(SAMPLE, "merge_data").unwrap(), None);
    }

    #[test]
    fn test_braces_in_strings_and_comments_are_skipped() {
        // Would terminate early if the "}" string literal were counted.
        let text = extract_function(SAMPLE, "clean_transaction_data")
            .unwrap()
            .unwrap();
        assert!(text.contains("Ok(out)"));
    }

    #[test]
    fn test_unbalanced_body_is_a_source_error() {
        let bad = "fn merge_data(a: Table) { let x = 1;";
        assert!(matches!(
            extract_function(bad, "merge_data"),
            Err(HarnessError::Source(_))
        ));
    }
}
