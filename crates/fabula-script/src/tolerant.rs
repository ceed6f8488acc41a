//! Extraction and tolerant parsing of embedded action blocks.
//!
//! Authors write action objects inline as `{ music: theme1 }`, in a
//! permissive JSON dialect: keys and string values may be unquoted,
//! strings may use single quotes, and trailing commas are allowed. A
//! repair pass normalizes each block to strict JSON before handing it
//! to `serde_json`.

use indexmap::IndexMap;

use crate::action::{ActionMap, Payload};
use crate::diagnostics::Diagnostic;

/// Stand-in for a decimal point while the repair pass rewrites bare
/// tokens, so `0.5` survives without being treated as a dotted name.
const DOT_SENTINEL: char = '\u{E001}';

/// Result of scanning one fragment for action blocks.
#[derive(Default)]
pub struct Extraction {
    /// The fragment text with every block removed. Empty when a
    /// redirect short-circuited, truncated at an unmatched `{`.
    pub output: String,
    /// Parsed blocks in authored order, with their source spans.
    pub blocks: Vec<(std::ops::Range<usize>, ActionMap)>,
    /// Redirect target and the full block that requested it. The block
    /// is handed back unexecuted; acting on it is the caller's job.
    pub redirect: Option<(String, ActionMap)>,
    /// Problems encountered while scanning and parsing.
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan a fragment for `{...}` groups and parse each as a tolerant-JSON
/// action object.
///
/// Block text never reaches the output, whether or not it parses. A
/// block carrying a `"redirect"` key stops the scan: the rest of the
/// fragment is abandoned and the output cleared. An unmatched `{`
/// truncates the output from that point.
pub fn extract(text: &str) -> Extraction {
    let mut extraction = Extraction::default();
    let mut at = 0usize;

    while let Some(found) = text[at..].find('{') {
        let open = at + found;
        extraction.output.push_str(&text[at..open]);

        let Some(end) = matching_brace(text, open) else {
            extraction.diagnostics.push(
                Diagnostic::error(open..text.len(), "unmatched '{'")
                    .with_label("no closing brace before end of fragment"),
            );
            return extraction;
        };

        match parse_tolerant(&text[open..end]) {
            Ok(map) => {
                if let Some(target) = map.get("redirect") {
                    let target = target
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| target.to_string());
                    extraction.redirect = Some((target, map));
                    extraction.output.clear();
                    return extraction;
                }
                extraction.blocks.push((open..end, map));
            }
            Err(reason) => {
                extraction.diagnostics.push(
                    Diagnostic::warning(open..end, format!("unparsable action block: {reason}"))
                        .with_label("dropped"),
                );
            }
        }
        at = end;
    }
    extraction.output.push_str(&text[at..]);
    extraction
}

/// Parse one `{...}` block as a tolerant-JSON object.
pub fn parse_tolerant(block: &str) -> Result<ActionMap, String> {
    let repaired = repair(block);
    let value: serde_json::Value =
        serde_json::from_str(&repaired).map_err(|e| e.to_string())?;
    let serde_json::Value::Object(fields) = value else {
        return Err("not an object".to_string());
    };
    let mut map: ActionMap = IndexMap::new();
    for (key, value) in &fields {
        map.insert(key.clone(), Payload::from_json(value));
    }
    Ok(map)
}

/// Normalize a tolerant-JSON block to strict JSON.
///
/// Quotes bare keys and bare non-numeric values, converts single-quoted
/// strings to double-quoted, and removes trailing commas. Decimal
/// points are protected by [`DOT_SENTINEL`] while bare tokens are
/// classified and restored afterwards.
pub fn repair(block: &str) -> String {
    let protected = protect_decimals(block);
    let chars: Vec<char> = protected.chars().collect();
    let mut out = String::with_capacity(protected.len());
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    out.push(c);
                    if c == '\\' {
                        if let Some(&next) = chars.get(i + 1) {
                            out.push(next);
                            i += 2;
                            continue;
                        }
                    } else if c == '"' {
                        break;
                    }
                    i += 1;
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    if c == '\'' {
                        break;
                    }
                    if c == '\\' && chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    if c == '"' {
                        out.push_str("\\\"");
                    } else {
                        out.push(c);
                    }
                    i += 1;
                }
                out.push('"');
            }
            '}' | ']' => {
                trim_trailing_comma(&mut out);
                out.push(c);
            }
            _ if c.is_whitespace() || matches!(c, '{' | '[' | ':' | ',') => out.push(c),
            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                let mut j = i;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let is_key = chars.get(j) == Some(&':');
                emit_token(&mut out, &token, is_key);
                continue;
            }
        }
        i += 1;
    }

    out.replace(DOT_SENTINEL, ".")
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']' | ':' | ',' | '"' | '\'')
}

/// Write a bare token as strict JSON: keys are always quoted, values
/// keep JSON literals and numbers and are quoted otherwise.
fn emit_token(out: &mut String, token: &str, is_key: bool) {
    let restored = token.replace(DOT_SENTINEL, ".");
    let keep_bare = !is_key
        && (matches!(restored.as_str(), "true" | "false" | "null")
            || restored.parse::<f64>().is_ok());
    if keep_bare {
        out.push_str(&restored);
        return;
    }
    out.push('"');
    for c in restored.chars() {
        if c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn trim_trailing_comma(out: &mut String) {
    out.truncate(out.trim_end().len());
    if out.ends_with(',') {
        out.pop();
    }
}

/// Replace decimal points between digits with [`DOT_SENTINEL`],
/// skipping quoted strings.
fn protect_decimals(block: &str) -> String {
    let chars: Vec<char> = block.chars().collect();
    let mut out = String::with_capacity(block.len());
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for i in 0..chars.len() {
        let c = chars[i];
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' | '\'' => {
                in_string = Some(c);
                out.push(c);
            }
            '.' if i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(char::is_ascii_digit) =>
            {
                out.push(DOT_SENTINEL);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Byte index just past the `}` matching the `{` at `open`, honoring
/// quoted strings.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::Value;

    #[test]
    fn repair_quotes_bare_keys_and_values() {
        assert_eq!(repair("{music: theme1}"), r#"{"music": "theme1"}"#);
        assert_eq!(repair("{volume: 0.5}"), r#"{"volume": 0.5}"#);
        assert_eq!(repair("{loop: true}"), r#"{"loop": true}"#);
    }

    #[test]
    fn repair_converts_single_quotes() {
        assert_eq!(repair("{'a b': 'c\"d'}"), r#"{"a b": "c\"d"}"#);
        assert_eq!(repair(r"{'it\'s': 1}"), r#"{"it's": 1}"#);
    }

    #[test]
    fn repair_strips_trailing_commas() {
        assert_eq!(repair("{a: 1, b: 2, }"), r#"{"a": 1, "b": 2}"#);
        assert_eq!(repair("{list: [1, 2,]}"), r#"{"list": [1, 2]}"#);
    }

    #[test]
    fn repair_quotes_numeric_looking_keys() {
        assert_eq!(repair("{5: x}"), r#"{"5": "x"}"#);
    }

    #[test]
    fn repair_keeps_dotted_names_and_decimals_apart() {
        assert_eq!(
            repair("{flag: chapel.visited, volume: 1.25}"),
            r#"{"flag": "chapel.visited", "volume": 1.25}"#
        );
    }

    #[test]
    fn parse_builds_ordered_maps() {
        let map = parse_tolerant("{b: 1, a: 2, b: 3}").unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(map.get("b"), Some(&Payload::Scalar(Value::Number(3.0))));
    }

    #[test]
    fn extract_removes_blocks_from_output() {
        let extraction = extract(r#"{"music": "theme1"}Hello"#);
        assert_eq!(extraction.output, "Hello");
        assert_eq!(extraction.blocks.len(), 1);
        assert_eq!(extraction.blocks[0].1.get("music").unwrap().as_str(), Some("theme1"));
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn extract_parses_tolerant_blocks_with_nesting() {
        let extraction = extract("Pay up.{flag: {id: debt, add: -5}, sound: coin}");
        assert_eq!(extraction.output, "Pay up.");
        let map = &extraction.blocks[0].1;
        assert_eq!(map.get("flag").unwrap().str_field("id"), Some("debt"));
        assert_eq!(map.get("flag").unwrap().number_field("add"), Some(-5.0));
        assert_eq!(map.get("sound").unwrap().as_str(), Some("coin"));
    }

    #[test]
    fn redirect_short_circuits() {
        let extraction =
            extract("Before {a: 1} middle {redirect: chapel, extra: 2} after {b: 3}");
        assert_eq!(extraction.output, "");
        assert_eq!(extraction.blocks.len(), 1);
        let (target, map) = extraction.redirect.as_ref().unwrap();
        assert_eq!(target, "chapel");
        assert_eq!(map.get("extra").unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn unmatched_brace_truncates() {
        let extraction = extract("Keep this {music: theme");
        assert_eq!(extraction.output, "Keep this ");
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(extraction.diagnostics[0].is_error());
    }

    #[test]
    fn unparsable_blocks_are_dropped_with_a_warning() {
        let extraction = extract("Wait {a moment} please");
        assert_eq!(extraction.output, "Wait  please");
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(!extraction.diagnostics[0].is_error());
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_matching() {
        let extraction = extract(r#"{note: "curly } inside"}done"#);
        assert_eq!(extraction.output, "done");
        assert_eq!(
            extraction.blocks[0].1.get("note").unwrap().as_str(),
            Some("curly } inside")
        );
    }
}
