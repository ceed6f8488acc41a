//! The inline conditional language: `if{...}`, `ifOr{...}`, `else{}`,
//! `fi{}`.
//!
//! The language is flat. Keywords never nest; a second `if{}` before
//! the closing `fi{}` is an else-if arm of the same chain, because a
//! chain that has already produced output skips every later arm until
//! `fi{}` resets it. An `if{`/`ifOr{` marker written directly against
//! the closing `fi{}` continues the chain instead of resetting it,
//! which is how authors spell else-if across several `fi{}` groups.

use fabula_core::GameState;

use crate::condition::{evaluate_clause_list, Combine};
use crate::diagnostics::Diagnostic;
use crate::registry::{ConditionEntry, Registry};

/// One scanned segment of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Text outside any conditional chain, appended verbatim.
    Literal {
        /// Byte offset in the scanned text.
        start: usize,
        /// The verbatim text.
        text: String,
    },
    /// An `if{cond}` arm: condition list combined with AND.
    If {
        /// Byte offset of the `if{` marker.
        marker: usize,
        /// Byte offset of the condition text, for diagnostics.
        cond_at: usize,
        /// Raw condition text between the braces.
        cond: String,
        /// Body up to the next keyword marker.
        body: String,
    },
    /// An `ifOr{cond}` arm: condition list combined with OR.
    Or {
        /// Byte offset of the `ifOr{` marker.
        marker: usize,
        /// Byte offset of the condition text, for diagnostics.
        cond_at: usize,
        /// Raw condition text between the braces.
        cond: String,
        /// Body up to the next keyword marker.
        body: String,
    },
    /// An `else{}` arm, taken when nothing before it fired.
    Else {
        /// Byte offset of the `else{` marker.
        marker: usize,
        /// Body up to the next keyword marker.
        body: String,
    },
    /// A `fi{}` terminator.
    End {
        /// Byte offset just past the closing `}` of the `fi{}` group.
        after: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum MarkerKind {
    If,
    Or,
    Else,
    End,
}

/// Keyword markers, the longer `ifOr{` checked before its `if{` prefix.
const MARKERS: [(&str, MarkerKind); 4] = [
    ("ifOr{", MarkerKind::Or),
    ("if{", MarkerKind::If),
    ("else{", MarkerKind::Else),
    ("fi{", MarkerKind::End),
];

/// Scan one fragment into a flat block list.
///
/// A keyword only counts as a marker when it is not preceded by an
/// identifier character, so prose like `motif{` stays literal. An
/// unterminated keyword group turns the rest of the fragment literal.
pub fn scan(text: &str) -> (Vec<Block>, Vec<Diagnostic>) {
    let mut blocks = Vec::new();
    let mut diagnostics = Vec::new();
    let mut at = 0usize;

    while let Some((marker, kind, kw_len)) = find_marker(text, at) {
        if marker > at {
            blocks.push(Block::Literal {
                start: at,
                text: text[at..marker].to_string(),
            });
        }

        let open = marker + kw_len - 1;
        let Some(end) = group_end(text, open) else {
            diagnostics.push(
                Diagnostic::warning(marker..text.len(), "unterminated keyword group")
                    .with_label("treated as literal text"),
            );
            blocks.push(Block::Literal {
                start: marker,
                text: text[marker..].to_string(),
            });
            return (blocks, diagnostics);
        };
        let cond = &text[open + 1..end - 1];
        let body_end = find_marker(text, end).map_or(text.len(), |(next, _, _)| next);

        match kind {
            MarkerKind::If => blocks.push(Block::If {
                marker,
                cond_at: open + 1,
                cond: cond.to_string(),
                body: text[end..body_end].to_string(),
            }),
            MarkerKind::Or => blocks.push(Block::Or {
                marker,
                cond_at: open + 1,
                cond: cond.to_string(),
                body: text[end..body_end].to_string(),
            }),
            MarkerKind::Else => {
                if !cond.trim().is_empty() {
                    diagnostics.push(Diagnostic::warning(
                        open + 1..end - 1,
                        "content inside else{} is ignored",
                    ));
                }
                blocks.push(Block::Else {
                    marker,
                    body: text[end..body_end].to_string(),
                });
            }
            MarkerKind::End => {
                if !cond.trim().is_empty() {
                    diagnostics.push(Diagnostic::warning(
                        open + 1..end - 1,
                        "content inside fi{} is ignored",
                    ));
                }
                blocks.push(Block::End { after: end });
            }
        }

        at = match kind {
            MarkerKind::End => end,
            _ => body_end,
        };
    }

    if at < text.len() {
        blocks.push(Block::Literal {
            start: at,
            text: text[at..].to_string(),
        });
    }
    (blocks, diagnostics)
}

/// Evaluate a scanned block list into output text.
///
/// One `fired` flag per chain: once an arm has produced output, every
/// later arm is skipped (conditions unevaluated) until `fi{}` resets
/// the chain. A `fi{}` directly abutting the next `if{`/`ifOr{` marker
/// does not reset.
pub fn evaluate(
    blocks: &[Block],
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
) -> (String, Vec<Diagnostic>) {
    let mut out = String::new();
    let mut diagnostics = Vec::new();
    let mut fired = false;
    let mut chain_open = false;
    let mut saw_else = false;

    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Literal { text, .. } => out.push_str(text),
            Block::If {
                cond_at,
                cond,
                body,
                ..
            } => {
                chain_open = true;
                if fired {
                    continue;
                }
                let (ok, diags) =
                    evaluate_clause_list(conditions, state, cond, Combine::All, *cond_at);
                diagnostics.extend(diags);
                if ok {
                    out.push_str(body);
                    fired = true;
                }
            }
            Block::Or {
                cond_at,
                cond,
                body,
                ..
            } => {
                chain_open = true;
                if fired {
                    continue;
                }
                let (ok, diags) =
                    evaluate_clause_list(conditions, state, cond, Combine::Any, *cond_at);
                diagnostics.extend(diags);
                if ok {
                    out.push_str(body);
                    fired = true;
                }
            }
            Block::Else { marker, body } => {
                if !chain_open {
                    diagnostics.push(Diagnostic::warning(
                        *marker..*marker + 5,
                        "else{} without a preceding if{}",
                    ));
                } else if saw_else {
                    diagnostics.push(Diagnostic::warning(
                        *marker..*marker + 5,
                        "more than one else{} in a chain",
                    ));
                }
                chain_open = true;
                saw_else = true;
                if !fired {
                    out.push_str(body);
                    fired = true;
                }
            }
            Block::End { after } => {
                let continues = matches!(
                    blocks.get(i + 1),
                    Some(Block::If { marker, .. } | Block::Or { marker, .. }) if marker == after
                );
                if !continues {
                    fired = false;
                    chain_open = false;
                    saw_else = false;
                }
            }
        }
    }

    if chain_open {
        diagnostics.push(Diagnostic::warning(
            out.len()..out.len(),
            "conditional chain is missing its fi{}",
        ));
    }
    (out, diagnostics)
}

/// Scan and evaluate in one call.
pub fn process(
    text: &str,
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
) -> (String, Vec<Diagnostic>) {
    let (blocks, mut diagnostics) = scan(text);
    let (out, eval_diags) = evaluate(&blocks, conditions, state);
    diagnostics.extend(eval_diags);
    (out, diagnostics)
}

/// Find the next keyword marker at or after `from`.
fn find_marker(text: &str, from: usize) -> Option<(usize, MarkerKind, usize)> {
    for (offset, _) in text[from..].char_indices() {
        let p = from + offset;
        for (keyword, kind) in MARKERS {
            if text[p..].starts_with(keyword) {
                let boundary = text[..p]
                    .chars()
                    .next_back()
                    .is_none_or(|c| !c.is_alphanumeric() && c != '_');
                if boundary {
                    return Some((p, kind, keyword.len()));
                }
            }
        }
    }
    None
}

/// Byte index just past the `}` matching the `{` at `open`. Plain
/// depth counting; condition text has no string syntax to honor.
fn group_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
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
    use fabula_core::GameState;

    fn registry() -> Registry<ConditionEntry> {
        Registry::new("condition")
    }

    fn state(gold: f64) -> GameState {
        let mut state = GameState::new();
        state.flags.set("gold", gold);
        state
    }

    fn run(text: &str, gold: f64) -> String {
        process(text, &registry(), &state(gold)).0
    }

    #[test]
    fn if_else_picks_one_arm() {
        let text = "if{gold>10}Rich!else{}Poor.fi{}";
        assert_eq!(run(text, 20.0), "Rich!");
        assert_eq!(run(text, 5.0), "Poor.");
    }

    #[test]
    fn literals_pass_through() {
        assert_eq!(run("No keywords here.", 0.0), "No keywords here.");
        assert_eq!(
            run("Start if{gold>10}rich fi{}end", 20.0),
            "Start rich end"
        );
    }

    #[test]
    fn second_if_acts_as_else_if() {
        let text = "if{gold>10}rich if{gold>0}some else{}broke fi{}";
        assert_eq!(run(text, 20.0), "rich ");
        assert_eq!(run(text, 5.0), "some ");
        assert_eq!(run(text, 0.0), "broke ");
    }

    #[test]
    fn abutting_fi_continues_the_chain() {
        let chained = "if{gold>10}rich fi{}if{gold>0}some fi{}";
        assert_eq!(run(chained, 20.0), "rich ");

        let separate = "if{gold>10}rich fi{} if{gold>0}some fi{}";
        assert_eq!(run(separate, 20.0), "rich  some ");
    }

    #[test]
    fn ifor_combines_with_or() {
        let text = "ifOr{gold>100, gold<5}edge case fi{}";
        assert_eq!(run(text, 200.0), "edge case ");
        assert_eq!(run(text, 1.0), "edge case ");
        assert_eq!(run(text, 50.0), "");
    }

    #[test]
    fn prose_braces_stay_literal() {
        assert_eq!(run("A motif{} recurs.", 0.0), "A motif{} recurs.");
        assert_eq!(run("The wifi{} is down.", 0.0), "The wifi{} is down.");
    }

    #[test]
    fn stray_else_is_an_unconditional_arm() {
        let (out, diags) = process("else{}hello fi{}", &registry(), &state(0.0));
        assert_eq!(out, "hello ");
        assert!(diags
            .iter()
            .any(|d| d.message.contains("without a preceding if{}")));
    }

    #[test]
    fn second_else_in_a_fired_chain_is_skipped() {
        let (out, diags) = process(
            "if{gold>10}rich else{}poor else{}also poor fi{}",
            &registry(),
            &state(20.0),
        );
        assert_eq!(out, "rich ");
        assert!(diags
            .iter()
            .any(|d| d.message.contains("more than one else{}")));
    }

    #[test]
    fn missing_fi_is_reported() {
        let (out, diags) = process("if{gold>10}rich", &registry(), &state(20.0));
        assert_eq!(out, "rich");
        assert!(diags.iter().any(|d| d.message.contains("missing its fi{}")));
    }

    #[test]
    fn unterminated_group_turns_literal() {
        let (out, diags) = process("text if{gold>10 oops", &registry(), &state(20.0));
        assert_eq!(out, "text if{gold>10 oops");
        assert!(diags
            .iter()
            .any(|d| d.message.contains("unterminated keyword group")));
    }

    #[test]
    fn condition_content_may_hold_braces() {
        let (blocks, diags) = scan("if{a == {x}}body fi{}");
        assert!(diags.is_empty());
        assert!(matches!(&blocks[0], Block::If { cond, .. } if cond == "a == {x}"));
    }
}
