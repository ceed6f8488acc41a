//! Evaluation of condition clauses and single `key op value` conditions.

use fabula_core::{GameState, Value};

use crate::action::{ActionMap, Payload};
use crate::diagnostics::{Diagnostic, Severity};
use crate::registry::{ConditionEntry, Registry};

/// Comparison operators, multi-character ones before their prefixes so
/// `>=` never matches as `>` followed by a stray `=`.
const OPERATORS: [&str; 7] = ["==", "!=", ">=", "<=", ">", "<", "="];

/// Which clause pair of a parameter map a gate reads.
///
/// One parameter map can gate two independent predicates for the same
/// choice: whether it is shown at all, and whether it can be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateClause {
    /// Reads the `if` (AND) and `ifOr` (OR) keys.
    Visibility,
    /// Reads the `active` (AND) and `activeOr` (OR) keys.
    Availability,
}

impl GateClause {
    /// The AND-combined clause key.
    pub fn primary_key(self) -> &'static str {
        match self {
            Self::Visibility => "if",
            Self::Availability => "active",
        }
    }

    /// The OR-combined clause key.
    pub fn or_key(self) -> &'static str {
        match self {
            Self::Visibility => "ifOr",
            Self::Availability => "activeOr",
        }
    }
}

/// How the single conditions of a clause combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Every condition must hold.
    All,
    /// At least one condition must hold.
    Any,
}

/// Evaluate a visibility or availability gate over a parameter map.
///
/// Absent parameters, or parameters without the relevant clause keys,
/// gate nothing and evaluate true. When both the primary and the OR
/// clause are present the result is the AND of the two.
pub fn gate(
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
    params: Option<&ActionMap>,
    clause: GateClause,
) -> (bool, Vec<Diagnostic>) {
    let Some(params) = params else {
        return (true, Vec::new());
    };
    let mut diagnostics = Vec::new();
    let mut result = true;
    let mut gated = false;

    if let Some(payload) = params.get(clause.primary_key()) {
        let (ok, diags) = clause_truth(conditions, state, payload, Combine::All);
        diagnostics.extend(diags);
        result = result && ok;
        gated = true;
    }
    if let Some(payload) = params.get(clause.or_key()) {
        let (ok, diags) = clause_truth(conditions, state, payload, Combine::Any);
        diagnostics.extend(diags);
        result = result && ok;
        gated = true;
    }

    if gated {
        (result, diagnostics)
    } else {
        (true, diagnostics)
    }
}

/// Evaluate one clause payload: a literal boolean (or number) passes
/// through, a string is a comma-separated condition list.
pub fn clause_truth(
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
    payload: &Payload,
    combine: Combine,
) -> (bool, Vec<Diagnostic>) {
    match payload {
        Payload::Scalar(Value::Str(text)) => {
            evaluate_clause_list(conditions, state, text, combine, 0)
        }
        Payload::Scalar(value) => (value.is_truthy(), Vec::new()),
        _ => (
            false,
            vec![Diagnostic::warning(
                0..0,
                "condition clause must be a boolean or a string",
            )],
        ),
    }
}

/// Evaluate a comma-separated list of single conditions.
///
/// Commas inside parentheses do not split, so condition arguments can
/// themselves be comma-separated. `base` offsets diagnostic spans into
/// the enclosing fragment.
pub fn evaluate_clause_list(
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
    text: &str,
    combine: Combine,
    base: usize,
) -> (bool, Vec<Diagnostic>) {
    if text.trim().is_empty() {
        let span = base..base + text.len();
        return (false, vec![Diagnostic::warning(span, "empty condition")]);
    }

    let mut diagnostics = Vec::new();
    let mut result = match combine {
        Combine::All => true,
        Combine::Any => false,
    };
    for (offset, part) in split_top_level(text) {
        let (ok, diags) = evaluate_single(conditions, state, part, base + offset);
        diagnostics.extend(diags);
        result = match combine {
            Combine::All => result && ok,
            Combine::Any => result || ok,
        };
    }
    (result, diagnostics)
}

/// Evaluate one `key op value` condition. Malformed input is reported
/// and evaluates false.
pub fn evaluate_single(
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
    raw: &str,
    base: usize,
) -> (bool, Vec<Diagnostic>) {
    let lead = raw.len() - raw.trim_start().len();
    let cond = raw.trim();
    let span = base + lead..base + lead + cond.len();

    if cond.is_empty() {
        return (false, vec![Diagnostic::warning(span, "empty condition")]);
    }
    let Some((op_at, op)) = find_operator(cond) else {
        let message = format!("missing comparison operator in \"{cond}\"");
        return (false, vec![Diagnostic::warning(span, message)]);
    };
    let key = cond[..op_at].trim();
    if key.is_empty() {
        let message = format!("missing key before \"{op}\" in \"{cond}\"");
        return (false, vec![Diagnostic::warning(span, message)]);
    }
    let right = Value::parse(cond[op_at + op.len()..].trim());

    let left = match key_value(conditions, state, key, span.clone()) {
        Ok(value) => value,
        Err(diag) => return (false, vec![diag]),
    };

    match compare(op, &left, &right) {
        Ok(result) => (result, Vec::new()),
        Err(message) => (false, vec![Diagnostic::warning(span, message)]),
    }
}

/// Resolve the left-hand side of a condition: a `_`-prefixed registered
/// condition (with optional arguments) or a flag id. Unset flags read
/// as zero.
fn key_value(
    conditions: &Registry<ConditionEntry>,
    state: &GameState,
    key: &str,
    span: std::ops::Range<usize>,
) -> Result<Value, Diagnostic> {
    if !key.starts_with('_') {
        return Ok(Value::Number(state.flags.get_or_zero(key)));
    }

    let (name, args) = match key.find('(') {
        Some(open) => {
            if !key.ends_with(')') {
                let message = format!("unclosed argument list in \"{key}\"");
                return Err(Diagnostic::warning(span, message));
            }
            let inner = &key[open + 1..key.len() - 1];
            let args = if inner.trim().is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(|a| a.trim().to_string()).collect()
            };
            (key[..open].trim_end(), args)
        }
        None => (key, Vec::new()),
    };

    match conditions.get(name) {
        Some(entry) => Ok(entry.evaluate(state, &args)),
        None => {
            let mut diag = conditions.missing(span, name);
            diag.severity = Severity::Error;
            Err(diag)
        }
    }
}

/// Apply a comparison operator.
///
/// `=`/`==` are loose (coercing) equality and `!=` its negation. The
/// ordering operators compare numerically and reject operands that do
/// not coerce to a number.
fn compare(op: &str, left: &Value, right: &Value) -> Result<bool, String> {
    match op {
        "=" | "==" => Ok(left.loose_eq(right)),
        "!=" => Ok(!left.loose_eq(right)),
        _ => {
            let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
                return Err(format!(
                    "cannot compare \"{left}\" {op} \"{right}\" numerically"
                ));
            };
            Ok(match op {
                ">" => l > r,
                "<" => l < r,
                ">=" => l >= r,
                "<=" => l <= r,
                other => return Err(format!("unsupported operator \"{other}\"")),
            })
        }
    }
}

/// Locate the leftmost comparison operator at parenthesis depth zero.
fn find_operator(text: &str) -> Option<(usize, &'static str)> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                for op in OPERATORS {
                    if text[i..].starts_with(op) {
                        return Some((i, op));
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas at parenthesis depth zero, keeping each part's byte
/// offset.
fn split_top_level(text: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, &text[start..]));
    parts
}
