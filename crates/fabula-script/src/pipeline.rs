//! The multi-pass text resolution pipeline.
//!
//! One fragment flows through ordered passes: code escape,
//! placeholders, conditionals, templates, action extraction, speaker
//! detection, style markup, and finally restoration of protected
//! segments. Every pass degrades on bad input and reports a
//! diagnostic; the pipeline always returns best-effort output.

use fabula_core::GameState;

use crate::action::ActionMap;
use crate::block;
use crate::diagnostics::Diagnostic;
use crate::engine::ScriptEngine;
use crate::tolerant;

/// Sentinel wrapping the index of a protected segment, from the
/// private-use area so authored text never collides with it.
const PROTECT: char = '\u{E000}';

/// Caller knobs for one resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Execute non-deferred actions as blocks are extracted. On by
    /// default; linting and previews turn it off.
    pub execute_actions: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            execute_actions: true,
        }
    }
}

impl ResolveOptions {
    /// Options that execute actions (the default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress action execution; blocks are still extracted and
    /// returned (builder style).
    pub fn without_actions(mut self) -> Self {
        self.execute_actions = false;
        self
    }
}

/// The result of resolving one fragment.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Rendered text, empty when a redirect short-circuited.
    pub output: String,
    /// Id of the character named by a leading `SpeakerId: ` prefix.
    pub speaker: Option<String>,
    /// Every action block encountered, merged in authored order. For a
    /// redirect, the redirect block alone, unexecuted.
    pub actions: ActionMap,
    /// Target of a `redirect` action block, for the caller to act on.
    pub redirect: Option<String>,
    /// Everything the passes reported.
    pub diagnostics: Vec<Diagnostic>,
}

enum TemplateOutcome {
    Text(String),
    Redirect(String, ActionMap),
}

/// Run the full pipeline. `depth` tracks template re-entry.
pub(crate) fn run(
    engine: &ScriptEngine,
    state: &mut GameState,
    text: &str,
    options: &ResolveOptions,
    depth: usize,
) -> Resolution {
    let mut diagnostics = Vec::new();
    let mut protected: Vec<String> = Vec::new();
    let mut actions = ActionMap::new();

    let text = escape_code(text, &mut protected, &mut diagnostics);

    let (text, diags) = resolve_placeholders(engine, state, &text);
    diagnostics.extend(diags);

    let (text, diags) = block::process(&text, &engine.conditions, state);
    diagnostics.extend(diags);

    let text = match resolve_templates(
        engine,
        state,
        &text,
        options,
        depth,
        &mut protected,
        &mut actions,
        &mut diagnostics,
    ) {
        TemplateOutcome::Text(text) => text,
        TemplateOutcome::Redirect(target, map) => {
            return Resolution {
                actions: map,
                redirect: Some(target),
                diagnostics,
                ..Resolution::default()
            };
        }
    };

    let extraction = tolerant::extract(&text);
    diagnostics.extend(extraction.diagnostics);
    for (_, map) in &extraction.blocks {
        if options.execute_actions {
            diagnostics.extend(engine.resolve_actions(state, map, true));
        }
        for (name, payload) in map {
            actions.insert(name.clone(), payload.clone());
        }
    }
    if let Some((target, map)) = extraction.redirect {
        return Resolution {
            actions: map,
            redirect: Some(target),
            diagnostics,
            ..Resolution::default()
        };
    }

    let (speaker, text) = split_speaker(state, &extraction.output);
    let text = apply_style(&text);
    let output = restore_protected(&text, &protected);

    Resolution {
        output,
        speaker,
        actions,
        redirect: None,
        diagnostics,
    }
}

fn sentinel(index: usize) -> String {
    format!("{PROTECT}{index}{PROTECT}")
}

/// Lift `[code]...[/code]` bodies out of the text so no later pass
/// touches them. Unclosed `[code]` stays literal.
fn escape_code(
    text: &str,
    protected: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let mut out = String::new();
    let mut at = 0usize;

    while let Some(found) = text[at..].find("[code]") {
        let start = at + found;
        let body_start = start + "[code]".len();
        let Some(close_rel) = text[body_start..].find("[/code]") else {
            diagnostics.push(
                Diagnostic::warning(start..text.len(), "unclosed [code]")
                    .with_label("left as literal text"),
            );
            break;
        };
        let close = body_start + close_rel;
        out.push_str(&text[at..start]);
        out.push_str(&sentinel(protected.len()));
        protected.push(text[body_start..close].to_string());
        at = close + "[/code]".len();
    }
    out.push_str(&text[at..]);
    out
}

/// Replace sentinels with their stored segments. Anything that merely
/// looks like a sentinel is emitted unchanged.
fn restore_protected(text: &str, protected: &[String]) -> String {
    let mut out = String::new();
    let mut at = 0usize;

    while let Some(found) = text[at..].find(PROTECT) {
        let start = at + found;
        out.push_str(&text[at..start]);
        let after = start + PROTECT.len_utf8();
        let index_end = text[after..].find(PROTECT).map(|rel| after + rel);
        let saved = index_end.and_then(|end| {
            let index = text[after..end].parse::<usize>().ok()?;
            protected.get(index).map(|s| (end, s))
        });
        match saved {
            Some((end, segment)) => {
                out.push_str(segment);
                at = end + PROTECT.len_utf8();
            }
            None => {
                out.push(PROTECT);
                at = after;
            }
        }
    }
    out.push_str(&text[at..]);
    out
}

/// Resolve `|name|` and `|name(args)|` through the placeholder
/// registry. `|$...|` template references pass through untouched for
/// the template pass. Substituted text is not re-scanned.
fn resolve_placeholders(
    engine: &ScriptEngine,
    state: &GameState,
    text: &str,
) -> (String, Vec<Diagnostic>) {
    let mut out = String::new();
    let mut diagnostics = Vec::new();
    let mut at = 0usize;

    while let Some(found) = text[at..].find('|') {
        let open = at + found;
        out.push_str(&text[at..open]);
        let Some(close_rel) = text[open + 1..].find('|') else {
            out.push_str(&text[open..]);
            return (out, diagnostics);
        };
        let close = open + 1 + close_rel;
        let content = &text[open + 1..close];

        if content.starts_with('$') {
            out.push_str(&text[open..=close]);
            at = close + 1;
            continue;
        }
        match parse_call(content) {
            Some((name, args)) => {
                match engine.placeholders.get(name) {
                    Some(entry) => out.push_str(&entry.resolve(state, &args)),
                    None => {
                        diagnostics.push(engine.placeholders.missing(open..close + 1, name));
                        out.push_str(&text[open..=close]);
                    }
                }
                at = close + 1;
            }
            None => {
                // Not placeholder-shaped; the pipe was prose.
                out.push('|');
                at = open + 1;
            }
        }
    }
    out.push_str(&text[at..]);
    (out, diagnostics)
}

/// Parse `name` or `name(a, b)`. Arguments are split on commas at the
/// top level and trimmed; there is no nested parsing.
fn parse_call(content: &str) -> Option<(&str, Vec<String>)> {
    let (name, args) = match content.find('(') {
        Some(open) => {
            if !content.ends_with(')') {
                return None;
            }
            let inner = &content[open + 1..content.len() - 1];
            let args = if inner.trim().is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(|a| a.trim().to_string()).collect()
            };
            (&content[..open], args)
        }
        None => (content, Vec::new()),
    };
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, args))
}

/// Expand `|$name|` and `|$container.name|` template references by
/// recursively resolving the stored fragment. The child's output is
/// protected from the remaining passes; its actions merge into the
/// parent's map; a child redirect short-circuits the parent.
#[allow(clippy::too_many_arguments)]
fn resolve_templates(
    engine: &ScriptEngine,
    state: &mut GameState,
    text: &str,
    options: &ResolveOptions,
    depth: usize,
    protected: &mut Vec<String>,
    actions: &mut ActionMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> TemplateOutcome {
    let mut out = String::new();
    let mut at = 0usize;

    while let Some(found) = text[at..].find("|$") {
        let open = at + found;
        let Some(close_rel) = text[open + 2..].find('|') else {
            break;
        };
        let close = open + 2 + close_rel;
        let reference = &text[open + 2..close];
        out.push_str(&text[at..open]);
        at = close + 1;

        let Some(template) = engine.template_ref(reference) else {
            diagnostics.push(
                Diagnostic::warning(open..close + 1, format!("unknown template \"${reference}\""))
                    .with_label("left as literal text"),
            );
            out.push_str(&text[open..=close]);
            continue;
        };
        if depth + 1 >= engine.config.max_depth {
            diagnostics.push(Diagnostic::error(
                open..close + 1,
                format!(
                    "template \"${reference}\" exceeds the nesting limit of {}",
                    engine.config.max_depth
                ),
            ));
            continue;
        }

        let child = run(engine, state, template, options, depth + 1);
        diagnostics.extend(child.diagnostics);
        if let Some(target) = child.redirect {
            return TemplateOutcome::Redirect(target, child.actions);
        }
        for (name, payload) in child.actions {
            actions.insert(name, payload);
        }
        out.push_str(&sentinel(protected.len()));
        protected.push(child.output);
    }
    out.push_str(&text[at..]);
    TemplateOutcome::Text(out)
}

/// Strip a leading `SpeakerId: ` prefix when the id names a known
/// character. Ids never contain whitespace; anything else is left
/// alone.
fn split_speaker(state: &GameState, text: &str) -> (Option<String>, String) {
    let trimmed = text.trim_start();
    if let Some(colon) = trimmed.find(':') {
        let id = &trimmed[..colon];
        if !id.is_empty()
            && !id.chars().any(char::is_whitespace)
            && state.character(id).is_some()
        {
            let rest = &trimmed[colon + 1..];
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            return (Some(id.to_string()), rest.to_string());
        }
    }
    (None, text.to_string())
}

/// Apply the style markup: `**text**` becomes italic before `*text*`
/// becomes bold, in that order so the double marker is never consumed
/// as two singles. Unpaired markers stay literal.
fn apply_style(text: &str) -> String {
    let italic = replace_pairs(text, "**", "<i>", "</i>");
    replace_pairs(&italic, "*", "<b>", "</b>")
}

fn replace_pairs(text: &str, marker: &str, open_tag: &str, close_tag: &str) -> String {
    let mut out = String::new();
    let mut at = 0usize;

    while let Some(found) = text[at..].find(marker) {
        let start = at + found;
        let content_start = start + marker.len();
        let Some(rel) = text[content_start..].find(marker) else {
            break;
        };
        let end = content_start + rel;
        out.push_str(&text[at..start]);
        out.push_str(open_tag);
        out.push_str(&text[content_start..end]);
        out.push_str(close_tag);
        at = end + marker.len();
    }
    out.push_str(&text[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_bodies_round_trip_untouched() {
        let mut protected = Vec::new();
        let mut diags = Vec::new();
        let escaped = escape_code("a [code]*raw* if{x}[/code] b", &mut protected, &mut diags);
        assert!(!escaped.contains("*raw*"));
        assert_eq!(protected.len(), 1);

        let restored = restore_protected(&escaped, &protected);
        assert_eq!(restored, "a *raw* if{x} b");
        assert!(diags.is_empty());
    }

    #[test]
    fn unclosed_code_stays_literal() {
        let mut protected = Vec::new();
        let mut diags = Vec::new();
        let escaped = escape_code("a [code]dangling", &mut protected, &mut diags);
        assert_eq!(escaped, "a [code]dangling");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn stray_sentinel_chars_survive_restore() {
        let text = format!("x{PROTECT}y");
        assert_eq!(restore_protected(&text, &[]), text);
    }

    #[test]
    fn parse_call_shapes() {
        assert_eq!(parse_call("name"), Some(("name", vec![])));
        assert_eq!(
            parse_call("greet(a, b)"),
            Some(("greet", vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(parse_call("greet()"), Some(("greet", vec![])));
        assert!(parse_call("not a name").is_none());
        assert!(parse_call("").is_none());
        assert!(parse_call("broken(").is_none());
    }

    #[test]
    fn style_markup_mapping() {
        assert_eq!(apply_style("*bold*"), "<b>bold</b>");
        assert_eq!(apply_style("**italic**"), "<i>italic</i>");
        assert_eq!(apply_style("a *b* and **c**"), "a <b>b</b> and <i>c</i>");
        assert_eq!(apply_style("unpaired * stays"), "unpaired * stays");
    }

    #[test]
    fn speaker_requires_a_known_character() {
        use fabula_core::Character;
        let mut state = GameState::new();
        state
            .add_character(Character::new("kaela", "Kaela"))
            .unwrap();

        let (speaker, rest) = split_speaker(&state, "kaela: Hello there.");
        assert_eq!(speaker.as_deref(), Some("kaela"));
        assert_eq!(rest, "Hello there.");

        let (speaker, rest) = split_speaker(&state, "stranger: Hello.");
        assert!(speaker.is_none());
        assert_eq!(rest, "stranger: Hello.");

        let (speaker, _) = split_speaker(&state, "The guard: halt");
        assert!(speaker.is_none());
    }
}
