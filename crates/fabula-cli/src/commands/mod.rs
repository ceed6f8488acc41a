pub mod check;
pub mod play;
pub mod registry;
pub mod run;

use std::path::Path;

use fabula_script::{Diagnostic, ScriptEngine, Severity, register_defaults, render_diagnostics};

use crate::story::Story;

/// Load a story and build an engine carrying the default registrations
/// plus the story's templates.
fn load(path: &Path) -> Result<(Story, ScriptEngine), String> {
    let story = Story::load(path)?;
    let mut engine = ScriptEngine::new();
    register_defaults(&mut engine);
    story.apply_templates(&mut engine);
    Ok((story, engine))
}

/// Print diagnostics to stderr using ariadne, with a count footer.
fn print_diagnostics(source: &str, name: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let rendered = render_diagnostics(source, name, diagnostics);
    eprint!("{rendered}");

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    } else if warnings > 0 {
        eprintln!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }
}

/// Display name for a speaker id: the character's name when known.
fn speaker_name(state: &fabula_core::GameState, id: &str) -> String {
    state
        .character(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}
