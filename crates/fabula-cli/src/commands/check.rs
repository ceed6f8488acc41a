use std::path::Path;

use fabula_script::{ResolveOptions, error_count};

pub fn run(story_path: &Path, fragment: Option<&str>) -> Result<(), String> {
    let (story, engine) = super::load(story_path)?;

    if let Some(start) = &story.start {
        story
            .fragment(start)
            .map_err(|e| format!("start fragment: {e}"))?;
    }

    let names: Vec<&str> = match fragment {
        Some(name) => {
            story.fragment(name)?;
            vec![name]
        }
        None => story.fragments.keys().map(String::as_str).collect(),
    };

    let mut errors = 0usize;
    let mut warnings = 0usize;
    for name in &names {
        let fragment = story.fragment(name)?;
        let mut state = story.build_state()?;

        let resolution = engine.resolve(
            &mut state,
            &fragment.text,
            ResolveOptions::new().without_actions(),
        );
        let mut diagnostics = resolution.diagnostics;
        for choice in &fragment.choices {
            let (_, diags) = engine.build_choice(&state, choice.spec());
            diagnostics.extend(diags);
        }

        let label = format!("{}#{name}", story_path.display());
        super::print_diagnostics(&fragment.text, &label, &diagnostics);

        let fragment_errors = error_count(&diagnostics);
        errors += fragment_errors;
        warnings += diagnostics.len() - fragment_errors;
    }

    if errors > 0 {
        return Err(format!(
            "{errors} error{} across {} fragment{}",
            if errors == 1 { "" } else { "s" },
            names.len(),
            if names.len() == 1 { "" } else { "s" },
        ));
    }

    let title = story.title.as_deref().unwrap_or("story");
    println!("  All checks passed for '{title}'.");
    println!(
        "  {} fragment{}, {} warning{}",
        names.len(),
        if names.len() == 1 { "" } else { "s" },
        warnings,
        if warnings == 1 { "" } else { "s" },
    );

    Ok(())
}
