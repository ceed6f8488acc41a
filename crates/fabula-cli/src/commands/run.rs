use std::path::Path;

use colored::Colorize;
use fabula_script::ResolveOptions;

pub fn run(story_path: &Path, name: &str, no_actions: bool) -> Result<(), String> {
    let (story, engine) = super::load(story_path)?;
    let fragment = story.fragment(name)?;
    let mut state = story.build_state()?;

    let options = if no_actions {
        ResolveOptions::new().without_actions()
    } else {
        ResolveOptions::default()
    };
    let resolution = engine.resolve(&mut state, &fragment.text, options);

    let label = format!("{}#{name}", story_path.display());
    super::print_diagnostics(&fragment.text, &label, &resolution.diagnostics);

    if let Some(target) = &resolution.redirect {
        println!("  {} {target}", "Redirects to".bold());
        return Ok(());
    }

    if let Some(id) = &resolution.speaker {
        println!("{}", format!("{}:", super::speaker_name(&state, id)).bold());
    }
    println!("{}", resolution.output);

    if !resolution.actions.is_empty() {
        println!();
        println!("  {}", "Actions".bold().underline());
        for (action, payload) in &resolution.actions {
            println!("  {action}: {payload}");
        }
    }

    Ok(())
}
