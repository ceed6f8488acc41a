use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use fabula_script::{ScriptEngine, register_defaults};

use crate::story::Story;

pub fn run(story_path: Option<&Path>) -> Result<(), String> {
    let mut engine = ScriptEngine::new();
    register_defaults(&mut engine);
    if let Some(path) = story_path {
        Story::load(path)?.apply_templates(&mut engine);
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Kind", "Timing"]);

    for name in engine.condition_registry().names() {
        table.add_row(vec![name, "condition", ""]);
    }
    for name in engine.action_registry().names() {
        let timing = engine
            .action_registry()
            .get(name)
            .map(action_timing)
            .unwrap_or_default();
        table.add_row(vec![name, "action", timing]);
    }
    for name in engine.placeholder_registry().names() {
        table.add_row(vec![name, "placeholder", ""]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} conditions, {} actions, {} placeholders",
        engine.condition_registry().len(),
        engine.action_registry().len(),
        engine.placeholder_registry().len(),
    );

    let templates: Vec<_> = engine.templates().collect();
    if !templates.is_empty() {
        let count = templates.len();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Container", "Template", "Text"]);
        for (container, name, text) in templates {
            table.add_row(vec![container.to_string(), name.to_string(), preview(text)]);
        }
        println!();
        println!("{table}");
        println!();
        println!("  {count} template{}", if count == 1 { "" } else { "s" });
    }

    Ok(())
}

fn action_timing(entry: &fabula_script::ActionEntry) -> &'static str {
    match (entry.event_delayed, entry.on_game_load) {
        (true, true) => "delayed, reload",
        (true, false) => "delayed",
        (false, true) => "reload",
        (false, false) => "",
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= 60 {
        return text.to_string();
    }
    let cut: String = text.chars().take(57).collect();
    format!("{cut}...")
}
