use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use colored::Colorize;
use fabula_script::{ActionEntry, ActionFlow, ResolveOptions};

pub fn run(story_path: &Path, start: Option<&str>) -> Result<(), String> {
    let (story, mut engine) = super::load(story_path)?;
    let mut state = story.build_state()?;

    // Navigation target shared with the goTo handler, so choices can
    // move the story to another fragment.
    let target: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let goto = Rc::clone(&target);
    engine.register_action(
        "goTo",
        ActionEntry::new(move |_, payload| {
            if let Some(next) = payload.as_str() {
                *goto.borrow_mut() = Some(next.to_string());
            }
            ActionFlow::Continue
        }),
    );

    let mut current = match start.or_else(|| story.start_fragment()) {
        Some(name) => name.to_string(),
        None => return Err("story has no fragments".into()),
    };

    if let Some(title) = &story.title {
        println!("  {}\n", title.bold());
    }
    println!("  Pick choices by number or id. 'quit' exits.\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    'story: loop {
        let fragment = story.fragment(&current)?;
        let resolution = engine.resolve(&mut state, &fragment.text, ResolveOptions::default());
        super::print_diagnostics(&fragment.text, &current, &resolution.diagnostics);

        if let Some(next) = resolution.redirect {
            current = next;
            continue;
        }

        if let Some(id) = &resolution.speaker {
            println!("{}", format!("{}:", super::speaker_name(&state, id)).bold());
        }
        println!("{}\n", resolution.output);

        let mut open = Vec::new();
        for authored in &fragment.choices {
            let (choice, diags) = engine.build_choice(&state, authored.spec());
            super::print_diagnostics(&fragment.text, &current, &diags);
            if choice.visible {
                open.push(choice);
            }
        }
        if open.is_empty() {
            println!("  {}", "The end.".bold());
            break;
        }
        for (i, choice) in open.iter().enumerate() {
            if choice.available {
                println!("  {}. {}", i + 1, choice.display);
            } else {
                let label = format!("{} (unavailable)", choice.display);
                println!("  {}. {}", i + 1, label.dimmed());
            }
        }

        let picked = loop {
            print!("> ");
            io::stdout().flush().map_err(|e| e.to_string())?;

            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break 'story,
                Err(e) => return Err(e.to_string()),
                _ => {}
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("q") {
                break 'story;
            }

            let found = input
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| open.get(i))
                .or_else(|| open.iter().find(|c| c.id == input));
            match found {
                Some(choice) if choice.available => break choice,
                Some(choice) => {
                    println!("{}", format!("\"{}\" is not available.", choice.display).yellow());
                }
                None => println!("{}", "No such choice.".yellow()),
            }
        };

        let diags = engine.resolve_actions(&mut state, &picked.params, false);
        super::print_diagnostics(&fragment.text, &current, &diags);
        println!();

        if let Some(next) = target.borrow_mut().take() {
            current = next;
        }
    }

    Ok(())
}
