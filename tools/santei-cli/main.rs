use ahash::AHashMap;
use clap::{Parser, ValueEnum};
use santei::prelude::*;
use std::fs;
use std::io::{self, Write};
use tokio::runtime::{Builder, Runtime};

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderCli {
    Topological,
    DefinitionOrder,
}

/// Evaluate calculated metadata fields from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the field definitions JSON file (an array of field definitions)
    definitions_path: String,
    /// Optional path to a JSON object with the baseline field values
    baseline_path: Option<String>,

    /// Edits to apply in order, as `FieldId=value` (`FieldId=null` clears a field)
    #[arg(short, long = "set", value_name = "FIELD=VALUE")]
    edits: Vec<String>,

    /// Focus this field before applying the edits and blur it afterwards
    #[arg(short, long)]
    focus: Option<String>,

    /// The order in which calculated fields are recomputed
    #[arg(short, long, value_enum, default_value = "topological")]
    order: OrderCli,

    /// Identifier to save the payload under
    #[arg(long, default_value = "item")]
    identifier: String,

    /// Run in interactive mode to edit fields one command at a time
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start the async runtime: {}", e)));

    let mut form = open_form(&cli);
    if cli.human {
        run_interactive(&runtime, &mut form, &cli.identifier);
    } else {
        run_non_interactive(&runtime, &mut form, &cli);
    }
}

fn open_form(cli: &Cli) -> MetadataForm {
    let definitions_json = fs::read_to_string(&cli.definitions_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read definitions file '{}': {}",
            cli.definitions_path, e
        ))
    });

    let baseline = match &cli.baseline_path {
        Some(path) => load_baseline(path),
        None => {
            println!("No baseline file provided. Starting with empty values.");
            AHashMap::new()
        }
    };

    let order = match cli.order {
        OrderCli::Topological => RecalcOrder::Topological,
        OrderCli::DefinitionOrder => RecalcOrder::DefinitionOrder,
    };

    MetadataForm::builder(definitions_json.as_str(), baseline)
        .with_recalc_order(order)
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid field definitions: {}", e)))
}

fn load_baseline(path: &str) -> AHashMap<String, Value> {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read baseline file '{}': {}", path, e))
    });
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse baseline JSON: {}", e)));
    raw.iter()
        .map(|(id, value)| (id.clone(), Value::from_json(value)))
        .collect()
}

/// Runs the CLI in non-interactive mode, taking all edits from the command line.
fn run_non_interactive(runtime: &Runtime, form: &mut MetadataForm, cli: &Cli) {
    print_fields(form);

    if let Some(field_id) = &cli.focus {
        if !form.on_field_focus(field_id) {
            println!("Note: '{}' is not an editable calculated field; focus ignored.", field_id);
        }
    }

    for edit in &cli.edits {
        let (field_id, value) = parse_edit(edit).unwrap_or_else(|| {
            exit_with_error(&format!("Malformed edit '{}', expected FIELD=VALUE", edit))
        });
        apply_edit(form, field_id, value);
    }

    if let Some(field_id) = &cli.focus {
        form.on_field_blur(field_id);
    }

    if !cli.edits.is_empty() {
        println!("\nAfter {} edit(s):", cli.edits.len());
        print_fields(form);
    }
    save(runtime, form, &cli.identifier);
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive(runtime: &Runtime, form: &mut MetadataForm, identifier: &str) {
    println!("--- Santei Interactive Mode ---");
    println!("Commands: set FIELD=VALUE | focus FIELD | blur FIELD | show | save | reset | quit");
    print_fields(form);

    loop {
        let line = prompt_for_input("Command", None);
        let (command, argument) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        match command {
            "set" => match parse_edit(argument) {
                Some((field_id, value)) => {
                    apply_edit(form, field_id, value);
                    print_fields(form);
                }
                None => println!("Usage: set FIELD=VALUE"),
            },
            "focus" => {
                if form.on_field_focus(argument.trim()) {
                    println!("Focused '{}'.", argument.trim());
                } else {
                    println!("'{}' does not take part in manual overrides.", argument.trim());
                }
            }
            "blur" => {
                form.on_field_blur(argument.trim());
                print_fields(form);
            }
            "show" => print_fields(form),
            "save" => save(runtime, form, identifier),
            "reset" => {
                form.reset_form();
                print_fields(form);
            }
            "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown command '{}'.", other),
        }
    }
}

fn parse_edit(edit: &str) -> Option<(&str, Value)> {
    let (field_id, raw) = edit.split_once('=')?;
    let value = match raw.trim() {
        "" | "null" => Value::Null,
        text => Value::Text(text.to_string()),
    };
    Some((field_id.trim(), value))
}

fn apply_edit(form: &mut MetadataForm, field_id: &str, value: Value) {
    if let Err(e) = form.update_field_value(field_id, value) {
        eprintln!("Edit rejected: {}", e);
    }
}

fn print_fields(form: &MetadataForm) {
    println!("\n--- Fields ---");
    for field in form.fields() {
        let marker = match form.get_field_definition(&field.field_id) {
            Some(definition) if definition.allows_manual_override() => "=~",
            Some(definition) if definition.is_calculated() => "= ",
            _ => "  ",
        };
        let shown = if field.value.is_empty() {
            "<empty>".to_string()
        } else {
            field.value.to_string()
        };
        match &field.error_message {
            Some(message) => println!(
                "{} {:<20} {:<16} ({})",
                marker, field.field_id, shown, message
            ),
            None => println!("{} {:<20} {}", marker, field.field_id, shown),
        }
    }
    println!("-----------------------------");
    println!("Valid:       {}", form.is_valid());
    println!("Has Changes: {}", form.has_changes());
}

fn save(runtime: &Runtime, form: &mut MetadataForm, identifier: &str) {
    let store = InMemoryStore::new();
    match runtime.block_on(form.save_metadata(&store, identifier)) {
        Ok(payload) => {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to render payload: {}", e)));
            println!("\nPayload for '{}':\n{}", identifier, json);
        }
        Err(e) => println!("\nSave refused: {}", e),
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if let Err(e) = io::stdout().flush() {
        exit_with_error(&format!("Failed to flush stdout: {}", e));
    }

    match io::stdin().read_line(&mut line) {
        Ok(0) => return "quit".to_string(),
        Ok(_) => {}
        Err(e) => exit_with_error(&format!("Failed to read line: {}", e)),
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
