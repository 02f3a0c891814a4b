use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::core::models::StepOutcome;
use crate::core::state::RunState;

pub fn print_summary(state: &RunState) {
    if state.all_succeeded() {
        println!("\n{}", "siteup run complete".green().bold());
    } else {
        println!("\n{}", "siteup run failed".red().bold());
    }

    println!("{}: {}", "Application".cyan().bold(), state.app_dir);
    println!("{}: {}", "Site".cyan().bold(), state.site);
    println!("{}: {}", "Mode".cyan().bold(), state.mode);
    println!("{}: {}", "Run ID".cyan().bold(), state.run_id);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Step").add_attribute(Attribute::Bold),
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);

    for step in &state.steps {
        let outcome = match step.outcome {
            StepOutcome::Success => Cell::new("success").fg(Color::Green),
            StepOutcome::Skipped => Cell::new("skipped").fg(Color::Yellow),
            StepOutcome::Failed => Cell::new("failed").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&step.name),
            outcome,
            Cell::new(&step.detail),
        ]);
    }

    println!("{}", table);

    if let Some(failed) = state.failed_step() {
        println!(
            "\n{} {}: {}",
            "Failed at".red().bold(),
            failed.name,
            failed.detail
        );
    }
}
