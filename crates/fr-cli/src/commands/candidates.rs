use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(file: &Path) -> Result<(), String> {
    let scenario = super::load(file, 42)?;

    if scenario.candidates.is_empty() {
        println!("  No candidate actions.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Robot", "Action", "Target"]);
    for (i, c) in scenario.candidates.iter().enumerate() {
        let target = if c.target.is_empty() { "-" } else { c.target.as_str() };
        table.add_row(vec![(i + 1).to_string(), c.robot.clone(), c.action.clone(), target.to_string()]);
    }

    println!("{table}");
    println!();
    println!("  {} candidate actions", scenario.candidates.len());

    Ok(())
}
