use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use fr_core::EntityKind;

pub fn run(file: &Path, kind: Option<&str>, seed: u64) -> Result<(), String> {
    let scenario = super::load(file, seed)?;
    let world = &scenario.world;

    let filter = match kind {
        Some(name) => Some(
            EntityKind::parse(name).ok_or_else(|| format!("unknown entity kind: \"{name}\""))?,
        ),
        None => None,
    };

    let entities: Vec<_> = world
        .all_entities()
        .filter(|e| filter.is_none_or(|k| e.kind == k))
        .collect();

    if entities.is_empty() {
        println!("  No entities found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Kind", "Room", "Position", "Shown"]);

    for entity in &entities {
        table.add_row(vec![
            entity.id.to_string(),
            entity.kind.to_string(),
            super::or_dash(entity.room.as_ref()),
            super::fmt_xz(entity.position),
            if entity.shown { "yes" } else { "no" }.to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} entities", entities.len());

    Ok(())
}
