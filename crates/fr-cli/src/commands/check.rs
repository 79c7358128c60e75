use std::path::Path;

pub fn run(file: &Path) -> Result<(), String> {
    let scenario = super::load(file, 42)?;
    let world = &scenario.world;

    println!("  All checks passed for '{}'.", file.display());
    println!(
        "  {} entities, {} robots, {} candidate actions",
        world.entity_count(),
        world.robot_ids().len(),
        scenario.candidates.len()
    );
    let counts: Vec<String> = world
        .active_counts_by_kind()
        .into_iter()
        .map(|(kind, n)| format!("{n} {kind}"))
        .collect();
    println!("  {}", counts.join(", "));

    Ok(())
}
