use std::path::Path;

use colored::Colorize;

pub fn run(file: &Path, id: &str, seed: u64) -> Result<(), String> {
    let scenario = super::load(file, seed)?;
    let world = &scenario.world;

    let entity = world
        .get(id)
        .map_err(|_| format!("entity not found: \"{id}\""))?;

    println!("  {} [{}]", entity.id.to_string().bold(), entity.kind.to_string().dimmed());
    println!();
    println!("  position:   ({:.2}, {:.2}, {:.2})", entity.position.x, entity.position.y, entity.position.z);
    println!("  room:       {}", super::or_dash(entity.room.as_ref()));
    println!("  active:     {}", entity.active);
    println!("  shown:      {}", entity.shown);
    if entity.half_extents != glam::Vec3::ZERO {
        let size = entity.footprint().size();
        println!("  footprint:  {:.1} x {:.1}", size.x, size.z);
    }

    if let Ok(robot) = world.robot(id) {
        println!();
        println!("  {}", "Robot".dimmed());
        println!("  heading:    {}", super::fmt_xz(robot.heading));
        println!("  fov:        {} deg, range {}", robot.fov.angle_deg, robot.fov.range);
        println!("  equipped:   {}", robot.equipped);
        println!("  holding:    {}", super::or_dash(robot.holding.as_ref()));
    }

    Ok(())
}
