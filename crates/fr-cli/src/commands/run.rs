use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use fr_core::EntityKind;
use fr_simulation::{Outcome, SimConfig, SimEventKind, Simulation};

pub struct RunOptions {
    pub ticks: u64,
    pub seed: u64,
    pub seconds_per_tick: f64,
    pub script: Option<PathBuf>,
    pub candidates: bool,
    pub step: bool,
    pub no_dynamics: bool,
    pub events: bool,
    pub json: bool,
}

/// One line of a command script.
#[derive(Debug, Clone, PartialEq)]
enum ScriptLine {
    /// `<robot> <action> [target]`; robot `_` addresses the selected robot.
    Command {
        robot: String,
        action: String,
        target: String,
    },
    /// `tick <n>`
    Tick(u64),
    /// `select <robot>`
    Select(String),
    /// `dynamics <on|off> <on|off> <seconds>`
    Dynamics {
        enabled: bool,
        on_step: bool,
        seconds: f64,
    },
}

fn parse_flag(word: &str, line: usize) -> Result<bool, String> {
    match word {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("line {line}: expected on/off, found \"{other}\"")),
    }
}

fn parse_script(text: &str) -> Result<Vec<(usize, ScriptLine)>, String> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let n = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let parsed = match words.as_slice() {
            ["tick", count] => ScriptLine::Tick(
                count
                    .parse()
                    .map_err(|_| format!("line {n}: invalid tick count \"{count}\""))?,
            ),
            ["select", robot] => ScriptLine::Select((*robot).to_string()),
            ["dynamics", enabled, on_step, seconds] => ScriptLine::Dynamics {
                enabled: parse_flag(enabled, n)?,
                on_step: parse_flag(on_step, n)?,
                seconds: seconds
                    .parse()
                    .map_err(|_| format!("line {n}: invalid interval \"{seconds}\""))?,
            },
            [robot, action, rest @ ..] if rest.len() <= 1 => ScriptLine::Command {
                robot: if *robot == "_" { String::new() } else { (*robot).to_string() },
                action: (*action).to_string(),
                target: rest.first().map(|t| (*t).to_string()).unwrap_or_default(),
            },
            _ => return Err(format!("line {n}: cannot parse \"{line}\"")),
        };
        lines.push((n, parsed));
    }
    Ok(lines)
}

/// What the CLI ran and what came of it.
struct Executed {
    command: String,
    outcome: Outcome,
}

pub fn run(file: &Path, opts: &RunOptions) -> Result<(), String> {
    if !(opts.seconds_per_tick.is_finite() && opts.seconds_per_tick > 0.0) {
        return Err(format!(
            "seconds per tick must be positive and finite, got {}",
            opts.seconds_per_tick
        ));
    }
    let script = match &opts.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            parse_script(&text)?
        }
        None => Vec::new(),
    };

    let scenario = super::load(file, opts.seed)?;
    let config = SimConfig::default()
        .with_seed(opts.seed)
        .with_seconds_per_tick(opts.seconds_per_tick)
        .with_max_events(1000);
    let mut sim = Simulation::from_scenario(scenario, config);
    if opts.no_dynamics {
        let interval = sim
            .dynamics()
            .map_or(45.0, |d| d.config().fire_spread_seconds);
        sim.configure_dynamics(false, false, interval);
    }
    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;

    let mut executed = Vec::new();
    let mut execute = |sim: &mut Simulation, robot: &str, action: &str, target: &str| {
        let outcome = if opts.step {
            sim.execute_step(robot, action, target)
        } else {
            sim.execute(robot, action, target)
        };
        let robot = if robot.is_empty() { "_" } else { robot };
        let command = if target.is_empty() {
            format!("{robot}: {action}")
        } else {
            format!("{robot}: {action}({target})")
        };
        executed.push(Executed { command, outcome });
    };

    if opts.candidates {
        for candidate in sim.candidates().to_vec() {
            execute(&mut sim, &candidate.robot, &candidate.action, &candidate.target);
        }
    }

    for (n, line) in script {
        match line {
            ScriptLine::Command {
                robot,
                action,
                target,
            } => execute(&mut sim, &robot, &action, &target),
            ScriptLine::Tick(count) => sim
                .run(count)
                .map_err(|e| format!("simulation error: {e}"))?,
            ScriptLine::Select(robot) => sim.select(&robot).map_err(|e| format!("line {n}: {e}"))?,
            ScriptLine::Dynamics {
                enabled,
                on_step,
                seconds,
            } => {
                if !sim.configure_dynamics(enabled, on_step, seconds) {
                    return Err(format!("line {n}: no dynamics engine"));
                }
            }
        }
    }

    sim.run(opts.ticks)
        .map_err(|e| format!("simulation error: {e}"))?;

    if opts.json {
        print_json(&sim, &executed)
    } else {
        print_report(&sim, file, opts, &executed);
        Ok(())
    }
}

fn print_json(sim: &Simulation, executed: &[Executed]) -> Result<(), String> {
    let to_value = |v: serde_json::Result<serde_json::Value>| v.map_err(|e| e.to_string());
    let commands: Vec<serde_json::Value> = executed
        .iter()
        .map(|e| {
            serde_json::json!({
                "command": e.command,
                "outcome": e.outcome.to_string(),
                "rejected": e.outcome.is_rejected(),
            })
        })
        .collect();

    let mut report = serde_json::Map::new();
    report.insert("frame".into(), to_value(serde_json::to_value(sim.view()))?);
    report.insert("commands".into(), serde_json::Value::Array(commands));
    report.insert(
        "events".into(),
        to_value(serde_json::to_value(sim.events().events()))?,
    );
    let text = serde_json::to_string_pretty(&serde_json::Value::Object(report))
        .map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn print_report(sim: &Simulation, file: &Path, opts: &RunOptions, executed: &[Executed]) {
    println!(
        "  {} '{}' {}",
        "Simulation".bold(),
        file.display(),
        format!(
            "({} ticks, seed={}, {}s/tick)",
            sim.current_tick(),
            opts.seed,
            opts.seconds_per_tick
        )
        .dimmed()
    );
    println!(
        "  {} commands executed, {} events logged",
        executed.len(),
        sim.events().len()
    );
    println!();

    if !executed.is_empty() {
        println!("  {}", "Commands".bold().underline());
        for e in executed {
            let outcome = e.outcome.to_string();
            let outcome = if e.outcome.is_rejected() {
                outcome.red()
            } else if e.outcome.is_deferred() {
                outcome.yellow()
            } else {
                outcome.green()
            };
            println!("  {:<32} {outcome}", e.command);
        }
        println!();
    }

    if opts.events {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[tick {:>3}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    let view = sim.view();

    println!("  {}", "Robots".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Robot", "Position", "Heading", "Equipped", "Holding", "Target"]);
    for robot in &view.robots {
        table.add_row(vec![
            robot.id.to_string(),
            super::fmt_xz(robot.position),
            super::fmt_xz(robot.heading),
            if robot.equipped { "yes" } else { "no" }.to_string(),
            super::or_dash(robot.holding.as_ref()),
            robot.target.map_or_else(|| "-".to_string(), super::fmt_xz),
        ]);
    }
    println!("{table}");
    println!();

    let count = |kind: EntityKind, active: bool| {
        view.entities
            .iter()
            .filter(|e| e.kind == kind && e.active == active)
            .count()
    };
    println!("  {}", "World".bold().underline());
    println!("  fires burning:      {}", count(EntityKind::Fire, true));
    println!("  fires extinguished: {}", count(EntityKind::Fire, false));
    println!("  survivors waiting:  {}", count(EntityKind::Survivor, true));
    println!("  survivors rescued:  {}", count(EntityKind::Survivor, false));
    if let Some(d) = &view.dynamics {
        let state = if d.suspended {
            "suspended".yellow()
        } else if d.enabled {
            "on".green()
        } else {
            "off".dimmed()
        };
        println!(
            "  dynamics:           {state} (every {}s, on_step: {})",
            d.fire_spread_seconds, d.on_step
        );
    }
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::FireSpawned { .. } => description.red().bold(),
        SimEventKind::FiresExtinguished { .. } | SimEventKind::Rescued { .. } => {
            description.green()
        }
        SimEventKind::CommandRejected { .. } | SimEventKind::NoSurvivorInView { .. } => {
            description.yellow()
        }
        SimEventKind::MoveStarted { .. } | SimEventKind::Arrived { .. } => description.blue(),
        SimEventKind::Revealed { .. } => description.cyan(),
        SimEventKind::DynamicsSuspended { .. }
        | SimEventKind::DynamicsResumed { .. }
        | SimEventKind::DynamicsConfigured { .. }
        | SimEventKind::ObstacleNudged { .. } => description.dimmed(),
        _ => description.normal(),
    }
}
