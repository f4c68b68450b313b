//! bulwark-skirmish: headless runner for the Bulwark decision engine.
//!
//! Usage:
//!   bulwark-skirmish run scenario.json --ticks 600
//!   bulwark-skirmish random --seed 7 --per-team 3 --ticks 900

use std::path::PathBuf;
use std::process;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::EnvFilter;

use bulwark_core::commands::{ActuatorCommand, ControlCommand};
use bulwark_core::constants::{DT, TICK_RATE};
use bulwark_core::events::EngineEvent;
use bulwark_core::types::UnitId;
use bulwark_sim::engine::{SimConfig, TickReport};
use bulwark_sim::sensors::ScriptedSensors;
use bulwark_sim::world_setup::{MissileSpec, UnitSpec};
use bulwark_sim::SimulationEngine;

const DEFAULT_TICKS: u64 = 30 * TICK_RATE as u64;

/// Scenario file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    seed: Option<u64>,
    ticks: Option<u64>,
    units: Vec<UnitSpec>,
    missiles: Vec<MissileSpec>,
    /// Sensor feed used until the first timeline entry replaces it.
    sensors: ScriptedSensors,
    timeline: Vec<TimelineEntry>,
}

/// Something that happens at the start of a given tick.
#[derive(Debug, Deserialize)]
struct TimelineEntry {
    tick: u64,
    #[serde(default)]
    sensors: Option<ScriptedSensors>,
    #[serde(default)]
    commands: Vec<ControlCommand>,
}

/// One line of output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Actuation {
        tick: u64,
        unit: UnitId,
        command: &'a ActuatorCommand,
    },
    Event {
        tick: u64,
        event: &'a EngineEvent,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "random" => cmd_random(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "bulwark-skirmish: headless runner for the Bulwark decision engine\n\
         \n\
         Commands:\n\
         \n\
         run       Play a scenario file\n\
         \n\
           <path>             Scenario JSON (units, missiles, sensor feeds, timeline)\n\
           --ticks <N>        Ticks to run (default: scenario value, else 900)\n\
           --events           Also print engine events\n\
         \n\
         random    Two random flights of fighters with guard mode on\n\
         \n\
           --seed <N>         RNG seed (default: 42)\n\
           --per-team <N>     Fighters per team (default: 2)\n\
           --ticks <N>        Ticks to run (default: 900)\n\
           --events           Also print engine events\n\
         \n\
         Output is one JSON object per line on stdout. Set RUST_LOG for logs on stderr.\n\
         \n\
         Examples:\n\
         \n\
           bulwark-skirmish run demos/head_on.json --ticks 600\n\
           RUST_LOG=info bulwark-skirmish random --seed 7 --per-team 3\n"
    );
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

// --- Run command ---

fn cmd_run(args: &[String]) {
    let path = match args.first().filter(|a| !a.starts_with("--")) {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("Error: scenario path is required");
            process::exit(1);
        }
    };

    let json = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    };
    let mut scenario: Scenario = match serde_json::from_str(&json) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error parsing scenario: {e}");
            process::exit(1);
        }
    };

    let ticks = parse_flag(args, "--ticks")
        .or(scenario.ticks)
        .unwrap_or(DEFAULT_TICKS);
    let mut engine = SimulationEngine::new(SimConfig {
        seed: scenario.seed.unwrap_or(SimConfig::default().seed),
    });

    for spec in std::mem::take(&mut scenario.units) {
        if let Err(e) = engine.spawn_unit(spec) {
            eprintln!("Error spawning unit: {e}");
            process::exit(1);
        }
    }
    for spec in std::mem::take(&mut scenario.missiles) {
        if let Err(e) = engine.spawn_missile(spec) {
            eprintln!("Error spawning missile: {e}");
            process::exit(1);
        }
    }

    eprintln!(
        "Scenario {}: {} entities, {} ticks",
        path.display(),
        engine.bodies().len(),
        ticks
    );

    scenario.timeline.sort_by_key(|e| e.tick);
    let mut timeline = scenario.timeline.into_iter().peekable();
    let mut sensors = scenario.sensors;
    let events = has_flag(args, "--events");

    for _ in 0..ticks {
        let tick = engine.time().tick;
        while let Some(entry) = timeline.next_if(|e| e.tick <= tick) {
            if let Some(feed) = entry.sensors {
                sensors = feed;
            }
            engine.queue_commands(entry.commands);
        }
        let report = engine.tick(&sensors);
        print_report(&report, events);
        integrate_motion(&mut engine);
    }

    print_summary(&engine);
}

// --- Random command ---

fn cmd_random(args: &[String]) {
    let seed = parse_flag(args, "--seed").unwrap_or(SimConfig::default().seed);
    let per_team: usize = parse_flag(args, "--per-team").unwrap_or(2);
    let ticks = parse_flag(args, "--ticks").unwrap_or(DEFAULT_TICKS);
    let events = has_flag(args, "--events");

    let mut engine = SimulationEngine::new(SimConfig { seed });
    if let Err(e) = engine.spawn_random_skirmish(per_team) {
        eprintln!("Error spawning skirmish: {e}");
        process::exit(1);
    }
    eprintln!("Random skirmish: seed {seed}, {per_team} per team, {ticks} ticks");

    let sensors = ScriptedSensors::omniscient();
    for _ in 0..ticks {
        let report = engine.tick(&sensors);
        print_report(&report, events);
        integrate_motion(&mut engine);
    }

    print_summary(&engine);
}

// --- Helpers ---

/// Straight-line motion. The engine never moves units itself.
fn integrate_motion(engine: &mut SimulationEngine) {
    for (id, mut body) in engine.bodies() {
        body.position = body.position.extrapolate(&body.velocity, DT);
        if let Err(e) = engine.update_body(id, body) {
            tracing::warn!(%e, unit = id.0, "body update failed");
        }
    }
}

fn print_report(report: &TickReport, with_events: bool) {
    let tick = report.time.tick;
    for actuation in &report.actuations {
        print_line(&Line::Actuation {
            tick,
            unit: actuation.unit,
            command: &actuation.command,
        });
    }
    if with_events {
        for event in &report.events {
            print_line(&Line::Event { tick, event });
        }
    }
}

fn print_line(line: &Line) {
    match serde_json::to_string(line) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error encoding output: {e}"),
    }
}

fn print_summary(engine: &SimulationEngine) {
    eprintln!("Finished at t={:.2}s", engine.time().elapsed_secs);
    for (id, _) in engine.bodies() {
        let Some(controller) = engine.controller(id) else {
            continue;
        };
        let remaining = engine.loadout(id).map_or(0, |l| l.len());
        eprintln!(
            "  unit {:>3}: {:?}, target {:?}, {} weapon(s)",
            id.0,
            controller.state(),
            controller.guard_target().map(|t| t.0),
            remaining
        );
    }
}
