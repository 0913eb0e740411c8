// CLI entry point for the headless waymark demo.
//
// Builds a small course (a floor, a one-block step, a wall with a gap) on
// a `HeadlessClient`, starts a script thread that paths through it and
// mines a block at the end, and drives the host tick loop until the script
// finishes. Partway through, the host drops a block onto the route so the
// run shows a replan.
//
// Usage:
//   waymark-demo [OPTIONS]
//     --config <PATH>     Host config JSON (default: built-in defaults)
//     --control <PATH>    Control config JSON (default: built-in defaults)
//     --max-ticks <N>     Give up after this many host ticks (default: 2000)
//     --block-at <N>      Tick at which the route gets blocked (default: 30)

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use waymark_control::block::BlockKind;
use waymark_control::config::ControlConfig;
use waymark_control::scheduler::drive_tick;
use waymark_control::script::ScriptValue;
use waymark_control::spawn_script;
use waymark_control::types::VoxelCoord;
use waymark_headless::{HeadlessClient, HostConfig, HostError};

struct DemoArgs {
    host_config: Option<String>,
    control_config: Option<String>,
    max_ticks: u64,
    block_at: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();
    if let Err(e) = run(&args) {
        error!("demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &DemoArgs) -> Result<(), HostError> {
    let host_config = match &args.host_config {
        Some(path) => HostConfig::from_file(path)?,
        None => HostConfig {
            world_size: [24, 8, 24],
            ..HostConfig::default()
        },
    };
    let control_config = match &args.control_config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| HostError::Io {
                path: path.clone(),
                source,
            })?;
            ControlConfig::from_json(&json)?
        }
        None => ControlConfig::default(),
    };

    let mut client = HeadlessClient::flat(host_config)?;
    build_course(&mut client);
    client.spawn_player(VoxelCoord::new(4, 1, 4))?;
    let client = Arc::new(Mutex::new(client));

    let mut script = spawn_script(client.clone(), control_config, |player| {
        let reached = player.path_to_pos(4.5, 2.0, 16.5, &ScriptValue::Null)?;
        if !reached {
            return Ok(false);
        }
        player.long_mine_block(4, 2, 18)
    });

    let mut ticks = 0;
    while ticks < args.max_ticks && drive_tick(&client, &mut script) {
        ticks += 1;
        if ticks == args.block_at {
            let mut host = client.lock().unwrap_or_else(PoisonError::into_inner);
            host.set_block(VoxelCoord::new(4, 2, 11), BlockKind::Solid);
            info!(tick = ticks, "dropped a block onto the route");
        }
    }

    if !script.is_finished() {
        warn!(ticks, "script still running at tick limit");
    }
    let outcome = script.join()?;
    let host = client.lock().unwrap_or_else(PoisonError::into_inner);
    info!(
        ticks,
        outcome,
        jumps = host.jump_impulses,
        position = ?host.player_position(),
        "demo finished"
    );
    Ok(())
}

/// Floor at y = 0, a raised platform from z = 8 on, a wall at z = 13 with a
/// gap at x = 4, and a block to mine at the far end.
fn build_course(client: &mut HeadlessClient) {
    client.fill(VoxelCoord::new(0, 1, 8), VoxelCoord::new(23, 1, 23), BlockKind::Solid);
    client.fill(VoxelCoord::new(0, 2, 13), VoxelCoord::new(23, 3, 13), BlockKind::Solid);
    client.fill(VoxelCoord::new(4, 2, 13), VoxelCoord::new(5, 3, 13), BlockKind::Air);
    client.fill(VoxelCoord::new(4, 2, 18), VoxelCoord::new(4, 2, 18), BlockKind::Solid);
}

fn parse_args() -> DemoArgs {
    let mut parsed = DemoArgs {
        host_config: None,
        control_config: None,
        max_ticks: 2000,
        block_at: 30,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                parsed.host_config = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--control" => {
                i += 1;
                parsed.control_config = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--control requires a path");
                    std::process::exit(1);
                }));
            }
            "--max-ticks" => {
                i += 1;
                parsed.max_ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--max-ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--block-at" => {
                i += 1;
                parsed.block_at = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--block-at requires a valid number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_usage() {
    println!("Usage: waymark-demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>     Host config JSON (default: built-in defaults)");
    println!("  --control <PATH>    Control config JSON (default: built-in defaults)");
    println!("  --max-ticks <N>     Give up after this many host ticks (default: 2000)");
    println!("  --block-at <N>      Tick at which the route gets blocked (default: 30)");
    println!("  --help, -h          Show this help");
}
