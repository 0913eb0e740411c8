// waymark_headless — reference host for waymark scripts.
//
// A tiny voxel game with just enough simulation to exercise the control
// layer end to end: a dense block grid, AABB player physics with gravity
// and jumping, drifting entities, an inventory and a toy interaction model.
// It is a test and demo harness, not a model of any real game.
//
// Module overview:
// - `client.rs`:  HeadlessClient, implements every `waymark_control::host` trait.
// - `world.rs`:   Dense 3D voxel grid + DDA raycast.
// - `physics.rs`: Axis-separated AABB movement, gravity, jumps, ladders.
// - `config.rs`:  HostConfig, every physics and interaction tunable.
// - `error.rs`:   HostError.
//
// The `waymark-demo` binary runs a scripted walk through a small course on
// a script thread; `tests/` holds the end-to-end scenarios.

pub mod client;
pub mod config;
pub mod error;
pub mod physics;
pub mod world;

pub use client::HeadlessClient;
pub use config::HostConfig;
pub use error::HostError;
