// Per-tick suspension of a script against the host clock.
//
// `TickScheduler::advance_one_tick(input)` is the only place a script ever
// waits. It hands the script's intent for the next tick to the host, blocks
// until the host has completed exactly one discrete step with it, and
// returns. Ticks are never skipped or coalesced, and there is no
// cancellation at this layer.
//
// Two implementations:
//
// - `LocalScheduler` owns a host implementing `HostTick` and steps it
//   in-process. Used by tests and single-threaded embeddings.
// - `ThreadedScheduler` is the script-side end of a channel rendezvous with
//   the host's tick loop. The host holds the matching `ScriptThread` and
//   calls `run_until_tick()` once per tick: that resumes the script and
//   blocks until the script yields its intent (or finishes). Both sides
//   share the client behind `Arc<Mutex<_>>`, but strict alternation means
//   the lock is never contended. Once the host drops its end, the script's
//   next `advance_one_tick` fails with `HostUnavailable`.
//
// Between ticks the script reads and writes host state through `client()`.
// The returned guard borrows the scheduler, so it cannot be held across
// `advance_one_tick`.
//
// See also: `session.rs` for the per-session input state these schedulers
// carry, `player.rs` for `spawn_script`, which starts a script on a
// `ScriptThread`.

use crate::error::ControlError;
use crate::host::{GameClient, HostTick};
use crate::input::InputState;
use std::ops::DerefMut;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// The script's view of the host clock.
pub trait TickScheduler {
    type Client: GameClient;

    type ClientGuard<'a>: DerefMut<Target = Self::Client>
    where
        Self: 'a;

    /// Access the host client between ticks.
    fn client(&mut self) -> Result<Self::ClientGuard<'_>, ControlError>;

    /// Run exactly one host tick with `input`, then return.
    fn advance_one_tick(&mut self, input: &InputState) -> Result<(), ControlError>;

    /// The session driving this scheduler has ended; the host should stop
    /// applying its intent.
    fn release_input(&mut self);

    /// Ticks completed through this scheduler.
    fn current_tick(&self) -> u64;
}

/// Steps an owned host in-process.
#[derive(Debug)]
pub struct LocalScheduler<C> {
    host: C,
    tick: u64,
    /// Intent applied by `idle_tick`; cleared by `release_input`.
    held: Option<InputState>,
}

impl<C: GameClient + HostTick> LocalScheduler<C> {
    pub fn new(host: C) -> Self {
        Self {
            host,
            tick: 0,
            held: None,
        }
    }

    pub fn host(&self) -> &C {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut C {
        &mut self.host
    }

    pub fn into_host(self) -> C {
        self.host
    }

    /// Step the host without a new script decision. The last intent keeps
    /// applying until the session releases it.
    pub fn idle_tick(&mut self) {
        self.host.step(self.held.as_ref());
        self.tick += 1;
    }

    pub fn is_holding_input(&self) -> bool {
        self.held.is_some()
    }
}

impl<C: GameClient + HostTick> TickScheduler for LocalScheduler<C> {
    type Client = C;
    type ClientGuard<'a>
        = &'a mut C
    where
        Self: 'a;

    fn client(&mut self) -> Result<Self::ClientGuard<'_>, ControlError> {
        Ok(&mut self.host)
    }

    fn advance_one_tick(&mut self, input: &InputState) -> Result<(), ControlError> {
        self.host.step(Some(input));
        self.held = Some(*input);
        self.tick += 1;
        Ok(())
    }

    fn release_input(&mut self) {
        trace!(target: "scheduler", tick = self.tick, "input released");
        self.held = None;
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }
}

/// Script-side end of a threaded tick rendezvous.
pub struct ThreadedScheduler<C> {
    client: Arc<Mutex<C>>,
    resume_rx: Receiver<()>,
    yield_tx: SyncSender<InputState>,
    tick: u64,
}

impl<C: GameClient> ThreadedScheduler<C> {
    /// Block until the host first resumes the script.
    fn wait_for_host(&self) -> Result<(), ControlError> {
        self.resume_rx
            .recv()
            .map_err(|_| ControlError::HostUnavailable)
    }
}

impl<C: GameClient> TickScheduler for ThreadedScheduler<C> {
    type Client = C;
    type ClientGuard<'a>
        = MutexGuard<'a, C>
    where
        Self: 'a;

    fn client(&mut self) -> Result<Self::ClientGuard<'_>, ControlError> {
        // A poisoned lock means the host panicked mid-step.
        self.client.lock().map_err(|_| ControlError::HostUnavailable)
    }

    fn advance_one_tick(&mut self, input: &InputState) -> Result<(), ControlError> {
        self.yield_tx
            .send(*input)
            .map_err(|_| ControlError::HostUnavailable)?;
        self.resume_rx
            .recv()
            .map_err(|_| ControlError::HostUnavailable)?;
        self.tick += 1;
        Ok(())
    }

    fn release_input(&mut self) {
        // Intent only crosses the channel inside `advance_one_tick`, so there
        // is nothing held on the host side to clear.
        trace!(target: "scheduler", tick = self.tick, "input released");
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }
}

/// Host-side handle of a script running on its own thread.
pub struct ScriptThread<R> {
    resume_tx: Option<SyncSender<()>>,
    yield_rx: Receiver<InputState>,
    handle: Option<JoinHandle<Result<R, ControlError>>>,
    finished: bool,
}

impl<R: Send + 'static> ScriptThread<R> {
    /// Start `script` on a new thread. It does not run until the first
    /// `run_until_tick`.
    pub fn spawn<C, F>(client: Arc<Mutex<C>>, script: F) -> Self
    where
        C: GameClient + Send + 'static,
        F: FnOnce(ThreadedScheduler<C>) -> Result<R, ControlError> + Send + 'static,
    {
        let (resume_tx, resume_rx) = mpsc::sync_channel(1);
        let (yield_tx, yield_rx) = mpsc::sync_channel(1);
        let scheduler = ThreadedScheduler {
            client,
            resume_rx,
            yield_tx,
            tick: 0,
        };
        let handle = thread::spawn(move || {
            scheduler.wait_for_host()?;
            script(scheduler)
        });
        Self {
            resume_tx: Some(resume_tx),
            yield_rx,
            handle: Some(handle),
            finished: false,
        }
    }

    /// Resume the script and block until it yields intent for this tick.
    /// `None` once the script has finished.
    pub fn run_until_tick(&mut self) -> Option<InputState> {
        if self.finished {
            return None;
        }
        let resumed = self
            .resume_tx
            .as_ref()
            .is_some_and(|tx| tx.send(()).is_ok());
        if !resumed {
            self.finished = true;
            return None;
        }
        match self.yield_rx.recv() {
            Ok(input) => Some(input),
            Err(_) => {
                debug!(target: "scheduler", "script finished");
                self.finished = true;
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop ticking the script and collect its result. A script that is
    /// still running sees `HostUnavailable` at its next tick.
    pub fn join(mut self) -> Result<R, ControlError> {
        self.resume_tx = None;
        let Some(handle) = self.handle.take() else {
            return Err(ControlError::HostUnavailable);
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!(target: "scheduler", "script thread panicked");
                Err(ControlError::ScriptPanicked)
            }
        }
    }
}

/// Run one host tick with the script's intent for it. Returns whether the
/// script is still running.
pub fn drive_tick<C: HostTick, R: Send + 'static>(
    host: &Mutex<C>,
    script: &mut ScriptThread<R>,
) -> bool {
    let input = script.run_until_tick();
    host.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .step(input.as_ref());
    input.is_some()
}
