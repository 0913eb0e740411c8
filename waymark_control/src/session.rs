// Per-script control session.
//
// A `ControlSession` bundles what one running script owns: its scheduler
// (borrowed), its `InputState`, and the control config. Every control
// operation takes the session explicitly; there is no ambient "current
// script" lookup.
//
// Dropping the session resets the input to neutral and tells the scheduler
// to release it, so a script that ends (or errors out) never leaves keys
// held down in the host.

use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::host::{GameClient, PlayerSnapshot};
use crate::input::InputState;
use crate::scheduler::TickScheduler;
use tracing::trace;

pub struct ControlSession<'a, S: TickScheduler> {
    scheduler: &'a mut S,
    input: InputState,
    config: ControlConfig,
}

impl<'a, S: TickScheduler> ControlSession<'a, S> {
    pub fn new(scheduler: &'a mut S, config: ControlConfig) -> Self {
        Self {
            scheduler,
            input: InputState::neutral(),
            config,
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn set_blocking(&mut self, blocked: bool) {
        self.input.blocked = blocked;
    }

    pub fn is_blocking(&self) -> bool {
        self.input.blocked
    }

    /// The host client, between ticks.
    pub fn client(&mut self) -> Result<S::ClientGuard<'_>, ControlError> {
        self.scheduler.client()
    }

    /// Snapshot of the controlled player.
    pub fn player(&mut self) -> Result<PlayerSnapshot, ControlError> {
        self.client()?.player().ok_or(ControlError::NoPlayer)
    }

    /// Hand the current input to the host and wait out one tick.
    pub fn tick(&mut self) -> Result<(), ControlError> {
        self.scheduler.advance_one_tick(&self.input)
    }

    pub fn current_tick(&self) -> u64 {
        self.scheduler.current_tick()
    }
}

impl<S: TickScheduler> Drop for ControlSession<'_, S> {
    fn drop(&mut self) {
        trace!(target: "script", tick = self.scheduler.current_tick(), "session ended");
        self.input.reset();
        self.scheduler.release_input();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MovementFlags;
    use crate::scheduler::LocalScheduler;
    use crate::testing::TestHost;

    #[test]
    fn tick_hands_current_input_to_host() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(4));
        {
            let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
            session.input_mut().flags.sneak = true;
            session.set_blocking(true);
            session.tick().unwrap();
            assert_eq!(session.current_tick(), 1);
        }
        let seen = scheduler.host().last_input.unwrap();
        assert!(seen.blocked);
        assert!(seen.flags.sneak);
    }

    #[test]
    fn drop_releases_input() {
        let mut scheduler = LocalScheduler::new(TestHost::flat(4));
        {
            let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
            session.input_mut().flags = MovementFlags {
                forward: true,
                ..MovementFlags::NONE
            };
            session.tick().unwrap();
        }
        assert!(!scheduler.is_holding_input());
    }

    #[test]
    fn drop_releases_input_after_error() {
        fn failing(scheduler: &mut LocalScheduler<TestHost>) -> Result<(), ControlError> {
            let mut session = ControlSession::new(scheduler, ControlConfig::default());
            session.input_mut().flags.forward = true;
            session.tick()?;
            Err(ControlError::NoPlayer)
        }
        let mut scheduler = LocalScheduler::new(TestHost::flat(4));
        assert!(failing(&mut scheduler).is_err());
        assert!(!scheduler.is_holding_input());
    }

    #[test]
    fn player_without_entity_is_an_error() {
        let mut host = TestHost::flat(4);
        host.player = None;
        let mut scheduler = LocalScheduler::new(host);
        let mut session = ControlSession::new(&mut scheduler, ControlConfig::default());
        assert!(matches!(session.player(), Err(ControlError::NoPlayer)));
    }
}
