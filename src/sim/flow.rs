/// Screen flow: Start → Playing → End → Playing …
///
/// ┌─────────┬──────────────────────────────┬─────────┐
/// │ Phase    │ Trigger                       │ Next    │
/// ├─────────┼──────────────────────────────┼─────────┤
/// │ Start    │ Begin (edge)                  │ Playing │
/// │ Playing  │ a death animation completes   │ End     │
/// │ End      │ Confirm or Respawn (edge)     │ Playing │
/// │ any      │ Exit (level)                  │ quit    │
/// └─────────┴──────────────────────────────┴─────────┘
///
/// `Flow` only decides; the world applies positioning and resets.

use crate::domain::controls::{Control, ControlSnapshot, EdgeTrigger};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Start,
    Playing,
    End,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    None,
    PlayerWon,
    PlayerLost,
}

/// What the flow wants done this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlowCommand {
    Stay,
    /// Start → Playing: move both fighters to their combat marks.
    BeginMatch,
    /// End → Playing: full reset.
    Rematch,
    Quit,
}

#[derive(Clone, Debug)]
pub struct Flow {
    pub phase: Phase,
    pub outcome: Outcome,
    begin: EdgeTrigger,
    confirm: EdgeTrigger,
    respawn: EdgeTrigger,
}

impl Flow {
    pub fn new() -> Self {
        Flow {
            phase: Phase::Start,
            outcome: Outcome::None,
            begin: EdgeTrigger::default(),
            confirm: EdgeTrigger::default(),
            respawn: EdgeTrigger::default(),
        }
    }

    /// Read this tick's controls and perform any input-driven transition.
    /// Edge triggers are fed every tick so a key held across a phase
    /// change does not fire on arrival.
    pub fn poll(&mut self, controls: &ControlSnapshot) -> FlowCommand {
        let begin = self.begin.update(controls.is_active(Control::Begin));
        let confirm = self.confirm.update(controls.is_active(Control::Confirm));
        let respawn = self.respawn.update(controls.is_active(Control::Respawn));

        if controls.is_active(Control::Exit) {
            return FlowCommand::Quit;
        }

        match self.phase {
            Phase::Start if begin => {
                self.phase = Phase::Playing;
                tracing::info!("match started");
                FlowCommand::BeginMatch
            }
            Phase::End if confirm || respawn => {
                self.phase = Phase::Playing;
                self.outcome = Outcome::None;
                tracing::info!("rematch");
                FlowCommand::Rematch
            }
            _ => FlowCommand::Stay,
        }
    }

    /// Playing → End. The outcome is recorded once; later calls are ignored.
    pub fn finish(&mut self, outcome: Outcome) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::End;
        self.outcome = outcome;
        tracing::info!(?outcome, "match over");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(cs: &[Control]) -> ControlSnapshot {
        cs.iter().copied().collect()
    }

    #[test]
    fn begin_moves_start_to_playing_once() {
        let mut f = Flow::new();
        assert_eq!(f.poll(&snap(&[])), FlowCommand::Stay);
        assert_eq!(f.poll(&snap(&[Control::Begin])), FlowCommand::BeginMatch);
        assert_eq!(f.phase, Phase::Playing);
        assert_eq!(f.poll(&snap(&[Control::Begin])), FlowCommand::Stay);
    }

    #[test]
    fn confirm_is_ignored_outside_end() {
        let mut f = Flow::new();
        assert_eq!(f.poll(&snap(&[Control::Confirm])), FlowCommand::Stay);
        assert_eq!(f.phase, Phase::Start);
    }

    #[test]
    fn finish_then_rematch_clears_outcome() {
        let mut f = Flow::new();
        f.poll(&snap(&[Control::Begin]));
        assert!(f.finish(Outcome::PlayerWon));
        assert!(!f.finish(Outcome::PlayerLost));
        assert_eq!(f.outcome, Outcome::PlayerWon);
        assert_eq!(f.poll(&snap(&[Control::Respawn])), FlowCommand::Rematch);
        assert_eq!(f.phase, Phase::Playing);
        assert_eq!(f.outcome, Outcome::None);
    }

    #[test]
    fn confirm_held_through_match_end_needs_a_fresh_press() {
        let mut f = Flow::new();
        f.poll(&snap(&[Control::Begin]));
        f.poll(&snap(&[Control::Confirm]));
        f.finish(Outcome::PlayerLost);
        assert_eq!(f.poll(&snap(&[Control::Confirm])), FlowCommand::Stay);
        f.poll(&snap(&[]));
        assert_eq!(f.poll(&snap(&[Control::Confirm])), FlowCommand::Rematch);
    }

    #[test]
    fn exit_quits_from_any_phase() {
        let mut f = Flow::new();
        assert_eq!(f.poll(&snap(&[Control::Exit])), FlowCommand::Quit);
        f.poll(&snap(&[Control::Begin]));
        assert_eq!(f.poll(&snap(&[Control::Exit, Control::MoveLeft])), FlowCommand::Quit);
    }
}
