/// Combatants: the two fighters and the data their state machine runs on.
/// One struct serves both; the `Role` only decides who feeds it intents.

use crate::config::{ArchetypeConfig, Clip};
use super::timer::Timer;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Player,
    Enemy,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// +1 facing right, -1 facing left.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Direction that points from `from` toward `to`.
    pub fn toward(from: f32, to: f32) -> Facing {
        if to < from { Facing::Left } else { Facing::Right }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

/// Action state machine (shared by Player and Enemy).
/// Exactly one is active; hit-stun is not a state, it is `damage_timer`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActionState {
    Idle,
    Running,
    /// `impact_spent` flips once the impact frame has been evaluated,
    /// so a cycle can land at most one hit.
    Attacking { impact_spent: bool },
    Charging,
    Jumping,
    Falling,
    Dying,
    Dead,
}

impl ActionState {
    #[cfg(test)]
    pub fn is_attacking(self) -> bool {
        matches!(self, ActionState::Attacking { .. })
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, ActionState::Jumping | ActionState::Falling)
    }

    /// Dying or Dead: intents no longer apply.
    pub fn is_down(self) -> bool {
        matches!(self, ActionState::Dying | ActionState::Dead)
    }
}

/// What a controller (keyboard or AI) wants this tick.
/// Player input and AI policy both produce this; the state machine
/// does not know which one it came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Intent {
    pub movement: Option<Facing>,
    pub attack: bool,
    pub charge: bool,
    pub jump: bool,
}

impl Intent {
    pub const IDLE: Intent = Intent { movement: None, attack: false, charge: false, jump: false };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    pub role: Role,
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub health: u32,
    pub state: ActionState,
    /// Column within the current state's sprite row.
    pub frame: u32,
    pub frame_timer: Timer,
    /// Time since the last hit taken. Drives hit-flash and stagger.
    pub damage_timer: Timer,
    /// Time since the last attack was started (only the AI reads it).
    pub attack_timer: Timer,
}

/// Initial damage timer: comfortably past both the flash and stagger
/// windows so nobody spawns looking freshly hit.
pub fn spawn_damage_time(arch: &ArchetypeConfig) -> f32 {
    arch.hit_flash.max(arch.stagger_duration) + 1.0
}

impl Combatant {
    pub fn new(role: Role, arch: &ArchetypeConfig, position: Vec2, facing: Facing) -> Self {
        Combatant {
            role,
            position,
            velocity: Vec2::ZERO,
            facing,
            health: arch.max_health,
            state: ActionState::Idle,
            frame: 0,
            frame_timer: Timer::new(),
            damage_timer: Timer::primed(spawn_damage_time(arch)),
            attack_timer: Timer::new(),
        }
    }

    /// Put the fighter back on its mark with full health and fresh timers.
    /// The record is reused, never rebuilt, so `role` survives.
    pub fn respawn(&mut self, arch: &ArchetypeConfig, position: Vec2, facing: Facing) {
        *self = Combatant::new(self.role, arch, position, facing);
    }

    /// Health above zero. A fighter at zero health is still animating its
    /// death for a few ticks but no longer counts as alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    #[cfg(test)]
    pub fn is_dead(&self) -> bool {
        self.state == ActionState::Dead
    }

    /// Enter a new state from its first frame.
    pub fn enter(&mut self, state: ActionState) {
        self.state = state;
        self.frame = 0;
    }

    pub fn face(&mut self, facing: Facing) {
        self.facing = facing;
    }

    /// Take one point of damage and restart the hit window.
    pub fn take_hit(&mut self) {
        self.health = self.health.saturating_sub(1);
        self.damage_timer.reset();
    }

    pub fn is_flashing(&self, arch: &ArchetypeConfig) -> bool {
        !self.damage_timer.ready(arch.hit_flash)
    }

    pub fn is_staggered(&self, arch: &ArchetypeConfig) -> bool {
        !self.damage_timer.ready(arch.stagger_duration)
    }

    /// The sprite row backing the current state.
    pub fn clip(&self, arch: &ArchetypeConfig) -> Clip {
        let c = &arch.clips;
        match self.state {
            ActionState::Idle => c.idle,
            ActionState::Running => c.run,
            ActionState::Attacking { .. } => c.attack,
            ActionState::Charging => c.charge,
            ActionState::Jumping => c.jump,
            ActionState::Falling => c.fall,
            ActionState::Dying | ActionState::Dead => c.death,
        }
    }

    /// (row, column) to sample, with the column clamped into the clip.
    /// Dead always shows the final column of the death row.
    pub fn sheet_cell(&self, arch: &ArchetypeConfig) -> (u32, u32) {
        let clip = self.clip(arch);
        let last = clip.frames.saturating_sub(1);
        let col = match self.state {
            ActionState::Dead => last,
            _ => self.frame.min(last),
        };
        (clip.row, col)
    }
}
