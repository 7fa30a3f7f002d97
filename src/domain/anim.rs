/// Entity animation state machine.
///
/// One tick for one fighter runs in four calls, always in this order:
///
///   1. `begin_tick`   : advance timers, preempt into Dying at zero health
///   2. `apply_intent` : Idle/Running/Attacking/Charging/Jumping transitions
///   3. `integrate`    : move by velocity, gravity, landing, arena bounds
///   4. `advance`      : step the animation on the fixed cadence
///
/// Game-logic effects (impact frame, death completion) happen inside
/// `advance`, on the same tick the frame counter moves. They are reported
/// through `TickReport` rather than applied here, so the caller can
/// resolve both fighters against the same start-of-tick state.
///
/// ## Transition table
/// ┌──────────────────┬──────────────────────────────┬──────────────┐
/// │ From              │ Trigger                       │ To           │
/// ├──────────────────┼──────────────────────────────┼──────────────┤
/// │ any but Dying/Dead│ health == 0 (tick start)      │ Dying        │
/// │ Idle / Running    │ attack intent                 │ Attacking    │
/// │ Idle / Running    │ charge intent (if enabled)    │ Charging     │
/// │ Idle / Running    │ jump intent (if enabled)      │ Jumping      │
/// │ Idle              │ horizontal intent             │ Running      │
/// │ Running           │ no horizontal intent          │ Idle         │
/// │ Jumping           │ velocity.y > 0                │ Falling      │
/// │ Jumping / Falling │ touches ground                │ Idle         │
/// │ Attacking         │ last frame played             │ Idle         │
/// │ Charging          │ last frame played             │ Idle         │
/// │ Dying             │ last death frame, on ground   │ Dead         │
/// │ Dead              │ (only a match reset)          │ (none)       │
/// └──────────────────┴──────────────────────────────┴──────────────┘

use crate::config::{ArchetypeConfig, ArenaConfig, MechanicsConfig};
use super::entity::{ActionState, Combatant, Intent};

/// Everything noteworthy that happened to one fighter this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TickReport {
    /// Attacking or Charging was entered.
    pub swung: bool,
    /// Dying was entered.
    pub fell: bool,
    /// A running frame with a footfall was shown.
    pub footstep: bool,
    /// The attack reached its impact frame (range not yet checked).
    pub impact: bool,
    /// The death animation finished; the fighter is now Dead.
    pub died: bool,
}

impl Combatant {
    /// Step 1: timers, then death preemption.
    pub fn begin_tick(&mut self, dt: f32, report: &mut TickReport) {
        self.damage_timer.accumulate(dt);
        self.attack_timer.accumulate(dt);

        if self.health == 0 && !self.state.is_down() {
            self.enter(ActionState::Dying);
            self.velocity.x = 0.0;
            report.fell = true;
        }
    }

    /// Step 2: interpret an intent. Attacks, charges and death are
    /// uninterruptible; while they play, horizontal velocity is pinned to 0.
    pub fn apply_intent(
        &mut self,
        intent: Intent,
        arch: &ArchetypeConfig,
        mech: &MechanicsConfig,
        report: &mut TickReport,
    ) {
        match self.state {
            ActionState::Dying
            | ActionState::Dead
            | ActionState::Attacking { .. }
            | ActionState::Charging => {
                self.velocity.x = 0.0;
            }
            ActionState::Jumping | ActionState::Falling => {
                self.steer(intent, arch);
            }
            ActionState::Idle | ActionState::Running => {
                if let Some(dir) = intent.movement {
                    self.face(dir);
                }

                if intent.attack && self.is_alive() {
                    self.enter(ActionState::Attacking { impact_spent: false });
                    self.velocity.x = 0.0;
                    self.attack_timer.reset();
                    report.swung = true;
                } else if intent.charge && mech.charge && self.is_alive() {
                    self.enter(ActionState::Charging);
                    self.velocity.x = 0.0;
                    report.swung = true;
                } else if intent.jump && mech.jump {
                    self.velocity.y = -mech.jump_speed;
                    self.enter(ActionState::Jumping);
                    self.steer(intent, arch);
                } else {
                    self.steer(intent, arch);
                    match (self.state, intent.movement) {
                        (ActionState::Idle, Some(_)) => self.enter(ActionState::Running),
                        (ActionState::Running, None) => self.enter(ActionState::Idle),
                        _ => {}
                    }
                }
            }
        }
    }

    fn steer(&mut self, intent: Intent, arch: &ArchetypeConfig) {
        match intent.movement {
            Some(dir) => {
                self.face(dir);
                self.velocity.x = dir.sign() * arch.move_speed;
            }
            None => self.velocity.x = 0.0,
        }
    }

    /// Step 3: motion. Gravity acts on anyone above the ground line or
    /// moving vertically, so a fighter killed mid-jump still lands.
    pub fn integrate(&mut self, dt: f32, arena: &ArenaConfig, mech: &MechanicsConfig) {
        self.position.x = (self.position.x + self.velocity.x * dt).clamp(0.0, arena.width);

        if self.position.y < arena.ground || self.velocity.y != 0.0 {
            self.velocity.y += mech.gravity * dt;
            self.position.y += self.velocity.y * dt;

            if self.position.y >= arena.ground {
                self.position.y = arena.ground;
                self.velocity.y = 0.0;
                if self.state.is_airborne() {
                    self.enter(ActionState::Idle);
                }
            } else if self.state == ActionState::Jumping && self.velocity.y > 0.0 {
                self.enter(ActionState::Falling);
            }
        }
    }

    /// Step 4: animation cadence. At most one frame step per tick.
    /// A body killed in the air holds its last death frame until it lands.
    pub fn advance(
        &mut self,
        dt: f32,
        arch: &ArchetypeConfig,
        arena: &ArenaConfig,
        report: &mut TickReport,
    ) {
        if self.state == ActionState::Dead {
            return;
        }

        self.frame_timer.accumulate(dt);
        if !self.frame_timer.ready(arch.animation_speed) {
            return;
        }
        self.frame_timer.reset();

        let clips = &arch.clips;
        match self.state {
            ActionState::Idle => {
                self.frame = (self.frame + 1) % clips.idle.frames;
            }
            ActionState::Running => {
                self.frame = (self.frame + 1) % clips.run.frames;
                if self.frame == 0 || self.frame == (clips.run.frames + 1) / 2 {
                    report.footstep = true;
                }
            }
            ActionState::Attacking { impact_spent } => {
                self.frame += 1;
                if !impact_spent && self.frame == arch.impact_frame {
                    report.impact = true;
                    self.state = ActionState::Attacking { impact_spent: true };
                }
                if self.frame >= clips.attack.frames {
                    self.enter(ActionState::Idle);
                }
            }
            ActionState::Charging => {
                self.frame += 1;
                if self.frame >= clips.charge.frames {
                    self.enter(ActionState::Idle);
                }
            }
            ActionState::Jumping => {
                self.frame = (self.frame + 1).min(clips.jump.frames - 1);
            }
            ActionState::Falling => {
                self.frame = (self.frame + 1).min(clips.fall.frames - 1);
            }
            ActionState::Dying => {
                self.frame += 1;
                let last = clips.death.frames - 1;
                if self.frame >= last {
                    self.frame = last;
                    if self.position.y >= arena.ground {
                        self.state = ActionState::Dead;
                        report.died = true;
                    }
                }
            }
            ActionState::Dead => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Facing, Role, Vec2};

    const TICK: f32 = 0.075;

    fn fighter(cfg: &GameConfig) -> Combatant {
        Combatant::new(
            Role::Player,
            &cfg.player,
            Vec2::new(500.0, cfg.arena.ground),
            Facing::Right,
        )
    }

    fn run_tick(c: &mut Combatant, cfg: &GameConfig, intent: Intent) -> TickReport {
        let mut r = TickReport::default();
        c.begin_tick(TICK, &mut r);
        c.apply_intent(intent, &cfg.player, &cfg.mechanics, &mut r);
        c.integrate(TICK, &cfg.arena, &cfg.mechanics);
        c.advance(TICK, &cfg.player, &cfg.arena, &mut r);
        r
    }

    fn go(dir: Facing) -> Intent {
        Intent { movement: Some(dir), ..Intent::IDLE }
    }

    fn attack() -> Intent {
        Intent { attack: true, ..Intent::IDLE }
    }

    #[test]
    fn holding_right_runs_until_released() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, go(Facing::Right));
        assert_eq!(c.state, ActionState::Running);
        assert!(c.position.x > 500.0);
        for _ in 0..20 {
            run_tick(&mut c, &cfg, go(Facing::Right));
            assert_eq!(c.state, ActionState::Running);
        }
        run_tick(&mut c, &cfg, Intent::IDLE);
        assert_eq!(c.state, ActionState::Idle);
        assert_eq!(c.velocity.x, 0.0);
    }

    #[test]
    fn facing_flips_immediately() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, go(Facing::Left));
        assert_eq!(c.facing, Facing::Left);
        assert!(c.velocity.x < 0.0);
        run_tick(&mut c, &cfg, go(Facing::Right));
        assert_eq!(c.facing, Facing::Right);
    }

    #[test]
    fn attack_impacts_once_on_designated_frame_then_idles() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        let mut impacts = vec![];
        let first = run_tick(&mut c, &cfg, attack());
        assert!(first.swung);
        impacts.push(first.impact);
        for _ in 0..4 {
            // Intent is ignored mid-swing, including movement.
            let r = run_tick(&mut c, &cfg, go(Facing::Left));
            assert_eq!(c.velocity.x, 0.0);
            impacts.push(r.impact);
        }
        assert_eq!(impacts, vec![false, false, false, true, false]);
        assert_eq!(c.state, ActionState::Idle);
        assert_eq!(c.frame, 0);
        assert_eq!(c.position.x, 500.0);
    }

    #[test]
    fn held_attack_starts_a_fresh_cycle_with_a_fresh_impact() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        let impacts: usize = (0..10)
            .map(|_| run_tick(&mut c, &cfg, attack()))
            .filter(|r| r.impact)
            .count();
        assert_eq!(impacts, 2);
    }

    #[test]
    fn zero_health_preempts_attack_and_dies_once() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, attack());
        c.health = 0;
        let r = run_tick(&mut c, &cfg, attack());
        assert!(r.fell);
        assert_eq!(c.state, ActionState::Dying);

        let mut deaths = 0;
        let mut falls = 0;
        for _ in 0..10 {
            let r = run_tick(&mut c, &cfg, go(Facing::Right));
            deaths += r.died as u32;
            falls += r.fell as u32;
        }
        assert_eq!(deaths, 1);
        assert_eq!(falls, 0);
        assert!(c.is_dead());
        assert_eq!(c.position.x, 500.0);
    }

    #[test]
    fn dying_takes_death_frames_minus_one_ticks() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        c.health = 0;
        let mut r = run_tick(&mut c, &cfg, Intent::IDLE);
        // Entering Dying and its first step happen on the same tick.
        let mut ticks = 1;
        while !r.died {
            r = run_tick(&mut c, &cfg, Intent::IDLE);
            ticks += 1;
        }
        assert_eq!(ticks, cfg.player.clips.death.frames - 1);
        assert_eq!(c.sheet_cell(&cfg.player), (6, 3));
    }

    #[test]
    fn death_in_the_air_waits_for_the_landing() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, Intent { jump: true, ..Intent::IDLE });
        c.health = 0;

        let mut died_at = None;
        for t in 0..100 {
            let r = run_tick(&mut c, &cfg, Intent::IDLE);
            if r.died {
                died_at = Some(t);
                break;
            }
            assert_eq!(c.state, ActionState::Dying);
            assert!(c.frame < cfg.player.clips.death.frames);
        }
        assert!(died_at.is_some_and(|t| t + 1 > cfg.player.clips.death.frames - 1));
        assert!(c.is_dead());
        assert_eq!(c.position.y, cfg.arena.ground);
        assert_eq!(c.velocity.y, 0.0);
    }

    #[test]
    fn animation_waits_for_the_cadence() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        let mut r = TickReport::default();
        c.advance(0.03, &cfg.player, &cfg.arena, &mut r);
        assert_eq!(c.frame, 0);
        c.advance(0.03, &cfg.player, &cfg.arena, &mut r);
        assert_eq!(c.frame, 0);
        c.advance(0.03, &cfg.player, &cfg.arena, &mut r);
        assert_eq!(c.frame, 1);
    }

    #[test]
    fn idle_wraps_and_running_reports_footfalls() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        for _ in 0..cfg.player.clips.idle.frames {
            run_tick(&mut c, &cfg, Intent::IDLE);
        }
        assert_eq!(c.frame, 0);

        let steps: Vec<u32> = (0..14)
            .filter_map(|_| {
                let r = run_tick(&mut c, &cfg, go(Facing::Right));
                r.footstep.then_some(c.frame)
            })
            .collect();
        assert_eq!(steps, vec![4, 0, 4, 0]);
    }

    #[test]
    fn charge_plays_without_impact_and_returns_to_idle() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        let charge = Intent { charge: true, ..Intent::IDLE };
        let r = run_tick(&mut c, &cfg, charge);
        assert!(r.swung);
        assert_eq!(c.state, ActionState::Charging);
        let mut impacts = 0;
        for _ in 0..cfg.player.clips.charge.frames {
            impacts += run_tick(&mut c, &cfg, attack()).impact as u32;
        }
        assert_eq!(impacts, 0);
        assert_ne!(c.state, ActionState::Charging);
    }

    #[test]
    fn charge_disabled_falls_through_to_movement() {
        let mut cfg = GameConfig::default();
        cfg.mechanics.charge = false;
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, Intent { charge: true, ..go(Facing::Right) });
        assert_eq!(c.state, ActionState::Running);
    }

    #[test]
    fn jump_rises_falls_and_lands_back_on_ground() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        run_tick(&mut c, &cfg, Intent { jump: true, ..Intent::IDLE });
        assert_eq!(c.state, ActionState::Jumping);
        assert!(c.position.y < cfg.arena.ground);

        let mut saw_falling = false;
        for _ in 0..100 {
            // Attacks are refused in the air.
            run_tick(&mut c, &cfg, attack());
            if c.state == ActionState::Falling {
                saw_falling = true;
            }
            if !c.state.is_airborne() {
                break;
            }
        }
        assert!(saw_falling);
        assert_eq!(c.position.y, cfg.arena.ground);
        assert_eq!(c.velocity.y, 0.0);
        assert!(!c.state.is_attacking());
    }

    #[test]
    fn arena_bounds_clamp_position() {
        let cfg = GameConfig::default();
        let mut c = fighter(&cfg);
        c.position.x = 1.0;
        run_tick(&mut c, &cfg, go(Facing::Left));
        assert_eq!(c.position.x, 0.0);
    }
}
