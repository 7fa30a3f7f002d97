/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Screen flow (input-driven transitions, quit)
///   2. Timers + death preemption (player, enemy)
///   3. Intents: player input, then enemy AI
///   4. State machines: player, then enemy (intent → motion → animation)
///   5. Combat resolution against start-of-tick health and distance
///   6. Win / lose check
///   7. Draw list
///
/// A tick that changes phase through input does only that: the fighters
/// are placed, but nothing moves until the next tick.

use crate::domain::ai;
use crate::domain::anim::TickReport;
use crate::domain::combat;
use crate::domain::controls::{Control, ControlSnapshot};
use crate::domain::entity::{Facing, Intent};
use super::draw::{self, DrawList};
use super::event::{push_cue, AudioCue, AudioEvent, MusicCommand};
use super::flow::{FlowCommand, Outcome, Phase};
use super::world::WorldState;

/// Everything the presentation layer needs after one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub draws: DrawList,
    pub audio: Vec<AudioEvent>,
    pub quit: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, controls: &ControlSnapshot, dt: f32) -> FrameOutput {
    world.tick += 1;
    let mut audio = Vec::new();

    match world.flow.poll(controls) {
        FlowCommand::Quit => {
            return FrameOutput { draws: draw::compose(world), audio, quit: true };
        }
        FlowCommand::BeginMatch => {
            world.place_at_combat_marks();
            return FrameOutput { draws: draw::compose(world), audio, quit: false };
        }
        FlowCommand::Rematch => {
            world.place_at_combat_marks();
            audio.push(AudioEvent::Music(MusicCommand::Start));
            return FrameOutput { draws: draw::compose(world), audio, quit: false };
        }
        FlowCommand::Stay => {}
    }

    match world.flow.phase {
        Phase::Start => tick_lobby(world, dt),
        Phase::Playing => tick_duel(world, controls, dt, &mut audio),
        Phase::End => {}
    }

    FrameOutput { draws: draw::compose(world), audio, quit: false }
}

// ══════════════════════════════════════════════════════════════
// Input interpretation
// ══════════════════════════════════════════════════════════════

/// Map the control snapshot onto an intent. Both directions held cancel out.
pub fn player_intent(controls: &ControlSnapshot) -> Intent {
    let left = controls.is_active(Control::MoveLeft);
    let right = controls.is_active(Control::MoveRight);
    Intent {
        movement: match (left, right) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            _ => None,
        },
        attack: controls.is_active(Control::AttackPrimary),
        charge: controls.is_active(Control::AttackSecondary),
        jump: controls.is_active(Control::Jump),
    }
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

/// Start screen: fighters breathe in place. No AI, no combat.
fn tick_lobby(world: &mut WorldState, dt: f32) {
    let mut ignored = TickReport::default();
    let WorldState { config, player, enemy, .. } = world;
    player.advance(dt, &config.player, &config.arena, &mut ignored);
    enemy.advance(dt, &config.enemy, &config.arena, &mut ignored);
}

fn tick_duel(world: &mut WorldState, controls: &ControlSnapshot, dt: f32, audio: &mut Vec<AudioEvent>) {
    // Timers never move anyone, so this is the gap as the tick began.
    let distance = world.distance();
    let WorldState { config, player, enemy, flow, .. } = world;
    let mut pr = TickReport::default();
    let mut er = TickReport::default();

    player.begin_tick(dt, &mut pr);
    enemy.begin_tick(dt, &mut er);

    let p_intent = player_intent(controls);
    let e_intent = ai::decide(enemy, player, &config.enemy).intent();

    player.apply_intent(p_intent, &config.player, &config.mechanics, &mut pr);
    player.integrate(dt, &config.arena, &config.mechanics);
    player.advance(dt, &config.player, &config.arena, &mut pr);

    enemy.apply_intent(e_intent, &config.enemy, &config.mechanics, &mut er);
    enemy.integrate(dt, &config.arena, &config.mechanics);
    enemy.advance(dt, &config.enemy, &config.arena, &mut er);

    combat::resolve(
        player,
        enemy,
        distance,
        pr.impact,
        er.impact,
        config.player.strike_range,
        config.enemy.strike_range,
    );

    // ── Audio ──
    let vol = &config.audio;
    if pr.swung || er.swung {
        push_cue(audio, AudioCue::Attack, vol.attack_volume);
    }
    if pr.footstep {
        push_cue(audio, AudioCue::Run, vol.run_volume);
    }
    if er.footstep {
        let gain = (vol.run_volume - distance.abs() / vol.enemy_run_falloff * vol.run_volume)
            .clamp(0.0, vol.run_volume);
        push_cue(audio, AudioCue::Run, gain);
    }
    if pr.fell {
        tracing::debug!("player is dying");
        push_cue(audio, AudioCue::Defeat, vol.defeat_volume);
    }
    if er.fell {
        tracing::debug!("enemy is dying");
        push_cue(audio, AudioCue::Victory, vol.victory_volume);
    }

    // ── Win / lose ──
    if pr.died || er.died {
        let outcome = if enemy.health == 0 { Outcome::PlayerWon } else { Outcome::PlayerLost };
        if flow.finish(outcome) {
            audio.push(AudioEvent::Music(MusicCommand::Stop));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{ActionState, Vec2};
    use crate::sim::world::combat_marks;
    use proptest::prelude::*;

    const DT: f32 = 0.075;

    fn none() -> ControlSnapshot {
        ControlSnapshot::new()
    }

    fn only(c: Control) -> ControlSnapshot {
        ControlSnapshot::new().with(c)
    }

    /// World already in Playing, fighters on their marks.
    fn playing() -> WorldState {
        let mut w = WorldState::new(GameConfig::default());
        step(&mut w, &only(Control::Begin), DT);
        assert_eq!(w.flow.phase, Phase::Playing);
        w
    }

    #[test]
    fn begin_places_fighters_on_combat_marks_once() {
        let mut w = WorldState::new(GameConfig::default());
        let lobby = (w.player.position, w.enemy.position);
        step(&mut w, &none(), DT);
        assert_eq!((w.player.position, w.enemy.position), lobby);

        step(&mut w, &only(Control::Begin), DT);
        let (p, e) = combat_marks(&w.config);
        assert_eq!(w.flow.phase, Phase::Playing);
        assert_eq!(w.player.position, p);
        assert_eq!(w.enemy.position, e);

        // Begin held: no re-placement, the enemy starts walking.
        step(&mut w, &only(Control::Begin), DT);
        assert!(w.enemy.position.x < e.x);
        assert_eq!(w.player.position, p);
    }

    #[test]
    fn holding_move_right_runs_within_one_tick() {
        let mut w = playing();
        step(&mut w, &only(Control::MoveRight), DT);
        assert_eq!(w.player.state, ActionState::Running);
        for _ in 0..10 {
            step(&mut w, &only(Control::MoveRight), DT);
            assert_eq!(w.player.state, ActionState::Running);
        }
        step(&mut w, &none(), DT);
        assert_eq!(w.player.state, ActionState::Idle);
    }

    #[test]
    fn killing_blow_ends_the_match_as_a_win() {
        let mut w = playing();
        w.enemy.health = 1;
        w.enemy.position = w.player.position;
        // Keep the enemy from swinging back during the exchange.
        w.enemy.attack_timer = Default::default();

        let mut landed_on = None;
        for t in 0..5 {
            step(&mut w, &only(Control::AttackPrimary), DT);
            if w.enemy.health == 0 && landed_on.is_none() {
                landed_on = Some(t);
            }
        }
        assert_eq!(landed_on, Some(3));
        assert_eq!(w.enemy.health, 0);

        let mut saw_dying = false;
        for _ in 0..10 {
            let out = step(&mut w, &none(), DT);
            saw_dying |= w.enemy.state == ActionState::Dying;
            if w.flow.phase == Phase::End {
                assert!(out.audio.contains(&AudioEvent::Music(MusicCommand::Stop)));
                break;
            }
        }
        assert!(saw_dying);
        assert_eq!(w.enemy.state, ActionState::Dead);
        assert_eq!(w.flow.phase, Phase::End);
        assert_eq!(w.flow.outcome, Outcome::PlayerWon);
    }

    #[test]
    fn dying_entry_plays_victory_cue() {
        let mut w = playing();
        w.enemy.health = 0;
        let out = step(&mut w, &none(), DT);
        assert_eq!(w.enemy.state, ActionState::Dying);
        assert!(out.audio.iter().any(|a| matches!(a, AudioEvent::Cue { cue: AudioCue::Victory, .. })));
    }

    #[test]
    fn enemy_approaches_then_waits_before_attacking() {
        let mut w = playing();
        let range = w.config.enemy.strike_range;
        w.player.position = Vec2::new(1000.0, w.config.arena.ground);
        w.enemy.position = Vec2::new(1000.0 + 2.0 * range, w.config.arena.ground);
        w.enemy.attack_timer = Default::default();

        let mut ticks = 0;
        while w.distance().abs() >= range {
            step(&mut w, &none(), DT);
            assert_eq!(w.enemy.state, ActionState::Running);
            ticks += 1;
            assert!(ticks < 100);
        }
        // Inside range: stop, then wait out the cooldown.
        let mut held = 0;
        loop {
            step(&mut w, &none(), DT);
            if w.enemy.state.is_attacking() {
                break;
            }
            assert_eq!(w.enemy.velocity.x, 0.0);
            held += 1;
            assert!(held < 100);
        }
        assert!(held > 0);
        let elapsed = (ticks + held + 1) as f32 * DT;
        assert!(elapsed >= w.config.enemy.attack_cooldown);
    }

    #[test]
    fn mutual_hits_on_the_same_tick_both_land() {
        let mut w = playing();
        w.player.position = Vec2::new(1000.0, w.config.arena.ground);
        w.enemy.position = Vec2::new(1000.0, w.config.arena.ground);
        w.player.health = 1;
        w.enemy.health = 1;
        w.player.enter(ActionState::Attacking { impact_spent: false });
        w.enemy.enter(ActionState::Attacking { impact_spent: false });
        w.player.frame = 3;
        w.enemy.frame = 3;
        w.player.frame_timer = Default::default();
        w.enemy.frame_timer = Default::default();

        step(&mut w, &none(), DT);
        assert_eq!((w.player.health, w.enemy.health), (0, 0));
    }

    #[test]
    fn reach_is_measured_before_anyone_moves() {
        let mut w = playing();
        let ground = w.config.arena.ground;
        w.player.position = Vec2::new(1000.0, ground);
        // 61 apart: outside reach now, inside once the enemy steps in.
        w.enemy.position = Vec2::new(1061.0, ground);
        w.player.enter(ActionState::Attacking { impact_spent: false });
        w.player.frame = 3;
        w.player.frame_timer = Default::default();

        step(&mut w, &none(), DT);
        assert!(w.distance().abs() < w.config.player.strike_range);
        assert_eq!(w.player.state, ActionState::Attacking { impact_spent: true });
        assert_eq!(w.enemy.health, w.config.enemy.max_health);
    }

    #[test]
    fn fighter_killed_mid_jump_lands_before_the_match_ends() {
        let mut w = playing();
        step(&mut w, &only(Control::Jump), DT);
        assert!(w.player.position.y < w.config.arena.ground);
        w.player.health = 0;

        let mut ticks = 0;
        while w.flow.phase == Phase::Playing {
            step(&mut w, &none(), DT);
            ticks += 1;
            assert!(ticks < 100);
        }
        // Longer than the bare death cycle: the body had to come down first.
        assert!(ticks > w.config.player.clips.death.frames);
        assert_eq!(w.flow.outcome, Outcome::PlayerLost);
        assert_eq!(w.player.state, ActionState::Dead);
        assert_eq!(w.player.position.y, w.config.arena.ground);
        assert_eq!(w.player.velocity.y, 0.0);
        assert_eq!(w.player.sheet_cell(&w.config.player), (6, 3));
    }

    #[test]
    fn dead_stays_dead_until_rematch() {
        let mut w = playing();
        w.player.health = 0;
        for _ in 0..10 {
            step(&mut w, &only(Control::MoveRight).with(Control::AttackPrimary), DT);
        }
        assert!(w.player.is_dead());
        assert_eq!(w.flow.phase, Phase::End);
        assert_eq!(w.flow.outcome, Outcome::PlayerLost);

        let frozen = (w.player.clone(), w.enemy.clone());
        for _ in 0..5 {
            step(&mut w, &only(Control::MoveLeft).with(Control::Jump), DT);
        }
        assert_eq!((w.player.clone(), w.enemy.clone()), frozen);
    }

    #[test]
    fn rematch_restores_both_fighters_and_music() {
        let mut w = playing();
        w.player.health = 0;
        for _ in 0..10 {
            step(&mut w, &none(), DT);
        }
        assert_eq!(w.flow.phase, Phase::End);

        let out = step(&mut w, &only(Control::Confirm), DT);
        assert!(out.audio.contains(&AudioEvent::Music(MusicCommand::Start)));
        assert_eq!(w.flow.phase, Phase::Playing);
        assert_eq!(w.flow.outcome, Outcome::None);

        let fresh = {
            let mut f = WorldState::new(GameConfig::default());
            f.place_at_combat_marks();
            f
        };
        assert_eq!(w.player, fresh.player);
        assert_eq!(w.enemy, fresh.enemy);
    }

    #[test]
    fn exit_quits_from_any_phase() {
        let mut w = WorldState::new(GameConfig::default());
        assert!(step(&mut w, &only(Control::Exit), DT).quit);
        let mut w = playing();
        assert!(step(&mut w, &only(Control::Exit), DT).quit);
    }

    #[test]
    fn both_directions_cancel() {
        let i = player_intent(&only(Control::MoveLeft).with(Control::MoveRight));
        assert_eq!(i.movement, None);
    }

    #[test]
    fn at_most_one_run_cue_per_tick() {
        let mut w = playing();
        w.player.enter(ActionState::Running);
        w.enemy.enter(ActionState::Running);
        w.player.frame = 3;
        w.enemy.frame = 3;
        w.enemy.position.x = w.player.position.x + 400.0;
        let out = step(&mut w, &only(Control::MoveRight), DT);
        let runs: Vec<f32> = out
            .audio
            .iter()
            .filter_map(|a| match a {
                AudioEvent::Cue { cue: AudioCue::Run, gain } => Some(*gain),
                _ => None,
            })
            .collect();
        assert_eq!(runs, vec![0.6]);
    }

    // ── Properties over random play ──

    fn arb_controls() -> impl Strategy<Value = ControlSnapshot> {
        proptest::collection::vec(any::<bool>(), Control::ALL.len()).prop_map(|bits| {
            let mut snap = ControlSnapshot::new();
            for (c, on) in Control::ALL.iter().zip(bits) {
                snap.set(*c, on);
            }
            snap.set(Control::Exit, false);
            snap
        })
    }

    proptest! {
        #[test]
        fn health_never_rises_outside_a_rematch(
            ticks in proptest::collection::vec((arb_controls(), 0.0f32..0.12), 1..400)
        ) {
            let mut w = playing();
            for (controls, dt) in ticks {
                let before = (w.player.health, w.enemy.health, w.flow.phase);
                step(&mut w, &controls, dt);
                let rematch = before.2 == Phase::End && w.flow.phase == Phase::Playing;
                if !rematch {
                    prop_assert!(w.player.health <= before.0);
                    prop_assert!(w.enemy.health <= before.1);
                    prop_assert!(before.0 - w.player.health <= 1);
                    prop_assert!(before.1 - w.enemy.health <= 1);
                }
                prop_assert!(w.player.health <= w.config.player.max_health);
                prop_assert!(w.enemy.health <= w.config.enemy.max_health);
            }
        }

        #[test]
        fn ai_respects_cooldown_and_stagger(
            ticks in proptest::collection::vec((arb_controls(), 0.0f32..0.12), 1..400)
        ) {
            let mut w = playing();
            for (controls, dt) in ticks {
                let was_attacking = w.enemy.state.is_attacking();
                let cooldown_then = w.enemy.attack_timer.elapsed() + dt;
                let since_hit_then = w.enemy.damage_timer.elapsed() + dt;
                let phase = w.flow.phase;
                step(&mut w, &controls, dt);
                if phase == Phase::Playing && !was_attacking && w.enemy.state.is_attacking() {
                    prop_assert!(cooldown_then >= w.config.enemy.attack_cooldown);
                    prop_assert!(since_hit_then >= w.config.enemy.stagger_duration);
                }
            }
        }

        #[test]
        fn dead_is_terminal_while_the_match_lasts(
            ticks in proptest::collection::vec((arb_controls(), 0.0f32..0.12), 1..200)
        ) {
            let mut w = playing();
            w.player.health = 0;
            for (mut controls, dt) in ticks {
                controls.set(Control::Confirm, false);
                controls.set(Control::Respawn, false);
                let was_dead = w.player.is_dead();
                step(&mut w, &controls, dt);
                if was_dead {
                    prop_assert!(w.player.is_dead());
                }
            }
        }
    }
}
