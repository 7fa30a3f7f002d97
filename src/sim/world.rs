/// WorldState: the complete state of a running duel.
///
/// Both combatants are created once and reused across rounds. A rematch
/// moves them back to their marks and restores health and timers in place.
///
/// ## Marks
///
///   - lobby marks  : arena centre ± `lobby_offset`, shown on the Start screen
///   - combat marks : `mark_inset` in from each edge (the player's mark also
///                    clears one scaled sprite width so it is fully on screen)

use crate::config::GameConfig;
use crate::domain::entity::{Combatant, Facing, Role, Vec2};
use super::flow::Flow;

pub struct WorldState {
    pub config: GameConfig,

    // ── Entities ──
    pub player: Combatant,
    pub enemy: Combatant,

    // ── Meta ──
    pub flow: Flow,
    pub tick: u64,
}

impl WorldState {
    pub fn new(config: GameConfig) -> Self {
        let (player_pos, enemy_pos) = lobby_marks(&config);
        let player = Combatant::new(Role::Player, &config.player, player_pos, Facing::Right);
        let enemy = Combatant::new(Role::Enemy, &config.enemy, enemy_pos, Facing::Left);
        WorldState {
            config,
            player,
            enemy,
            flow: Flow::new(),
            tick: 0,
        }
    }

    /// Place both fighters on their combat marks with full health and
    /// fresh timers. Used for the first match and for every rematch.
    pub fn place_at_combat_marks(&mut self) {
        let (player_pos, enemy_pos) = combat_marks(&self.config);
        self.player.respawn(&self.config.player, player_pos, Facing::Right);
        self.enemy.respawn(&self.config.enemy, enemy_pos, Facing::Left);
        tracing::debug!(
            player_x = player_pos.x,
            enemy_x = enemy_pos.x,
            "fighters placed on combat marks"
        );
    }

    /// Signed horizontal distance, player minus enemy.
    pub fn distance(&self) -> f32 {
        self.player.position.x - self.enemy.position.x
    }
}

pub fn lobby_marks(config: &GameConfig) -> (Vec2, Vec2) {
    let a = &config.arena;
    let centre = a.width / 2.0;
    (
        Vec2::new(centre - a.lobby_offset, a.ground),
        Vec2::new(centre + a.lobby_offset, a.ground),
    )
}

pub fn combat_marks(config: &GameConfig) -> (Vec2, Vec2) {
    let a = &config.arena;
    (
        Vec2::new(a.mark_inset + a.scale * a.frame_width as f32, a.ground),
        Vec2::new(a.width - a.mark_inset, a.ground),
    )
}
