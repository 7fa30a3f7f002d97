/// Enemy AI: a three-rule priority list.
///
///   1. Out of reach (|d| >= strike range)   → walk toward the player
///   2. In reach, player alive, cooldown done,
///      not staggered                        → attack
///   3. Otherwise                            → hold
///
/// Rule order is the tie-break. The policy only produces an `Intent`;
/// the shared state machine decides what that intent is allowed to do.

use crate::config::ArchetypeConfig;
use super::entity::{Combatant, Facing, Intent};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decision {
    Approach(Facing),
    Attack,
    Hold,
}

impl Decision {
    pub fn intent(self) -> Intent {
        match self {
            Decision::Approach(dir) => Intent { movement: Some(dir), ..Intent::IDLE },
            Decision::Attack => Intent { attack: true, ..Intent::IDLE },
            Decision::Hold => Intent::IDLE,
        }
    }
}

/// Decide the enemy's move for this tick. A downed enemy always holds.
pub fn decide(enemy: &Combatant, player: &Combatant, arch: &ArchetypeConfig) -> Decision {
    if !enemy.is_alive() || enemy.state.is_down() {
        return Decision::Hold;
    }

    let d = player.position.x - enemy.position.x;

    let decision = if d.abs() >= arch.strike_range {
        Decision::Approach(Facing::toward(enemy.position.x, player.position.x))
    } else if player.is_alive()
        && enemy.attack_timer.ready(arch.attack_cooldown)
        && !enemy.is_staggered(arch)
    {
        Decision::Attack
    } else {
        Decision::Hold
    };

    tracing::trace!(distance = d, ?decision, "enemy decision");
    decision
}
