/// Combat resolution: turns impact frames into damage.
///
/// Both decisions are made before either is applied, so each side reads
/// the other's health as it stood at the start of the tick. Range is
/// judged on the gap at the start of the tick too: a fighter who walks
/// into reach during the impact tick is not hit until the next swing.
/// Two swings that connect on the same tick both land.

use super::entity::Combatant;

/// Result of one tick's exchange.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Exchange {
    pub player_landed: bool,
    pub enemy_landed: bool,
}

/// Would a swing hurt `target` across a horizontal gap of `distance`?
/// Target must be alive and within `strike_range`.
pub fn connects(target: &Combatant, distance: f32, strike_range: f32) -> bool {
    target.health > 0 && distance.abs() <= strike_range
}

/// Resolve this tick's impacts. `*_impact` come from each fighter's
/// `TickReport::impact`; ranges come from the attacker's archetype.
/// `distance` is the gap between the two when the tick began.
pub fn resolve(
    player: &mut Combatant,
    enemy: &mut Combatant,
    distance: f32,
    player_impact: bool,
    enemy_impact: bool,
    player_range: f32,
    enemy_range: f32,
) -> Exchange {
    let exchange = Exchange {
        player_landed: player_impact && connects(enemy, distance, player_range),
        enemy_landed: enemy_impact && connects(player, distance, enemy_range),
    };

    if exchange.player_landed {
        enemy.take_hit();
        tracing::debug!(enemy_health = enemy.health, "player strike landed");
    } else if player_impact {
        tracing::debug!("player strike whiffed");
    }

    if exchange.enemy_landed {
        player.take_hit();
        tracing::debug!(player_health = player.health, "enemy strike landed");
    } else if enemy_impact {
        tracing::debug!("enemy strike whiffed");
    }

    exchange
}
