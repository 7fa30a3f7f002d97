/// Draw intents: what the renderer should show, in world terms.
///
/// The simulation describes sprites the way a sprite-sheet renderer would
/// need them (position, mirror scale, origin, source rectangle, tint) and
/// leaves the actual drawing to whichever presentation layer consumes them.

use crate::config::{ArchetypeConfig, ArenaConfig};
use crate::domain::entity::{Combatant, Facing, Role, Vec2};
use super::flow::{Outcome, Phase};
use super::world::WorldState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const NEUTRAL: Tint = Tint { r: 255, g: 255, b: 255, a: 255 };
    pub const HIT_FLASH: Tint = Tint { r: 255, g: 0, b: 0, a: 128 };
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SpriteDraw {
    pub sheet: Role,
    pub position: Vec2,
    /// x carries the mirror: negative when facing left.
    pub scale: Vec2,
    /// Local origin in sheet pixels.
    pub origin: Vec2,
    pub source: SpriteRect,
    pub tint: Tint,
}

impl SpriteDraw {
    /// World-space horizontal extent `(left, right)` of the sprite.
    pub fn world_span(&self) -> (f32, f32) {
        let a = self.position.x - self.origin.x * self.scale.x;
        let b = self.position.x + (self.source.w as f32 - self.origin.x) * self.scale.x;
        (a.min(b), a.max(b))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UiElement {
    StartPrompt,
    WinBanner,
    PlayAgainPrompt,
    LoseBanner,
    RespawnPrompt,
    Instructions,
    Health { current: u32, max: u32, visible: bool },
}

impl UiElement {
    pub fn text(&self) -> &'static str {
        match self {
            UiElement::StartPrompt => "Press Space to Play!",
            UiElement::WinBanner => "You Won!",
            UiElement::PlayAgainPrompt => "Press Enter to Play Again or Escape to Exit",
            UiElement::LoseBanner => "You Died!",
            UiElement::RespawnPrompt => "Press Enter to Respawn or Escape to Exit",
            UiElement::Instructions => {
                "A/D: Move   W: Jump   J/Left Click: Attack   K/Right Click: Charge"
            }
            UiElement::Health { .. } => "",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub sprites: Vec<SpriteDraw>,
    pub ui: Vec<UiElement>,
}

/// Sprite origin for a facing: the mirror pivots around the sprite's far
/// edge so flipping never moves the fighter in the world.
pub fn origin_for(facing: Facing, frame_width: u32) -> Vec2 {
    match facing {
        Facing::Right => Vec2::new(frame_width as f32, 0.0),
        Facing::Left => Vec2::ZERO,
    }
}

pub fn sprite_for(c: &Combatant, arch: &ArchetypeConfig, arena: &ArenaConfig) -> SpriteDraw {
    let (row, col) = c.sheet_cell(arch);
    SpriteDraw {
        sheet: c.role,
        position: c.position,
        scale: Vec2::new(c.facing.sign() * arena.scale, arena.scale),
        origin: origin_for(c.facing, arena.frame_width),
        source: SpriteRect {
            x: col * arena.frame_width,
            y: row * arena.frame_height,
            w: arena.frame_width,
            h: arena.frame_height,
        },
        tint: if c.is_flashing(arch) { Tint::HIT_FLASH } else { Tint::NEUTRAL },
    }
}

/// Build this tick's draw list from the world.
pub fn compose(world: &WorldState) -> DrawList {
    let cfg = &world.config;
    let sprites = vec![
        sprite_for(&world.player, &cfg.player, &cfg.arena),
        sprite_for(&world.enemy, &cfg.enemy, &cfg.arena),
    ];

    let ui = match (world.flow.phase, world.flow.outcome) {
        (Phase::Start, _) => vec![UiElement::StartPrompt],
        (Phase::End, Outcome::PlayerWon) => vec![UiElement::WinBanner, UiElement::PlayAgainPrompt],
        (Phase::End, _) => vec![UiElement::LoseBanner, UiElement::RespawnPrompt],
        (Phase::Playing, _) => vec![
            UiElement::Instructions,
            UiElement::Health {
                current: world.player.health,
                max: cfg.player.max_health,
                // Heart blinks out at the very start of a hit.
                visible: world.player.damage_timer.ready(cfg.player.hit_flash * 0.2),
            },
        ],
    };

    DrawList { sprites, ui }
}
