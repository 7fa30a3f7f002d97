/// External configuration loader.
///
/// Reads `duel.toml` from the executable's directory (or CWD).
/// Falls back to the built-in balance if the file is missing, unreadable,
/// or describes an impossible fighter (zero-length animations and so on).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub player: ArchetypeConfig,
    pub enemy: ArchetypeConfig,
    pub mechanics: MechanicsConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    pub frame_limit: u32,
}

/// World geometry, in sprite-sheet pixels times `scale`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    pub width: f32,
    pub ground: f32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub scale: f32,
    /// Distance of each combat mark from its arena edge.
    pub mark_inset: f32,
    /// Pre-match offset of each fighter from the arena centre.
    pub lobby_offset: f32,
}

/// One row of a sprite sheet: which row it lives on and how many columns it uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    pub row: u32,
    pub frames: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clips {
    pub idle: Clip,
    pub run: Clip,
    pub attack: Clip,
    pub charge: Clip,
    pub jump: Clip,
    pub fall: Clip,
    /// Last column is the resting corpse pose.
    pub death: Clip,
}

/// Balance and animation data for one kind of fighter.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeConfig {
    pub max_health: u32,
    pub move_speed: f32,
    pub animation_speed: f32,
    pub strike_range: f32,
    pub attack_cooldown: f32,
    pub stagger_duration: f32,
    pub hit_flash: f32,
    pub impact_frame: u32,
    pub clips: Clips,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MechanicsConfig {
    pub jump: bool,
    pub charge: bool,
    pub jump_speed: f32,
    pub gravity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioConfig {
    pub run_volume: f32,
    pub attack_volume: f32,
    pub music_volume: f32,
    pub victory_volume: f32,
    pub defeat_volume: f32,
    /// Distance at which the enemy's footsteps fade to silence.
    pub enemy_run_falloff: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub attack_primary: Vec<String>,
    pub attack_secondary: Vec<String>,
    pub begin: Vec<String>,
    pub confirm: Vec<String>,
    pub respawn: Vec<String>,
    pub exit: Vec<String>,
}

impl ArchetypeConfig {
    /// Baseline swordsman: six hearts, quick feet.
    pub fn player() -> Self {
        ArchetypeConfig {
            max_health: 6,
            move_speed: 250.0,
            animation_speed: 0.075,
            strike_range: 56.0,
            attack_cooldown: 0.0,
            stagger_duration: 1.0,
            hit_flash: 0.5,
            impact_frame: 4,
            clips: Clips {
                idle: Clip { row: 0, frames: 5 },
                run: Clip { row: 1, frames: 7 },
                attack: Clip { row: 2, frames: 5 },
                charge: Clip { row: 3, frames: 6 },
                jump: Clip { row: 4, frames: 3 },
                fall: Clip { row: 5, frames: 3 },
                death: Clip { row: 6, frames: 4 },
            },
        }
    }

    /// Baseline opponent: two hits to kill, half the player's speed.
    pub fn enemy() -> Self {
        ArchetypeConfig {
            max_health: 2,
            move_speed: 125.0,
            attack_cooldown: 1.0,
            clips: Clips {
                idle: Clip { row: 0, frames: 5 },
                run: Clip { row: 1, frames: 7 },
                attack: Clip { row: 2, frames: 5 },
                charge: Clip { row: 3, frames: 5 },
                // The AI never jumps; these rows sit past the death row.
                jump: Clip { row: 6, frames: 1 },
                fall: Clip { row: 7, frames: 1 },
                death: Clip { row: 5, frames: 4 },
            },
            ..ArchetypeConfig::player()
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            width: default_arena_width(),
            ground: default_ground(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            scale: default_scale(),
            mark_inset: default_mark_inset(),
            lobby_offset: default_lobby_offset(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            arena: ArenaConfig::default(),
            player: ArchetypeConfig::player(),
            enemy: ArchetypeConfig::enemy(),
            mechanics: TomlMechanics::default().into(),
            audio: TomlAudio::default().into(),
            gamepad: TomlGamepad::default().into(),
            frame_limit: default_frame_limit(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    arena: TomlArena,
    #[serde(default)]
    player: TomlArchetype,
    #[serde(default)]
    enemy: TomlArchetype,
    #[serde(default)]
    mechanics: TomlMechanics,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlArena {
    #[serde(default = "default_arena_width")]
    width: f32,
    #[serde(default = "default_ground")]
    ground: f32,
    #[serde(default = "default_frame_width")]
    frame_width: u32,
    #[serde(default = "default_frame_height")]
    frame_height: u32,
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default = "default_mark_inset")]
    mark_inset: f32,
    #[serde(default = "default_lobby_offset")]
    lobby_offset: f32,
}

/// Archetype overrides. Player and enemy have different baselines, so
/// every key is optional and layered over the matching built-in.
#[derive(Deserialize, Debug, Default)]
struct TomlArchetype {
    max_health: Option<u32>,
    move_speed: Option<f32>,
    animation_speed: Option<f32>,
    strike_range: Option<f32>,
    attack_cooldown: Option<f32>,
    stagger_duration: Option<f32>,
    hit_flash: Option<f32>,
    impact_frame: Option<u32>,
    #[serde(default)]
    clips: TomlClips,
}

#[derive(Deserialize, Debug, Default)]
struct TomlClips {
    idle: Option<TomlClip>,
    run: Option<TomlClip>,
    attack: Option<TomlClip>,
    charge: Option<TomlClip>,
    jump: Option<TomlClip>,
    fall: Option<TomlClip>,
    death: Option<TomlClip>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct TomlClip {
    row: Option<u32>,
    frames: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct TomlMechanics {
    #[serde(default = "default_true")]
    jump: bool,
    #[serde(default = "default_true")]
    charge: bool,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_run_volume")]
    run_volume: f32,
    #[serde(default = "default_attack_volume")]
    attack_volume: f32,
    #[serde(default = "default_music_volume")]
    music_volume: f32,
    #[serde(default = "default_victory_volume")]
    victory_volume: f32,
    #[serde(default = "default_defeat_volume")]
    defeat_volume: f32,
    #[serde(default = "default_enemy_run_falloff")]
    enemy_run_falloff: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_attack_primary")]
    attack_primary: Vec<String>,
    #[serde(default = "default_pad_attack_secondary")]
    attack_secondary: Vec<String>,
    #[serde(default = "default_pad_begin")]
    begin: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_respawn")]
    respawn: Vec<String>,
    #[serde(default = "default_pad_exit")]
    exit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_frame_limit")]
    frame_limit: u32,
}

// ── Defaults ──

fn default_true() -> bool { true }
fn default_arena_width() -> f32 { 1920.0 }
fn default_ground() -> f32 { 745.0 }
fn default_frame_width() -> u32 { 56 }
fn default_frame_height() -> u32 { 56 }
fn default_scale() -> f32 { 5.0 }
fn default_mark_inset() -> f32 { 33.0 }
fn default_lobby_offset() -> f32 { 300.0 }

fn default_jump_speed() -> f32 { 950.0 }
fn default_gravity() -> f32 { 2600.0 }

fn default_run_volume() -> f32 { 0.6 }
fn default_attack_volume() -> f32 { 1.0 }
fn default_music_volume() -> f32 { 0.3 }
fn default_victory_volume() -> f32 { 0.5 }
fn default_defeat_volume() -> f32 { 0.3 }
fn default_enemy_run_falloff() -> f32 { 800.0 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_attack_primary() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_pad_attack_secondary() -> Vec<String> { vec!["Y".into(), "R2".into()] }
fn default_pad_begin() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_respawn() -> Vec<String> { vec!["B".into()] }
fn default_pad_exit() -> Vec<String> { vec!["Select".into()] }

fn default_frame_limit() -> u32 { 120 }

impl Default for TomlArena {
    fn default() -> Self {
        TomlArena {
            width: default_arena_width(),
            ground: default_ground(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            scale: default_scale(),
            mark_inset: default_mark_inset(),
            lobby_offset: default_lobby_offset(),
        }
    }
}

impl Default for TomlMechanics {
    fn default() -> Self {
        TomlMechanics {
            jump: true,
            charge: true,
            jump_speed: default_jump_speed(),
            gravity: default_gravity(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio {
            run_volume: default_run_volume(),
            attack_volume: default_attack_volume(),
            music_volume: default_music_volume(),
            victory_volume: default_victory_volume(),
            defeat_volume: default_defeat_volume(),
            enemy_run_falloff: default_enemy_run_falloff(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            attack_primary: default_pad_attack_primary(),
            attack_secondary: default_pad_attack_secondary(),
            begin: default_pad_begin(),
            confirm: default_pad_confirm(),
            respawn: default_pad_respawn(),
            exit: default_pad_exit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { frame_limit: default_frame_limit() }
    }
}

// ── Schema → public structs ──

impl From<TomlArena> for ArenaConfig {
    fn from(t: TomlArena) -> Self {
        ArenaConfig {
            width: t.width,
            ground: t.ground,
            frame_width: t.frame_width,
            frame_height: t.frame_height,
            scale: t.scale,
            mark_inset: t.mark_inset,
            lobby_offset: t.lobby_offset,
        }
    }
}

impl From<TomlMechanics> for MechanicsConfig {
    fn from(t: TomlMechanics) -> Self {
        MechanicsConfig {
            jump: t.jump,
            charge: t.charge,
            jump_speed: t.jump_speed,
            gravity: t.gravity,
        }
    }
}

impl From<TomlAudio> for AudioConfig {
    fn from(t: TomlAudio) -> Self {
        AudioConfig {
            run_volume: t.run_volume,
            attack_volume: t.attack_volume,
            music_volume: t.music_volume,
            victory_volume: t.victory_volume,
            defeat_volume: t.defeat_volume,
            enemy_run_falloff: t.enemy_run_falloff,
        }
    }
}

impl From<TomlGamepad> for GamepadConfig {
    fn from(t: TomlGamepad) -> Self {
        GamepadConfig {
            jump: t.jump,
            attack_primary: t.attack_primary,
            attack_secondary: t.attack_secondary,
            begin: t.begin,
            confirm: t.confirm,
            respawn: t.respawn,
            exit: t.exit,
        }
    }
}

impl TomlClip {
    fn over(self, base: Clip) -> Clip {
        Clip {
            row: self.row.unwrap_or(base.row),
            frames: self.frames.unwrap_or(base.frames),
        }
    }
}

impl TomlArchetype {
    fn over(self, base: ArchetypeConfig) -> ArchetypeConfig {
        let c = self.clips;
        let b = base.clips;
        let clip = |t: Option<TomlClip>, base: Clip| t.map_or(base, |t| t.over(base));
        ArchetypeConfig {
            max_health: self.max_health.unwrap_or(base.max_health),
            move_speed: self.move_speed.unwrap_or(base.move_speed),
            animation_speed: self.animation_speed.unwrap_or(base.animation_speed),
            strike_range: self.strike_range.unwrap_or(base.strike_range),
            attack_cooldown: self.attack_cooldown.unwrap_or(base.attack_cooldown),
            stagger_duration: self.stagger_duration.unwrap_or(base.stagger_duration),
            hit_flash: self.hit_flash.unwrap_or(base.hit_flash),
            impact_frame: self.impact_frame.unwrap_or(base.impact_frame),
            clips: Clips {
                idle: clip(c.idle, b.idle),
                run: clip(c.run, b.run),
                attack: clip(c.attack, b.attack),
                charge: clip(c.charge, b.charge),
                jump: clip(c.jump, b.jump),
                fall: clip(c.fall, b.fall),
                death: clip(c.death, b.death),
            },
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `duel.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/duel`. Any failure falls back to defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("duel.toml");
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!("{e}; using default settings");
                    return GameConfig::default();
                }
            }
        }
        tracing::info!("No duel.toml found; using default settings");
        GameConfig::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let t: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig {
            arena: t.arena.into(),
            player: t.player.over(ArchetypeConfig::player()),
            enemy: t.enemy.over(ArchetypeConfig::enemy()),
            mechanics: t.mechanics.into(),
            audio: t.audio.into(),
            gamepad: t.gamepad.into(),
            frame_limit: t.general.frame_limit,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
            ConfigError::Invalid { field: field.into(), reason: reason.to_string() }
        }
        // TOML accepts `nan` and `inf`; neither is a usable length or period.
        fn positive(x: f32) -> bool {
            x.is_finite() && x > 0.0
        }

        if !positive(self.arena.width) {
            return Err(invalid("arena.width", "must be positive"));
        }
        if self.arena.frame_width == 0 || self.arena.frame_height == 0 {
            return Err(invalid("arena.frame_width/frame_height", "must be non-zero"));
        }
        if self.frame_limit == 0 {
            return Err(invalid("general.frame_limit", "must be non-zero"));
        }
        if !positive(self.audio.enemy_run_falloff) {
            return Err(invalid("audio.enemy_run_falloff", "must be positive"));
        }
        for (name, a) in [("player", &self.player), ("enemy", &self.enemy)] {
            if a.max_health == 0 {
                return Err(invalid(format!("{name}.max_health"), "must be at least 1"));
            }
            if !positive(a.animation_speed) {
                return Err(invalid(format!("{name}.animation_speed"), "must be positive"));
            }
            if !positive(a.strike_range) {
                return Err(invalid(format!("{name}.strike_range"), "must be positive"));
            }
            let clips = [
                ("idle", a.clips.idle),
                ("run", a.clips.run),
                ("attack", a.clips.attack),
                ("charge", a.clips.charge),
                ("jump", a.clips.jump),
                ("fall", a.clips.fall),
                ("death", a.clips.death),
            ];
            for (i, (clip_name, clip)) in clips.iter().enumerate() {
                if clip.frames == 0 {
                    return Err(invalid(
                        format!("{name}.clips.{clip_name}.frames"),
                        "must be at least 1",
                    ));
                }
                // The renderer picks a pose by row, so rows cannot be shared.
                if clips[..i].iter().any(|(_, other)| other.row == clip.row) {
                    return Err(invalid(
                        format!("{name}.clips.{clip_name}.row"),
                        "already used by another clip",
                    ));
                }
            }
            if a.impact_frame == 0 || a.impact_frame >= a.clips.attack.frames {
                return Err(invalid(
                    format!("{name}.impact_frame"),
                    "must land strictly inside the attack clip",
                ));
            }
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/duel");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
