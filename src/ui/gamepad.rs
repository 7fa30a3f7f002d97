/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` table of duel.toml and is
/// built once by `ActionMap::from_config`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (up also jumps)
///   A                     →  Jump / Begin
///   X / R1                →  Attack
///   Y / R2                →  Charge
///   Start                 →  Begin / Confirm
///   B                     →  Respawn
///   Select                →  Exit
///
/// All actions are reported as held; edges are detected by the screen flow.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::controls::{Control, ControlSnapshot};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Control-to-button mapping (loaded from config).
struct ActionMap {
    bindings: Vec<(Control, Vec<Btn>)>,
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(field: &str, names: &[String]) -> Vec<Btn> {
            names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        tracing::warn!(field, button = %s, "unknown gamepad button name ignored");
                    }
                    btn
                })
                .collect()
        }
        ActionMap {
            bindings: vec![
                (Control::Jump, parse_list("jump", &cfg.jump)),
                (Control::AttackPrimary, parse_list("attack_primary", &cfg.attack_primary)),
                (Control::AttackSecondary, parse_list("attack_secondary", &cfg.attack_secondary)),
                (Control::Begin, parse_list("begin", &cfg.begin)),
                (Control::Confirm, parse_list("confirm", &cfg.confirm)),
                (Control::Respawn, parse_list("respawn", &cfg.respawn)),
                (Control::Exit, parse_list("exit", &cfg.exit)),
            ],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [bool; BTN_COUNT],

    // D-pad
    dpad_up: bool,
    dpad_left: bool,
    dpad_right: bool,

    // Stick
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    tracing::info!(error = %e, "gamepad support unavailable");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [false; BTN_COUNT],
            dpad_up: false,
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::from_config(cfg),
            connected,
        }
    }

    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    tracing::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    tracing::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad_up = held; return; }
            Button::DPadLeft  => { self.dpad_left = held; return; }
            Button::DPadRight => { self.dpad_right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)] = held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)])
    }

    /// Merge everything held on the pad into `snap`.
    pub fn fill(&self, snap: &mut ControlSnapshot) {
        if self.dpad_left || self.stick_x < -STICK_DEADZONE {
            snap.press(Control::MoveLeft);
        }
        if self.dpad_right || self.stick_x > STICK_DEADZONE {
            snap.press(Control::MoveRight);
        }
        if self.dpad_up || self.stick_y > STICK_DEADZONE {
            snap.press(Control::Jump);
        }
        for (control, btns) in &self.action_map.bindings {
            if self.any_held(btns) {
                snap.press(*control);
            }
        }
    }

    #[cfg(any(feature = "gamepad", test))]
    fn release_all(&mut self) {
        self.buttons = [false; BTN_COUNT];
        self.dpad_up = false;
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
