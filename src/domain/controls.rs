/// Logical controls and the per-tick snapshot the simulation reads.
///
/// The snapshot is level-triggered: a control is "active" for as long as
/// the device reports it held. One-shot screen actions (Begin, Confirm,
/// Respawn) go through an explicit `EdgeTrigger` so a held key does not
/// fire them every tick.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Control {
    MoveLeft,
    MoveRight,
    Jump,
    AttackPrimary,
    AttackSecondary,
    Confirm,
    Respawn,
    Exit,
    Begin,
}

const CONTROL_COUNT: usize = 9;

#[cfg(test)]
impl Control {
    pub const ALL: [Control; CONTROL_COUNT] = [
        Control::MoveLeft,
        Control::MoveRight,
        Control::Jump,
        Control::AttackPrimary,
        Control::AttackSecondary,
        Control::Confirm,
        Control::Respawn,
        Control::Exit,
        Control::Begin,
    ];
}

fn control_index(c: Control) -> usize {
    c as usize
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlSnapshot {
    active: [bool; CONTROL_COUNT],
}

impl ControlSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, control: Control, active: bool) {
        self.active[control_index(control)] = active;
    }

    /// Mark active without ever clearing (merging several devices).
    pub fn press(&mut self, control: Control) {
        self.set(control, true);
    }

    pub fn is_active(&self, control: Control) -> bool {
        self.active[control_index(control)]
    }

    #[cfg(test)]
    pub fn with(mut self, control: Control) -> Self {
        self.press(control);
        self
    }
}

impl FromIterator<Control> for ControlSnapshot {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        let mut snap = ControlSnapshot::new();
        for c in iter {
            snap.press(c);
        }
        snap
    }
}

/// Rising-edge detector over a level-triggered control.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeTrigger {
    was_active: bool,
}

impl EdgeTrigger {
    /// Feed this tick's level; true only on the tick it goes inactive → active.
    pub fn update(&mut self, active: bool) -> bool {
        let fired = active && !self.was_active;
        self.was_active = active;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_each_control_independently() {
        let snap: ControlSnapshot = [Control::MoveRight, Control::AttackPrimary].into_iter().collect();
        assert!(snap.is_active(Control::MoveRight));
        assert!(snap.is_active(Control::AttackPrimary));
        for c in Control::ALL {
            if c != Control::MoveRight && c != Control::AttackPrimary {
                assert!(!snap.is_active(c), "{c:?} should be inactive");
            }
        }
    }

    #[test]
    fn edge_fires_once_per_press() {
        let mut e = EdgeTrigger::default();
        assert!(e.update(true));
        assert!(!e.update(true));
        assert!(!e.update(true));
        assert!(!e.update(false));
        assert!(e.update(true));
    }
}
