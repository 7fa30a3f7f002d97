/// Audio intents emitted during a simulation step.
/// The presentation layer plays them; the simulation never waits on them.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AudioCue {
    Run,
    Attack,
    Victory,
    Defeat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MusicCommand {
    Start,
    Stop,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AudioEvent {
    /// One-shot sound at `gain` (0.0–1.0+, already scaled by config volume).
    Cue { cue: AudioCue, gain: f32 },
    Music(MusicCommand),
}

/// Push a cue, collapsing duplicates: at most one of each cue per tick,
/// keeping the loudest request.
pub fn push_cue(events: &mut Vec<AudioEvent>, cue: AudioCue, gain: f32) {
    for ev in events.iter_mut() {
        if let AudioEvent::Cue { cue: c, gain: g } = ev {
            if *c == cue {
                *g = g.max(gain);
                return;
            }
        }
    }
    events.push(AudioEvent::Cue { cue, gain });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_cues_collapse_to_loudest() {
        let mut evs = vec![AudioEvent::Music(MusicCommand::Stop)];
        push_cue(&mut evs, AudioCue::Run, 0.2);
        push_cue(&mut evs, AudioCue::Attack, 1.0);
        push_cue(&mut evs, AudioCue::Run, 0.6);
        push_cue(&mut evs, AudioCue::Run, 0.1);
        assert_eq!(
            evs,
            vec![
                AudioEvent::Music(MusicCommand::Stop),
                AudioEvent::Cue { cue: AudioCue::Run, gain: 0.6 },
                AudioEvent::Cue { cue: AudioCue::Attack, gain: 1.0 },
            ]
        );
    }
}
