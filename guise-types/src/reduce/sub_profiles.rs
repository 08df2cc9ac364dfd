use super::Reduced;
use crate::{AppearanceProfile, EditorCommand};

pub(super) fn reduce(command: &EditorCommand, profile: &mut AppearanceProfile) -> Reduced {
    match command {
        EditorCommand::ToggleLight(active) => {
            let changed = profile.light.active != *active;
            profile.light.active = *active;
            Reduced::changed(changed)
        }
        EditorCommand::ToggleRing(enabled) => {
            let changed = profile.ring.enabled != *enabled;
            profile.ring.enabled = *enabled;
            Reduced::changed(changed)
        }
        _ => Reduced::default(),
    }
}
