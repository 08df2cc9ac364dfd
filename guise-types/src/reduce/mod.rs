//! Pure structural reducers for the profile editor.
//!
//! These functions are the single source of truth for command → profile
//! mutations. They mutate the `AppearanceProfile` only. They do NOT:
//! - Touch in-flight field edits (the session snapshots those around us)
//! - Resolve resource references
//! - Start or stop sounds
//! - Recompute the preview

mod layers;
mod sub_profiles;

use crate::{AppearanceProfile, EditorCommand, LayerId};

/// What a reduction did to the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reduced {
    pub changed: bool,
    /// Id of a layer created by the command.
    pub added: Option<LayerId>,
}

impl Reduced {
    pub(crate) fn changed(changed: bool) -> Self {
        Self {
            changed,
            added: None,
        }
    }
}

/// Apply a command's structural mutation to the profile.
/// Returns `None` if the command is not reducible (caller routes it to the
/// edit buffer instead).
pub fn reduce_command(command: &EditorCommand, profile: &mut AppearanceProfile) -> Option<Reduced> {
    match command {
        EditorCommand::AddLayer(_)
        | EditorCommand::RemoveLayer(_)
        | EditorCommand::SetLayerDisabled(_, _)
        | EditorCommand::SetLayerLoop(_, _)
        | EditorCommand::MoveLayer { .. } => Some(layers::reduce(command, &mut profile.effects)),

        EditorCommand::ToggleLight(_) | EditorCommand::ToggleRing(_) => {
            Some(sub_profiles::reduce(command, profile))
        }

        // Inspector selection only rebuilds the surface
        EditorCommand::SelectTarget(_) => Some(Reduced::default()),

        EditorCommand::EditField { .. } | EditorCommand::SetFieldActive { .. } => None,
    }
}
