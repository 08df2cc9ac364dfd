use super::Reduced;
use crate::{move_layer, EditorCommand, LayerStore};

pub(super) fn reduce(command: &EditorCommand, store: &mut LayerStore) -> Reduced {
    match command {
        EditorCommand::AddLayer(kind) => {
            let id = store.add(*kind);
            Reduced {
                changed: true,
                added: Some(id),
            }
        }
        EditorCommand::RemoveLayer(id) => Reduced::changed(store.remove(*id)),
        EditorCommand::SetLayerDisabled(id, disabled) => {
            Reduced::changed(store.set_disabled(*id, *disabled))
        }
        EditorCommand::SetLayerLoop(id, looping) => Reduced::changed(store.set_loop(*id, *looping)),
        EditorCommand::MoveLayer { id, zone, target } => {
            Reduced::changed(move_layer(store, *id, *zone, *target))
        }
        _ => Reduced::default(),
    }
}
