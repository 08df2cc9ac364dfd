//! Profile data model.

pub mod layer;
pub mod layer_store;
pub mod light;
pub mod profile;
pub mod ring;

pub use layer::{Band, BlendMode, EffectLayer, LayerKind, LayerPatch};
pub use layer_store::LayerStore;
pub use light::{LightAnimation, LightAnimationKind, LightProfile};
pub use profile::{Anchor, AppearanceProfile, Disposition, ProfileChanges, ProfileMode, Tags};
pub use ring::{RingColors, RingEffect, RingEffects, RingProfile, RingSubject};
