//! Administrative areas: the registry and their map layers.

mod layers;
mod registry;

pub use layers::AreaLayerManager;
pub use registry::{Area, AreaKind, AreaRegistry};
