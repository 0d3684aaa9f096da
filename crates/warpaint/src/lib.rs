#![forbid(unsafe_code)]
//! warpaint: deterministic paint-kit texture combination with seeded stage trees.
//!
//! Modules:
//! - rng: the legacy uniform random stream and 64-bit seed splitting
//! - engine: the compositing-engine trait the host implements (node graph, params, redraw)
//! - texture: texture handles, async provider, shared fetch cache
//! - schema: typed paint-kit definitions, async definition store, legacy weapon ids
//! - stage: the expanded stage tree (randomization, linking, texture setup)
//! - combine: the orchestrator, variable table, events, request queue
//!
//! A combine call resolves a paint kit for a weapon, expands its operation
//! tree into engine nodes, randomizes stage parameters from a 64-bit seed,
//! resolves textures, and redraws the graph. Identical inputs produce
//! identical graphs, bit for bit.
pub mod combine;
pub mod engine;
pub mod error;
pub mod rng;
pub mod schema;
pub mod stage;
pub mod texture;

/// Convenient re-exports for common types. Import with `use warpaint::prelude::*;`.
pub mod prelude {
    pub use crate::combine::events::{CombineEvent, EventSink, FnSink, VecSink};
    pub use crate::combine::queue::{QueueItem, RequestQueue};
    pub use crate::combine::variables::VariableTable;
    pub use crate::combine::{CombineRequest, Team, TextureCombiner, DEFAULT_TEXTURE_SIZE};
    pub use crate::engine::{node_kind, ImageGraph, NodeId, NodeOptions, ParamValue};
    pub use crate::error::{Error, Result};
    pub use crate::rng::{split_seed, RandomSource, UniformRandomStream};
    pub use crate::schema::store::{DefinitionStore, StaticDefinitionStore};
    pub use crate::schema::{
        DefRef, DefType, Definition, Header, ItemDefinition, OperationNode, OperationTemplate,
        PaintKitDefinition, VarField,
    };
    pub use crate::stage::{Stage, StageKind};
    pub use crate::texture::{Texture, TextureCache, TextureProvider, TextureRef};
}
