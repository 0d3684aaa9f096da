//! Compositing-engine interface.
//!
//! The crate never touches pixels. It drives an external node-graph
//! compositor through [ImageGraph]: the combiner creates nodes, wires
//! predecessors, writes randomized parameters, and finally asks for a redraw.
//! Hosts implement the trait over their renderer; tests implement it over a
//! recording mock.
use async_trait::async_trait;
use glam::Vec2;

use crate::error::Result;
use crate::texture::TextureRef;

/// Node kinds the combiner instantiates.
///
/// The vocabulary is open on the engine side; these are the kinds a paint-kit
/// operation tree resolves to.
pub mod node_kind {
    pub const TEXTURE_LOOKUP: &str = "texture lookup";
    pub const COMBINE_ADD: &str = "combine_add";
    pub const COMBINE_LERP: &str = "combine_lerp";
    pub const MULTIPLY: &str = "multiply";
    pub const APPLY_STICKER: &str = "apply_sticker";
    pub const SELECT: &str = "select";
    pub const INT_ARRAY: &str = "int array";
}

/// Opaque handle of an engine node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Creation options for [ImageGraph::add_node].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeOptions {
    /// Element count for array-valued nodes.
    pub length: Option<usize>,
    /// Render target size for texture nodes.
    pub texture_size: Option<u32>,
}

impl NodeOptions {
    pub fn length(length: usize) -> Self {
        Self {
            length: Some(length),
            ..Self::default()
        }
    }

    pub fn texture_size(texture_size: u32) -> Self {
        Self {
            texture_size: Some(texture_size),
            ..Self::default()
        }
    }
}

/// A parameter value written to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Vec2(Vec2),
    Str(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<Vec2> for ParamValue {
    fn from(value: Vec2) -> Self {
        ParamValue::Vec2(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// The node-graph surface the combiner drives.
///
/// Implementations are shared across concurrent texture-setup tasks, so all
/// methods take `&self`; mutability is interior. Parameter and wiring writes
/// are fire-and-forget; only [redraw](ImageGraph::redraw) can fail.
#[async_trait]
pub trait ImageGraph: Send + Sync {
    /// Removes every node and clears engine-side variables.
    fn clear(&self);

    /// Sets the render target size used by subsequently created nodes.
    fn set_texture_size(&self, size: u32);

    /// Creates a node of the given kind.
    fn add_node(&self, kind: &str, options: NodeOptions) -> NodeId;

    /// Writes a named parameter on a node.
    fn set_param(&self, node: NodeId, name: &str, value: ParamValue);

    /// Writes one element of an array-valued node.
    fn set_value(&self, node: NodeId, index: usize, value: i32);

    /// Declared input names of a node, in declaration order.
    fn input_slots(&self, node: NodeId) -> Vec<String>;

    /// Whether the node declares the named input.
    fn has_input(&self, node: NodeId, input: &str) -> bool;

    /// Wires `pred`'s named output into `node`'s named input.
    fn set_predecessor(&self, node: NodeId, input: &str, pred: NodeId, output: &str);

    /// Binds the primary input texture of a node.
    fn set_input_texture(&self, node: NodeId, texture: TextureRef);

    /// Binds a texture to a named input (for example `specular`).
    fn set_input(&self, node: NodeId, input: &str, texture: TextureRef);

    /// Binds the texture the node's output renders into.
    fn bind_output(&self, node: NodeId, texture: TextureRef);

    /// Marks a node dirty so the next redraw re-evaluates it.
    fn invalidate(&self, node: NodeId);

    /// Enables or disables automatic redraw on parameter changes.
    fn set_auto_redraw(&self, node: NodeId, enabled: bool);

    /// Renders the graph rooted at `node` and resolves when done.
    async fn redraw(&self, node: NodeId) -> Result<()>;
}
