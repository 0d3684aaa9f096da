//! Stage trees.
//!
//! Expanding a paint kit's operation tree yields a tree of stages, each
//! owning one node of the compositing engine. The tree drives three passes:
//! wiring child nodes into their parent's inputs, drawing randomized
//! parameters in pre-order, and binding textures concurrently.
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::engine::{node_kind, ImageGraph, NodeId, NodeOptions};
use crate::error::{Error, Result};
use crate::rng::RandomSource;
use crate::texture::TextureCache;

pub mod combine;
pub mod params;
pub mod select;
pub mod sticker;
pub mod texture_lookup;

pub use combine::{CombineMode, CombineParams};
pub use params::Range;
pub use sticker::{ApplyStickerParams, Sticker};
pub use texture_lookup::TextureLookupParams;

/// Stage variant with its randomizable parameters.
#[derive(Debug, Clone)]
pub enum StageKind {
    TextureLookup(TextureLookupParams),
    Combine {
        mode: CombineMode,
        params: CombineParams,
    },
    Select {
        texture_size: u32,
    },
    ApplySticker(ApplyStickerParams),
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::TextureLookup(_) => node_kind::TEXTURE_LOOKUP,
            StageKind::Combine { mode, .. } => mode.node_kind(),
            StageKind::Select { .. } => node_kind::SELECT,
            StageKind::ApplySticker(_) => node_kind::APPLY_STICKER,
        }
    }
}

/// One node of an expanded paint-kit tree.
#[derive(Debug, Clone)]
pub struct Stage {
    pub node: NodeId,
    pub kind: StageKind,
    pub texture_path: String,
    pub specular_texture_path: String,
    pub children: Vec<Stage>,
}

impl Stage {
    pub fn new(node: NodeId, kind: StageKind) -> Self {
        Self {
            node,
            kind,
            texture_path: String::new(),
            specular_texture_path: String::new(),
            children: Vec::new(),
        }
    }

    /// Prepends `children` ahead of any existing children, preserving their
    /// order.
    pub fn append_children(&mut self, mut children: Vec<Stage>) {
        children.append(&mut self.children);
        self.children = children;
    }

    /// Draws randomized parameters for the whole tree in pre-order.
    ///
    /// Stages share a cursor into `streams`: a stage draws from the stream
    /// under the cursor and, if it drew anything, moves the cursor to the
    /// next stream. Select stages draw nothing and leave the cursor alone.
    pub fn compute_random_values<R: RandomSource>(
        &mut self,
        engine: &dyn ImageGraph,
        cursor: &mut usize,
        streams: &mut [R],
    ) -> Result<()> {
        if streams.is_empty() {
            return Err(Error::Other("randomization needs at least one stream".into()));
        }
        if self.compute_random_values_this(engine, &mut streams[*cursor])? {
            *cursor = (*cursor + 1) % streams.len();
        }
        for child in &mut self.children {
            child.compute_random_values(engine, cursor, streams)?;
        }
        Ok(())
    }

    fn compute_random_values_this(
        &mut self,
        engine: &dyn ImageGraph,
        rng: &mut dyn RandomSource,
    ) -> Result<bool> {
        match &mut self.kind {
            StageKind::TextureLookup(params) => {
                params.randomize(engine, self.node, rng);
                Ok(true)
            }
            StageKind::Combine { params, .. } => {
                params.randomize(engine, self.node, rng);
                Ok(true)
            }
            StageKind::Select { .. } => Ok(false),
            StageKind::ApplySticker(params) => {
                let choice = params.randomize(engine, self.node, rng)?;
                self.texture_path = choice.texture_path;
                self.specular_texture_path = choice.specular_texture_path;
                Ok(true)
            }
        }
    }

    /// Wires each child's node into the next free input of this stage's
    /// node, recursively. Children beyond the declared inputs stay unwired.
    pub fn link_nodes(&self, engine: &dyn ImageGraph) {
        let inputs = engine.input_slots(self.node);
        for (i, child) in self.children.iter().enumerate() {
            child.link_nodes(engine);
            if let Some(input) = inputs.get(i) {
                engine.set_predecessor(self.node, input, child.node, "output");
            }
        }
    }

    /// Resolves and binds the textures of the whole tree, fanning the
    /// fetches out over concurrent tasks. Unresolvable textures are logged
    /// and skipped.
    pub async fn setup_textures(
        &self,
        engine: &Arc<dyn ImageGraph>,
        textures: &TextureCache,
    ) -> Result<()> {
        let mut jobs = Vec::new();
        self.collect_texture_jobs(&mut jobs);

        let mut tasks = JoinSet::new();
        for job in jobs {
            let engine = Arc::clone(engine);
            let textures = textures.clone();
            tasks.spawn(async move { job.run(engine.as_ref(), &textures).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| Error::Other(format!("texture setup task failed: {e}")))?;
        }
        Ok(())
    }

    fn collect_texture_jobs(&self, jobs: &mut Vec<TextureJob>) {
        if !self.texture_path.is_empty() || !self.specular_texture_path.is_empty() {
            let select_size = match self.kind {
                StageKind::Select { texture_size } => Some(texture_size),
                _ => None,
            };
            jobs.push(TextureJob {
                node: self.node,
                select_size,
                texture_path: self.texture_path.clone(),
                specular_texture_path: self.specular_texture_path.clone(),
            });
        }
        for child in &self.children {
            child.collect_texture_jobs(jobs);
        }
    }

    fn render_into(&self, lines: &mut Vec<String>, depth: usize) {
        lines.push(format!("{}{}", "\t".repeat(depth), self.kind.name()));
        for child in &self.children {
            child.render_into(lines, depth + 1);
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        f.write_str(&lines.join("\n"))
    }
}

/// Texture work for one stage, detached from the tree so it can run on its
/// own task.
struct TextureJob {
    node: NodeId,
    select_size: Option<u32>,
    texture_path: String,
    specular_texture_path: String,
}

impl TextureJob {
    async fn run(self, engine: &dyn ImageGraph, textures: &TextureCache) {
        if let Some(texture_size) = self.select_size {
            // Select stages sample their group texture through a dedicated
            // lookup node feeding the select node's input.
            let lookup =
                engine.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::texture_size(texture_size));
            engine.set_predecessor(self.node, "input", lookup, "output");
            match textures.texture(&self.texture_path).await {
                Some(texture) => engine.set_input_texture(lookup, texture),
                None => warn!("Group texture '{}' not found.", self.texture_path),
            }
            engine.invalidate(lookup);
            return;
        }

        if !self.texture_path.is_empty() {
            match textures.texture(&self.texture_path).await {
                Some(texture) => engine.set_input_texture(self.node, texture),
                None => warn!("Texture '{}' not found.", self.texture_path),
            }
            engine.set_param(self.node, "path", self.texture_path.as_str().into());
            engine.invalidate(self.node);
        }

        if !self.specular_texture_path.is_empty() && engine.has_input(self.node, "specular") {
            match textures.specular_texture(&self.specular_texture_path).await {
                Some(texture) => engine.set_input(self.node, "specular", texture),
                None => debug!(
                    "Specular texture '{}' not found.",
                    self.specular_texture_path
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{Call, RecordingGraph};
    use crate::engine::ParamValue;
    use crate::rng::UniformRandomStream;
    use crate::texture::testing::EchoProvider;

    fn combine_stage(graph: &RecordingGraph, mode: CombineMode) -> Stage {
        let node = graph.add_node(mode.node_kind(), NodeOptions::default());
        Stage::new(
            node,
            StageKind::Combine {
                mode,
                params: CombineParams {
                    adjust_gamma: Range::new(0.0, 1.0),
                    ..CombineParams::default()
                },
            },
        )
    }

    fn gamma(graph: &RecordingGraph, node: NodeId) -> f64 {
        match graph.param(node, "adjust gamma") {
            Some(ParamValue::Float(value)) => value,
            other => panic!("missing gamma: {other:?}"),
        }
    }

    #[test]
    fn append_children_prepends_in_order() {
        let graph = RecordingGraph::default();
        let mut root = combine_stage(&graph, CombineMode::Add);
        let existing = combine_stage(&graph, CombineMode::Multiply);
        let existing_node = existing.node;
        root.children.push(existing);

        let a = combine_stage(&graph, CombineMode::Lerp);
        let b = combine_stage(&graph, CombineMode::Lerp);
        let (a_node, b_node) = (a.node, b.node);
        root.append_children(vec![a, b]);

        let order: Vec<NodeId> = root.children.iter().map(|child| child.node).collect();
        assert_eq!(order, vec![a_node, b_node, existing_node]);
    }

    #[test]
    fn stages_alternate_streams_in_preorder() {
        let graph = RecordingGraph::default();
        let mut root = combine_stage(&graph, CombineMode::Add);
        let child_a = combine_stage(&graph, CombineMode::Lerp);
        let child_b = combine_stage(&graph, CombineMode::Lerp);
        let (a_node, b_node) = (child_a.node, child_b.node);
        root.append_children(vec![child_a, child_b]);

        let mut streams = [UniformRandomStream::new(42), UniformRandomStream::new(7)];
        let mut cursor = 0;
        root.compute_random_values(&graph, &mut cursor, &mut streams)
            .expect("randomize");

        assert_eq!(gamma(&graph, root.node), 0.7370189999868251);
        assert_eq!(gamma(&graph, a_node), 0.643754235302915);
        assert_eq!(gamma(&graph, b_node), 0.5304490451377114);
        assert_eq!(cursor, 1);
    }

    #[test]
    fn select_stages_do_not_advance_the_cursor() {
        let graph = RecordingGraph::default();
        let mut root = combine_stage(&graph, CombineMode::Add);
        let select_node = graph.add_node(node_kind::SELECT, NodeOptions::default());
        let select = Stage::new(select_node, StageKind::Select { texture_size: 1024 });
        let child = combine_stage(&graph, CombineMode::Lerp);
        let child_node = child.node;
        root.append_children(vec![select, child]);

        let mut streams = [UniformRandomStream::new(42), UniformRandomStream::new(7)];
        let mut cursor = 0;
        root.compute_random_values(&graph, &mut cursor, &mut streams)
            .expect("randomize");

        assert_eq!(gamma(&graph, root.node), 0.7370189999868251);
        assert_eq!(gamma(&graph, child_node), 0.643754235302915);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn sticker_stages_store_their_chosen_paths() {
        let graph = RecordingGraph::default();
        let node = graph.add_node(node_kind::APPLY_STICKER, NodeOptions::default());
        let mut stage = Stage::new(
            node,
            StageKind::ApplySticker(ApplyStickerParams {
                stickers: vec![Sticker::new("stickers/frog.vtf")],
                ..ApplyStickerParams::default()
            }),
        );

        let mut streams = [UniformRandomStream::new(7)];
        let mut cursor = 0;
        stage
            .compute_random_values(&graph, &mut cursor, &mut streams)
            .expect("randomize");

        assert_eq!(stage.texture_path, "stickers/frog.vtf");
        assert_eq!(stage.specular_texture_path, "stickers/frog_s");
        assert_eq!(cursor, 0);
    }

    #[test]
    fn randomize_requires_streams() {
        let graph = RecordingGraph::default();
        let mut root = combine_stage(&graph, CombineMode::Add);
        let mut streams: [UniformRandomStream; 0] = [];
        let mut cursor = 0;
        assert!(root
            .compute_random_values(&graph, &mut cursor, &mut streams)
            .is_err());
    }

    #[test]
    fn link_nodes_wires_children_to_declared_inputs() {
        let graph = RecordingGraph::default();
        graph.declare_inputs(node_kind::COMBINE_ADD, &["a", "b"]);

        let mut root = combine_stage(&graph, CombineMode::Add);
        let children: Vec<Stage> = (0..3)
            .map(|_| {
                let node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
                Stage::new(node, StageKind::TextureLookup(TextureLookupParams::default()))
            })
            .collect();
        let child_nodes: Vec<NodeId> = children.iter().map(|child| child.node).collect();
        root.append_children(children);

        root.link_nodes(&graph);

        let wires: Vec<Call> = graph
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::SetPredecessor(..)))
            .collect();
        assert_eq!(
            wires,
            vec![
                Call::SetPredecessor(
                    root.node.0,
                    "a".to_owned(),
                    child_nodes[0].0,
                    "output".to_owned()
                ),
                Call::SetPredecessor(
                    root.node.0,
                    "b".to_owned(),
                    child_nodes[1].0,
                    "output".to_owned()
                ),
            ]
        );
    }

    #[test]
    fn display_indents_children() {
        let graph = RecordingGraph::default();
        let mut root = combine_stage(&graph, CombineMode::Add);
        let lookup_node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        let select_node = graph.add_node(node_kind::SELECT, NodeOptions::default());
        root.append_children(vec![
            Stage::new(
                lookup_node,
                StageKind::TextureLookup(TextureLookupParams::default()),
            ),
            Stage::new(select_node, StageKind::Select { texture_size: 256 }),
        ]);

        assert_eq!(root.to_string(), "combine_add\n\ttexture lookup\n\tselect");
    }

    #[tokio::test]
    async fn setup_binds_textures_and_paths() {
        let graph = Arc::new(RecordingGraph::default());
        let engine: Arc<dyn ImageGraph> = graph.clone();
        let textures = TextureCache::new(Arc::new(EchoProvider::default()));

        let mut root = combine_stage(graph.as_ref(), CombineMode::Add);
        let lookup_node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        let mut lookup = Stage::new(
            lookup_node,
            StageKind::TextureLookup(TextureLookupParams::default()),
        );
        lookup.texture_path = "paints/base".into();
        root.append_children(vec![lookup]);

        root.setup_textures(&engine, &textures).await.expect("setup");

        let calls = graph.calls();
        assert!(calls.contains(&Call::SetInputTexture(
            lookup_node.0,
            "paints/base".to_owned()
        )));
        assert!(calls.contains(&Call::SetParam(
            lookup_node.0,
            "path".to_owned(),
            ParamValue::Str("paints/base".into())
        )));
        assert!(calls.contains(&Call::Invalidate(lookup_node.0)));
    }

    #[tokio::test]
    async fn setup_routes_select_groups_through_a_lookup_node() {
        let graph = Arc::new(RecordingGraph::default());
        let engine: Arc<dyn ImageGraph> = graph.clone();
        let textures = TextureCache::new(Arc::new(EchoProvider::default()));

        let select_node = graph.add_node(node_kind::SELECT, NodeOptions::default());
        let mut stage = Stage::new(select_node, StageKind::Select { texture_size: 512 });
        stage.texture_path = "groups/mask".into();

        stage.setup_textures(&engine, &textures).await.expect("setup");

        let calls = graph.calls();
        let aux = calls
            .iter()
            .find_map(|call| match call {
                Call::AddNode(id, kind) if kind == node_kind::TEXTURE_LOOKUP => Some(*id),
                _ => None,
            })
            .expect("aux lookup node");
        assert!(calls.contains(&Call::SetPredecessor(
            select_node.0,
            "input".to_owned(),
            aux,
            "output".to_owned()
        )));
        assert!(calls.contains(&Call::SetInputTexture(aux, "groups/mask".to_owned())));
        assert!(calls.contains(&Call::Invalidate(aux)));
        // The group path rides on the bound texture only; the lookup node
        // gets no path param.
        assert!(!calls
            .iter()
            .any(|call| matches!(call, Call::SetParam(id, _, _) if *id == aux)));
    }

    #[tokio::test]
    async fn setup_binds_specular_when_the_node_has_the_input() {
        let graph = Arc::new(RecordingGraph::default());
        graph.declare_inputs(node_kind::APPLY_STICKER, &["specular"]);
        let engine: Arc<dyn ImageGraph> = graph.clone();
        let textures = TextureCache::new(Arc::new(EchoProvider::default()));

        let node = graph.add_node(node_kind::APPLY_STICKER, NodeOptions::default());
        let mut stage = Stage::new(node, StageKind::ApplySticker(ApplyStickerParams::default()));
        stage.texture_path = "stickers/frog.vtf".into();
        stage.specular_texture_path = "stickers/frog_s".into();

        stage.setup_textures(&engine, &textures).await.expect("setup");

        assert!(graph.calls().contains(&Call::SetInput(
            node.0,
            "specular".to_owned(),
            "stickers/frog_s".to_owned()
        )));
    }

    #[tokio::test]
    async fn setup_skips_missing_textures_but_keeps_the_path_param() {
        let graph = Arc::new(RecordingGraph::default());
        let engine: Arc<dyn ImageGraph> = graph.clone();
        let mut provider = EchoProvider::default();
        provider.missing.insert("paints/base".to_owned());
        let textures = TextureCache::new(Arc::new(provider));

        let node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        let mut stage = Stage::new(node, StageKind::TextureLookup(TextureLookupParams::default()));
        stage.texture_path = "paints/base".into();

        stage.setup_textures(&engine, &textures).await.expect("setup");

        let calls = graph.calls();
        assert!(!calls
            .iter()
            .any(|call| matches!(call, Call::SetInputTexture(..))));
        assert!(calls.contains(&Call::SetParam(
            node.0,
            "path".to_owned(),
            ParamValue::Str("paints/base".into())
        )));
    }
}
