//! Expansion of operation-node schemas into stage trees.
//!
//! An operation tree arrives as nested [OperationNode]s: inline stages with
//! children, or references to other operation templates whose top-level nodes
//! splice in as siblings. Expansion resolves every schema field through the
//! per-combine variable table, creates the engine node for each stage, and
//! parses the randomizable parameter ranges.
use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::combine::variables::VariableTable;
use crate::combine::Team;
use crate::engine::{node_kind, ImageGraph, NodeOptions};
use crate::error::{Error, Result};
use crate::schema::store::DefinitionStore;
use crate::schema::{
    ApplyStickerNode, OperationNode, SelectNode, StageNode, TextureLookupNode,
};
use crate::stage::params::{
    parse_flag, parse_inverse_range, parse_range, parse_range_scaled, parse_vec2,
};
use crate::stage::select::add_select_nodes;
use crate::stage::{
    ApplyStickerParams, CombineMode, CombineParams, Stage, StageKind, Sticker, TextureLookupParams,
};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Context for one expansion run. Borrowed from the combiner for the duration
/// of a combine call.
pub(crate) struct Expander<'a> {
    pub(crate) engine: &'a dyn ImageGraph,
    pub(crate) store: &'a dyn DefinitionStore,
    pub(crate) variables: &'a VariableTable,
    pub(crate) team: Team,
    pub(crate) texture_size: u32,
}

impl Expander<'_> {
    /// Expands the single top-level operation node of a template.
    ///
    /// A root that expands to nothing (for example a texture lookup without a
    /// resolvable path) yields `None`; a root that splices out to several
    /// sibling stages has no single node to render from and is rejected.
    pub(crate) async fn expand_root(&self, node: &OperationNode) -> Result<Option<Stage>> {
        let mut stages = self.expand_node(node).await?;
        match stages.len() {
            0 => Ok(None),
            1 => Ok(stages.pop()),
            n => Err(Error::Schema(format!(
                "top-level operation node expanded to {n} stages, expected one"
            ))),
        }
    }

    /// Expands one operation node into zero or more sibling stages.
    ///
    /// Inline stages yield at most one stage with their nested children
    /// attached; template references yield the expansion of the referenced
    /// template's top-level nodes, flattened in place.
    fn expand_node<'b>(&'b self, node: &'b OperationNode) -> BoxFuture<'b, Result<Vec<Stage>>> {
        Box::pin(async move {
            if let Some(stage_node) = &node.stage {
                let (built, child_nodes) = self.build_stage(stage_node)?;
                let Some(mut stage) = built else {
                    return Ok(Vec::new());
                };
                if !child_nodes.is_empty() {
                    let children = self.expand_children(child_nodes).await?;
                    stage.append_children(children);
                }
                return Ok(vec![stage]);
            }

            if let Some(template_ref) = node.operation_template {
                let definition = self.store.definition(template_ref).await?.ok_or(
                    Error::MissingDefinition {
                        def_type: template_ref.def_type.code(),
                        defindex: template_ref.defindex,
                    },
                )?;
                let template = definition.as_operation().ok_or_else(|| {
                    Error::Schema(format!(
                        "definition {template_ref} is not an operation template"
                    ))
                })?;
                return self.expand_children(&template.operation_node).await;
            }

            Err(Error::Schema(
                "operation node carries neither a stage nor a template reference".into(),
            ))
        })
    }

    async fn expand_children(&self, nodes: &[OperationNode]) -> Result<Vec<Stage>> {
        let mut children = Vec::new();
        for node in nodes {
            children.extend(self.expand_node(node).await?);
        }
        Ok(children)
    }

    /// Builds the stage an inline schema node describes, dispatching on which
    /// payload key is present. Returns the stage (absent when the stage is
    /// dropped) together with its nested child nodes.
    fn build_stage<'b>(
        &self,
        stage: &'b StageNode,
    ) -> Result<(Option<Stage>, &'b [OperationNode])> {
        if let Some(lookup) = &stage.texture_lookup {
            Ok((self.build_texture_lookup(lookup), &lookup.operation_node))
        } else if let Some(combine) = &stage.combine_add {
            Ok((
                Some(self.build_combine(CombineMode::Add)),
                &combine.operation_node,
            ))
        } else if let Some(combine) = &stage.combine_lerp {
            Ok((
                Some(self.build_combine(CombineMode::Lerp)),
                &combine.operation_node,
            ))
        } else if let Some(combine) = &stage.combine_multiply {
            Ok((
                Some(self.build_combine(CombineMode::Multiply)),
                &combine.operation_node,
            ))
        } else if let Some(select) = &stage.select {
            Ok((Some(self.build_select(select)), &select.operation_node))
        } else if let Some(sticker) = &stage.apply_sticker {
            Ok((
                Some(self.build_apply_sticker(sticker)?),
                &sticker.operation_node,
            ))
        } else {
            Err(Error::Schema("unrecognized stage".into()))
        }
    }

    /// The texture path is team-conditional: the red or blue variant when the
    /// schema carries one, the plain field otherwise. A stage whose path does
    /// not resolve is dropped along with its children.
    fn build_texture_lookup(&self, lookup: &TextureLookupNode) -> Option<Stage> {
        let field = match self.team {
            Team::Red => lookup.texture_red.as_ref().or(lookup.texture.as_ref()),
            Team::Blue => lookup.texture_blue.as_ref().or(lookup.texture.as_ref()),
        };
        let Some(resolved) = self.variables.resolve(field) else {
            warn!("Texture lookup stage has no resolvable texture path; dropping stage.");
            return None;
        };
        let texture_path = resolved
            .strip_suffix(".tga")
            .unwrap_or(resolved.as_str())
            .to_owned();
        if texture_path.is_empty() {
            warn!("Texture lookup stage resolved to an empty path; dropping stage.");
            return None;
        }

        let node = self
            .engine
            .add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        self.engine
            .set_param(node, "path", texture_path.as_str().into());

        let mut params = TextureLookupParams {
            texture_path: texture_path.clone(),
            ..TextureLookupParams::default()
        };
        if let Some(text) = self.variables.resolve(lookup.adjust_black.as_ref()) {
            parse_range_scaled(&mut params.adjust_black, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.adjust_offset.as_ref()) {
            parse_range_scaled(&mut params.adjust_offset, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.adjust_gamma.as_ref()) {
            parse_inverse_range(&mut params.adjust_gamma, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.scale_uv.as_ref()) {
            parse_range(&mut params.scale_uv, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.rotation.as_ref()) {
            parse_range(&mut params.rotation, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.translate_u.as_ref()) {
            parse_range(&mut params.translate_u, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.translate_v.as_ref()) {
            parse_range(&mut params.translate_v, &text);
        }
        if let Some(text) = self.variables.resolve(lookup.flip_u.as_ref()) {
            params.allow_flip_u = parse_flag(&text);
        }
        if let Some(text) = self.variables.resolve(lookup.flip_v.as_ref()) {
            params.allow_flip_v = parse_flag(&text);
        }

        let mut built = Stage::new(node, StageKind::TextureLookup(params));
        built.texture_path = texture_path;
        Some(built)
    }

    /// Combine payloads carry nothing but their children; the adjust draws
    /// always run over the default ranges.
    fn build_combine(&self, mode: CombineMode) -> Stage {
        let node = self.engine.add_node(mode.node_kind(), NodeOptions::default());
        Stage::new(
            node,
            StageKind::Combine {
                mode,
                params: CombineParams::default(),
            },
        )
    }

    /// Unresolvable threshold entries keep their slot so later levels stay at
    /// their schema index.
    fn build_select(&self, select: &SelectNode) -> Stage {
        let levels: Vec<String> = select
            .select
            .iter()
            .map(|field| self.variables.resolve(Some(field)).unwrap_or_default())
            .collect();
        let node = add_select_nodes(self.engine, &levels);

        let mut built = Stage::new(
            node,
            StageKind::Select {
                texture_size: self.texture_size,
            },
        );
        if let Some(groups) = self.variables.resolve(select.groups.as_ref()) {
            built.texture_path = groups;
        }
        built
    }

    fn build_apply_sticker(&self, sticker: &ApplyStickerNode) -> Result<Stage> {
        let node = self
            .engine
            .add_node(node_kind::APPLY_STICKER, NodeOptions::default());

        let mut params = ApplyStickerParams::default();
        if let Some(text) = self.variables.resolve(sticker.adjust_black.as_ref()) {
            parse_range_scaled(&mut params.adjust_black, &text);
        }
        if let Some(text) = self.variables.resolve(sticker.adjust_offset.as_ref()) {
            parse_range_scaled(&mut params.adjust_offset, &text);
        }
        if let Some(text) = self.variables.resolve(sticker.adjust_gamma.as_ref()) {
            parse_inverse_range(&mut params.adjust_gamma, &text);
        }
        if let Some(text) = self.variables.resolve(sticker.dest_bl.as_ref()) {
            parse_vec2(&mut params.bottom_left, &text);
        }
        if let Some(text) = self.variables.resolve(sticker.dest_tl.as_ref()) {
            parse_vec2(&mut params.top_left, &text);
        }
        if let Some(text) = self.variables.resolve(sticker.dest_tr.as_ref()) {
            parse_vec2(&mut params.top_right, &text);
        }

        let candidates = sticker
            .sticker
            .as_deref()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| Error::Schema("apply sticker stage has no sticker candidates".into()))?;
        for spec in candidates {
            let mut candidate = match self.variables.resolve(spec.base.as_ref()) {
                Some(file_name) => Sticker::new(file_name),
                None => {
                    warn!("Sticker candidate has no resolvable base texture.");
                    Sticker::new("")
                }
            };
            if let Some(text) = self.variables.resolve(spec.weight.as_ref()) {
                match text.trim().parse::<f64>() {
                    Ok(weight) => candidate.weight = weight,
                    Err(_) => warn!("Unparsable sticker weight '{}'.", text),
                }
            }
            params.stickers.push(candidate);
        }

        self.engine.invalidate(node);
        Ok(Stage::new(node, StageKind::ApplySticker(params)))
    }
}
