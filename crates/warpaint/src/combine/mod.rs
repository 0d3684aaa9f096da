//! Paint-kit combination.
//!
//! [TextureCombiner] drives one combine end to end: resolve the paint kit and
//! the weapon's item to an operation template, expand the template into a
//! stage tree of engine nodes, randomize the stage parameters from the
//! request seed, resolve and bind textures, and redraw the graph. The same
//! request against the same definitions produces the same graph, bit for bit.
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::combine::events::{CombineEvent, EventSink};
use crate::combine::expand::Expander;
use crate::combine::variables::VariableTable;
use crate::engine::ImageGraph;
use crate::error::{Error, Result};
use crate::rng::{split_seed, UniformRandomStream};
use crate::schema::store::DefinitionStore;
use crate::schema::{DefRef, Definition, ItemSlot, PaintKitDefinition, WearEntry};
use crate::texture::{TextureCache, TextureRef};

pub mod events;
pub(crate) mod expand;
pub mod queue;
pub mod variables;

/// Edge length of combined textures when a request does not override it.
pub const DEFAULT_TEXTURE_SIZE: u32 = 2048;

/// Which team's texture variants a combine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Team {
    #[default]
    Red,
    Blue,
}

impl From<u32> for Team {
    /// Team index as the data encodes it: 0 is red, everything else is blue.
    fn from(index: u32) -> Self {
        if index == 0 {
            Team::Red
        } else {
            Team::Blue
        }
    }
}

/// Everything one combine needs.
///
/// Build with [new](CombineRequest::new) and the `with_` methods:
///
/// ```
/// use warpaint::prelude::*;
///
/// let request = CombineRequest::new(290, "shotgun", "paintkit_shotgun_290")
///     .with_wear(2)
///     .with_seed(0x7eadbeef);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CombineRequest {
    /// Paint-kit definition index.
    pub paint_kit_id: u32,
    /// Wear level, an index into the item definition's per-wear entries.
    pub wear: usize,
    /// Weapon id the kit is combined for.
    pub weapon: String,
    /// Name the rendered output is published under.
    pub output_texture_name: String,
    /// Texture to bind the root node's output to, if the host wants one.
    pub output_texture: Option<TextureRef>,
    pub team: Team,
    /// 64-bit seed driving every random draw of the combine.
    pub seed: u64,
    /// Edge length of the combined texture.
    pub texture_size: u32,
}

impl CombineRequest {
    pub fn new(
        paint_kit_id: u32,
        weapon: impl Into<String>,
        output_texture_name: impl Into<String>,
    ) -> Self {
        Self {
            paint_kit_id,
            wear: 0,
            weapon: weapon.into(),
            output_texture_name: output_texture_name.into(),
            output_texture: None,
            team: Team::default(),
            seed: 0,
            texture_size: DEFAULT_TEXTURE_SIZE,
        }
    }

    pub fn with_wear(mut self, wear: usize) -> Self {
        self.wear = wear;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = team;
        self
    }

    pub fn with_output_texture(mut self, texture: TextureRef) -> Self {
        self.output_texture = Some(texture);
        self
    }

    pub fn with_texture_size(mut self, texture_size: u32) -> Self {
        self.texture_size = texture_size;
        self
    }
}

/// The matched weapon slot of a paint kit: the slot itself for its instance
/// data, and the item definition it pointed at.
struct LocatedItem {
    slot: ItemSlot,
    definition: Arc<Definition>,
}

/// Combines paint kits into rendered textures on a compositing engine.
pub struct TextureCombiner {
    engine: Arc<dyn ImageGraph>,
    store: Arc<dyn DefinitionStore>,
    textures: TextureCache,
}

impl TextureCombiner {
    pub fn new(
        engine: Arc<dyn ImageGraph>,
        store: Arc<dyn DefinitionStore>,
        textures: TextureCache,
    ) -> Self {
        Self {
            engine,
            store,
            textures,
        }
    }

    /// Combines one paint kit.
    ///
    /// Resolves `Ok(true)` when the kit rendered, `Ok(false)` when the kit,
    /// item, or template does not apply to the request (unknown kit, weapon
    /// not in the kit, wear level without a template), and `Err` for
    /// malformed definitions and engine failures.
    pub async fn combine_paint(&self, request: &CombineRequest) -> Result<bool> {
        self.combine_paint_with_events(request, &mut ()).await
    }

    /// Same as [combine_paint](Self::combine_paint), emitting
    /// [CombineEvent]s to `sink`.
    pub async fn combine_paint_with_events(
        &self,
        request: &CombineRequest,
        sink: &mut dyn EventSink,
    ) -> Result<bool> {
        if request.weapon.is_empty() || request.output_texture_name.is_empty() {
            debug!(
                "Combine request for paint kit {} is incomplete.",
                request.paint_kit_id
            );
            return Ok(false);
        }
        debug!(
            "Combining paint kit {} for weapon '{}' (wear {}, seed {}).",
            request.paint_kit_id, request.weapon, request.wear, request.seed
        );

        self.engine.clear();
        self.engine.set_texture_size(request.texture_size);

        let kit_ref = DefRef::paint_kit(request.paint_kit_id);
        let Some(kit_definition) = self.store.definition(kit_ref).await? else {
            debug!("Paint kit definition {} not found.", request.paint_kit_id);
            return Ok(false);
        };
        let kit = kit_definition
            .as_paint_kit()
            .ok_or_else(|| Error::Schema(format!("definition {kit_ref} is not a paint kit")))?;

        let Some(located) = self.locate_item(kit, &request.weapon).await? else {
            debug!(
                "Paint kit {} has no item for weapon '{}'.",
                request.paint_kit_id, request.weapon
            );
            return Ok(false);
        };
        let item_definition = located.definition.as_item();
        let wear_entry = item_definition.and_then(|item| item.definition.get(request.wear));

        let template_ref = kit
            .operation_template
            .or_else(|| wear_entry.and_then(|entry| entry.operation_template));
        let Some(template_ref) = template_ref else {
            debug!(
                "Paint kit {} has no operation template at wear {}.",
                request.paint_kit_id, request.wear
            );
            return Ok(false);
        };
        let Some(template_definition) = self.store.definition(template_ref).await? else {
            debug!("Operation template {} not found.", template_ref);
            return Ok(false);
        };
        let template = template_definition.as_operation().ok_or_else(|| {
            Error::Schema(format!(
                "definition {template_ref} is not an operation template"
            ))
        })?;
        let root_node = match template.operation_node.as_slice() {
            [] => {
                debug!("Operation template {} is empty.", template_ref);
                return Ok(false);
            }
            [node] => node,
            nodes => {
                return Err(Error::Schema(format!(
                    "operation template {template_ref} has {} top-level nodes, expected one",
                    nodes.len()
                )))
            }
        };

        let variables = self.setup_variables(kit, &located, wear_entry);

        let expander = Expander {
            engine: self.engine.as_ref(),
            store: self.store.as_ref(),
            variables: &variables,
            team: request.team,
            texture_size: request.texture_size,
        };
        let Some(mut root) = expander.expand_root(root_node).await? else {
            warn!(
                "Paint kit {} expanded to no stage for weapon '{}'.",
                request.paint_kit_id, request.weapon
            );
            return Ok(false);
        };
        debug!("Expanded stage tree:\n{}", root);

        root.link_nodes(self.engine.as_ref());

        let (hi, lo) = split_seed(request.seed);
        let mut streams = [UniformRandomStream::new(hi), UniformRandomStream::new(lo)];
        let mut cursor = 0;
        root.compute_random_values(self.engine.as_ref(), &mut cursor, &mut streams)?;

        root.setup_textures(&self.engine, &self.textures).await?;

        self.engine.set_auto_redraw(root.node, true);
        if let Some(texture) = &request.output_texture {
            self.engine.bind_output(root.node, Arc::clone(texture));
        }
        self.engine.redraw(root.node).await?;

        info!(
            "Combined paint kit {} for '{}' as '{}'.",
            request.paint_kit_id, request.weapon, request.output_texture_name
        );
        sink.send(CombineEvent::PaintDone {
            paint_kit_id: request.paint_kit_id,
            wear: request.wear,
            weapon: request.weapon.clone(),
            output_texture_name: request.output_texture_name.clone(),
            output_texture: request.output_texture.clone(),
            seed: request.seed,
            node: root.node,
        });
        Ok(true)
    }

    /// Finds the kit slot whose item definition matches `weapon`.
    ///
    /// Named slots match on the item-definition index as written; the legacy
    /// `item` array matches after translating numeric indexes to weapon
    /// names.
    async fn locate_item(
        &self,
        kit: &PaintKitDefinition,
        weapon: &str,
    ) -> Result<Option<LocatedItem>> {
        for (_, slot) in kit.item_slots() {
            let Some(template) = slot.item_definition_template else {
                continue;
            };
            let Some(definition) = self.store.definition(template).await? else {
                continue;
            };
            let matched = definition
                .as_item()
                .and_then(|item| item.item_definition_index.as_deref())
                .is_some_and(|index| index == weapon);
            if matched {
                return Ok(Some(LocatedItem { slot, definition }));
            }
        }

        for slot in &kit.item {
            let Some(template) = slot.item_definition_template else {
                continue;
            };
            let Some(definition) = self.store.definition(template).await? else {
                continue;
            };
            let matched = definition
                .as_item()
                .and_then(|item| item.item_definition_index.as_deref())
                .is_some_and(|index| crate::schema::legacy::translate_item_index(index) == weapon);
            if matched {
                return Ok(Some(LocatedItem {
                    slot: slot.clone(),
                    definition,
                }));
            }
        }

        Ok(None)
    }

    /// Builds the variable table for a combine. Layers write in precedence
    /// order, item instance data first, so an earlier layer's value survives
    /// unless a later header variable is marked non-inheritable.
    fn setup_variables(
        &self,
        kit: &PaintKitDefinition,
        located: &LocatedItem,
        wear_entry: Option<&WearEntry>,
    ) -> VariableTable {
        let mut variables = VariableTable::new();
        if let Some(data) = &located.slot.data {
            variables.assign(&data.variable);
        }
        if let Some(entry) = wear_entry {
            variables.assign_defaults(&entry.variable);
        }
        if let Some(header) = located
            .definition
            .as_item()
            .and_then(|item| item.header.as_ref())
        {
            variables.declare_headers(&header.variables);
        }
        if let Some(header) = &kit.header {
            variables.declare_headers(&header.variables);
        }
        variables
    }
}
