//! Typed paint-kit definitions.
//!
//! Definition data comes out of a protobuf-derived JSON dump that exists in
//! two naming vintages, camelCase and snake_case. Both are accepted here via
//! serde aliases so nothing downstream ever branches on spelling. Scalar
//! values are similarly lenient: numbers and booleans found where strings are
//! expected are stringified at ingestion.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::schema::DefRef;

/// A literal-or-variable schema field.
///
/// Most stage parameters are written either as a literal `string` or as a
/// `variable` reference resolved against the per-combine variable table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VarField {
    pub variable: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub string: Option<String>,
}

impl VarField {
    /// A field carrying a literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            variable: None,
            string: Some(value.into()),
        }
    }

    /// A field referencing a variable, with no literal fallback.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            variable: Some(name.into()),
            string: None,
        }
    }
}

/// Texture-lookup stage payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextureLookupNode {
    pub texture: Option<VarField>,
    #[serde(alias = "texture_red")]
    pub texture_red: Option<VarField>,
    #[serde(alias = "texture_blue")]
    pub texture_blue: Option<VarField>,
    #[serde(alias = "adjust_black")]
    pub adjust_black: Option<VarField>,
    #[serde(alias = "adjust_offset")]
    pub adjust_offset: Option<VarField>,
    #[serde(alias = "adjust_gamma")]
    pub adjust_gamma: Option<VarField>,
    pub rotation: Option<VarField>,
    #[serde(alias = "translate_u")]
    pub translate_u: Option<VarField>,
    #[serde(alias = "translate_v")]
    pub translate_v: Option<VarField>,
    #[serde(alias = "scale_uv")]
    pub scale_uv: Option<VarField>,
    #[serde(alias = "flip_u")]
    pub flip_u: Option<VarField>,
    #[serde(alias = "flip_v")]
    pub flip_v: Option<VarField>,
    #[serde(alias = "operation_node")]
    pub operation_node: Vec<OperationNode>,
}

/// Combine stage payload, shared by add, lerp, and multiply. Carries only
/// children; combine stages take no configuration from the schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombineNode {
    #[serde(alias = "operation_node")]
    pub operation_node: Vec<OperationNode>,
}

/// Select stage payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectNode {
    /// Group texture consulted by the select node.
    pub groups: Option<VarField>,
    /// Threshold levels, written into the engine's int-array node.
    pub select: Vec<VarField>,
    #[serde(alias = "operation_node")]
    pub operation_node: Vec<OperationNode>,
}

/// One sticker candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickerSpec {
    /// Texture path of the sticker.
    pub base: Option<VarField>,
    /// Selection weight; absent means 1.
    pub weight: Option<VarField>,
}

/// Apply-sticker stage payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplyStickerNode {
    pub sticker: Option<Vec<StickerSpec>>,
    #[serde(alias = "dest_bl")]
    pub dest_bl: Option<VarField>,
    #[serde(alias = "dest_tl")]
    pub dest_tl: Option<VarField>,
    #[serde(alias = "dest_tr")]
    pub dest_tr: Option<VarField>,
    #[serde(alias = "adjust_black")]
    pub adjust_black: Option<VarField>,
    #[serde(alias = "adjust_offset")]
    pub adjust_offset: Option<VarField>,
    #[serde(alias = "adjust_gamma")]
    pub adjust_gamma: Option<VarField>,
    #[serde(alias = "operation_node")]
    pub operation_node: Vec<OperationNode>,
}

/// A stage object carries exactly one payload key; which one decides the
/// stage kind. Extra payloads are ignored in the same precedence order the
/// reference data was authored against.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageNode {
    #[serde(alias = "texture_lookup")]
    pub texture_lookup: Option<TextureLookupNode>,
    #[serde(alias = "combine_add")]
    pub combine_add: Option<CombineNode>,
    #[serde(alias = "combine_lerp")]
    pub combine_lerp: Option<CombineNode>,
    #[serde(alias = "combine_multiply")]
    pub combine_multiply: Option<CombineNode>,
    pub select: Option<SelectNode>,
    #[serde(alias = "apply_sticker")]
    pub apply_sticker: Option<ApplyStickerNode>,
}

/// A node of an operation tree: an inline stage or a template reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationNode {
    pub stage: Option<StageNode>,
    #[serde(alias = "operation_template")]
    pub operation_template: Option<DefRef>,
}

/// Operation template (definition type 7).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationTemplate {
    #[serde(alias = "operation_node")]
    pub operation_node: Vec<OperationNode>,
}

/// A `{variable, string}` assignment entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Assignment {
    pub variable: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub string: Option<String>,
}

/// A named header variable with inheritance control.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeaderVariable {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "lenient_opt_bool")]
    pub inherit: Option<bool>,
}

/// Shared definition header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Header {
    pub name: Option<String>,
    pub defindex: Option<u32>,
    pub variables: Vec<HeaderVariable>,
}

/// Per-wear entry of an item definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WearEntry {
    #[serde(alias = "operation_template")]
    pub operation_template: Option<DefRef>,
    pub variable: Vec<Assignment>,
}

/// Item definition (definition type 8).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemDefinition {
    #[serde(
        alias = "item_definition_index",
        deserialize_with = "lenient_opt_string"
    )]
    pub item_definition_index: Option<String>,
    pub definition: Vec<WearEntry>,
    pub header: Option<Header>,
}

/// Inline data on a paint-kit item slot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemData {
    pub variable: Vec<Assignment>,
}

/// A weapon slot of a paint kit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemSlot {
    #[serde(alias = "item_definition_template")]
    pub item_definition_template: Option<DefRef>,
    pub data: Option<ItemData>,
}

/// Paint-kit definition (definition type 9).
///
/// Modern kits carry one slot per weapon under the weapon's name; those land
/// in `fields` together with any other unmodeled keys and are picked apart by
/// [item_slots](PaintKitDefinition::item_slots). Legacy kits list their items
/// in the `item` array instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaintKitDefinition {
    #[serde(alias = "operation_template")]
    pub operation_template: Option<DefRef>,
    pub header: Option<Header>,
    pub item: Vec<ItemSlot>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl PaintKitDefinition {
    /// Named weapon slots, recognized by their item-definition template.
    pub fn item_slots(&self) -> impl Iterator<Item = (&str, ItemSlot)> + '_ {
        self.fields.iter().filter_map(|(name, value)| {
            let slot: ItemSlot = serde_json::from_value(value.clone()).ok()?;
            slot.item_definition_template?;
            Some((name.as_str(), slot))
        })
    }

    /// Every slot name with its item-definition template index, legacy `item`
    /// entries included (keyed `item0`, `item1`, ...).
    pub fn item_templates(&self) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        for (i, slot) in self.item.iter().enumerate() {
            if let Some(template) = slot.item_definition_template {
                out.push((format!("item{i}"), template.defindex));
            }
        }
        for (name, slot) in self.item_slots() {
            if let Some(template) = slot.item_definition_template {
                out.push((name.to_owned(), template.defindex));
            }
        }
        out
    }
}

/// Header-only definition (definition type 10).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderDefinition {
    pub header: Option<Header>,
}

/// Variable definition (definition type 6). Present in the blob but not
/// consumed during combination; kept opaque.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VariableDefinition(pub serde_json::Value);

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
        Raw::Bool(b) => b.to_string(),
    }))
}

// Loose-equality coercion: 0 and "0" count as false, like the data's origin.
fn lenient_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
        Str(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        Raw::Bool(b) => b,
        Raw::Int(n) => n != 0,
        Raw::Float(x) => x != 0.0,
        Raw::Str(s) => !(s.is_empty() || s == "0"),
    }))
}
