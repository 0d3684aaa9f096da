//! Paint-kit definition schema: typed definitions keyed by `(type, defindex)`
//! and the stores that serve them.
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

pub mod defs;
pub mod legacy;
pub mod store;

pub use defs::{
    ApplyStickerNode, Assignment, CombineNode, Header, HeaderDefinition, HeaderVariable, ItemData,
    ItemDefinition, ItemSlot, OperationNode, OperationTemplate, PaintKitDefinition, SelectNode,
    StageNode, StickerSpec, TextureLookupNode, VarField, VariableDefinition, WearEntry,
};

/// Definition kind. The numeric codes are fixed by the data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum DefType {
    Variable,
    Operation,
    Item,
    PaintKit,
    Header,
}

impl DefType {
    pub fn code(self) -> u8 {
        match self {
            DefType::Variable => 6,
            DefType::Operation => 7,
            DefType::Item => 8,
            DefType::PaintKit => 9,
            DefType::Header => 10,
        }
    }
}

impl TryFrom<u8> for DefType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            6 => Ok(DefType::Variable),
            7 => Ok(DefType::Operation),
            8 => Ok(DefType::Item),
            9 => Ok(DefType::PaintKit),
            10 => Ok(DefType::Header),
            other => Err(Error::Schema(format!("unknown definition type {other}"))),
        }
    }
}

impl fmt::Display for DefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reference to a definition by kind and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefRef {
    #[serde(rename = "type")]
    pub def_type: DefType,
    #[serde(deserialize_with = "lenient_u32")]
    pub defindex: u32,
}

impl DefRef {
    pub const fn operation(defindex: u32) -> Self {
        Self {
            def_type: DefType::Operation,
            defindex,
        }
    }

    pub const fn item(defindex: u32) -> Self {
        Self {
            def_type: DefType::Item,
            defindex,
        }
    }

    pub const fn paint_kit(defindex: u32) -> Self {
        Self {
            def_type: DefType::PaintKit,
            defindex,
        }
    }
}

impl fmt::Display for DefRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.def_type, self.defindex)
    }
}

/// A parsed definition of any kind.
#[derive(Debug, Clone)]
pub enum Definition {
    Variable(VariableDefinition),
    Operation(OperationTemplate),
    Item(ItemDefinition),
    PaintKit(PaintKitDefinition),
    Header(HeaderDefinition),
}

impl Definition {
    /// Parses a raw JSON value as a definition of the given kind.
    pub fn from_value(def_type: DefType, value: serde_json::Value) -> Result<Self> {
        Ok(match def_type {
            DefType::Variable => Definition::Variable(serde_json::from_value(value)?),
            DefType::Operation => Definition::Operation(serde_json::from_value(value)?),
            DefType::Item => Definition::Item(serde_json::from_value(value)?),
            DefType::PaintKit => Definition::PaintKit(serde_json::from_value(value)?),
            DefType::Header => Definition::Header(serde_json::from_value(value)?),
        })
    }

    pub fn def_type(&self) -> DefType {
        match self {
            Definition::Variable(_) => DefType::Variable,
            Definition::Operation(_) => DefType::Operation,
            Definition::Item(_) => DefType::Item,
            Definition::PaintKit(_) => DefType::PaintKit,
            Definition::Header(_) => DefType::Header,
        }
    }

    pub fn as_operation(&self) -> Option<&OperationTemplate> {
        match self {
            Definition::Operation(template) => Some(template),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&ItemDefinition> {
        match self {
            Definition::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_paint_kit(&self) -> Option<&PaintKitDefinition> {
        match self {
            Definition::PaintKit(kit) => Some(kit),
            _ => None,
        }
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
