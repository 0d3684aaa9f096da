//! Apply-sticker stages.
use glam::Vec2;

use crate::engine::{ImageGraph, NodeId};
use crate::error::{Error, Result};
use crate::rng::RandomSource;
use crate::stage::params::Range;

/// One sticker candidate with its selection weight.
#[derive(Debug, Clone)]
pub struct Sticker {
    pub file_name: String,
    pub weight: f64,
}

impl Sticker {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            weight: 1.0,
        }
    }
}

/// Randomizable parameters of an apply-sticker stage.
#[derive(Debug, Clone)]
pub struct ApplyStickerParams {
    pub stickers: Vec<Sticker>,
    pub adjust_black: Range,
    pub adjust_offset: Range,
    pub adjust_gamma: Range,
    pub bottom_left: Vec2,
    pub top_left: Vec2,
    pub top_right: Vec2,
}

impl Default for ApplyStickerParams {
    fn default() -> Self {
        Self {
            stickers: Vec::new(),
            adjust_black: Range::default(),
            adjust_offset: Range::new(1.0, 1.0),
            adjust_gamma: Range::new(1.0, 1.0),
            bottom_left: Vec2::ZERO,
            top_left: Vec2::ZERO,
            top_right: Vec2::ZERO,
        }
    }
}

/// Texture paths of the sticker picked during randomization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StickerChoice {
    pub(crate) texture_path: String,
    pub(crate) specular_texture_path: String,
}

impl ApplyStickerParams {
    /// Picks a sticker by weighted draw, then draws and writes the adjust
    /// values and destination corners.
    pub(crate) fn randomize(
        &self,
        engine: &dyn ImageGraph,
        node: NodeId,
        rng: &mut dyn RandomSource,
    ) -> Result<StickerChoice> {
        let total_weight: f64 = self.stickers.iter().map(|sticker| sticker.weight).sum();
        let mut weight = rng.random_float(0.0, total_weight);
        let mut choice = None;
        for sticker in &self.stickers {
            if weight < sticker.weight {
                choice = Some(StickerChoice {
                    texture_path: sticker.file_name.clone(),
                    specular_texture_path: specular_path(&sticker.file_name),
                });
                break;
            }
            weight -= sticker.weight;
        }
        let choice = choice
            .ok_or_else(|| Error::Schema("sticker weights selected no candidate".into()))?;

        let adjust_black = rng.random_float(self.adjust_black.low, self.adjust_black.high);
        let adjust_offset = rng.random_float(self.adjust_offset.low, self.adjust_offset.high);
        let adjust_gamma = rng.random_float(self.adjust_gamma.low, self.adjust_gamma.high);
        let adjust_white = adjust_black + adjust_offset;

        engine.set_param(node, "adjust black", adjust_black.into());
        engine.set_param(node, "adjust white", adjust_white.into());
        engine.set_param(node, "adjust gamma", adjust_gamma.into());
        engine.set_param(node, "bottom left", self.bottom_left.into());
        engine.set_param(node, "top left", self.top_left.into());
        engine.set_param(node, "top right", self.top_right.into());

        engine.invalidate(node);
        Ok(choice)
    }
}

/// Specular texture path for a sticker base texture.
fn specular_path(file_name: &str) -> String {
    let base = file_name.strip_suffix(".vtf").unwrap_or(file_name);
    format!("{base}_s")
}
