//! Texture-lookup stages.
use crate::engine::{ImageGraph, NodeId};
use crate::rng::RandomSource;
use crate::stage::params::Range;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Randomizable parameters of a texture-lookup stage.
#[derive(Debug, Clone)]
pub struct TextureLookupParams {
    pub adjust_black: Range,
    pub adjust_offset: Range,
    pub adjust_gamma: Range,
    pub rotation: Range,
    pub translate_u: Range,
    pub translate_v: Range,
    pub scale_uv: Range,
    pub allow_flip_u: bool,
    pub allow_flip_v: bool,
    pub texture_path: String,
}

impl Default for TextureLookupParams {
    fn default() -> Self {
        Self {
            adjust_black: Range::default(),
            adjust_offset: Range::new(1.0, 1.0),
            adjust_gamma: Range::new(1.0, 1.0),
            rotation: Range::default(),
            translate_u: Range::default(),
            translate_v: Range::default(),
            scale_uv: Range::new(1.0, 1.0),
            allow_flip_u: false,
            allow_flip_v: false,
            texture_path: String::new(),
        }
    }
}

impl TextureLookupParams {
    /// Draws this stage's random values and writes them to its node.
    ///
    /// Axes that do not allow flipping draw nothing for the flip decision.
    pub(crate) fn randomize(
        &self,
        engine: &dyn ImageGraph,
        node: NodeId,
        rng: &mut dyn RandomSource,
    ) {
        let flip_u = self.allow_flip_u && rng.random_int(0, 1) != 0;
        let flip_v = self.allow_flip_v && rng.random_int(0, 1) != 0;
        let translate_u = rng.random_float(self.translate_u.low, self.translate_u.high);
        let translate_v = rng.random_float(self.translate_v.low, self.translate_v.high);
        let rotation = rng.random_float(self.rotation.low, self.rotation.high);
        let scale_uv = rng.random_float(self.scale_uv.low, self.scale_uv.high);

        let adjust_black = rng.random_float(self.adjust_black.low, self.adjust_black.high);
        let adjust_offset = rng.random_float(self.adjust_offset.low, self.adjust_offset.high);
        let adjust_gamma = rng.random_float(self.adjust_gamma.low, self.adjust_gamma.high);
        let adjust_white = adjust_black + adjust_offset;

        engine.set_param(node, "adjust black", adjust_black.into());
        engine.set_param(node, "adjust white", adjust_white.into());
        engine.set_param(node, "adjust gamma", adjust_gamma.into());
        engine.set_param(node, "rotation", (rotation * DEG_TO_RAD).into());
        engine.set_param(node, "translate u", translate_u.into());
        engine.set_param(node, "translate v", translate_v.into());
        let scale_u = scale_uv * if flip_u { -1.0 } else { 1.0 };
        let scale_v = scale_uv * if flip_v { -1.0 } else { 1.0 };
        engine.set_param(node, "scale u", scale_u.into());
        engine.set_param(node, "scale v", scale_v.into());
        engine.set_param(node, "path", self.texture_path.as_str().into());

        engine.invalidate(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{Call, RecordingGraph};
    use crate::engine::{node_kind, NodeOptions, ParamValue};
    use crate::rng::UniformRandomStream;

    fn seeded_params() -> TextureLookupParams {
        TextureLookupParams {
            rotation: Range::new(0.0, 360.0),
            translate_u: Range::new(0.0, 1.0),
            translate_v: Range::new(0.0, 1.0),
            scale_uv: Range::new(1.0, 3.0),
            allow_flip_u: true,
            texture_path: "paints/splatter".into(),
            ..TextureLookupParams::default()
        }
    }

    #[test]
    fn randomize_writes_the_seeded_draw_sequence() {
        let graph = RecordingGraph::default();
        let node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        let mut stream = UniformRandomStream::new(42);
        seeded_params().randomize(&graph, node, &mut stream);

        let expect = [
            ("adjust black", 0.0),
            ("adjust white", 1.0),
            ("adjust gamma", 1.0),
            ("rotation", 1.1829612551554085),
            ("translate u", 0.5390094013600654),
            ("translate v", 0.7370189999868251),
            ("scale u", -2.9870191514431585),
            ("scale v", 2.9870191514431585),
        ];
        for (name, value) in expect {
            assert_eq!(
                graph.param(node, name),
                Some(ParamValue::Float(value)),
                "param {name}"
            );
        }
        assert_eq!(
            graph.param(node, "path"),
            Some(ParamValue::Str("paints/splatter".into()))
        );
        assert!(graph
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Invalidate(id) if *id == node.0)));
    }

    #[test]
    fn disallowed_flips_draw_nothing() {
        let graph = RecordingGraph::default();
        let node = graph.add_node(node_kind::TEXTURE_LOOKUP, NodeOptions::default());
        let params = TextureLookupParams {
            allow_flip_u: false,
            ..seeded_params()
        };
        let mut stream = UniformRandomStream::new(42);
        params.randomize(&graph, node, &mut stream);

        // With no flip draw the first float lands on translate u.
        assert_eq!(
            graph.param(node, "translate u"),
            Some(ParamValue::Float(0.4719729877412193))
        );
        assert_eq!(graph.param(node, "scale u"), graph.param(node, "scale v"));
    }
}
