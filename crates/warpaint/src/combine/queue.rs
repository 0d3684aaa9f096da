//! Serialized combine queue.
//!
//! Combines share one engine graph, so they must run one at a time. The
//! queue keeps items in arrival order and [drain](RequestQueue::drain)
//! works through them sequentially; refreshing an item can clear what is
//! still pending first, the interactive pattern where only the newest
//! request matters.
use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::combine::events::{CombineEvent, EventSink};
use crate::combine::{CombineRequest, Team, TextureCombiner};
use crate::schema::legacy::{strip_variant_suffix, translate_item_index};
use crate::texture::TextureRef;

/// One queued combine.
///
/// The item id doubles as the weapon id; ids may carry a `~<n>` variant
/// marker or be a legacy numeric index, both are translated when the item is
/// drained. Items without a paint kit have nothing to render and are skipped.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: String,
    pub paint_kit_id: Option<u32>,
    pub wear: usize,
    pub seed: u64,
    pub team: Team,
    /// Name the output is published under; defaults to the item id.
    pub output_texture_name: String,
    pub output_texture: Option<TextureRef>,
}

impl QueueItem {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            output_texture_name: id.clone(),
            id,
            paint_kit_id: None,
            wear: 0,
            seed: 0,
            team: Team::default(),
            output_texture: None,
        }
    }

    pub fn with_paint_kit(mut self, paint_kit_id: u32) -> Self {
        self.paint_kit_id = Some(paint_kit_id);
        self
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

    pub fn with_output_texture_name(mut self, name: impl Into<String>) -> Self {
        self.output_texture_name = name.into();
        self
    }

    pub fn with_output_texture(mut self, texture: TextureRef) -> Self {
        self.output_texture = Some(texture);
        self
    }

    fn into_request(self, paint_kit_id: u32) -> CombineRequest {
        let weapon = translate_item_index(&strip_variant_suffix(&self.id)).to_owned();
        let mut request = CombineRequest::new(paint_kit_id, weapon, self.output_texture_name)
            .with_wear(self.wear)
            .with_seed(self.seed)
            .with_team(self.team);
        if let Some(texture) = self.output_texture {
            request = request.with_output_texture(texture);
        }
        request
    }
}

/// FIFO of pending combines.
#[derive(Debug, Default)]
pub struct RequestQueue {
    items: VecDeque<QueueItem>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    /// Enqueues `item`, dropping everything still pending when
    /// `clear_pending` is set.
    pub fn refresh(&mut self, item: QueueItem, clear_pending: bool) {
        if clear_pending {
            self.items.clear();
        }
        self.items.push_back(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Combines every pending item in order and returns how many rendered.
    ///
    /// Each item gets a [Started](CombineEvent::Started) event; a successful
    /// combine emits its [PaintDone](CombineEvent::PaintDone), anything else
    /// emits [Failed](CombineEvent::Failed). Errors are reported per item and
    /// never stop the drain.
    pub async fn drain(&mut self, combiner: &TextureCombiner, sink: &mut dyn EventSink) -> usize {
        let mut combined = 0;
        while let Some(item) = self.items.pop_front() {
            let Some(paint_kit_id) = item.paint_kit_id else {
                debug!("Skipping queue item '{}' without a paint kit.", item.id);
                continue;
            };
            let item_id = item.id.clone();
            sink.send(CombineEvent::Started {
                item_id: item_id.clone(),
            });
            let request = item.into_request(paint_kit_id);
            match combiner.combine_paint_with_events(&request, sink).await {
                Ok(true) => combined += 1,
                Ok(false) => sink.send(CombineEvent::Failed { item_id }),
                Err(e) => {
                    warn!("Combine for '{}' failed: {}.", item_id, e);
                    sink.send(CombineEvent::Failed { item_id });
                }
            }
        }
        combined
    }
}
