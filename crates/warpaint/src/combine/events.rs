//! Event types and sinks for observing combines.
//!
//! This module defines [`CombineEvent`] and a set of sinks to collect or
//! forward events while running
//! [`TextureCombiner`](crate::combine::TextureCombiner) directly or through
//! a [`RequestQueue`](crate::combine::queue::RequestQueue).
use crate::engine::NodeId;
use crate::texture::TextureRef;

/// Describes events emitted by combine operations.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum CombineEvent {
    /// Emitted when the queue starts working on an item.
    Started {
        /// The queue item id.
        item_id: String,
    },

    /// Emitted when a combine finished rendering.
    PaintDone {
        /// The requested paint kit.
        paint_kit_id: u32,
        /// The requested wear level.
        wear: usize,
        /// The weapon the kit was combined for.
        weapon: String,
        /// Name the output is published under.
        output_texture_name: String,
        /// The texture the root node's output was bound to, if any.
        output_texture: Option<TextureRef>,
        /// The 64-bit combine seed.
        seed: u64,
        /// The root engine node of the rendered graph.
        node: NodeId,
    },

    /// Emitted when a queue item could not be combined.
    Failed {
        /// The queue item id.
        item_id: String,
    },
}

/// A generic event sink that accepts [`CombineEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: CombineEvent);

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = CombineEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: CombineEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(CombineEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(CombineEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(CombineEvent),
{
    #[inline]
    fn send(&mut self, event: CombineEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<CombineEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<CombineEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[CombineEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: CombineEvent) {
        self.events.push(event);
    }
}
