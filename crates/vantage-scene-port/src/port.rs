// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port trait defining the renderer contract.

use crate::{ApplyError, CategoryState, SceneEvent};

/// Scene rendering port trait.
///
/// Implementors receive events in stream order and draw on request.
///
/// # Design
///
/// This trait defines a hexagonal port for rendering. The decoder owns the
/// shape registry and resource table; adapters (headless mocks, GPU viewers)
/// mirror what they need from the events.
///
/// # Frame Semantics
///
/// Transient shapes arrive as [`SceneEvent::ShapeCreated`] with object id
/// zero and are implicitly gone after the next
/// [`SceneEvent::FrameEnded`] unless that event carries `persist`.
pub trait ScenePort {
    /// Apply one event.
    fn apply_event(&mut self, event: &SceneEvent<'_>) -> Result<(), ApplyError>;

    /// Draw the current scene, hiding shapes whose category is inactive.
    fn render(&mut self, categories: &CategoryState);

    /// Dispose all resources.
    fn dispose(&mut self);
}
