// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port contract for Vantage renderers.
//!
//! This crate defines what a viewer sees of a decoded stream. It contains no
//! packet parsing; that lives in vantage-scene-codec.
//!
//! # Design Principles
//!
//! - **Renderers are dumb**: they receive events and draw. Identity rules,
//!   bounds checks and transient lifetimes are enforced before an event is
//!   emitted.
//! - **Category state is owned by the connection**: the decoder keeps one
//!   [`CategoryState`] and lends it to [`ScenePort::render`].

use thiserror::Error;

/// Error type for scene event application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The event referenced state the adapter does not hold.
    #[error("invariant violation: {0}")]
    Invariant(String),
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}

mod categories;
mod event;
mod port;

pub use categories::{CategoryInfo, CategoryState, CategoryTree, CATEGORY_COUNT};
pub use event::SceneEvent;
pub use port::ScenePort;
