// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream decoder and test harness for vantage-scene-port.
//!
//! This crate provides:
//! - [`SceneDecoder`]: routes packets into a [`ShapeRegistry`] and a
//!   [`ResourceTable`] and emits scene events
//! - MockAdapter for headless testing of ScenePort implementations
//!
//! # Design
//!
//! Identity and bounds rules are enforced here, before anything reaches a
//! renderer. This keeps vantage-scene-port free of protocol logic.

mod decoder;
mod mock_adapter;
mod registry;
mod resources;

pub use decoder::{DecodeError, DecoderStats, SceneDecoder};
pub use mock_adapter::{MockAdapter, MockShape};
pub use registry::ShapeRegistry;
pub use resources::{RemoteMesh, ResourceTable};
