// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape registry enforcing the transient/persistent id rules.
//!
//! - Object id zero is transient: it lives until the next end of frame and
//!   can only receive data, never updates or destroys.
//! - Non-zero ids are persistent and unique per routing id. A second create
//!   is a [`ProtocolError::DuplicateShape`] unless it carries `REPLACE`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use vantage_proto::{PacketReader, ProtocolError, UpdateMessage};
use vantage_shapes::{DataStatus, Renderable, Shape};

/// Live shapes of one connection.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    persistent: HashMap<(u16, u32), Shape>,
    transients: Vec<Shape>,
}

impl ShapeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded shape.
    pub fn create(&mut self, shape: Shape) -> Result<&mut Shape, ProtocolError> {
        let (routing_id, object_id) = (shape.routing_id(), shape.object_id());
        if object_id == 0 {
            let at = self.transients.len();
            self.transients.push(shape);
            return Ok(&mut self.transients[at]);
        }
        let replace = shape.core().flags.replace();
        match self.persistent.entry((routing_id, object_id)) {
            Entry::Occupied(mut slot) if replace => {
                slot.insert(shape);
                Ok(slot.into_mut())
            }
            Entry::Occupied(_) => Err(ProtocolError::DuplicateShape {
                routing_id,
                object_id,
            }),
            Entry::Vacant(slot) => Ok(slot.insert(shape)),
        }
    }

    /// Apply an update to a persistent shape.
    pub fn update(&mut self, routing_id: u16, msg: &UpdateMessage) -> Result<&Shape, ProtocolError> {
        let shape = self.persistent_mut(routing_id, msg.object_id)?;
        shape.apply_update(msg);
        Ok(&*shape)
    }

    /// Remove a persistent shape.
    pub fn destroy(&mut self, routing_id: u16, object_id: u32) -> Result<Shape, ProtocolError> {
        if object_id == 0 {
            return Err(ProtocolError::InvalidObjectId {
                routing_id,
                object_id,
            });
        }
        self.persistent
            .remove(&(routing_id, object_id))
            .ok_or(ProtocolError::InvalidObjectId {
                routing_id,
                object_id,
            })
    }

    /// Feed a data message to its shape.
    ///
    /// Data for object id zero goes to the most recent transient on the same
    /// routing id.
    pub fn data(
        &mut self,
        routing_id: u16,
        object_id: u32,
        r: &mut PacketReader<'_>,
    ) -> Result<(&mut Shape, DataStatus), ProtocolError> {
        let shape = if object_id == 0 {
            self.transients
                .iter_mut()
                .rev()
                .find(|s| s.routing_id() == routing_id)
                .ok_or(ProtocolError::InvalidObjectId {
                    routing_id,
                    object_id,
                })?
        } else {
            self.persistent_mut(routing_id, object_id)?
        };
        let status = shape.read_data(r)?;
        Ok((shape, status))
    }

    fn persistent_mut(&mut self, routing_id: u16, object_id: u32) -> Result<&mut Shape, ProtocolError> {
        if object_id == 0 {
            return Err(ProtocolError::InvalidObjectId {
                routing_id,
                object_id,
            });
        }
        self.persistent
            .get_mut(&(routing_id, object_id))
            .ok_or(ProtocolError::InvalidObjectId {
                routing_id,
                object_id,
            })
    }

    /// Persistent shape by identity.
    pub fn get(&self, routing_id: u16, object_id: u32) -> Option<&Shape> {
        self.persistent.get(&(routing_id, object_id))
    }

    /// Close a frame. Transients are dropped unless `persist` is set.
    ///
    /// Returns the number of transients dropped.
    pub fn end_frame(&mut self, persist: bool) -> usize {
        if persist {
            return 0;
        }
        let dropped = self.transients.len();
        self.transients.clear();
        dropped
    }

    /// Every live shape, persistent first.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.persistent.values().chain(self.transients.iter())
    }

    /// Every live shape, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.persistent.values_mut().chain(self.transients.iter_mut())
    }

    /// Number of persistent shapes.
    pub fn persistent_len(&self) -> usize {
        self.persistent.len()
    }

    /// Number of transient shapes in the current frame.
    pub fn transient_len(&self) -> usize {
        self.transients.len()
    }

    /// Drop every shape.
    pub fn reset(&mut self) {
        self.persistent.clear();
        self.transients.clear();
    }
}
