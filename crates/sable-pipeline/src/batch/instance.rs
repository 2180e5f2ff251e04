// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Round-robin instance batching of rigid meshes.
//!
//! A fixed table of slots accumulates world matrices per (model, mesh) pair. A slot
//! is handed back to the caller for submission when it fills up, when another mesh
//! claims it, or when the caller drains the table.

use ahash::AHashMap;
use sable_core::math::Mat4;
use sable_core::scene::{Mesh, Model, ModelId};
use std::sync::Arc;

/// Identity of a batchable mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    /// Model resource.
    pub model: ModelId,
    /// Mesh index in the model.
    pub mesh_index: usize,
}

/// Accumulated instances of one mesh, ready to submit.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    /// Model owning the mesh.
    pub model: Arc<Model>,
    /// Mesh index in the model.
    pub mesh_index: usize,
    /// One world matrix per instance.
    pub matrices: Vec<Mat4>,
}

impl InstanceBatch {
    /// The batched mesh.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.model.meshes.get(self.mesh_index)
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Whether the batch holds no instance.
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Batches forced out by one [`InstanceBatcher::add_instance`] call, in the order
/// they must be submitted.
#[derive(Debug, Default)]
pub struct Flushed {
    /// Previous owner of the slot the new mesh took.
    pub stolen: Option<InstanceBatch>,
    /// The mesh's own batch, when it reached capacity.
    pub full: Option<InstanceBatch>,
}

impl Flushed {
    /// Iterates over the forced batches in submission order.
    pub fn into_batches(self) -> impl Iterator<Item = InstanceBatch> {
        self.stolen.into_iter().chain(self.full)
    }
}

/// The slot table.
#[derive(Debug)]
pub struct InstanceBatcher {
    slots: Vec<Option<InstanceBatch>>,
    owners: AHashMap<BatchKey, usize>,
    current: usize,
    capacity: usize,
    spare: Vec<Vec<Mat4>>,
}

impl InstanceBatcher {
    /// Creates a table of `slot_count` slots holding up to `capacity` instances each.
    pub fn new(slot_count: usize, capacity: usize) -> Self {
        let slot_count = slot_count.max(1);
        Self {
            slots: (0..slot_count).map(|_| None).collect(),
            owners: AHashMap::with_capacity(slot_count),
            current: slot_count - 1,
            capacity: capacity.max(1),
            spare: Vec::new(),
        }
    }

    /// Instances per slot.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot currently owned by `key`.
    pub fn slot_of(&self, key: BatchKey) -> Option<usize> {
        self.owners.get(&key).copied()
    }

    /// Instances staged and not yet flushed.
    pub fn pending_instances(&self) -> usize {
        self.slots.iter().flatten().map(InstanceBatch::len).sum()
    }

    /// Adds one instance of `model.meshes[mesh_index]`.
    pub fn add_instance(&mut self, model: &Arc<Model>, mesh_index: usize, matrix: Mat4) -> Flushed {
        let key = BatchKey {
            model: model.id,
            mesh_index,
        };
        let mut flushed = Flushed::default();

        let slot = match self.owners.get(&key) {
            Some(slot) => *slot,
            None => {
                self.current = (self.current + 1) % self.slots.len();
                let slot = self.current;
                flushed.stolen = self.release(slot);
                let matrices = self.spare.pop().unwrap_or_default();
                self.slots[slot] = Some(InstanceBatch {
                    model: Arc::clone(model),
                    mesh_index,
                    matrices,
                });
                self.owners.insert(key, slot);
                slot
            }
        };

        let full = match self.slots[slot].as_mut() {
            Some(batch) => {
                batch.matrices.push(matrix);
                batch.matrices.len() >= self.capacity
            }
            None => false,
        };
        if full {
            flushed.full = self.release(slot);
        }
        flushed
    }

    /// Empties every occupied slot, in slot order.
    pub fn flush_all(&mut self) -> Vec<InstanceBatch> {
        let mut batches = Vec::new();
        for slot in 0..self.slots.len() {
            if let Some(batch) = self.release(slot) {
                batches.push(batch);
            }
        }
        batches
    }

    /// Returns a submitted batch's matrix storage for reuse.
    pub fn recycle(&mut self, mut batch: InstanceBatch) {
        batch.matrices.clear();
        self.spare.push(batch.matrices);
    }

    /// Drops every staged instance without submitting it.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.owners.clear();
        self.current = self.slots.len() - 1;
    }

    fn release(&mut self, slot: usize) -> Option<InstanceBatch> {
        let batch = self.slots.get_mut(slot)?.take()?;
        self.owners.remove(&BatchKey {
            model: batch.model.id,
            mesh_index: batch.mesh_index,
        });
        if batch.is_empty() {
            self.spare.push(batch.matrices);
            return None;
        }
        Some(batch)
    }
}
