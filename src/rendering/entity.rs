//! # Entities and Draw Batches
//!
//! An [`Entity`] is one positioned instance of an uploaded model. Terrain creates
//! exactly one entity per chunk, placed at the chunk origin.
//!
//! [`EntityBatches`] groups entities by model so the renderer can issue one batched
//! draw per model. Batches are rebuilt for every query and hold no state between
//! frames.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};

use super::upload::ModelHandle;

/// A renderable instance bound to an uploaded model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    /// The model this entity draws
    pub model: ModelHandle,
    /// World position (the chunk origin for terrain entities)
    pub position: Point3<f32>,
    /// Euler rotation in degrees
    pub rotation: Vector3<f32>,
    /// Uniform scale
    pub scale: f32,
}

impl Entity {
    /// Creates an unrotated, unit-scale entity at `position`.
    pub fn new(model: ModelHandle, position: Point3<f32>) -> Self {
        Entity {
            model,
            position,
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }

    /// Whether both horizontal axis distances to `center` are at most `half_extent`.
    ///
    /// The boundary is inclusive. The vertical axis is ignored.
    pub fn within(&self, center: Point3<f32>, half_extent: f32) -> bool {
        (center.x - self.position.x).abs() <= half_extent
            && (center.z - self.position.z).abs() <= half_extent
    }
}

/// Entities grouped by the model they share.
#[derive(Debug, Default, Clone)]
pub struct EntityBatches {
    batches: HashMap<ModelHandle, Vec<Entity>>,
}

impl EntityBatches {
    /// Creates an empty set of batches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` to its model's batch.
    ///
    /// Returns `false` without adding anything if an identical entity is already
    /// in the batch.
    pub fn insert(&mut self, entity: Entity) -> bool {
        let batch = self.batches.entry(entity.model).or_default();
        if batch.contains(&entity) {
            return false;
        }
        batch.push(entity);
        true
    }

    /// Entities drawn with `model`.
    pub fn batch(&self, model: &ModelHandle) -> Option<&[Entity]> {
        self.batches.get(model).map(Vec::as_slice)
    }

    /// Number of distinct models.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether there are no batches.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total number of entities across all batches.
    pub fn entity_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    /// Iterates over `(model, entities)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModelHandle, &Vec<Entity>)> {
        self.batches.iter()
    }

    /// Consumes the batches, returning the underlying map.
    pub fn into_map(self) -> HashMap<ModelHandle, Vec<Entity>> {
        self.batches
    }
}

impl FromIterator<Entity> for EntityBatches {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut batches = EntityBatches::new();
        for entity in iter {
            batches.insert(entity);
        }
        batches
    }
}
