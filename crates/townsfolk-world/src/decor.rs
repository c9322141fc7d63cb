//! The decor registry: trees, fountains, walls and other scenery.
//!
//! Only elements flagged `blocking` matter to pathfinding; the rest are
//! purely cosmetic.

use std::collections::BTreeMap;

use townsfolk_types::{DecorElement, DecorId};

/// Id-keyed store of decor elements.
#[derive(Debug, Clone, Default)]
pub struct DecorRegistry {
    elements: BTreeMap<DecorId, DecorElement>,
}

impl DecorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `elements`.
    pub fn from_elements(elements: impl IntoIterator<Item = DecorElement>) -> Self {
        Self {
            elements: elements.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    /// Insert or replace an element.
    pub fn insert(&mut self, element: DecorElement) -> DecorId {
        let id = element.id;
        self.elements.insert(id, element);
        id
    }

    /// Remove an element.
    pub fn remove(&mut self, id: DecorId) -> Option<DecorElement> {
        self.elements.remove(&id)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements that agents must walk around.
    pub fn get_blocking_elements(&self) -> impl Iterator<Item = &DecorElement> {
        self.elements.values().filter(|e| e.blocking)
    }
}
