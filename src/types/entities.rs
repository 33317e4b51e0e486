//! The entity store: attributes and direct parent edges per entity.

use std::collections::{HashMap, HashSet, VecDeque};

use super::entity_uid::EntityUID;
use super::value::Record;

/// One stored entity: its attribute record and its direct parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub uid: EntityUID,
    pub attrs: Record,
    pub parents: HashSet<EntityUID>,
}

impl Entity {
    pub fn new(uid: EntityUID) -> Self {
        Entity {
            uid,
            attrs: Record::new(),
            parents: HashSet::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<super::value::Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent: EntityUID) -> Self {
        self.parents.insert(parent);
        self
    }
}

/// The store maps UIDs to entities and holds direct hierarchy edges only;
/// the transitive closure is walked on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities(HashMap<EntityUID, Entity>);

impl Entities {
    pub fn new() -> Self {
        Entities::default()
    }

    pub fn add(&mut self, entity: Entity) {
        self.0.insert(entity.uid.clone(), entity);
    }

    pub fn get(&self, uid: &EntityUID) -> Option<&Entity> {
        self.0.get(uid)
    }

    pub fn contains(&self, uid: &EntityUID) -> bool {
        self.0.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The reflexive-transitive ancestor set of `start`.
    ///
    /// Breadth-first over parent edges with a visited set, so cyclic stores
    /// terminate and a UID missing from the store simply contributes no
    /// parents.
    pub fn ancestors_of(&self, start: &EntityUID) -> HashSet<EntityUID> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(uid) = queue.pop_front() {
            if !seen.insert(uid.clone()) {
                continue;
            }
            if let Some(entity) = self.0.get(&uid) {
                for parent in &entity.parents {
                    if !seen.contains(parent) {
                        queue.push_back(parent.clone());
                    }
                }
            }
        }
        seen
    }
}

impl FromIterator<Entity> for Entities {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut entities = Entities::new();
        for entity in iter {
            entities.add(entity);
        }
        entities
    }
}
