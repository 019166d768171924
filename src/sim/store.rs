//! Entity stores: one per category, mapping a sprite to its simulation record

use super::pool::{Sprite, SpriteId};

/// One live entity
#[derive(Debug, Clone)]
pub struct Entry<R> {
    pub sprite: Sprite,
    pub data: R,
}

/// What an updater wants done with the entity it just visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Keep,
    Despawn,
}

/// Insertion-ordered collection of live entities of one category
#[derive(Debug, Clone)]
pub struct EntityStore<R> {
    entries: Vec<Entry<R>>,
}

impl<R> Default for EntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> EntityStore<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Attach the sprite and start tracking it
    pub fn insert(&mut self, mut sprite: Sprite, data: R) -> SpriteId {
        sprite.visible = true;
        sprite.attached = true;
        let id = sprite.id;
        self.entries.push(Entry { sprite, data });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<R>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry<R>> {
        self.entries.iter_mut()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Entry<R>> {
        self.entries.iter().find(|e| e.sprite.id == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Entry<R>> {
        self.entries.iter_mut().find(|e| e.sprite.id == id)
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<Entry<R>> {
        let idx = self.entries.iter().position(|e| e.sprite.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Remove everything, handing back the entries for recycling
    pub fn clear(&mut self) -> Vec<Entry<R>> {
        std::mem::take(&mut self.entries)
    }

    /// Visit every entity once; entities marked `Despawn` are removed and returned
    ///
    /// Entities whose sprite has been detached from the render tree are
    /// removed without being visited.
    pub fn sweep<F>(&mut self, mut visit: F) -> Vec<Entry<R>>
    where
        F: FnMut(&mut Entry<R>) -> Step,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            if !entry.sprite.attached {
                log::warn!("Dropping detached {:?} sprite {}", entry.sprite.kind, entry.sprite.id);
                removed.push(entry);
                continue;
            }
            match visit(&mut entry) {
                Step::Keep => kept.push(entry),
                Step::Despawn => removed.push(entry),
            }
        }
        self.entries = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pool::{ObjectPool, PoolKind};

    fn store_with(values: &[i32]) -> (ObjectPool, EntityStore<i32>) {
        let mut pool = ObjectPool::new();
        let mut store = EntityStore::new();
        for &v in values {
            let sprite = pool.acquire(PoolKind::Bubble);
            store.insert(sprite, v);
        }
        (pool, store)
    }

    #[test]
    fn test_insert_attaches_sprite() {
        let (_, store) = store_with(&[1]);
        let entry = store.iter().next().unwrap();
        assert!(entry.sprite.visible);
        assert!(entry.sprite.attached);
    }

    #[test]
    fn test_sweep_removes_marked_entries() {
        let (_, mut store) = store_with(&[1, 2, 3, 4]);
        let removed = store.sweep(|e| {
            e.data *= 10;
            if e.data % 20 == 0 { Step::Despawn } else { Step::Keep }
        });
        let kept: Vec<i32> = store.iter().map(|e| e.data).collect();
        assert_eq!(kept, vec![10, 30]);
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn test_sweep_drops_detached_sprites() {
        let (_, mut store) = store_with(&[1, 2]);
        store.iter_mut().next().unwrap().sprite.attached = false;
        let mut visited = 0;
        let removed = store.sweep(|_| {
            visited += 1;
            Step::Keep
        });
        assert_eq!(visited, 1);
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let (_, mut store) = store_with(&[5, 6, 7]);
        let id = store.iter().nth(1).unwrap().sprite.id;
        assert_eq!(store.remove(id).map(|e| e.data), Some(6));
        assert!(store.remove(id).is_none());
        assert_eq!(store.clear().len(), 2);
        assert!(store.is_empty());
    }
}
