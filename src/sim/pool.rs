//! Object pools for entity sprites
//!
//! Sprites are the visual handles of on-screen entities. Instead of creating
//! and dropping one per spawn, each category keeps a free list of released
//! sprites that are reset and handed out again.

use serde::{Deserialize, Serialize};

use crate::consts::{POOL_SOFT_CAP, POOL_TRIM_TARGET};

/// Pool category. Sprites never move between categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    Obstacle,
    Bubble,
    Crab,
    Pearl,
    PowerUp,
    LifePowerUp,
}

impl PoolKind {
    pub const ALL: [PoolKind; 6] = [
        PoolKind::Obstacle,
        PoolKind::Bubble,
        PoolKind::Crab,
        PoolKind::Pearl,
        PoolKind::PowerUp,
        PoolKind::LifePowerUp,
    ];

    fn index(self) -> usize {
        match self {
            PoolKind::Obstacle => 0,
            PoolKind::Bubble => 1,
            PoolKind::Crab => 2,
            PoolKind::Pearl => 3,
            PoolKind::PowerUp => 4,
            PoolKind::LifePowerUp => 5,
        }
    }

    /// Number of sprites created up front for this category
    pub fn prefill(&self) -> usize {
        match self {
            PoolKind::Obstacle => 15,
            PoolKind::Bubble => 30,
            PoolKind::Crab => 5,
            PoolKind::Pearl => 0,
            PoolKind::PowerUp => 5,
            PoolKind::LifePowerUp => 5,
        }
    }

    /// CSS class the sprite carries when rendered
    pub fn class_name(&self) -> &'static str {
        match self {
            PoolKind::Obstacle => "obstacle",
            PoolKind::Bubble => "bubble",
            PoolKind::Crab => "crab",
            PoolKind::Pearl => "pearl",
            PoolKind::PowerUp => "power-up",
            PoolKind::LifePowerUp => "life-powerup",
        }
    }
}

pub type SpriteId = u32;

/// Looping rotation applied to spinning obstacles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub period_secs: f32,
    pub reverse: bool,
}

/// Visual handle of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: SpriteId,
    pub kind: PoolKind,
    /// Shown on screen
    pub visible: bool,
    /// Attached to the render tree
    pub attached: bool,
    /// Asset key of the image shown (None for plain shapes)
    pub variant: Option<&'static str>,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub spin: Option<Spin>,
}

impl Sprite {
    fn new(id: SpriteId, kind: PoolKind) -> Self {
        Self {
            id,
            kind,
            visible: false,
            attached: false,
            variant: None,
            width: 0.0,
            height: 0.0,
            opacity: 1.0,
            spin: None,
        }
    }

    /// Clear every visual change made while the sprite was in use
    fn reset(&mut self) {
        self.visible = false;
        self.attached = false;
        self.variant = None;
        self.width = 0.0;
        self.height = 0.0;
        self.opacity = 1.0;
        self.spin = None;
    }
}

/// Per-category free lists of reusable sprites
#[derive(Debug, Clone)]
pub struct ObjectPool {
    free: [Vec<Sprite>; 6],
    next_id: SpriteId,
}

impl Default for ObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectPool {
    /// Create empty pools
    pub fn new() -> Self {
        Self {
            free: Default::default(),
            next_id: 1,
        }
    }

    /// Create pools filled to their initial counts
    pub fn prefilled() -> Self {
        let mut pool = Self::new();
        pool.reset();
        pool
    }

    fn create(&mut self, kind: PoolKind) -> Sprite {
        let id = self.next_id;
        self.next_id += 1;
        Sprite::new(id, kind)
    }

    /// Take a hidden, reset sprite of the given category
    pub fn acquire(&mut self, kind: PoolKind) -> Sprite {
        match self.free[kind.index()].pop() {
            Some(sprite) => sprite,
            None => self.create(kind),
        }
    }

    /// Return a sprite after use
    ///
    /// The sprite is reset and detached. It is kept only if its category
    /// matches, it is not already free, and the free list is under the soft cap.
    pub fn release(&mut self, mut sprite: Sprite, kind: PoolKind) {
        sprite.reset();

        if sprite.kind != kind {
            log::warn!(
                "Sprite {} released to {:?} pool but belongs to {:?}; discarding",
                sprite.id,
                kind,
                sprite.kind
            );
            return;
        }

        let free = &mut self.free[kind.index()];
        if free.iter().any(|s| s.id == sprite.id) {
            log::warn!("Sprite {} released twice; ignoring", sprite.id);
            return;
        }
        if free.len() < POOL_SOFT_CAP {
            free.push(sprite);
        }
    }

    /// Truncate every free list to the trim target. Returns sprites discarded.
    pub fn trim(&mut self) -> usize {
        let mut discarded = 0;
        for free in &mut self.free {
            if free.len() > POOL_TRIM_TARGET {
                discarded += free.len() - POOL_TRIM_TARGET;
                free.truncate(POOL_TRIM_TARGET);
            }
        }
        if discarded > 0 {
            log::info!("Trimmed {} pooled sprites", discarded);
        }
        discarded
    }

    /// Restore every category to exactly its prefill count
    pub fn reset(&mut self) {
        for kind in PoolKind::ALL {
            let target = kind.prefill();
            self.free[kind.index()].truncate(target);
            while self.free[kind.index()].len() < target {
                let sprite = self.create(kind);
                self.free[kind.index()].push(sprite);
            }
        }
    }

    /// Free sprites available in a category
    pub fn available(&self, kind: PoolKind) -> usize {
        self.free[kind.index()].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_acquire_reuses_released_sprite() {
        let mut pool = ObjectPool::new();
        let mut sprite = pool.acquire(PoolKind::Bubble);
        let id = sprite.id;
        sprite.visible = true;
        sprite.opacity = 0.5;
        pool.release(sprite, PoolKind::Bubble);

        let again = pool.acquire(PoolKind::Bubble);
        assert_eq!(again.id, id);
        assert!(!again.visible);
        assert!(!again.attached);
        assert_eq!(again.opacity, 1.0);
    }

    #[test]
    fn test_acquire_creates_when_empty() {
        let mut pool = ObjectPool::new();
        let a = pool.acquire(PoolKind::Crab);
        let b = pool.acquire(PoolKind::Crab);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, PoolKind::Crab);
    }

    #[test]
    fn test_double_release_does_not_duplicate() {
        let mut pool = ObjectPool::new();
        let sprite = pool.acquire(PoolKind::Obstacle);
        pool.release(sprite.clone(), PoolKind::Obstacle);
        pool.release(sprite, PoolKind::Obstacle);
        assert_eq!(pool.available(PoolKind::Obstacle), 1);
    }

    #[test]
    fn test_release_to_wrong_category_is_discarded() {
        let mut pool = ObjectPool::new();
        let sprite = pool.acquire(PoolKind::Pearl);
        pool.release(sprite, PoolKind::Bubble);
        assert_eq!(pool.available(PoolKind::Bubble), 0);
        assert_eq!(pool.available(PoolKind::Pearl), 0);
    }

    #[test]
    fn test_soft_cap() {
        let mut pool = ObjectPool::new();
        let sprites: Vec<_> = (0..40).map(|_| pool.acquire(PoolKind::Bubble)).collect();
        for sprite in sprites {
            pool.release(sprite, PoolKind::Bubble);
        }
        assert_eq!(pool.available(PoolKind::Bubble), POOL_SOFT_CAP);
    }

    #[test]
    fn test_reset_restores_prefill() {
        let mut pool = ObjectPool::prefilled();
        for _ in 0..10 {
            let _ = pool.acquire(PoolKind::Obstacle);
        }
        pool.reset();
        for kind in PoolKind::ALL {
            assert_eq!(pool.available(kind), kind.prefill());
        }
    }

    proptest! {
        #[test]
        fn prop_trim_bounds_free_lists(counts in proptest::collection::vec(0usize..45, 6)) {
            let mut pool = ObjectPool::new();
            for (kind, &count) in PoolKind::ALL.iter().zip(&counts) {
                let sprites: Vec<_> = (0..count).map(|_| pool.acquire(*kind)).collect();
                for sprite in sprites {
                    pool.release(sprite, *kind);
                }
            }
            pool.trim();
            for kind in PoolKind::ALL {
                prop_assert!(pool.available(kind) <= POOL_TRIM_TARGET);
            }
        }
    }
}
