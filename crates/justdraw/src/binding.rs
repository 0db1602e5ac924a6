//! Binding-state cache.
//!
//! WebGL has one current program, one current buffer and one current
//! texture per context. Each [`BindSlot`] remembers the last thing bound
//! through the wrapper so a repeated bind of the same resource can skip
//! the native call. Only the most recent value is remembered.

use crate::webgl::{BufferId, ProgramId, TextureId};

/// The most recently bound resource of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSlot<K> {
    current: Option<K>,
}

impl<K> Default for BindSlot<K> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<K: Copy + PartialEq> BindSlot<K> {
    pub const fn new() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<K> {
        self.current
    }

    pub fn is_bound(&self, key: K) -> bool {
        self.current == Some(key)
    }

    /// Record `key` as bound. Returns `true` when the native bind has to be
    /// issued: the slot held something else, or `force` is set.
    pub fn acquire(&mut self, key: K, force: bool) -> bool {
        if !force && self.current == Some(key) {
            return false;
        }
        self.current = Some(key);
        true
    }

    /// Clear the slot if it holds `key`, or unconditionally with `force`.
    /// Returns `true` when the native unbind has to be issued.
    pub fn release(&mut self, key: K, force: bool) -> bool {
        if force || self.current == Some(key) {
            self.current = None;
            return true;
        }
        false
    }

    /// Forget the bound value; the next bind always reaches the context.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// Binding slots of one WebGL context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingCache {
    pub program: BindSlot<ProgramId>,
    /// Shared by the array and element-array targets.
    pub buffer: BindSlot<BufferId>,
    /// Keyed by texture and texture unit.
    pub texture: BindSlot<(TextureId, u32)>,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.program.reset();
        self.buffer.reset();
        self.texture.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_acquire_skips_repeat() {
        let mut slot = BindSlot::new();
        assert!(slot.acquire(1u32, false));
        assert!(!slot.acquire(1, false));
        assert!(slot.acquire(1, true));
        assert!(slot.acquire(2, false));
        assert_eq!(slot.current(), Some(2));
    }

    #[test]
    fn test_only_last_value_is_remembered() {
        let mut slot = BindSlot::new();
        assert!(slot.acquire('a', false));
        assert!(slot.acquire('b', false));
        assert!(slot.acquire('a', false));
    }

    #[test]
    fn test_release() {
        let mut slot = BindSlot::new();
        slot.acquire(3u8, false);
        assert!(!slot.release(4, false));
        assert!(slot.is_bound(3));
        assert!(slot.release(3, false));
        assert_eq!(slot.current(), None);
        assert!(slot.release(3, true));
    }

    #[test]
    fn test_cache_reset() {
        let mut cache = BindingCache::new();
        cache.program.acquire(ProgramId(0), false);
        cache.texture.acquire((TextureId(1), 2), false);
        cache.reset();
        assert_eq!(cache, BindingCache::default());
    }

    proptest! {
        #[test]
        fn test_one_native_bind_per_run(keys in prop::collection::vec(0u8..4, 0..64)) {
            let mut slot = BindSlot::new();
            let issued = keys.iter().filter(|&&k| slot.acquire(k, false)).count();
            let runs = keys.iter().enumerate().filter(|(i, k)| *i == 0 || keys[i - 1] != **k).count();
            prop_assert_eq!(issued, runs);
        }
    }
}
