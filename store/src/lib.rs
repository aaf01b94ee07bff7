#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Generational slot table used by Flow Defence to hold walkers and bullets.
//!
//! [`EntityStore`] keeps live values packed in a dense array so hot loops can
//! walk them by index, while a sparse slot table maps typed identities onto
//! their current dense position. Every identity carries the generation of the
//! slot it was issued from; removing an entry bumps that generation so stale
//! identities are detected instead of silently aliasing a newer entity.

use std::{
    fmt,
    hash::Hash,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

/// Slot index and generation pair backing every typed key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawId {
    index: u32,
    generation: u32,
}

impl RawId {
    /// Creates a raw identifier from its slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Sparse slot the identifier was issued from.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the identifier was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Typed identity issued by an [`EntityStore`].
///
/// Implementations are normally generated through [`new_key_type!`].
pub trait Key: Copy + Eq + Ord + Hash + fmt::Debug {
    /// Wraps a raw identifier into the typed key.
    fn from_raw(raw: RawId) -> Self;

    /// Raw identifier wrapped by the typed key.
    fn raw(&self) -> RawId;
}

/// Declares one or more typed keys usable with [`EntityStore`].
///
/// ```
/// flow_defence_store::new_key_type! {
///     /// Identity of a crate in the warehouse.
///     pub struct CrateId;
/// }
///
/// let mut store = flow_defence_store::EntityStore::<CrateId, u32>::new();
/// let id = store.insert(7);
/// assert_eq!(store.get(id), Some(&7));
/// ```
#[macro_export]
macro_rules! new_key_type {
    ($($(#[$outer:meta])* $vis:vis struct $name:ident;)*) => {
        $(
            $(#[$outer])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            $vis struct $name($crate::RawId);

            impl $crate::Key for $name {
                fn from_raw(raw: $crate::RawId) -> Self {
                    Self(raw)
                }

                fn raw(&self) -> $crate::RawId {
                    self.0
                }
            }

            impl ::core::fmt::Display for $name {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    ::core::fmt::Display::fmt(&self.0, f)
                }
            }
        )*
    };
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    dense: Option<u32>,
}

/// Dense, generation-checked container of live values.
///
/// Insertion, removal and lookup are O(1). Removal swaps the last live value
/// into the vacated dense position, so the order of [`EntityStore::as_slice`]
/// changes whenever an entry is removed. Identities are never reissued: a slot
/// whose generation counter would wrap is retired instead of being recycled.
#[derive(Clone, Debug)]
pub struct EntityStore<K: Key, V> {
    objects: Vec<V>,
    dense_keys: Vec<K>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl<K: Key, V> Default for EntityStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V> EntityStore<K, V> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            objects: Vec::new(),
            dense_keys: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an empty store able to hold `capacity` live values without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            dense_keys: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Inserts a default-initialised value and returns its identity.
    ///
    /// The value is meant to be filled in place through [`EntityStore::get_mut`]
    /// or the `IndexMut` implementation right after the call.
    pub fn add(&mut self) -> K
    where
        V: Default,
    {
        self.insert(V::default())
    }

    /// Inserts `value` and returns the identity assigned to it.
    pub fn insert(&mut self, value: V) -> K {
        self.insert_with_key(|_| value)
    }

    /// Inserts the value produced by `build`, which receives the identity it will be stored under.
    pub fn insert_with_key<F>(&mut self, build: F) -> K
    where
        F: FnOnce(K) -> V,
    {
        let dense = dense_index(self.objects.len());
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = dense_index(self.slots.len());
                self.slots.push(Slot {
                    generation: 0,
                    dense: None,
                });
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.dense = Some(dense);
        let key = K::from_raw(RawId::new(index, slot.generation));

        self.objects.push(build(key));
        self.dense_keys.push(key);
        key
    }

    /// Reports whether `key` refers to a live entry.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.dense_of(key).is_some()
    }

    /// Live value associated with `key`, if any.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&V> {
        let dense = self.dense_of(key)?;
        self.objects.get(dense)
    }

    /// Mutable live value associated with `key`, if any.
    #[must_use]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let dense = self.dense_of(key)?;
        self.objects.get_mut(dense)
    }

    /// Removes the entry identified by `key`, returning its value.
    ///
    /// Returns `None` when `key` is stale or was never issued by this store.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let dense = self.dense_of(key)?;
        let value = self.objects.swap_remove(dense);
        let _ = self.dense_keys.swap_remove(dense);

        if let Some(moved) = self.dense_keys.get(dense) {
            let moved_index = moved.raw().index() as usize;
            self.slots[moved_index].dense = Some(dense_index(dense));
        }

        self.release_slot(key.raw().index());
        Some(value)
    }

    /// Removes every entry, invalidating all identities issued so far.
    pub fn clear(&mut self) {
        let keys = std::mem::take(&mut self.dense_keys);
        for key in keys {
            self.release_slot(key.raw().index());
        }
        self.objects.clear();
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Reports whether the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Live values in dense order.
    #[must_use]
    pub fn as_slice(&self) -> &[V] {
        &self.objects
    }

    /// Mutable live values in dense order.
    ///
    /// The slice cannot grow or shrink, so indices stay valid for the borrow.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.objects
    }

    /// Identities of the live values, parallel to [`EntityStore::as_slice`].
    #[must_use]
    pub fn ids(&self) -> &[K] {
        &self.dense_keys
    }

    /// Iterates over live entries together with their identities.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.dense_keys.iter().copied().zip(self.objects.iter())
    }

    /// Iterates mutably over live entries together with their identities.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> + '_ {
        self.dense_keys.iter().copied().zip(self.objects.iter_mut())
    }

    fn dense_of(&self, key: K) -> Option<usize> {
        let raw = key.raw();
        let slot = self.slots.get(raw.index() as usize)?;
        if slot.generation != raw.generation() {
            return None;
        }
        slot.dense.map(|dense| dense as usize)
    }

    fn release_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.dense = None;
        // Exhausted slots stay retired so their last identity is never reissued.
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(index);
        }
    }
}

impl<K: Key, V> Index<K> for EntityStore<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("entity {} is not live in the store", key.raw()),
        }
    }
}

impl<K: Key, V> IndexMut<K> for EntityStore<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        match self.get_mut(key) {
            Some(value) => value,
            None => panic!("entity {} is not live in the store", key.raw()),
        }
    }
}

fn dense_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("entity store exceeded {} entries", u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    new_key_type! {
        struct TestId;
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Payload {
        energy: f32,
    }

    #[test]
    fn add_returns_default_value_ready_for_in_place_assignment() {
        let mut store = EntityStore::<TestId, Payload>::new();
        let id = store.add();

        assert_eq!(store[id], Payload::default());
        store[id].energy = 10.0;
        assert_eq!(store.get(id).map(|payload| payload.energy), Some(10.0));
    }

    #[test]
    fn remove_swaps_last_entry_into_vacated_position() {
        let mut store = EntityStore::<TestId, u32>::new();
        let first = store.insert(1);
        let second = store.insert(2);
        let third = store.insert(3);

        assert_eq!(store.remove(first), Some(1));

        assert_eq!(store.as_slice(), &[3, 2]);
        assert_eq!(store.ids(), &[third, second]);
        assert_eq!(store[third], 3);
        assert_eq!(store[second], 2);
    }

    #[test]
    fn reused_slot_receives_new_generation() {
        let mut store = EntityStore::<TestId, u32>::new();
        let stale = store.insert(1);
        let _ = store.remove(stale);
        let fresh = store.insert(2);

        assert_eq!(stale.raw().index(), fresh.raw().index());
        assert_ne!(stale, fresh);
        assert!(!store.contains(stale));
        assert!(store.get(stale).is_none());
        assert_eq!(store.remove(stale), None);
        assert_eq!(store[fresh], 2);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut store = EntityStore::<TestId, u32>::new();
        let id = store.insert(1);
        store.slots[0].generation = u32::MAX;
        let last = TestId::from_raw(RawId::new(0, u32::MAX));
        assert!(store.contains(last));
        assert!(!store.contains(id));

        let _ = store.remove(last);
        let next = store.insert(2);

        assert_eq!(next.raw().index(), 1);
        assert!(!store.contains(last));
    }

    #[test]
    fn raw_ids_stay_unique_across_generation_exhaustion() {
        use rand::{seq::SliceRandom, Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;
        use std::collections::HashSet;

        let mut rng = ChaCha8Rng::seed_from_u64(0x5107);
        let mut store = EntityStore::<TestId, u32>::new();
        for value in 0..8 {
            let _ = store.insert(value);
        }
        // Push every slot to the edge of its generation counter.
        for slot in &mut store.slots {
            slot.generation = u32::MAX - 2;
        }
        for key in &mut store.dense_keys {
            *key = TestId::from_raw(RawId::new(key.raw().index(), u32::MAX - 2));
        }
        let mut live = store.ids().to_vec();
        let mut issued: HashSet<RawId> = live.iter().map(|id| id.raw()).collect();

        for round in 0..3_u32 {
            live.shuffle(&mut rng);
            for victim in live.drain(..) {
                assert!(store.remove(victim).is_some());
            }
            if round < 2 {
                for value in 0..8 {
                    let id = store.insert(value);
                    assert!(issued.insert(id.raw()), "{id} was issued twice");
                    live.push(id);
                }
            }
        }
        assert!(store.slots.iter().all(|slot| slot.generation == u32::MAX));
        assert!(store.free.is_empty());

        for round in 0..400_u32 {
            live.shuffle(&mut rng);
            let removals = rng.gen_range(0..=live.len());
            for victim in live.drain(..removals) {
                assert!(store.remove(victim).is_some());
                assert!(!store.contains(victim));
            }
            for value in 0..rng.gen_range(1..4) {
                let id = store.insert(round * 4 + value);
                assert!(id.raw().index() >= 8, "retired slot {id} was recycled");
                assert!(issued.insert(id.raw()), "{id} was issued twice");
                live.push(id);
            }
        }

        assert_eq!(store.len(), live.len());
        assert!(live.iter().all(|id| store.contains(*id)));
    }

    #[test]
    fn clear_invalidates_every_identity() {
        let mut store = EntityStore::<TestId, u32>::new();
        let ids: Vec<_> = (0..4).map(|value| store.insert(value)).collect();

        store.clear();

        assert!(store.is_empty());
        assert!(ids.iter().all(|id| !store.contains(*id)));
        let fresh = store.insert(9);
        assert!(!ids.contains(&fresh));
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn indexing_with_stale_identity_panics() {
        let mut store = EntityStore::<TestId, u32>::new();
        let id = store.insert(1);
        let _ = store.remove(id);
        let _ = store[id];
    }

    #[test]
    fn raw_ids_serialize_with_bincode() {
        let raw = RawId::new(3, 7);
        let bytes = bincode::serialize(&raw).expect("serialize raw id");
        let decoded: RawId = bincode::deserialize(&bytes).expect("deserialize raw id");

        assert_eq!(decoded, raw);
        assert_eq!(raw.to_string(), "3v7");
    }
}
