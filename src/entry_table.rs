//! EntryTable: structural layer with stable key ids and insertion order.
//!
//! Entries live in a generational slot map addressed by `KeyId`; a hash
//! table indexes them by canonical key hash; a vector records order.
//! This layer knows nothing about capabilities or the cursor.

use crate::config::Equality;
use crate::key::{KeyId, KeyKind, KeyRef, Probe};
use core::hash::BuildHasher;
use hashbrown::HashTable;
use slotmap::SlotMap;
use std::any::Any;
use std::collections::hash_map::RandomState;

pub(crate) struct Entry<V, O: ?Sized> {
    pub(crate) key: KeyRef<O>,
    pub(crate) value: V,
    hash: u64,
}

impl<V: Clone, O: ?Sized> Clone for Entry<V, O> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            hash: self.hash,
        }
    }
}

pub struct EntryTable<V, O: ?Sized = dyn Any, S = RandomState> {
    hasher: S,
    index: HashTable<KeyId>,
    slots: SlotMap<KeyId, Entry<V, O>>,
    order: Vec<KeyId>,
}

impl<V, O: ?Sized> EntryTable<V, O> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<V, O: ?Sized> Default for EntryTable<V, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, O: ?Sized, S: Clone> Clone for EntryTable<V, O, S> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            index: self.index.clone(),
            slots: self.slots.clone(),
            order: self.order.clone(),
        }
    }
}

/// Iterator over entries in insertion order.
pub struct Iter<'a, V, O: ?Sized> {
    order: core::slice::Iter<'a, KeyId>,
    slots: &'a SlotMap<KeyId, Entry<V, O>>,
}

impl<'a, V, O: ?Sized> Iterator for Iter<'a, V, O> {
    type Item = (&'a KeyRef<O>, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let id = *self.order.next()?;
        self.slots.get(id).map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<V, O: ?Sized, S> EntryTable<V, O, S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn find(&self, probe: Probe<'_>, eq: Equality) -> Option<KeyId> {
        let hash = probe.hash_with(&self.hasher);
        self.index
            .find(hash, |&id| {
                self.slots
                    .get(id)
                    .map(|e| e.key.kind().probe().matches(&probe, eq))
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Overwrite the value of an entry whose key matches under `eq`, or
    /// append a new entry. Returns the entry id and the replaced value.
    pub(crate) fn upsert(&mut self, kind: KeyKind<O>, value: V, eq: Equality) -> (KeyId, Option<V>) {
        let hash = kind.probe().hash_with(&self.hasher);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&id| {
                slots
                    .get(id)
                    .map(|e| e.key.kind().probe().matches(&kind.probe(), eq))
                    .unwrap_or(false)
            },
            |&id| slots.get(id).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let id = *o.get();
                let old = slots
                    .get_mut(id)
                    .map(|e| core::mem::replace(&mut e.value, value));
                (id, old)
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let id = slots.insert_with_key(|id| Entry {
                    key: KeyRef::new(id, kind),
                    value,
                    hash,
                });
                v.insert(id);
                self.order.push(id);
                (id, None)
            }
        }
    }

    pub(crate) fn remove(&mut self, id: KeyId) -> Option<(KeyRef<O>, V)> {
        let entry = self.slots.remove(id)?;
        if let Ok(occupied) = self.index.find_entry(entry.hash, |&k| k == id) {
            occupied.remove();
        }
        if let Some(pos) = self.order.iter().position(|&k| k == id) {
            self.order.remove(pos);
        }
        Some((entry.key, entry.value))
    }

    pub(crate) fn get(&self, id: KeyId) -> Option<(&KeyRef<O>, &V)> {
        self.slots.get(id).map(|e| (&e.key, &e.value))
    }

    pub(crate) fn value_mut(&mut self, id: KeyId) -> Option<&mut V> {
        self.slots.get_mut(id).map(|e| &mut e.value)
    }

    pub(crate) fn contains_id(&self, id: KeyId) -> bool {
        self.slots.contains_key(id)
    }

    pub(crate) fn id_at(&self, pos: usize) -> Option<KeyId> {
        self.order.get(pos).copied()
    }

    pub(crate) fn first_id(&self) -> Option<KeyId> {
        self.order.first().copied()
    }

    pub(crate) fn last_id(&self) -> Option<KeyId> {
        self.order.last().copied()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.order.clear();
    }

    /// Remove every entry, returning them in order.
    pub(crate) fn drain(&mut self) -> Vec<(KeyRef<O>, V)> {
        let order = core::mem::take(&mut self.order);
        let mut out = Vec::with_capacity(order.len());
        for id in order {
            if let Some(e) = self.slots.remove(id) {
                out.push((e.key, e.value));
            }
        }
        self.index.clear();
        self.slots.clear();
        out
    }

    pub fn iter(&self) -> Iter<'_, V, O> {
        Iter {
            order: self.order.iter(),
            slots: &self.slots,
        }
    }

    pub(crate) fn ids(&self) -> &[KeyId] {
        &self.order
    }
}

/// Caller-key entry points used by the internal benchmarks.
#[cfg(feature = "bench_internal")]
impl<V, O: ?Sized, S: BuildHasher> EntryTable<V, O, S> {
    /// Insert or overwrite under `key` with strict equality. `None` for `Key::Id`.
    pub fn put(&mut self, key: &crate::key::Key<O>, value: V) -> Option<KeyId> {
        let kind = KeyKind::from_key(key)?;
        Some(self.upsert(kind, value, Equality::Strict).0)
    }

    pub fn lookup(&self, key: &crate::key::Key<O>) -> Option<KeyId> {
        self.find(key.probe()?, Equality::Strict)
    }

    pub fn take(&mut self, id: KeyId) -> Option<V> {
        self.remove(id).map(|(_, v)| v)
    }
}
