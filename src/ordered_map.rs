//! OrderedMap: the engine. Capability checks, key resolution, the cursor
//! and copy-on-transform operations on top of `EntryTable`.

use crate::config::{Capabilities, Equality, MapConfig};
use crate::cursor::Cursor;
use crate::entry_table::{EntryTable, Iter};
use crate::error::{Error, Result};
use crate::key::{canonical_int, Key, KeyId, KeyKind, KeyRef};
use crate::value::{collect_leaves, values_equal, LooseEq, Nested, StringForm};
use core::convert::Infallible;
use core::fmt;
use std::any::Any;
use tracing::{debug, trace};

/// Ordered map with scalar or weakly held object keys and an internal
/// cursor that follows its entry across mutations.
///
/// ```
/// use weak_ordered_map::{Capabilities, OrderedMap};
///
/// let mut m: OrderedMap<&str> = OrderedMap::with_capabilities(Capabilities::MAP);
/// m.set("a", "foo").unwrap();
/// m.set("b", "bar").unwrap();
/// assert_eq!(m.join(None), "foo, bar");
/// assert_eq!(m.pop().unwrap(), "bar");
/// ```
pub struct OrderedMap<V, O: ?Sized = dyn Any> {
    table: EntryTable<V, O>,
    cursor: Cursor,
    config: MapConfig,
}

/// Where a `set` lands.
enum Target<O: ?Sized> {
    /// Next positional key.
    Append,
    Existing(KeyId),
    New(KeyKind<O>),
}

impl<V, O: ?Sized> OrderedMap<V, O> {
    /// Plain indexed list with default configuration.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self {
            table: EntryTable::new(),
            cursor: Cursor::default(),
            config,
        }
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self::with_config(MapConfig::new(capabilities))
    }

    /// Empty map with this map's configuration.
    pub fn empty_like(&self) -> Self {
        Self::with_config(self.config.clone())
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    pub fn separator(&self) -> &str {
        &self.config.separator
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.config.separator = separator.into();
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Remove every entry and rewind the cursor.
    pub fn clear(&mut self) {
        self.table.clear();
        self.cursor.rewind();
    }

    /// Stored keys and values in order, stale entries included.
    pub fn iter(&self) -> Iter<'_, V, O> {
        self.table.iter()
    }

    // ----- key resolution -----

    fn locate(&self, key: &Key<O>, eq: Equality) -> Option<KeyId> {
        match key {
            Key::Id(id) => self.table.contains_id(*id).then_some(*id),
            other => other.probe().and_then(|p| self.table.find(p, eq)),
        }
    }

    fn resolve(&self, key: &Key<O>) -> Result<Target<O>> {
        match key {
            Key::Id(id) => match self.table.get(*id) {
                None => Err(Error::UnknownKey(*id)),
                Some((stored, _)) if !stored.is_live() => Err(Error::StaleKey(*id)),
                Some(_) => Ok(Target::Existing(*id)),
            },
            _ => Ok(match self.locate(key, self.config.key_equality) {
                Some(id) => Target::Existing(id),
                None => KeyKind::from_key(key).map_or(Target::Append, Target::New),
            }),
        }
    }

    /// Turn a `Key::Id` back into the caller's key; other keys pass through.
    fn pin(&self, key: Key<O>) -> Result<Key<O>> {
        match key {
            Key::Id(id) => self
                .table
                .get(id)
                .ok_or(Error::UnknownKey(id))?
                .0
                .denormalize(),
            other => Ok(other),
        }
    }

    /// Reverse lookup by identity number. The returned key may be stale;
    /// `KeyRef::denormalize` reports that.
    pub fn resolve_by_id(&self, id: KeyId) -> Option<&KeyRef<O>> {
        self.table.get(id).map(|(k, _)| k)
    }

    /// Largest integer key plus one, never below zero.
    fn next_index(&self) -> i64 {
        self.table
            .iter()
            .filter_map(|(k, _)| match k.kind() {
                KeyKind::Int(n) => Some(*n),
                KeyKind::Str(s) => canonical_int(s),
                KeyKind::Object { .. } => None,
            })
            .max()
            .map_or(0, |n| n.saturating_add(1).max(0))
    }

    // ----- cursor policy -----

    /// Run a structural mutation, then put the cursor back on the entry it
    /// denoted before. A removed entry leaves the cursor past-end.
    fn preserving_cursor<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mark = self.cursor.mark(&self.table);
        let out = f(self);
        self.cursor.restore(mark, &self.table);
        out
    }

    fn store(&mut self, target: Target<O>, value: V) -> KeyId {
        match target {
            Target::Existing(id) => {
                if let Some(slot) = self.table.value_mut(id) {
                    *slot = value;
                }
                id
            }
            Target::Append => {
                let kind = KeyKind::Int(self.table.len() as i64);
                self.insert_new(kind, value)
            }
            Target::New(kind) => self.insert_new(kind, value),
        }
    }

    fn insert_new(&mut self, kind: KeyKind<O>, value: V) -> KeyId {
        let eq = self.config.key_equality;
        self.preserving_cursor(|m| m.table.upsert(kind, value, eq).0)
    }

    // ----- lookup -----

    /// Value stored under `key`. `Ok(None)` when absent; `StaleKey` when the
    /// key names an entry whose object has been dropped.
    pub fn get(&self, key: impl Into<Key<O>>) -> Result<Option<&V>> {
        let key = key.into();
        let Some(id) = self.locate(&key, self.config.key_equality) else {
            return Ok(None);
        };
        match self.table.get(id) {
            Some((stored, _)) if !stored.is_live() => Err(Error::StaleKey(id)),
            entry => Ok(entry.map(|(_, v)| v)),
        }
    }

    /// Whether a live entry is stored under `key`, compared with `eq`.
    pub fn has(&self, key: impl Into<Key<O>>, eq: Equality) -> bool {
        self.locate(&key.into(), eq)
            .and_then(|id| self.table.get(id))
            .map_or(false, |(stored, _)| stored.is_live())
    }

    pub fn first(&self) -> Result<&V> {
        self.table
            .first_id()
            .and_then(|id| self.table.get(id))
            .map(|(_, v)| v)
            .ok_or(Error::Empty)
    }

    pub fn last(&self) -> Result<&V> {
        self.table
            .last_id()
            .and_then(|id| self.table.get(id))
            .map(|(_, v)| v)
            .ok_or(Error::Empty)
    }

    // ----- materialization -----

    /// Entries whose key can still be handed out; stale ones are skipped.
    fn live_entries(&self) -> impl Iterator<Item = (Key<O>, &V)> + '_ {
        self.table
            .iter()
            .filter_map(|(stored, v)| match stored.denormalize() {
                Ok(key) => Some((key, v)),
                Err(_) => {
                    trace!(id = %stored.id(), "skipping entry with stale key");
                    None
                }
            })
    }

    /// Caller-visible keys with borrowed values, in order.
    pub fn entries(&self) -> Vec<(Key<O>, &V)> {
        self.live_entries().collect()
    }

    /// Owned projection of the map as key/value pairs, in order.
    pub fn to_array(&self) -> Vec<(Key<O>, V)>
    where
        V: Clone,
    {
        self.live_entries().map(|(k, v)| (k, v.clone())).collect()
    }

    /// Keys in order. With `denormalize` object keys come back as the
    /// objects themselves and a dropped object fails the call; without it
    /// they come back as `Key::Id`.
    pub fn keys(&self, denormalize: bool) -> Result<Vec<Key<O>>> {
        self.table
            .iter()
            .map(|(k, _)| if denormalize { k.denormalize() } else { Ok(k.raw()) })
            .collect()
    }

    pub fn values(&self) -> Vec<&V> {
        self.table.iter().map(|(_, v)| v).collect()
    }

    // ----- cursor protocol -----

    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    /// Step the cursor; past the last entry it stays past-end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        self.cursor.advance(self.table.len());
    }

    pub fn valid(&self) -> bool {
        self.cursor.is_valid(self.table.len())
    }

    pub fn current(&self) -> Option<&V> {
        self.entry_under_cursor().map(|(_, v)| v)
    }

    /// Key under the cursor; `StaleKey` if its object has been dropped.
    pub fn key(&self) -> Result<Option<Key<O>>> {
        self.entry_under_cursor()
            .map(|(k, _)| k.denormalize())
            .transpose()
    }

    /// Zero-based: `seek(0)` is the first entry, `seek(len())` past-end.
    pub fn seek(&mut self, n: usize) {
        self.cursor.seek(n, self.table.len());
    }

    /// Current cursor position; equals `len()` when past-end.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    fn entry_under_cursor(&self) -> Option<(&KeyRef<O>, &V)> {
        self.table
            .id_at(self.cursor.position())
            .and_then(|id| self.table.get(id))
    }

    // ----- display -----

    /// Values' string forms joined by `separator`, or the map's own.
    pub fn join(&self, separator: Option<&str>) -> String
    where
        V: StringForm,
    {
        let sep = separator.unwrap_or(&self.config.separator);
        let mut out = String::new();
        for (i, (_, v)) in self.table.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            out.push_str(&v.string_form());
        }
        out
    }
}

impl<V: LooseEq, O: ?Sized> OrderedMap<V, O> {
    fn rejects_duplicate(&self, value: &V) -> bool {
        let dup =
            self.config.capabilities.unique && self.contains(value, self.config.value_equality);
        if dup {
            trace!("value already present in unique map; insert skipped");
        }
        dup
    }

    /// Store `value` under `key`.
    ///
    /// Returns `Ok(false)` when a unique map already holds the value.
    /// Non-associative maps ignore `key` and append. An existing key is
    /// overwritten in place; anything else is appended.
    pub fn set(&mut self, key: impl Into<Key<O>>, value: V) -> Result<bool> {
        if self.rejects_duplicate(&value) {
            return Ok(false);
        }
        let target = if self.config.capabilities.associative {
            self.resolve(&key.into())?
        } else {
            Target::Append
        };
        self.store(target, value);
        Ok(true)
    }

    /// Append under the next integer key. Returns `false` when a unique map
    /// already holds the value.
    pub fn push(&mut self, value: V) -> bool {
        if self.rejects_duplicate(&value) {
            return false;
        }
        let target = if self.config.capabilities.associative {
            Target::New(KeyKind::Int(self.next_index()))
        } else {
            Target::Append
        };
        self.store(target, value);
        true
    }

    pub fn contains(&self, value: &V, eq: Equality) -> bool {
        self.table.iter().any(|(_, v)| values_equal(v, value, eq))
    }

    /// Key of the first entry holding `value`. Fails with `StaleKey` if that
    /// entry's object key has been dropped.
    pub fn index_of(&self, value: &V, eq: Equality) -> Result<Option<Key<O>>> {
        self.table
            .iter()
            .find(|(_, v)| values_equal(*v, value, eq))
            .map(|(k, _)| k.denormalize())
            .transpose()
    }

    /// Remove the entry stored under `key`. Non-associative maps are
    /// renumbered afterwards.
    pub fn remove(&mut self, key: impl Into<Key<O>>) -> Option<V> {
        let id = self.locate(&key.into(), self.config.key_equality)?;
        self.remove_id(id)
    }

    fn remove_id(&mut self, id: KeyId) -> Option<V> {
        let gap = self.table.last_id() != Some(id);
        let (_, value) = self.preserving_cursor(|m| m.table.remove(id))?;
        if gap && !self.config.capabilities.associative {
            self.renumber();
        }
        Some(value)
    }

    /// Rebuild positional keys `0..n` by re-inserting every value through
    /// the append path. The cursor keeps its position, which after a
    /// renumber still denotes the same logical entry.
    fn renumber(&mut self) {
        let pos = self.cursor.position();
        let drained = self.table.drain();
        debug!(entries = drained.len(), "renumbering positional keys");
        for (_, value) in drained {
            self.push(value);
        }
        self.cursor.seek(pos, self.table.len());
    }

    pub fn pop(&mut self) -> Result<V> {
        let id = self.table.last_id().ok_or(Error::Empty)?;
        self.remove_id(id).ok_or(Error::Empty)
    }

    pub fn shift(&mut self) -> Result<V> {
        let id = self.table.first_id().ok_or(Error::Empty)?;
        self.remove_id(id).ok_or(Error::Empty)
    }

    /// Drop entries whose object key has been reclaimed. Returns how many.
    pub fn purge_stale(&mut self) -> usize {
        let stale: Vec<KeyId> = self
            .table
            .iter()
            .filter(|(k, _)| !k.is_live())
            .map(|(k, _)| k.id())
            .collect();
        for &id in &stale {
            self.remove_id(id);
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "purged stale entries");
        }
        stale.len()
    }

    /// Replace the contents with `items`. `Key::Id` keys are resolved
    /// against the current contents first; if any fails the map is left
    /// unchanged.
    pub fn reset<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (Key<O>, V)>,
    {
        let items = if self.config.capabilities.associative {
            items
                .into_iter()
                .map(|(k, v)| -> Result<(Key<O>, V)> { Ok((self.pin(k)?, v)) })
                .collect::<Result<Vec<_>>>()?
        } else {
            items.into_iter().collect()
        };
        self.clear();
        for (k, v) in items {
            self.set(k, v)?;
        }
        Ok(())
    }

    fn absorb(&mut self, key: Key<O>, value: V) {
        if let Err(err) = self.set(key, value) {
            debug!(%err, "entry dropped while building derived map");
        }
    }

    /// New map holding the entries whose value satisfies `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&V) -> bool) -> Self
    where
        V: Clone,
    {
        let mut out = self.empty_like();
        for (k, v) in self.live_entries() {
            if pred(v) {
                out.absorb(k, v.clone());
            }
        }
        out
    }

    /// New map with every value replaced by `f(value, key)`, keys kept.
    pub fn map(&self, mut f: impl FnMut(&V, &Key<O>) -> V) -> Self {
        match self.try_map(|v, k| Ok::<V, Infallible>(f(v, k))) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    /// Like `map`, stopping at the first error. The receiver is untouched
    /// either way.
    pub fn try_map<E>(
        &self,
        mut f: impl FnMut(&V, &Key<O>) -> core::result::Result<V, E>,
    ) -> core::result::Result<Self, E> {
        let mut out = self.empty_like();
        for (k, v) in self.live_entries() {
            let mapped = f(v, &k)?;
            out.absorb(k, mapped);
        }
        Ok(out)
    }

    /// Call `f` on every entry and return an untouched copy.
    pub fn for_each(&self, mut f: impl FnMut(&V, &Key<O>)) -> Self
    where
        V: Clone,
    {
        for (k, v) in self.live_entries() {
            f(v, &k);
        }
        self.clone()
    }

    /// New map of the leaves of every value, depth first, each under its
    /// innermost key.
    pub fn flatten(&self) -> Self
    where
        V: Nested + Clone,
    {
        let mut leaves = Vec::new();
        for (k, v) in self.live_entries() {
            collect_leaves(k, v.clone(), &mut leaves);
        }
        let mut out = self.empty_like();
        for (k, v) in leaves {
            out.absorb(k, v);
        }
        out
    }
}

impl<V, O: ?Sized> Default for OrderedMap<V, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, O: ?Sized> Clone for OrderedMap<V, O> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            cursor: self.cursor,
            config: self.config.clone(),
        }
    }
}

impl<V: fmt::Debug, O: ?Sized> fmt::Debug for OrderedMap<V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(k, v)| (k.raw(), v)))
            .finish()
    }
}

impl<V: StringForm, O: ?Sized> fmt::Display for OrderedMap<V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(None))
    }
}

impl<'a, V, O: ?Sized> IntoIterator for &'a OrderedMap<V, O> {
    type Item = (&'a KeyRef<O>, &'a V);
    type IntoIter = Iter<'a, V, O>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: LooseEq, O: ?Sized> Extend<V> for OrderedMap<V, O> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<V: LooseEq, O: ?Sized> FromIterator<V> for OrderedMap<V, O> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}
