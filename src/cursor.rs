//! Iteration cursor and the snapshot/restore policy around mutations.
//!
//! The cursor is a position in insertion order; `len` means past-end.
//! Mutations may shift positions, so before mutating the map takes a
//! `Mark` (the id under the cursor) and afterwards re-seeks it by a
//! linear walk from the start. A marked entry that was removed leaves
//! the cursor past-end; no mark at all (empty map or past-end) rewinds.

use crate::entry_table::EntryTable;
use crate::key::KeyId;
use core::hash::BuildHasher;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Cursor {
    pos: usize,
}

/// Identity of the entry under the cursor at some point in time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Mark(Option<KeyId>);

impl Cursor {
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }

    pub(crate) fn is_valid(&self, len: usize) -> bool {
        self.pos < len
    }

    /// Step forward; saturates at past-end.
    pub(crate) fn advance(&mut self, len: usize) {
        if self.pos < len {
            self.pos += 1;
        }
    }

    /// Zero-based: `seek(0)` is the first entry, anything `>= len` is past-end.
    pub(crate) fn seek(&mut self, n: usize, len: usize) {
        self.pos = n.min(len);
    }

    pub(crate) fn mark<V, O: ?Sized, S: BuildHasher>(&self, table: &EntryTable<V, O, S>) -> Mark {
        Mark(table.id_at(self.pos))
    }

    pub(crate) fn restore<V, O: ?Sized, S: BuildHasher>(
        &mut self,
        mark: Mark,
        table: &EntryTable<V, O, S>,
    ) {
        self.rewind();
        let Mark(Some(target)) = mark else {
            return;
        };
        let ids = table.ids();
        while self.pos < ids.len() && ids[self.pos] != target {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Equality;
    use crate::key::{Key, KeyKind};
    use std::any::Any;

    fn table(n: i64) -> (EntryTable<i64>, Vec<KeyId>) {
        let mut t = EntryTable::new();
        let ids = (0..n)
            .map(|i| {
                let kind: KeyKind<dyn Any> = KeyKind::from_key(&Key::Int(i)).unwrap();
                t.upsert(kind, i, Equality::Strict).0
            })
            .collect();
        (t, ids)
    }

    #[test]
    fn advance_saturates_at_past_end() {
        let mut c = Cursor::default();
        c.advance(2);
        c.advance(2);
        assert!(!c.is_valid(2));
        c.advance(2);
        assert_eq!(c.position(), 2);
    }

    #[test]
    fn seek_bounds() {
        let mut c = Cursor::default();
        c.seek(0, 3);
        assert_eq!(c.position(), 0);
        c.seek(2, 3);
        assert!(c.is_valid(3));
        c.seek(3, 3);
        assert!(!c.is_valid(3));
        c.seek(99, 3);
        assert_eq!(c.position(), 3);
    }

    #[test]
    fn restore_follows_identity_across_shift() {
        let (mut t, ids) = table(4);
        let mut c = Cursor::default();
        c.seek(2, t.len());
        let mark = c.mark(&t);
        t.remove(ids[0]);
        c.restore(mark, &t);
        assert_eq!(c.position(), 1);
        assert_eq!(t.id_at(c.position()), Some(ids[2]));
    }

    #[test]
    fn restore_lands_past_end_when_marked_entry_removed() {
        let (mut t, ids) = table(3);
        let mut c = Cursor::default();
        c.seek(1, t.len());
        let mark = c.mark(&t);
        t.remove(ids[1]);
        c.restore(mark, &t);
        assert!(!c.is_valid(t.len()));
    }

    #[test]
    fn restore_without_mark_rewinds() {
        let (t, _) = table(3);
        let mut c = Cursor::default();
        c.seek(3, t.len());
        let mark = c.mark(&t);
        assert_eq!(mark, Mark(None));
        c.restore(mark, &t);
        assert_eq!(c.position(), 0);
    }
}
