#![cfg(test)]

// State-machine property tests for OrderedMap, kept inside the crate so the
// cursor position can be compared without extra public surface.

use crate::config::{Capabilities, MapConfig};
use crate::error::Error;
use crate::key::Key;
use crate::ordered_map::OrderedMap;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Push(i32),
    Remove(usize),
    RemoveAt(i64),
    Pop,
    Shift,
    Seek(usize),
    Next,
    Rewind,
}

fn arb_scenario() -> impl Strategy<Value = (Capabilities, Vec<String>, Vec<Op>)> {
    let caps = (any::<bool>(), any::<bool>()).prop_map(|(associative, unique)| Capabilities {
        associative,
        unique,
    });
    let pool = proptest::collection::vec("[a-z]{1,3}", 1..=6);
    (caps, pool).prop_flat_map(|(caps, pool)| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            (idx.clone(), 0..6i32).prop_map(|(i, v)| Op::Set(i, v)),
            (0..6i32).prop_map(Op::Push),
            idx.prop_map(Op::Remove),
            (0..8i64).prop_map(Op::RemoveAt),
            Just(Op::Pop),
            Just(Op::Shift),
            (0..10usize).prop_map(Op::Seek),
            Just(Op::Next),
            Just(Op::Rewind),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (caps, pool.clone(), ops))
    })
}

/// Reference model: parallel key/value vectors and a cursor index where
/// `pos == len` means past-end.
struct Model {
    caps: Capabilities,
    keys: Vec<Key>,
    vals: Vec<i32>,
    pos: usize,
}

impl Model {
    fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            keys: Vec::new(),
            vals: Vec::new(),
            pos: 0,
        }
    }

    fn rejects(&self, v: i32) -> bool {
        self.caps.unique && self.vals.contains(&v)
    }

    fn append(&mut self, key: Key, v: i32) {
        if self.pos >= self.keys.len() {
            self.pos = 0;
        }
        self.keys.push(key);
        self.vals.push(v);
    }

    fn next_index(&self) -> i64 {
        self.keys
            .iter()
            .filter_map(|k| k.as_int())
            .max()
            .map_or(0, |n| (n + 1).max(0))
    }

    fn set(&mut self, key: Key, v: i32) -> bool {
        if self.rejects(v) {
            return false;
        }
        if !self.caps.associative {
            self.append(Key::Int(self.keys.len() as i64), v);
        } else if let Some(i) = self.keys.iter().position(|k| *k == key) {
            self.vals[i] = v;
        } else {
            self.append(key, v);
        }
        true
    }

    fn push(&mut self, v: i32) -> bool {
        if self.rejects(v) {
            return false;
        }
        let key = if self.caps.associative {
            Key::Int(self.next_index())
        } else {
            Key::Int(self.keys.len() as i64)
        };
        self.append(key, v);
        true
    }

    fn remove_at(&mut self, r: usize) -> i32 {
        let before = self.keys.len();
        self.keys.remove(r);
        let v = self.vals.remove(r);
        self.pos = if self.pos >= before {
            0
        } else if self.pos == r {
            self.keys.len()
        } else if self.pos > r {
            self.pos - 1
        } else {
            self.pos
        };
        if !self.caps.associative {
            self.keys = (0..self.keys.len() as i64).map(Key::Int).collect();
        }
        v
    }

    fn remove(&mut self, key: &Key) -> Option<i32> {
        let r = self.keys.iter().position(|k| k == key)?;
        Some(self.remove_at(r))
    }
}

// Property: OrderedMap matches a Vec-backed model for every capability mix.
// Invariants exercised across random operation sequences:
// - Keys stay distinct; positional maps keep keys equal to 0..n.
// - Unique maps never hold two equal values and report skipped inserts.
// - `set`/`push`/`remove`/`pop`/`shift` agree with the model on results.
// - The cursor follows its entry across mutations, lands past-end when its
//   entry is removed and rewinds when it was already past-end.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((caps, pool, ops) in arb_scenario()) {
        let mut sut: OrderedMap<i32> = OrderedMap::with_config(MapConfig::new(caps));
        let mut model = Model::new(caps);

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    let key = Key::Str(pool[i].clone());
                    let got = sut.set(key.clone(), v).unwrap();
                    prop_assert_eq!(got, model.set(key, v));
                }
                Op::Push(v) => {
                    prop_assert_eq!(sut.push(v), model.push(v));
                }
                Op::Remove(i) => {
                    let key = Key::Str(pool[i].clone());
                    prop_assert_eq!(sut.remove(key.clone()), model.remove(&key));
                }
                Op::RemoveAt(n) => {
                    prop_assert_eq!(sut.remove(n), model.remove(&Key::Int(n)));
                }
                Op::Pop => {
                    let expected = match model.keys.len() {
                        0 => Err(Error::Empty),
                        n => Ok(model.remove_at(n - 1)),
                    };
                    prop_assert_eq!(sut.pop(), expected);
                }
                Op::Shift => {
                    let expected = if model.keys.is_empty() {
                        Err(Error::Empty)
                    } else {
                        Ok(model.remove_at(0))
                    };
                    prop_assert_eq!(sut.shift(), expected);
                }
                Op::Seek(n) => {
                    sut.seek(n);
                    model.pos = n.min(model.keys.len());
                }
                Op::Next => {
                    sut.next();
                    model.pos = (model.pos + 1).min(model.keys.len());
                }
                Op::Rewind => {
                    sut.rewind();
                    model.pos = 0;
                }
            }

            // Post-conditions after each op
            let keys = sut.keys(true).unwrap();
            prop_assert_eq!(&keys, &model.keys);
            let vals: Vec<i32> = sut.values().into_iter().copied().collect();
            prop_assert_eq!(&vals, &model.vals);
            prop_assert_eq!(sut.position(), model.pos);
            prop_assert_eq!(sut.current(), model.vals.get(model.pos));
            prop_assert_eq!(sut.valid(), model.pos < model.vals.len());

            let distinct: HashSet<String> = keys.iter().map(|k| format!("{k:?}")).collect();
            prop_assert_eq!(distinct.len(), keys.len());
            if caps.unique {
                let distinct: HashSet<i32> = vals.iter().copied().collect();
                prop_assert_eq!(distinct.len(), vals.len());
            }
            if !caps.associative {
                let positional: Vec<Key> = (0..keys.len() as i64).map(Key::Int).collect();
                prop_assert_eq!(&keys, &positional);
            }
        }
    }
}

// Property: for a full walk, `rewind/valid/current/next` visit every entry
// once in order, whatever the history of the map.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_walk_visits_all_once(values in proptest::collection::vec(any::<i32>(), 0..40), removals in proptest::collection::vec(0..40i64, 0..10)) {
        let mut sut: OrderedMap<i32> = values.iter().copied().collect();
        for r in removals {
            sut.remove(r);
        }
        let expected: Vec<i32> = sut.values().into_iter().copied().collect();
        let mut seen = Vec::new();
        sut.rewind();
        while sut.valid() {
            seen.push(*sut.current().unwrap());
            sut.next();
        }
        prop_assert_eq!(seen, expected);
        prop_assert!(sut.current().is_none());
    }
}
