//! Keys: what callers pass in (`Key`) and what the map stores (`KeyRef`).
//!
//! Scalar keys are stored by value. Object keys are stored as a `Weak`
//! plus the address of the allocation; the map never keeps an object
//! alive, and a dropped object makes its stored key stale for good.

use crate::config::Equality;
use crate::error::{Error, Result};
use core::fmt;
use core::hash::BuildHasher;
use slotmap::{Key as _, KeyData};
use std::any::Any;
use std::rc::{Rc, Weak};

slotmap::new_key_type! {
    /// Stable identity number of a stored key. Generational: once an entry
    /// is removed its id never resolves again, even if the slot is reused.
    pub struct KeyId;
}

impl KeyId {
    pub fn as_u64(self) -> u64 {
        self.data().as_ffi()
    }

    pub fn from_u64(n: u64) -> Self {
        KeyId::from(KeyData::from_ffi(n))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_u64())
    }
}

/// A key as seen from outside the map.
///
/// `Id` names an already-stored key by identity number; it is what
/// `keys(false)` hands out for object keys.
pub enum Key<O: ?Sized = dyn Any> {
    Int(i64),
    Str(String),
    Object(Rc<O>),
    Id(KeyId),
}

impl<O: ?Sized> Key<O> {
    pub fn object(obj: Rc<O>) -> Self {
        Key::Object(obj)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Key::Object(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<O>> {
        match self {
            Key::Object(o) => Some(o),
            _ => None,
        }
    }

    pub(crate) fn probe(&self) -> Option<Probe<'_>> {
        match self {
            Key::Int(n) => Some(Probe::Int(*n)),
            Key::Str(s) => Some(Probe::Str(s)),
            Key::Object(o) => Some(Probe::Addr(addr_of(o))),
            Key::Id(_) => None,
        }
    }
}

impl Key<dyn Any> {
    /// Wrap any reference-counted object as a `dyn Any` key.
    pub fn any<T: Any>(obj: &Rc<T>) -> Self {
        let obj: Rc<dyn Any> = obj.clone();
        Key::Object(obj)
    }
}

impl<O: ?Sized> Clone for Key<O> {
    fn clone(&self) -> Self {
        match self {
            Key::Int(n) => Key::Int(*n),
            Key::Str(s) => Key::Str(s.clone()),
            Key::Object(o) => Key::Object(Rc::clone(o)),
            Key::Id(id) => Key::Id(*id),
        }
    }
}

/// Strict comparison; objects compare by identity.
impl<O: ?Sized> PartialEq for Key<O> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a == b,
            (Key::Str(a), Key::Str(b)) => a == b,
            (Key::Object(a), Key::Object(b)) => addr_of(a) == addr_of(b),
            (Key::Id(a), Key::Id(b)) => a == b,
            _ => false,
        }
    }
}

impl<O: ?Sized> Eq for Key<O> {}

impl<O: ?Sized> fmt::Debug for Key<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Key::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Key::Object(o) => write!(f, "Object({:#x})", addr_of(o)),
            Key::Id(id) => f.debug_tuple("Id").field(id).finish(),
        }
    }
}

impl<O: ?Sized> fmt::Display for Key<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
            Key::Object(o) => write!(f, "object@{:#x}", addr_of(o)),
            Key::Id(id) => write!(f, "{id}"),
        }
    }
}

impl<O: ?Sized> From<i64> for Key<O> {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl<O: ?Sized> From<i32> for Key<O> {
    fn from(n: i32) -> Self {
        Key::Int(i64::from(n))
    }
}

impl<O: ?Sized> From<usize> for Key<O> {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl<O: ?Sized> From<&str> for Key<O> {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl<O: ?Sized> From<String> for Key<O> {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl<O: ?Sized> From<Rc<O>> for Key<O> {
    fn from(o: Rc<O>) -> Self {
        Key::Object(o)
    }
}

impl<O: ?Sized> From<KeyId> for Key<O> {
    fn from(id: KeyId) -> Self {
        Key::Id(id)
    }
}

/// Payload of a stored key.
pub(crate) enum KeyKind<O: ?Sized> {
    Int(i64),
    Str(String),
    Object { target: Weak<O>, addr: usize },
}

impl<O: ?Sized> KeyKind<O> {
    /// Build the stored form of a caller key. `Key::Id` has no stored form
    /// of its own and must be resolved against the table first.
    pub(crate) fn from_key(key: &Key<O>) -> Option<Self> {
        match key {
            Key::Int(n) => Some(KeyKind::Int(*n)),
            Key::Str(s) => Some(KeyKind::Str(s.clone())),
            Key::Object(o) => Some(KeyKind::Object {
                target: Rc::downgrade(o),
                addr: addr_of(o),
            }),
            Key::Id(_) => None,
        }
    }

    pub(crate) fn probe(&self) -> Probe<'_> {
        match self {
            KeyKind::Int(n) => Probe::Int(*n),
            KeyKind::Str(s) => Probe::Str(s),
            KeyKind::Object { addr, .. } => Probe::Addr(*addr),
        }
    }
}

impl<O: ?Sized> Clone for KeyKind<O> {
    fn clone(&self) -> Self {
        match self {
            KeyKind::Int(n) => KeyKind::Int(*n),
            KeyKind::Str(s) => KeyKind::Str(s.clone()),
            KeyKind::Object { target, addr } => KeyKind::Object {
                target: Weak::clone(target),
                addr: *addr,
            },
        }
    }
}

/// A key as stored in the map, with its identity number.
pub struct KeyRef<O: ?Sized = dyn Any> {
    id: KeyId,
    kind: KeyKind<O>,
}

impl<O: ?Sized> KeyRef<O> {
    pub(crate) fn new(id: KeyId, kind: KeyKind<O>) -> Self {
        Self { id, kind }
    }

    pub(crate) fn kind(&self) -> &KeyKind<O> {
        &self.kind
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, KeyKind::Object { .. })
    }

    /// Scalar keys are always live; object keys while the object exists.
    pub fn is_live(&self) -> bool {
        match &self.kind {
            KeyKind::Object { target, .. } => target.strong_count() > 0,
            _ => true,
        }
    }

    /// Turn the stored key back into the caller's key. Fails once the
    /// object behind a weak key has been dropped.
    pub fn denormalize(&self) -> Result<Key<O>> {
        match &self.kind {
            KeyKind::Int(n) => Ok(Key::Int(*n)),
            KeyKind::Str(s) => Ok(Key::Str(s.clone())),
            KeyKind::Object { target, .. } => target
                .upgrade()
                .map(Key::Object)
                .ok_or(Error::StaleKey(self.id)),
        }
    }

    /// Scalars as themselves, objects as their identity number. Never fails.
    pub fn raw(&self) -> Key<O> {
        match &self.kind {
            KeyKind::Int(n) => Key::Int(*n),
            KeyKind::Str(s) => Key::Str(s.clone()),
            KeyKind::Object { .. } => Key::Id(self.id),
        }
    }
}

impl<O: ?Sized> Clone for KeyRef<O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for KeyRef<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("KeyRef");
        d.field("id", &self.id);
        match &self.kind {
            KeyKind::Int(n) => d.field("int", n),
            KeyKind::Str(s) => d.field("str", s),
            KeyKind::Object { addr, .. } => d.field("object", &format_args!("{addr:#x}")),
        };
        d.field("live", &self.is_live()).finish()
    }
}

/// Borrowed, hashable view of a key used for index lookups.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Probe<'a> {
    Int(i64),
    Str(&'a str),
    Addr(usize),
}

impl Probe<'_> {
    /// Hash of the canonical form: a string that spells an integer hashes
    /// like the integer, so loose and strict lookups share one index.
    pub(crate) fn hash_with<S: BuildHasher>(&self, hasher: &S) -> u64 {
        match *self {
            Probe::Int(n) => hasher.hash_one((0u8, n)),
            Probe::Str(s) => match canonical_int(s) {
                Some(n) => hasher.hash_one((0u8, n)),
                None => hasher.hash_one((1u8, s)),
            },
            Probe::Addr(a) => hasher.hash_one((2u8, a)),
        }
    }

    pub(crate) fn matches(&self, other: &Probe<'_>, eq: Equality) -> bool {
        match (*self, *other) {
            (Probe::Int(a), Probe::Int(b)) => a == b,
            (Probe::Str(a), Probe::Str(b)) => a == b,
            (Probe::Addr(a), Probe::Addr(b)) => a == b,
            (Probe::Int(n), Probe::Str(s)) | (Probe::Str(s), Probe::Int(n)) => {
                eq == Equality::Loose && canonical_int(s) == Some(n)
            }
            _ => false,
        }
    }
}

/// `Some(n)` when `s` is exactly the decimal spelling of `n`.
pub(crate) fn canonical_int(s: &str) -> Option<i64> {
    let n: i64 = s.parse().ok()?;
    (n.to_string() == s).then_some(n)
}

pub(crate) fn addr_of<O: ?Sized>(o: &Rc<O>) -> usize {
    Rc::as_ptr(o).cast::<()>() as usize
}
