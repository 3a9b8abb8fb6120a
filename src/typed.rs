//! TypedMap: an `OrderedMap` that checks every written value against a
//! declared type.
//!
//! Writes (`set`, `push`, `reset`) and the values produced by `map` and
//! `flatten` are checked before anything is stored; a mismatch fails with
//! `Error::TypeMismatch` and leaves the map as it was. Reads go through
//! `Deref` to the inner map.

use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::ordered_map::OrderedMap;
use crate::value::{LooseEq, Nested};
use core::fmt;
use core::ops::Deref;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::borrow::Cow;

/// Runtime description of the values a `TypedMap` accepts.
pub trait TypeDescriptor<V: ?Sized> {
    /// Name reported as `expected` in a mismatch.
    fn name(&self) -> Cow<'_, str>;

    fn accepts(&self, value: &V) -> bool;

    /// Name reported as `found` in a mismatch.
    fn describe(&self, value: &V) -> Cow<'_, str> {
        let _ = value;
        Cow::Borrowed(std::any::type_name::<V>())
    }
}

/// Kinds of JSON value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Bool,
    /// Number without a fractional part.
    Int,
    Float,
    /// Any number.
    Number,
    String,
    Array,
    Object,
    /// Anything with a natural string form: strings, numbers and booleans.
    Stringable,
}

impl JsonType {
    /// Most specific kind of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Number(n) if n.is_f64() => JsonType::Float,
            Value::Number(_) => JsonType::Int,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Int => "int",
            JsonType::Float => "float",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Stringable => "stringable",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TypeDescriptor<Value> for JsonType {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }

    fn accepts(&self, value: &Value) -> bool {
        let found = JsonType::of(value);
        match self {
            JsonType::Number => matches!(found, JsonType::Int | JsonType::Float),
            JsonType::Stringable => matches!(
                found,
                JsonType::String | JsonType::Int | JsonType::Float | JsonType::Bool
            ),
            expected => *expected == found,
        }
    }

    fn describe(&self, value: &Value) -> Cow<'_, str> {
        Cow::Borrowed(JsonType::of(value).as_str())
    }
}

/// A named check function.
pub struct Predicate<V: ?Sized> {
    name: Cow<'static, str>,
    check: fn(&V) -> bool,
}

impl<V: ?Sized> Predicate<V> {
    pub fn new(name: impl Into<Cow<'static, str>>, check: fn(&V) -> bool) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<V: ?Sized> Clone for Predicate<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            check: self.check,
        }
    }
}

impl<V: ?Sized> fmt::Debug for Predicate<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

impl<V: ?Sized> TypeDescriptor<V> for Predicate<V> {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn accepts(&self, value: &V) -> bool {
        (self.check)(value)
    }
}

pub struct TypedMap<V, T, O: ?Sized = dyn Any> {
    inner: OrderedMap<V, O>,
    value_type: T,
}

impl<V, T: TypeDescriptor<V>, O: ?Sized> TypedMap<V, T, O> {
    pub fn new(value_type: T) -> Self {
        Self::with_config(value_type, MapConfig::default())
    }

    pub fn with_config(value_type: T, config: MapConfig) -> Self {
        Self {
            inner: OrderedMap::with_config(config),
            value_type,
        }
    }

    /// Adopt an existing map after checking every value it holds.
    pub fn from_map(map: OrderedMap<V, O>, value_type: T) -> Result<Self> {
        for (_, v) in map.iter() {
            check(&value_type, v)?;
        }
        Ok(Self {
            inner: map,
            value_type,
        })
    }

    pub fn value_type(&self) -> &T {
        &self.value_type
    }

    pub fn check(&self, value: &V) -> Result<()> {
        check(&self.value_type, value)
    }

    pub fn into_inner(self) -> OrderedMap<V, O> {
        self.inner
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.inner.set_separator(separator);
    }

    pub fn rewind(&mut self) {
        self.inner.rewind();
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        self.inner.next();
    }

    pub fn seek(&mut self, n: usize) {
        self.inner.seek(n);
    }

    fn wrap(&self, inner: OrderedMap<V, O>) -> Self
    where
        T: Clone,
    {
        Self {
            inner,
            value_type: self.value_type.clone(),
        }
    }
}

fn check<V: ?Sized, T: TypeDescriptor<V>>(value_type: &T, value: &V) -> Result<()> {
    if value_type.accepts(value) {
        return Ok(());
    }
    Err(Error::TypeMismatch {
        expected: value_type.name().into_owned(),
        found: value_type.describe(value).into_owned(),
    })
}

impl<V: LooseEq, T: TypeDescriptor<V>, O: ?Sized> TypedMap<V, T, O> {
    pub fn set(&mut self, key: impl Into<Key<O>>, value: V) -> Result<bool> {
        self.check(&value)?;
        self.inner.set(key, value)
    }

    pub fn push(&mut self, value: V) -> Result<bool> {
        self.check(&value)?;
        Ok(self.inner.push(value))
    }

    /// Replace the contents; every value is checked before the map changes.
    pub fn reset<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (Key<O>, V)>,
    {
        let items: Vec<_> = items.into_iter().collect();
        for (_, v) in &items {
            self.check(v)?;
        }
        self.inner.reset(items)
    }

    pub fn remove(&mut self, key: impl Into<Key<O>>) -> Option<V> {
        self.inner.remove(key)
    }

    pub fn pop(&mut self) -> Result<V> {
        self.inner.pop()
    }

    pub fn shift(&mut self) -> Result<V> {
        self.inner.shift()
    }

    pub fn purge_stale(&mut self) -> usize {
        self.inner.purge_stale()
    }

    /// Transform every value; the first result of the wrong type fails the
    /// whole call.
    pub fn map(&self, mut f: impl FnMut(&V, &Key<O>) -> V) -> Result<Self>
    where
        T: Clone,
    {
        let value_type = &self.value_type;
        let inner = self.inner.try_map(|v, k| {
            let out = f(v, k);
            check(value_type, &out).map(|()| out)
        })?;
        Ok(self.wrap(inner))
    }

    pub fn filter(&self, pred: impl FnMut(&V) -> bool) -> Self
    where
        V: Clone,
        T: Clone,
    {
        self.wrap(self.inner.filter(pred))
    }

    pub fn for_each(&self, f: impl FnMut(&V, &Key<O>)) -> Self
    where
        V: Clone,
        T: Clone,
    {
        self.wrap(self.inner.for_each(f))
    }

    /// Flatten, then check every leaf.
    pub fn flatten(&self) -> Result<Self>
    where
        V: Nested + Clone,
        T: Clone,
    {
        let flat = self.inner.flatten();
        for (_, v) in flat.iter() {
            self.check(v)?;
        }
        Ok(self.wrap(flat))
    }
}

impl<V, T, O: ?Sized> Deref for TypedMap<V, T, O> {
    type Target = OrderedMap<V, O>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<V: Clone, T: Clone, O: ?Sized> Clone for TypedMap<V, T, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            value_type: self.value_type.clone(),
        }
    }
}

impl<V: fmt::Debug, T: fmt::Debug, O: ?Sized> fmt::Debug for TypedMap<V, T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedMap")
            .field("value_type", &self.value_type)
            .field("entries", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_type_kinds() {
        assert_eq!(JsonType::of(&json!(1)), JsonType::Int);
        assert_eq!(JsonType::of(&json!(1.5)), JsonType::Float);
        assert!(JsonType::Number.accepts(&json!(2)));
        assert!(JsonType::Number.accepts(&json!(2.5)));
        assert!(!JsonType::Int.accepts(&json!(2.5)));
        assert!(JsonType::Stringable.accepts(&json!(true)));
        assert!(!JsonType::Stringable.accepts(&json!([])));
        assert!(!JsonType::Stringable.accepts(&json!(null)));
    }

    #[test]
    fn mismatch_names_both_types() {
        let m: TypedMap<Value, JsonType> = TypedMap::new(JsonType::String);
        let err = m.check(&json!({"a": 1})).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: "string".into(),
                found: "object".into(),
            }
        );
    }

    #[test]
    fn predicate_descriptor() {
        let even: Predicate<i32> = Predicate::new("even", |n: &i32| n % 2 == 0);
        assert!(even.accepts(&4));
        assert!(!even.accepts(&3));
        assert_eq!(even.name(), "even");
        assert_eq!(even.describe(&3), "i32");
    }
}
