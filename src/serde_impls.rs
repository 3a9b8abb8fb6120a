//! Serde support and the JSON projection.
//!
//! The serialized form is `{ "config": .., "entries": [[key, value], ..] }`.
//! Only scalar keys have a portable form: an entry under an object key
//! fails serialization. Deserialization rebuilds the map through `set`
//! with the cursor at the start.

use crate::config::MapConfig;
use crate::key::Key;
use crate::ordered_map::OrderedMap;
use crate::value::LooseEq;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum WireKey {
    Int(i64),
    Str(String),
}

#[derive(serde::Serialize)]
struct WireOut<'a, V> {
    config: &'a MapConfig,
    entries: Vec<(WireKey, &'a V)>,
}

#[derive(serde::Deserialize)]
struct WireIn<V> {
    #[serde(default)]
    config: MapConfig,
    entries: Vec<(WireKey, V)>,
}

impl<V: Serialize, O: ?Sized> Serialize for OrderedMap<V, O> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries = Vec::with_capacity(self.len());
        for (stored, value) in self.iter() {
            let key = match stored.raw() {
                Key::Int(n) => WireKey::Int(n),
                Key::Str(s) => WireKey::Str(s),
                _ => {
                    return Err(ser::Error::custom(format!(
                        "entry under object key {} has no serialized form",
                        stored.id()
                    )))
                }
            };
            entries.push((key, value));
        }
        WireOut {
            config: self.config(),
            entries,
        }
        .serialize(serializer)
    }
}

impl<'de, V, O> Deserialize<'de> for OrderedMap<V, O>
where
    V: Deserialize<'de> + LooseEq,
    O: ?Sized,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireIn::<V>::deserialize(deserializer)?;
        let mut map = OrderedMap::with_config(wire.config);
        for (key, value) in wire.entries {
            let key = match key {
                WireKey::Int(n) => Key::Int(n),
                WireKey::Str(s) => Key::Str(s),
            };
            map.set(key, value).map_err(de::Error::custom)?;
        }
        map.rewind();
        Ok(map)
    }
}

impl<V: Serialize, O: ?Sized> OrderedMap<V, O> {
    /// JSON projection of the live entries: an object keyed by each key's
    /// string form for associative maps (object keys by identity number),
    /// an array otherwise. Object fields follow insertion order.
    ///
    /// Under strict key equality `1` and `"1"` are separate entries but
    /// share the name `"1"`; the later entry wins the field, keeping the
    /// earlier entry's position.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let live = self.iter().filter(|(k, _)| k.is_live());
        if !self.capabilities().associative {
            return live
                .map(|(_, v)| serde_json::to_value(v))
                .collect::<serde_json::Result<Vec<_>>>()
                .map(Value::Array);
        }
        let mut out = Map::new();
        for (k, v) in live {
            let name = match k.raw() {
                Key::Id(id) => id.as_u64().to_string(),
                other => other.to_string(),
            };
            let value = serde_json::to_value(v)?;
            if let Some(prev) = out.get_mut(&name) {
                debug!(key = %name, "JSON field name collision; later entry wins");
                *prev = value;
            } else {
                out.insert(name, value);
            }
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capabilities;
    use serde_json::json;
    use std::any::Any;
    use std::rc::Rc;

    #[test]
    fn list_projects_to_array() {
        let m: OrderedMap<&str> = ["foo", "bar"].into_iter().collect();
        assert_eq!(m.to_json().unwrap(), json!(["foo", "bar"]));
    }

    #[test]
    fn associative_projects_to_object() {
        let mut m: OrderedMap<i32> = OrderedMap::with_capabilities(Capabilities::MAP);
        m.set("a", 1).unwrap();
        m.set(7, 2).unwrap();
        assert_eq!(m.to_json().unwrap(), json!({"a": 1, "7": 2}));
    }

    /// Invariant: object fields come out in insertion order.
    #[test]
    fn associative_projection_keeps_insertion_order() {
        let mut m: OrderedMap<i32> = OrderedMap::with_capabilities(Capabilities::MAP);
        m.set("b", 1).unwrap();
        m.set("a", 2).unwrap();
        m.set(0, 3).unwrap();
        assert_eq!(m.to_json().unwrap().to_string(), r#"{"b":1,"a":2,"0":3}"#);
    }

    #[test]
    fn colliding_names_keep_the_later_value() {
        let mut m: OrderedMap<i32> = OrderedMap::with_capabilities(Capabilities::MAP);
        m.set(1, 10).unwrap();
        m.set("x", 20).unwrap();
        m.set("1", 11).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.to_json().unwrap().to_string(), r#"{"1":11,"x":20}"#);
    }

    #[test]
    fn object_keys_do_not_serialize() {
        let obj: Rc<dyn Any> = Rc::new(());
        let mut m: OrderedMap<i32> = OrderedMap::with_capabilities(Capabilities::MAP);
        m.set(obj.clone(), 1).unwrap();
        let err = serde_json::to_string(&m).unwrap_err();
        assert!(err.to_string().contains("object key"));
        // The JSON projection still names it by identity number.
        let projected = m.to_json().unwrap();
        assert_eq!(projected.as_object().map(|o| o.len()), Some(1));
    }

    #[test]
    fn deserialize_rewinds_and_keeps_separator() {
        let mut m: OrderedMap<String> = OrderedMap::with_capabilities(Capabilities::MAP);
        m.set_separator("|");
        m.set("x", "1".to_string()).unwrap();
        m.set("y", "2".to_string()).unwrap();
        m.seek(2);
        let text = serde_json::to_string(&m).unwrap();
        let back: OrderedMap<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.position(), 0);
        assert_eq!(back.separator(), "|");
        assert_eq!(back.to_array(), m.to_array());
    }
}
