use serde_json::json;
use weak_ordered_map::{Capabilities, Equality, Key, MapConfig, OrderedMap};

#[test]
fn to_array_then_reset_reproduces_contents() {
    let mut m: OrderedMap<String> = OrderedMap::with_capabilities(Capabilities::MAP);
    m.set("b", "2".into()).unwrap();
    m.set(3, "three".into()).unwrap();
    m.set("a", "1".into()).unwrap();

    let mut copy: OrderedMap<String> = OrderedMap::with_capabilities(Capabilities::MAP);
    copy.reset(m.to_array()).unwrap();
    assert_eq!(copy.to_array(), m.to_array());
}

#[test]
fn list_reset_renumbers() {
    let mut m: OrderedMap<i32> = OrderedMap::new();
    m.reset(vec![(Key::Int(7), 1), (Key::from("x"), 2)]).unwrap();
    assert_eq!(m.to_array(), [(Key::Int(0), 1), (Key::Int(1), 2)]);
}

#[test]
fn json_round_trip_keeps_order_config_and_rewinds() {
    let config = MapConfig::new(Capabilities::UNIQUE_MAP)
        .value_equality(Equality::Loose)
        .separator(";");
    let mut m: OrderedMap<serde_json::Value> = OrderedMap::with_config(config.clone());
    m.set("z", json!(1)).unwrap();
    m.set(10, json!("ten")).unwrap();
    m.set("a", json!([1, 2])).unwrap();
    m.seek(2);

    let text = serde_json::to_string(&m).unwrap();
    let back: OrderedMap<serde_json::Value> = serde_json::from_str(&text).unwrap();
    assert_eq!(back.config(), &config);
    assert_eq!(back.to_array(), m.to_array());
    assert_eq!(back.position(), 0);
    assert_eq!(back.to_string(), m.to_string());
}

#[test]
fn serialized_shape() {
    let m: OrderedMap<&str> = ["a", "b"].into_iter().collect();
    let v = serde_json::to_value(&m).unwrap();
    assert_eq!(v["entries"], json!([[0, "a"], [1, "b"]]));
    assert_eq!(v["config"]["separator"], json!(", "));
}

#[test]
fn deserialize_without_config_uses_defaults() {
    let m: OrderedMap<i32> = serde_json::from_str(r#"{"entries": [["k", 5], [9, 6]]}"#).unwrap();
    assert_eq!(m.config(), &MapConfig::default());
    // Default maps are positional.
    assert_eq!(m.to_array(), [(Key::Int(0), 5), (Key::Int(1), 6)]);
}

#[test]
fn deserialize_applies_unique_capability() {
    let text = r#"{"config": {"capabilities": {"unique": true}}, "entries": [[0, 1], [1, 1], [2, 2]]}"#;
    let m: OrderedMap<i32> = serde_json::from_str(text).unwrap();
    assert_eq!(m.values(), [&1, &2]);
}
