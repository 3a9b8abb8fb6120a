//! Value-side traits: loose comparison, string forms (for `join`) and
//! nesting (for `flatten`).

use crate::config::Equality;
use crate::key::Key;
use serde_json::Value;
use std::borrow::Cow;
use std::rc::Rc;

/// Scripting-language style equality, used when a map or a call asks for
/// `Equality::Loose`. Types without a looser notion fall back to `==`.
pub trait LooseEq: PartialEq {
    fn loose_eq(&self, other: &Self) -> bool {
        self == other
    }
}

pub(crate) fn values_equal<V: LooseEq + ?Sized>(a: &V, b: &V, eq: Equality) -> bool {
    match eq {
        Equality::Strict => a == b,
        Equality::Loose => a.loose_eq(b),
    }
}

macro_rules! strict_only {
    ($($t:ty),* $(,)?) => {
        $(impl LooseEq for $t {})*
    };
}

strict_only!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    str
);

impl LooseEq for &str {}

impl<T: LooseEq + ?Sized> LooseEq for Rc<T> {
    fn loose_eq(&self, other: &Self) -> bool {
        (**self).loose_eq(other)
    }
}

impl<T: LooseEq + ?Sized> LooseEq for Box<T> {
    fn loose_eq(&self, other: &Self) -> bool {
        (**self).loose_eq(other)
    }
}

impl<T: LooseEq> LooseEq for Option<T> {
    fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.loose_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: LooseEq> LooseEq for Vec<T> {
    fn loose_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.loose_eq(b))
    }
}

/// Numbers compare numerically, numeric strings equal numbers, booleans
/// compare by truthiness and null equals anything falsy.
impl LooseEq for Value {
    fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                match (numeric(s), n.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Value::Bool(b), v) | (v, Value::Bool(b)) => *b == truthy(v),
            (Value::Null, v) | (v, Value::Null) => !truthy(v),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, x)| b.get(k).map(|y| x.loose_eq(y)).unwrap_or(false))
            }
            _ => self == other,
        }
    }
}

fn numeric(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse().ok()
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The text a value contributes to `join` and to a map's `Display`.
///
/// Unlike `Display`, a string value renders as its bare contents.
pub trait StringForm {
    fn string_form(&self) -> Cow<'_, str>;
}

macro_rules! display_form {
    ($($t:ty),* $(,)?) => {
        $(impl StringForm for $t {
            fn string_form(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }
        })*
    };
}

display_form!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl StringForm for str {
    fn string_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl StringForm for String {
    fn string_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl<T: StringForm + ?Sized> StringForm for &T {
    fn string_form(&self) -> Cow<'_, str> {
        (**self).string_form()
    }
}

impl<T: StringForm + ?Sized> StringForm for Rc<T> {
    fn string_form(&self) -> Cow<'_, str> {
        (**self).string_form()
    }
}

impl<T: StringForm + ?Sized> StringForm for Box<T> {
    fn string_form(&self) -> Cow<'_, str> {
        (**self).string_form()
    }
}

/// Strings render bare, null renders empty, other scalars as their JSON
/// literal. Arrays and objects render as JSON text.
impl StringForm for Value {
    fn string_form(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Null => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            other => Cow::Owned(other.to_string()),
        }
    }
}

/// Values that can contain keyed children.
pub trait Nested: Sized {
    /// Split into keyed children, or hand a leaf back unchanged.
    fn into_children<O: ?Sized>(self) -> Result<Vec<(Key<O>, Self)>, Self>;
}

impl Nested for Value {
    fn into_children<O: ?Sized>(self) -> Result<Vec<(Key<O>, Self)>, Self> {
        match self {
            Value::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v))
                .collect()),
            Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(k, v)| (Key::Str(k), v))
                .collect()),
            leaf => Err(leaf),
        }
    }
}

/// Depth-first walk collecting leaves with their innermost key.
pub(crate) fn collect_leaves<V: Nested, O: ?Sized>(
    key: Key<O>,
    value: V,
    out: &mut Vec<(Key<O>, V)>,
) {
    match value.into_children::<O>() {
        Ok(children) => {
            for (k, v) in children {
                collect_leaves(k, v, out);
            }
        }
        Err(leaf) => out.push((key, leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::any::Any;

    #[test]
    fn primitives_are_strict_in_both_modes() {
        assert!(values_equal(&1i64, &1i64, Equality::Loose));
        assert!(!values_equal("1", "2", Equality::Loose));
        assert!(values_equal(&"a".to_string(), &"a".to_string(), Equality::Strict));
    }

    #[test]
    fn json_numeric_string_equals_number_loosely() {
        let s = json!("1");
        let n = json!(1);
        assert!(!values_equal(&s, &n, Equality::Strict));
        assert!(values_equal(&s, &n, Equality::Loose));
        assert!(values_equal(&json!(1.0), &json!(1), Equality::Loose));
        assert!(!values_equal(&json!("abc"), &json!(0), Equality::Loose));
    }

    #[test]
    fn json_truthiness() {
        assert!(json!(true).loose_eq(&json!("yes")));
        assert!(json!(false).loose_eq(&json!("0")));
        assert!(json!(null).loose_eq(&json!([])));
        assert!(!json!(null).loose_eq(&json!("x")));
    }

    #[test]
    fn json_containers_compare_elementwise() {
        assert!(json!(["1", 2]).loose_eq(&json!([1, "2"])));
        assert!(json!({"a": "1"}).loose_eq(&json!({"a": 1})));
        assert!(!json!({"a": 1}).loose_eq(&json!({"b": 1})));
    }

    #[test]
    fn leaves_keep_innermost_keys() {
        let mut out: Vec<(Key<dyn Any>, Value)> = Vec::new();
        collect_leaves(
            Key::Str("one".into()),
            json!({"two": 2, "n": {"three": 3}}),
            &mut out,
        );
        collect_leaves(Key::Int(9), json!(4), &mut out);
        let keys: Vec<String> = out.iter().map(|(k, _)| k.to_string()).collect();
        let vals: Vec<Value> = out.into_iter().map(|(_, v)| v).collect();
        assert_eq!(keys, ["two", "three", "9"]);
        assert_eq!(vals, [json!(2), json!(3), json!(4)]);
    }

    /// Invariant: object children come out in their written order.
    #[test]
    fn object_children_keep_insertion_order() {
        let children = json!({"z": 1, "m": 2, "a": 3})
            .into_children::<dyn Any>()
            .unwrap();
        let keys: Vec<String> = children.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["z", "m", "a"]);
    }

    #[test]
    fn json_string_forms() {
        assert_eq!(json!("foo").string_form(), "foo");
        assert_eq!(json!(12).string_form(), "12");
        assert_eq!(json!(1.5).string_form(), "1.5");
        assert_eq!(json!(true).string_form(), "true");
        assert_eq!(json!(null).string_form(), "");
        assert_eq!(json!(["a", 1]).string_form(), r#"["a",1]"#);
    }

    #[test]
    fn primitive_string_forms() {
        assert_eq!("bar".string_form(), "bar");
        assert_eq!(String::from("baz").string_form(), "baz");
        assert_eq!(7u8.string_form(), "7");
        assert_eq!(Rc::new('x').string_form(), "x");
    }
}
