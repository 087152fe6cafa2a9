//! Field schemas and the coercion rules that turn loosely typed payloads into
//! typed field values.
//!
//! Every resource kind declares a static [`FieldSpec`] slice. Applying a
//! payload to [`Fields`] follows a merge policy: a field only changes when
//! the payload carries a non-null value for it, so a partial refresh never
//! erases data that was already known.

use crate::error::{ActLabError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// Expected scalar type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    List,
    /// Accept whatever structure the payload carries.
    Raw,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Int => "integer",
            FieldKind::Float => "float",
            FieldKind::List => "list",
            FieldKind::Raw => "any",
        }
    }

    /// Coerce a non-null JSON value into this kind.
    pub fn coerce(self, field: &str, value: &Value) -> Result<FieldValue> {
        let mismatch = || ActLabError::Coercion {
            field: field.to_string(),
            expected: self.as_str(),
            found: describe(value),
        };
        match self {
            FieldKind::Str => Ok(FieldValue::Str(match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            })),
            FieldKind::Int => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                    .map(FieldValue::Int)
                    .ok_or_else(mismatch),
                Value::Bool(b) => Ok(FieldValue::Int(i64::from(*b))),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::Int)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            FieldKind::Float => match value {
                Value::Number(n) => n.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
                Value::Bool(b) => Ok(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(FieldValue::Float)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            FieldKind::List => match value {
                Value::Array(items) => Ok(FieldValue::List(items.clone())),
                _ => Err(mismatch()),
            },
            FieldKind::Raw => Ok(FieldValue::Raw(value.clone())),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Raw(Value),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::List(_) => FieldKind::List,
            FieldValue::Raw(_) => FieldKind::Raw,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Raw(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Raw(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::List(items) => Value::Array(items.clone()),
            FieldValue::Raw(v) => v.clone(),
        }
    }

    /// Render as a single form value. Structured values are sent as JSON.
    pub fn to_form_string(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::List(items) => Value::Array(items.clone()).to_string(),
            FieldValue::Raw(Value::String(s)) => s.clone(),
            FieldValue::Raw(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form_string())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Starting value materialized the first time the field is set up.
    pub default: Option<fn() -> FieldValue>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    pub const fn with_default(
        name: &'static str,
        kind: FieldKind,
        default: fn() -> FieldValue,
    ) -> Self {
        Self {
            name,
            kind,
            default: Some(default),
        }
    }
}

static ID_FIELD: FieldSpec = FieldSpec::new("id", FieldKind::Int);

/// The declared schema with `id: Int` prepended when the declaration omits it.
pub fn effective_schema(schema: &'static [FieldSpec]) -> impl Iterator<Item = &'static FieldSpec> {
    let has_id = schema.iter().any(|f| f.name == "id");
    let id = if has_id { None } else { Some(&ID_FIELD) };
    id.into_iter().chain(schema.iter())
}

pub fn kind_of(schema: &'static [FieldSpec], name: &str) -> Option<FieldKind> {
    effective_schema(schema).find(|f| f.name == name).map(|f| f.kind)
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Field name to current value; `None` is null/unset.
pub type FieldMap = BTreeMap<String, Option<FieldValue>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: FieldMap,
}

impl Fields {
    /// Empty field mapping with every declared field present.
    pub fn new(schema: &'static [FieldSpec]) -> Self {
        let mut fields = Fields::default();
        fields.materialize(schema);
        fields
    }

    fn materialize(&mut self, schema: &'static [FieldSpec]) {
        for spec in effective_schema(schema) {
            self.values
                .entry(spec.name.to_string())
                .or_insert_with(|| spec.default.map(|make| make()));
        }
    }

    /// Merge a payload into the mapping.
    ///
    /// Declared fields are coerced to their kind. Nulls never overwrite a
    /// known value. With `accept_all`, payload keys outside the mapping are
    /// added verbatim; keys already present are left alone.
    pub fn apply(
        &mut self,
        schema: &'static [FieldSpec],
        accept_all: bool,
        payload: &Map<String, Value>,
    ) -> Result<()> {
        // Coerce everything before writing so a bad value leaves no partial update.
        let staged = effective_schema(schema)
            .filter_map(|spec| match payload.get(spec.name) {
                Some(Value::Null) | None => None,
                Some(value) => Some(spec.kind.coerce(spec.name, value).map(|v| (spec.name, v))),
            })
            .collect::<Result<Vec<_>>>()?;

        self.materialize(schema);
        for (name, value) in staged {
            self.values.insert(name.to_string(), Some(value));
        }

        if accept_all {
            for (key, value) in payload {
                if self.values.contains_key(key) {
                    continue;
                }
                let raw = match value {
                    Value::Null => None,
                    other => Some(FieldValue::Raw(other.clone())),
                };
                self.values.insert(key.clone(), raw);
            }
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key).and_then(|v| v.as_ref())
    }

    /// Overwrite a key. Returns `false` when the key is not in the mapping
    /// and nothing was written.
    pub fn set(&mut self, key: &str, value: Option<FieldValue>) -> bool {
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<FieldValue>) {
        self.values.insert(key.into(), value);
    }

    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(FieldValue::as_int)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_int)
    }

    /// Independent copy of the mapping.
    pub fn to_map(&self) -> FieldMap {
        self.values.clone()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.as_ref().map(FieldValue::to_json).unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SCHEMA: &[FieldSpec] = &[
        FieldSpec::new("name", FieldKind::Str),
        FieldSpec::new("budget", FieldKind::Float),
        FieldSpec::new("leader_id", FieldKind::Int),
        FieldSpec::new("assignees", FieldKind::List),
    ];

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn id_is_always_present() {
        let fields = Fields::new(SCHEMA);
        assert!(fields.contains("id"));
        assert_eq!(fields.get("id"), None);
    }

    #[test]
    fn coerces_to_declared_kinds() {
        let mut fields = Fields::new(SCHEMA);
        fields
            .apply(
                SCHEMA,
                false,
                &obj(json!({
                    "id": "42",
                    "name": 7,
                    "budget": "12.5",
                    "leader_id": 3.9,
                    "assignees": [1, 2]
                })),
            )
            .unwrap();

        assert_eq!(fields.get("id"), Some(&FieldValue::Int(42)));
        assert_eq!(fields.get("name"), Some(&FieldValue::Str("7".into())));
        assert_eq!(fields.get("budget"), Some(&FieldValue::Float(12.5)));
        assert_eq!(fields.get("leader_id"), Some(&FieldValue::Int(3)));
        assert_eq!(fields.get("assignees"), Some(&FieldValue::List(vec![json!(1), json!(2)])));
    }

    #[test]
    fn null_never_erases_known_value() {
        let mut fields = Fields::new(SCHEMA);
        fields.apply(SCHEMA, false, &obj(json!({"name": "Alpha"}))).unwrap();
        fields.apply(SCHEMA, false, &obj(json!({"name": null}))).unwrap();
        assert_eq!(fields.str("name"), Some("Alpha"));

        // absent keys behave the same way
        fields.apply(SCHEMA, false, &obj(json!({"budget": 1}))).unwrap();
        assert_eq!(fields.str("name"), Some("Alpha"));
    }

    #[test]
    fn non_null_overwrites() {
        let mut fields = Fields::new(SCHEMA);
        fields.apply(SCHEMA, false, &obj(json!({"name": "Alpha"}))).unwrap();
        fields.apply(SCHEMA, false, &obj(json!({"name": "Beta"}))).unwrap();
        assert_eq!(fields.str("name"), Some("Beta"));
    }

    #[test]
    fn failed_coercion_is_an_error() {
        let mut fields = Fields::new(SCHEMA);
        let err = fields
            .apply(SCHEMA, false, &obj(json!({"leader_id": "not a number"})))
            .unwrap_err();
        assert!(matches!(err, ActLabError::Coercion { ref field, .. } if field == "leader_id"));

        let err = fields
            .apply(SCHEMA, false, &obj(json!({"assignees": "x"})))
            .unwrap_err();
        assert!(matches!(err, ActLabError::Coercion { expected: "list", .. }));
    }

    #[test]
    fn failed_apply_leaves_fields_untouched() {
        let mut fields = Fields::new(SCHEMA);
        fields.apply(SCHEMA, false, &obj(json!({"name": "Old", "budget": 2}))).unwrap();
        let before = fields.clone();

        let result = fields.apply(
            SCHEMA,
            false,
            &obj(json!({"name": "New", "budget": 9, "leader_id": "bob"})),
        );
        assert!(result.is_err());
        assert_eq!(fields, before);
        assert_eq!(fields.str("name"), Some("Old"));
    }

    #[test]
    fn unknown_keys_dropped_unless_accept_all() {
        let payload = obj(json!({"name": "a", "mime_type": "text/plain", "extra": null}));

        let mut strict = Fields::new(SCHEMA);
        strict.apply(SCHEMA, false, &payload).unwrap();
        assert!(!strict.contains("mime_type"));

        let mut open = Fields::new(SCHEMA);
        open.apply(SCHEMA, true, &payload).unwrap();
        assert_eq!(open.get("mime_type"), Some(&FieldValue::Raw(json!("text/plain"))));
        assert!(open.contains("extra"));
        assert_eq!(open.get("extra"), None);
    }

    #[test]
    fn accept_all_does_not_replace_existing_extras() {
        let mut fields = Fields::new(SCHEMA);
        fields.apply(SCHEMA, true, &obj(json!({"mime": "a"}))).unwrap();
        fields.apply(SCHEMA, true, &obj(json!({"mime": "b"}))).unwrap();
        assert_eq!(fields.str("mime"), Some("a"));
    }

    #[test]
    fn defaults_materialize_only_when_unset() {
        fn no_tags() -> FieldValue {
            FieldValue::List(Vec::new())
        }
        static WITH_DEFAULT: &[FieldSpec] =
            &[FieldSpec::with_default("tags", FieldKind::List, no_tags)];
        let mut fields = Fields::new(WITH_DEFAULT);
        assert_eq!(fields.get("tags"), Some(&FieldValue::List(Vec::new())));

        fields.apply(WITH_DEFAULT, false, &obj(json!({"tags": ["x"]}))).unwrap();
        fields.apply(WITH_DEFAULT, false, &obj(json!({}))).unwrap();
        assert_eq!(fields.get("tags"), Some(&FieldValue::List(vec![json!("x")])));
    }

    #[test]
    fn to_map_is_a_copy() {
        let mut fields = Fields::new(SCHEMA);
        fields.apply(SCHEMA, false, &obj(json!({"name": "keep"}))).unwrap();
        let mut copy = fields.to_map();
        copy.insert("name".into(), Some(FieldValue::from("changed")));
        copy.remove("id");
        assert_eq!(fields.str("name"), Some("keep"));
        assert!(fields.contains("id"));
    }

    #[test]
    fn set_rejects_unknown_keys() {
        let mut fields = Fields::new(SCHEMA);
        assert!(fields.set("name", Some("x".into())));
        assert!(!fields.set("nope", Some("x".into())));
        assert!(!fields.contains("nope"));
    }
}
