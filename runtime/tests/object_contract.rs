//! Behavioral contract of a generated extensible object.
//!
//! `Thing` below is written in exactly the shape `stencil-gen` emits for a
//! schema with a required string, a plain integer, a string list, a byte
//! field, a constant field, and an extension field. Keeping a reference
//! copy here pins the runtime crate against the code it must support:
//! get/set/has/remove/keys, deterministic JSON in both directions, clone
//! independence, and the validating builder.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, RwLock};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use stencil_runtime::{
    AcceptValue, ObjectError, ProduceValue, lock, read_lock, to_wire, write_lock,
};

pub const THING_COUNT_KEY: &str = "count";
pub const THING_DATA_KEY: &str = "data";
pub const THING_KIND_KEY: &str = "kind";
pub const THING_NAME_KEY: &str = "name";
pub const THING_TAGS_KEY: &str = "tags";

/// A thing with a name.
#[derive(Debug, Default)]
pub struct Thing {
    inner: RwLock<ThingInner>,
}

#[derive(Debug, Default, Clone)]
struct ThingInner {
    count: Option<i64>,
    data: Option<stencil_runtime::ByteSlice>,
    name: Option<String>,
    secret: Option<String>,
    tags: Option<Vec<String>>,
    extra: BTreeMap<String, Value>,
}

impl ThingInner {
    fn load(entries: BTreeMap<String, Value>) -> Result<Self, ObjectError> {
        let mut inner = Self::default();
        for (key, value) in entries {
            match key.as_str() {
                THING_COUNT_KEY => {
                    let stored: i64 =
                        serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                            key: THING_COUNT_KEY.to_string(),
                            reason: e.to_string(),
                        })?;
                    inner.count = Some(stored);
                }
                THING_DATA_KEY => {
                    let stored = <stencil_runtime::ByteSlice>::accept_value(value).map_err(|e| {
                        ObjectError::TypeMismatch {
                            key: THING_DATA_KEY.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    inner.data = Some(stored);
                }
                THING_KIND_KEY => {}
                THING_NAME_KEY => {
                    let stored: String =
                        serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                            key: THING_NAME_KEY.to_string(),
                            reason: e.to_string(),
                        })?;
                    inner.name = Some(stored);
                }
                THING_TAGS_KEY => {
                    let stored: Vec<String> =
                        serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                            key: THING_TAGS_KEY.to_string(),
                            reason: e.to_string(),
                        })?;
                    inner.tags = Some(stored);
                }
                _ => {
                    inner.extra.insert(key, value);
                }
            }
        }
        Ok(inner)
    }
}

impl Thing {
    /// Returns the value stored under `key` in its wire form.
    pub fn get(&self, key: &str) -> Result<Value, ObjectError> {
        let inner = read_lock(&self.inner);
        match key {
            THING_COUNT_KEY => match &inner.count {
                Some(v) => to_wire(key, v),
                None => Err(ObjectError::NoSuchKey(key.to_string())),
            },
            THING_DATA_KEY => match &inner.data {
                Some(v) => to_wire(key, v),
                None => Err(ObjectError::NoSuchKey(key.to_string())),
            },
            THING_KIND_KEY => {
                let v: String = String::from("thing");
                to_wire(key, &v)
            }
            THING_NAME_KEY => match &inner.name {
                Some(v) => to_wire(key, v),
                None => Err(ObjectError::NoSuchKey(key.to_string())),
            },
            THING_TAGS_KEY => match &inner.tags {
                Some(v) => to_wire(key, v),
                None => Err(ObjectError::NoSuchKey(key.to_string())),
            },
            _ => inner
                .extra
                .get(key)
                .cloned()
                .ok_or_else(|| ObjectError::NoSuchKey(key.to_string())),
        }
    }

    /// Stores `value` under `key`, coercing it into the declared storage
    /// type for known keys and into extra storage otherwise.
    pub fn set(&self, key: &str, value: Value) -> Result<(), ObjectError> {
        let mut inner = write_lock(&self.inner);
        match key {
            THING_COUNT_KEY => {
                let stored: i64 =
                    serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                inner.count = Some(stored);
            }
            THING_DATA_KEY => {
                let stored = <stencil_runtime::ByteSlice>::accept_value(value).map_err(|e| {
                    ObjectError::TypeMismatch {
                        key: key.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                inner.data = Some(stored);
            }
            THING_KIND_KEY => {}
            THING_NAME_KEY => {
                let stored: String =
                    serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                inner.name = Some(stored);
            }
            THING_TAGS_KEY => {
                let stored: Vec<String> =
                    serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                inner.tags = Some(stored);
            }
            _ => {
                inner.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// True when the key currently holds a value.
    pub fn has(&self, key: &str) -> bool {
        let inner = read_lock(&self.inner);
        match key {
            THING_COUNT_KEY => inner.count.is_some(),
            THING_DATA_KEY => inner.data.is_some(),
            THING_KIND_KEY => true,
            THING_NAME_KEY => inner.name.is_some(),
            THING_TAGS_KEY => inner.tags.is_some(),
            _ => inner.extra.contains_key(key),
        }
    }

    /// Clears the value stored under `key`. Idempotent.
    pub fn remove(&self, key: &str) {
        let mut inner = write_lock(&self.inner);
        match key {
            THING_COUNT_KEY => inner.count = None,
            THING_DATA_KEY => inner.data = None,
            THING_KIND_KEY => {}
            THING_NAME_KEY => inner.name = None,
            THING_TAGS_KEY => inner.tags = None,
            _ => {
                inner.extra.remove(key);
            }
        }
    }

    /// Returns the sorted union of present declared keys and extra keys.
    pub fn keys(&self) -> Vec<String> {
        let inner = read_lock(&self.inner);
        let mut keys = BTreeSet::new();
        if inner.count.is_some() {
            keys.insert(THING_COUNT_KEY.to_string());
        }
        if inner.data.is_some() {
            keys.insert(THING_DATA_KEY.to_string());
        }
        keys.insert(THING_KIND_KEY.to_string());
        if inner.name.is_some() {
            keys.insert(THING_NAME_KEY.to_string());
        }
        if inner.tags.is_some() {
            keys.insert(THING_TAGS_KEY.to_string());
        }
        keys.extend(inner.extra.keys().cloned());
        keys.into_iter().collect()
    }

    pub fn count(&self) -> i64 {
        let inner = read_lock(&self.inner);
        match &inner.count {
            Some(v) => v.clone(),
            None => 0,
        }
    }

    pub fn data(&self) -> Vec<u8> {
        let inner = read_lock(&self.inner);
        match &inner.data {
            Some(v) => v.produce_value(),
            None => Vec::new(),
        }
    }

    pub fn kind(&self) -> String {
        String::from("thing")
    }

    pub fn name(&self) -> String {
        let inner = read_lock(&self.inner);
        match &inner.name {
            Some(v) => v.clone(),
            None => Default::default(),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        let inner = read_lock(&self.inner);
        match &inner.tags {
            Some(v) => v.clone(),
            None => Vec::new(),
        }
    }

    pub fn has_count(&self) -> bool {
        read_lock(&self.inner).count.is_some()
    }

    pub fn has_data(&self) -> bool {
        read_lock(&self.inner).data.is_some()
    }

    pub fn has_kind(&self) -> bool {
        true
    }

    pub fn has_name(&self) -> bool {
        read_lock(&self.inner).name.is_some()
    }

    pub fn has_tags(&self) -> bool {
        read_lock(&self.inner).tags.is_some()
    }

    #[allow(dead_code)]
    pub(crate) fn secret(&self) -> Option<String> {
        read_lock(&self.inner).secret.clone()
    }

    pub(crate) fn set_secret(&self, value: Option<String>) {
        write_lock(&self.inner).secret = value;
    }

    /// Serializes the object as one JSON document.
    pub fn to_json(&self) -> Result<Vec<u8>, ObjectError> {
        serde_json::to_vec(self).map_err(ObjectError::from)
    }

    /// Replaces this object's state from a JSON document.
    ///
    /// The input is decoded into a fresh shadow state which replaces the
    /// current state only on full success; on failure the object is
    /// unchanged.
    pub fn from_json(&self, src: &[u8]) -> Result<(), ObjectError> {
        let entries: BTreeMap<String, Value> = serde_json::from_slice(src)?;
        let fresh = ThingInner::load(entries)?;
        *write_lock(&self.inner) = fresh;
        Ok(())
    }
}

impl Clone for Thing {
    fn clone(&self) -> Self {
        let inner = read_lock(&self.inner);
        Self {
            inner: RwLock::new(inner.clone()),
        }
    }
}

impl Serialize for Thing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        let inner = read_lock(&self.inner);
        let mut entries: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in &inner.extra {
            entries.insert(key.clone(), value.clone());
        }
        if let Some(v) = &inner.count {
            entries.insert(
                THING_COUNT_KEY.to_string(),
                to_wire(THING_COUNT_KEY, v).map_err(S::Error::custom)?,
            );
        }
        if let Some(v) = &inner.data {
            entries.insert(
                THING_DATA_KEY.to_string(),
                to_wire(THING_DATA_KEY, v).map_err(S::Error::custom)?,
            );
        }
        {
            let v: String = String::from("thing");
            entries.insert(
                THING_KIND_KEY.to_string(),
                to_wire(THING_KIND_KEY, &v).map_err(S::Error::custom)?,
            );
        }
        if let Some(v) = &inner.name {
            entries.insert(
                THING_NAME_KEY.to_string(),
                to_wire(THING_NAME_KEY, v).map_err(S::Error::custom)?,
            );
        }
        if let Some(v) = &inner.tags {
            entries.insert(
                THING_TAGS_KEY.to_string(),
                to_wire(THING_TAGS_KEY, v).map_err(S::Error::custom)?,
            );
        }
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Thing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let inner = ThingInner::load(entries).map_err(D::Error::custom)?;
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}

/// Builds `Thing` values, validating required fields.
#[derive(Default)]
pub struct ThingBuilder {
    state: Mutex<ThingBuilderState>,
}

#[derive(Default)]
struct ThingBuilderState {
    object: Option<Thing>,
    error: Option<ObjectError>,
}

impl ThingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(self, key: &str, value: Value) -> Self {
        {
            let mut state = lock(&self.state);
            if state.error.is_none() {
                let object = state.object.get_or_insert_with(Thing::default);
                if let Err(err) = object.set(key, value) {
                    state.error = Some(err);
                }
            }
        }
        self
    }

    fn fail(self, err: ObjectError) -> Self {
        {
            let mut state = lock(&self.state);
            if state.error.is_none() {
                state.error = Some(err);
            }
        }
        self
    }

    pub fn count(self, value: i64) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => self.apply(THING_COUNT_KEY, v),
            Err(e) => self.fail(ObjectError::from(e)),
        }
    }

    pub fn data(self, value: Vec<u8>) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => self.apply(THING_DATA_KEY, v),
            Err(e) => self.fail(ObjectError::from(e)),
        }
    }

    pub fn name(self, value: impl Into<String>) -> Self {
        match serde_json::to_value(value.into()) {
            Ok(v) => self.apply(THING_NAME_KEY, v),
            Err(e) => self.fail(ObjectError::from(e)),
        }
    }

    pub fn tags<I>(self, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let collected: Vec<String> = values.into_iter().collect();
        match serde_json::to_value(collected) {
            Ok(v) => self.apply(THING_TAGS_KEY, v),
            Err(e) => self.fail(ObjectError::from(e)),
        }
    }

    /// Sets any key by name, bypassing the typed setters.
    pub fn set(self, key: &str, value: Value) -> Self {
        self.apply(key, value)
    }

    /// Validates required fields and returns the built object, resetting
    /// the builder for reuse.
    pub fn build(&mut self) -> Result<Thing, ObjectError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.error.take() {
            state.object = None;
            return Err(err);
        }
        let object = state.object.take().unwrap_or_default();
        if !object.has(THING_NAME_KEY) {
            return Err(ObjectError::RequiredField("Name".to_string()));
        }
        Ok(object)
    }

    /// Like [`ThingBuilder::build`], but panics on error.
    pub fn must_build(&mut self) -> Thing {
        match self.build() {
            Ok(object) => object,
            Err(err) => panic!("cannot build Thing: {err}"),
        }
    }
}

// === round trip and determinism ===

#[test]
fn marshal_is_deterministic_and_sorted() {
    let thing = Thing::default();
    thing.set(THING_NAME_KEY, Value::from("a")).unwrap();
    thing.set(THING_COUNT_KEY, Value::from(3)).unwrap();
    thing.set("zebra", Value::from(true)).unwrap();
    thing.set("alpha", Value::from(1)).unwrap();

    let first = thing.to_json().unwrap();
    let second = thing.to_json().unwrap();
    assert_eq!(first, second);

    let text = String::from_utf8(first).unwrap();
    assert_eq!(
        text,
        r#"{"alpha":1,"count":3,"kind":"thing","name":"a","zebra":true}"#
    );
}

#[test]
fn unmarshal_marshal_round_trips() {
    let thing = Thing::default();
    thing.set(THING_NAME_KEY, Value::from("a")).unwrap();
    thing.set(THING_TAGS_KEY, serde_json::json!(["x", "y"])).unwrap();
    thing.set("extra", Value::from(42)).unwrap();

    let json = thing.to_json().unwrap();
    let other = Thing::default();
    other.from_json(&json).unwrap();

    assert_eq!(thing.keys(), other.keys());
    for key in thing.keys() {
        assert_eq!(thing.get(&key).unwrap(), other.get(&key).unwrap());
    }

    // Deserializing a fresh object goes through the same path
    let direct: Thing = serde_json::from_slice(&json).unwrap();
    assert_eq!(direct.keys(), thing.keys());
}

#[test]
fn byte_fields_travel_as_base64() {
    let thing = Thing::default();
    thing.set(THING_DATA_KEY, serde_json::json!([1, 2, 3])).unwrap();
    let text = String::from_utf8(thing.to_json().unwrap()).unwrap();
    assert!(text.contains(r#""data":"AQID""#));
    assert_eq!(thing.data(), vec![1, 2, 3]);
}

// === presence semantics ===

#[test]
fn has_tracks_set_and_remove() {
    let thing = Thing::default();
    assert!(!thing.has(THING_NAME_KEY));
    assert!(!thing.has_name());

    thing.set(THING_NAME_KEY, Value::from("a")).unwrap();
    assert!(thing.has_name());

    thing.remove(THING_NAME_KEY);
    assert!(!thing.has_name());

    // Removing again is fine
    thing.remove(THING_NAME_KEY);
    assert!(!thing.has_name());
}

#[test]
fn absent_fields_read_as_zero_values() {
    let thing = Thing::default();
    assert_eq!(thing.name(), "");
    assert_eq!(thing.count(), 0);
    assert_eq!(thing.tags(), Vec::<String>::new());
    assert_eq!(thing.data(), Vec::<u8>::new());
}

#[test]
fn get_on_absent_key_fails() {
    let thing = Thing::default();
    match thing.get(THING_NAME_KEY) {
        Err(ObjectError::NoSuchKey(key)) => assert_eq!(key, "name"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        thing.get("nonexistent"),
        Err(ObjectError::NoSuchKey(_))
    ));
}

// === extra storage ===

#[test]
fn unknown_keys_land_in_extra_storage() {
    let thing = Thing::default();
    thing
        .from_json(br#"{"name":"a","extra":42}"#)
        .unwrap();
    assert_eq!(thing.get("extra").unwrap(), Value::from(42));
    assert_eq!(thing.keys(), vec!["extra", "kind", "name"]);
}

// === type mismatches ===

#[test]
fn set_with_wrong_type_fails_and_preserves_value() {
    let thing = Thing::default();
    thing.set(THING_NAME_KEY, Value::from("a")).unwrap();

    let err = thing.set(THING_NAME_KEY, Value::from(123)).unwrap_err();
    assert!(matches!(err, ObjectError::TypeMismatch { .. }));
    assert_eq!(thing.name(), "a");
}

#[test]
fn from_json_failure_leaves_object_unchanged() {
    let thing = Thing::default();
    thing.set(THING_NAME_KEY, Value::from("before")).unwrap();
    thing.set("note", Value::from("kept")).unwrap();

    // count must be a number; the whole document is rejected
    let err = thing
        .from_json(br#"{"count":"not a number","name":"after"}"#)
        .unwrap_err();
    assert!(matches!(err, ObjectError::TypeMismatch { .. }));
    assert_eq!(thing.name(), "before");
    assert_eq!(thing.get("note").unwrap(), Value::from("kept"));

    // Malformed JSON is rejected before any state change
    assert!(thing.from_json(b"{not json").is_err());
    assert_eq!(thing.name(), "before");
}

// === constant fields ===

#[test]
fn constant_field_ignores_set_and_always_reads_fixed_value() {
    let thing = Thing::default();
    assert_eq!(thing.kind(), "thing");
    assert!(thing.has_kind());

    thing.set(THING_KIND_KEY, Value::from("else")).unwrap();
    assert_eq!(thing.kind(), "thing");
    assert_eq!(thing.get(THING_KIND_KEY).unwrap(), Value::from("thing"));

    // Unmarshal likewise keeps the fixed value
    thing.from_json(br#"{"kind":"imposter","name":"a"}"#).unwrap();
    assert_eq!(thing.kind(), "thing");
}

// === extension fields ===

#[test]
fn extension_fields_are_invisible_to_the_generic_surface() {
    let thing = Thing::default();
    thing.set_secret(Some("hidden".to_string()));

    assert!(!thing.keys().iter().any(|k| k == "secret"));
    let text = String::from_utf8(thing.to_json().unwrap()).unwrap();
    assert!(!text.contains("hidden"));

    // A wire key named like the extension storage is ordinary extra data
    thing.set("secret", Value::from("wire")).unwrap();
    assert_eq!(thing.get("secret").unwrap(), Value::from("wire"));
    assert_eq!(thing.secret(), Some("hidden".to_string()));
}

// === clone ===

#[test]
fn clone_is_independent_of_the_original() {
    let thing = Thing::default();
    thing.set(THING_NAME_KEY, Value::from("a")).unwrap();
    thing.set("extra", Value::from(1)).unwrap();

    let copy = thing.clone();
    copy.remove(THING_NAME_KEY);
    copy.remove("extra");

    assert!(thing.has_name());
    assert!(thing.has("extra"));
    assert!(!copy.has_name());
}

// === builder ===

#[test]
fn build_without_required_field_fails_naming_it() {
    let err = ThingBuilder::new().build().unwrap_err();
    match err {
        ObjectError::RequiredField(name) => assert_eq!(name, "Name"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn build_with_required_field_succeeds() {
    let thing = ThingBuilder::new().name("a").build().unwrap();
    assert_eq!(thing.name(), "a");
    let text = String::from_utf8(thing.to_json().unwrap()).unwrap();
    assert_eq!(text, r#"{"kind":"thing","name":"a"}"#);
}

#[test]
fn builder_typed_setters_cover_all_storage_shapes() {
    let thing = ThingBuilder::new()
        .name("a")
        .count(7)
        .tags(vec!["x".to_string(), "y".to_string()])
        .data(vec![1, 2, 3])
        .build()
        .unwrap();
    assert_eq!(thing.count(), 7);
    assert_eq!(thing.tags(), vec!["x", "y"]);
    assert_eq!(thing.data(), vec![1, 2, 3]);
    assert!(thing.has_count());
    assert!(thing.has_data());
    assert!(thing.has_tags());
}

#[test]
fn builder_generic_set_reaches_extra_storage() {
    let thing = ThingBuilder::new()
        .name("a")
        .set("custom", Value::from(9))
        .build()
        .unwrap();
    assert_eq!(thing.get("custom").unwrap(), Value::from(9));
}

#[test]
fn builder_defers_setter_errors_to_build() {
    let err = ThingBuilder::new()
        .set(THING_COUNT_KEY, Value::from("wrong"))
        .name("a")
        .build()
        .unwrap_err();
    assert!(matches!(err, ObjectError::TypeMismatch { .. }));
}

#[test]
fn builder_resets_for_reuse_after_build() {
    let mut builder = ThingBuilder::new().name("first");
    let first = builder.build().unwrap();
    assert_eq!(first.name(), "first");

    // State was taken; the next build starts from scratch
    let err = builder.build().unwrap_err();
    assert!(matches!(err, ObjectError::RequiredField(_)));
}

#[test]
#[should_panic(expected = "cannot build Thing")]
fn must_build_panics_on_missing_required_field() {
    ThingBuilder::new().must_build();
}
