use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::Deserializer;
use serde::ser::{Error as _, SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};
use crate::map::Map;

/// A dynamically-typed tree value.
///
/// Scalars are held inline. Arrays and objects are shared handles: cloning a
/// `Value` aliases the same container, which is what lets a tree contain
/// repeated references and cycles. Use [`crate::deep_clone`] for a structural
/// copy.
///
/// Equality (`==`) is structural deep equality, with `NaN` equal to `NaN`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Date(DateTime<Utc>),
    Regex(RegexLiteral),
}

impl Value {
    /// A fresh, empty object.
    pub fn object() -> Self {
        Self::Object(Object::new())
    }

    /// A fresh, empty array.
    pub fn array() -> Self {
        Self::Array(Array::new())
    }

    /// A date from milliseconds since the Unix epoch.
    pub fn date_from_millis(millis: i64) -> Result<Self> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Self::Date)
            .ok_or_else(|| TypeError::InvalidDate(millis.to_string()))
    }

    /// A date parsed from RFC 3339 text.
    pub fn date_from_rfc3339(text: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(text)
            .map(|d| Self::Date(d.with_timezone(&Utc)))
            .map_err(|e| TypeError::InvalidDate(format!("{text}: {e}")))
    }

    /// A regex literal value.
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::Regex(RegexLiteral::new(source, flags))
    }

    /// Whether this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The array handle, if this is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Identity of the container behind this value, if it is one.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Array(array) => Some(array.node_id()),
            Self::Object(object) => Some(object.node_id()),
            _ => None,
        }
    }

    /// Strict identity: containers must be the same handle, scalars must be
    /// equal values (`NaN` is never identical to itself here).
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a == b,
            _ => false,
        }
    }

    /// Convert into a `serde_json::Value`. Fails on cyclic values.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::ops::deep_equals(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(array) => fmt::Debug::fmt(array, f),
            Self::Object(object) => fmt::Debug::fmt(object, f),
            Self::Date(date) => write!(f, "Date({})", date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Regex(regex) => write!(f, "{regex}"),
        }
    }
}

/// Plain-text rendering: strings without quotes, dates as RFC 3339, regexes as
/// `/source/flags`, containers as compact JSON (`[Circular]` when cyclic).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Date(date) => f.write_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Regex(regex) => write!(f, "{regex}"),
            Self::Array(_) | Self::Object(_) => match serde_json::to_string(self) {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str("[Circular]"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Container handles
// ---------------------------------------------------------------------------

/// Identity of a shared container, stable for the container's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Shared, interior-mutable array handle.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    /// A fresh, empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// An array holding `items`.
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Borrow the elements.
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    /// Borrow the elements mutably.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// The element at `index`, as an aliasing handle.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Append `value`.
    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Shallow snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Whether both handles point at the same array.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of this array.
    pub fn node_id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as *const () as usize)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self::from_vec(items)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = ActiveNode::enter(self.node_id()) else {
            return f.write_str("[Circular]");
        };
        match self.0.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => f.write_str("[<borrowed>]"),
        }
    }
}

/// Shared, interior-mutable object handle.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Map>>);

impl Object {
    /// A fresh, empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// An object holding the entries of `map`.
    pub fn from_map(map: Map) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Borrow the entries.
    pub fn borrow(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    /// Borrow the entries mutably.
    pub fn borrow_mut(&self) -> RefMut<'_, Map> {
        self.0.borrow_mut()
    }

    /// Number of own keys.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the object has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// The value under `key`, as an aliasing handle.
    pub fn get<Q>(&self, key: &Q) -> Option<Value>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.0.borrow().get(key).cloned()
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.0.borrow().contains_key(key)
    }

    /// Insert or overwrite, returning the replaced value.
    pub fn insert(&self, key: impl Into<Key>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<Value>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.0.borrow_mut().remove(key)
    }

    /// Own keys in enumeration order: names first, then symbols.
    pub fn keys(&self) -> Vec<Key> {
        self.0.borrow().own_keys()
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of this object.
    pub fn node_id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as *const () as usize)
    }
}

impl From<Map> for Object {
    fn from(map: Map) -> Self {
        Self::from_map(map)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = ActiveNode::enter(self.node_id()) else {
            return f.write_str("{Circular}");
        };
        match self.0.try_borrow() {
            Ok(map) => f.debug_map().entries(map.iter()).finish(),
            Err(_) => f.write_str("{<borrowed>}"),
        }
    }
}

thread_local! {
    static ACTIVE_NODES: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a container as being walked by a recursive formatter/serializer.
struct ActiveNode(NodeId);

impl ActiveNode {
    /// `None` when the node is already on the walk stack (a cycle).
    fn enter(id: NodeId) -> Option<Self> {
        ACTIVE_NODES.with(|nodes| {
            let mut nodes = nodes.borrow_mut();
            if nodes.contains(&id) {
                None
            } else {
                nodes.push(id);
                Some(Self(id))
            }
        })
    }
}

impl Drop for ActiveNode {
    fn drop(&mut self) {
        ACTIVE_NODES.with(|nodes| {
            let mut nodes = nodes.borrow_mut();
            if let Some(pos) = nodes.iter().rposition(|id| *id == self.0) {
                nodes.remove(pos);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// An identity-unique symbol used as an object key.
///
/// Two symbols are equal only if one was cloned from the other; symbols
/// created separately with the same description are distinct.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    /// A new symbol, distinct from every other.
    pub fn new(description: &str) -> Self {
        Self(Rc::from(description))
    }

    /// The text the symbol was created with.
    pub fn description(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// An object key: a string name or a symbol.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Symbol(Symbol),
}

impl Key {
    /// The name, unless this is a symbol.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }

    /// Whether this is a symbol key.
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// The name, or the symbol's description.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Symbol(symbol) => symbol.description(),
        }
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::Name(name) if name == other)
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => write!(f, "Symbol({})", symbol.description()),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Symbol(symbol) => fmt::Debug::fmt(symbol, f),
        }
    }
}

/// Symbols serialize as their description.
impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Name)
    }
}

// ---------------------------------------------------------------------------
// Regex literals
// ---------------------------------------------------------------------------

/// A regular expression carried as data: its source and flags.
///
/// Regex values are compared and rendered by their `/source/flags` text; they
/// are never compiled.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegexLiteral {
    source: String,
    flags: String,
}

impl RegexLiteral {
    /// A literal from its source and flags.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// The pattern text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The flag characters.
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for RegexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl FromStr for RegexLiteral {
    type Err = TypeError;

    /// Parse `/source/flags` text.
    fn from_str(text: &str) -> Result<Self> {
        let body = text
            .strip_prefix('/')
            .ok_or_else(|| TypeError::InvalidRegex(text.to_string()))?;
        let end = body
            .rfind('/')
            .ok_or_else(|| TypeError::InvalidRegex(text.to_string()))?;
        Ok(Self::new(&body[..end], &body[end + 1..]))
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Array::from_vec(items))
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Self::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Object(Object::from_map(map))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(date)
    }
}

impl From<RegexLiteral> for Value {
    fn from(regex: RegexLiteral) -> Self {
        Self::Regex(regex)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(Array::from_vec(items.into_iter().map(Self::from).collect()))
            }
            serde_json::Value::Object(entries) => Self::Object(Object::from_map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Key::Name(k), Self::from(v)))
                    .collect(),
            )),
        }
    }
}

/// Largest integer magnitude an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// JSON form: dates as RFC 3339 text, regexes as `/source/flags`, non-finite
/// numbers as `null`, symbol-keyed entries omitted. Cyclic values fail.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(array) => {
                let Some(_guard) = ActiveNode::enter(array.node_id()) else {
                    return Err(S::Error::custom("cannot serialize a cyclic value"));
                };
                let items = array.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let Some(_guard) = ActiveNode::enter(object.node_id()) else {
                    return Err(S::Error::custom("cannot serialize a cyclic value"));
                };
                let map = object.borrow();
                let named: Vec<(&str, &Value)> = map
                    .iter()
                    .filter_map(|(k, v)| k.as_name().map(|name| (name, v)))
                    .collect();
                let mut out = serializer.serialize_map(Some(named.len()))?;
                for (name, value) in named {
                    out.serialize_entry(name, value)?;
                }
                out.end()
            }
            Self::Date(date) => {
                serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Regex(regex) => serializer.collect_str(regex),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}
