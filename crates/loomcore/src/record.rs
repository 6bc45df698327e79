use serde_json::{Map, Value};

/// The universal payload passed between nodes: an untyped key/value record.
pub type Record = Map<String, Value>;

/// Defaulting accessors over a [`Record`].
///
/// Runners must tolerate absent or mistyped keys by falling back to empty
/// defaults instead of raising on read, so plain `get` calls are rarely
/// what node code wants.
pub trait RecordExt {
    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str;
    fn bool_or(&self, key: &str, default: bool) -> bool;
    fn f64_or(&self, key: &str, default: f64) -> f64;
    fn i64_or(&self, key: &str, default: i64) -> i64;

    /// True when the key is present and not `null`.
    fn has(&self, key: &str) -> bool;

    /// Loose truthiness: absent/null/false/0/"" are falsy, everything
    /// else is truthy.
    fn truthy(&self, key: &str) -> bool;
}

impl RecordExt for Record {
    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    fn has(&self, key: &str) -> bool {
        matches!(self.get(key), Some(v) if !v.is_null())
    }

    fn truthy(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }
}

/// Build a record from key/value pairs. Convenience for runners and tests.
pub fn record(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Record {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
