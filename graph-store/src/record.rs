//! Row records returned by read queries.

use std::collections::HashMap;

use serde_json::Value;

/// One result row, keyed by the query's column names.
///
/// Values are untyped JSON; the accessors below cover the handful of shapes
/// the enrichment passes actually read (strings, integers, string lists).
#[derive(Debug, Clone)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub(crate) fn new(columns: &[String], row: Vec<Value>) -> Self {
        let fields = columns.iter().cloned().zip(row).collect();
        Self { fields }
    }

    /// Raw JSON value for a column, if present and non-null.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// String column.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    /// Owned string column.
    pub fn string(&self, key: &str) -> Option<String> {
        self.str(key).map(str::to_owned)
    }

    /// Integer column.
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.value(key).and_then(Value::as_i64)
    }

    /// List-of-strings column; null entries are dropped.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.value(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors() {
        let columns = vec!["path".to_string(), "depth".to_string(), "fqns".to_string()];
        let record = Record::new(
            &columns,
            vec![json!("/a/b"), json!(3), json!(["p.X", null, "p.Y"])],
        );

        assert_eq!(record.str("path"), Some("/a/b"));
        assert_eq!(record.i64("depth"), Some(3));
        assert_eq!(record.string_list("fqns"), vec!["p.X", "p.Y"]);
        assert!(record.str("missing").is_none());
    }

    #[test]
    fn null_is_absent() {
        let columns = vec!["summary".to_string()];
        let record = Record::new(&columns, vec![json!(null)]);
        assert!(record.value("summary").is_none());
        assert!(record.string("summary").is_none());
    }
}
