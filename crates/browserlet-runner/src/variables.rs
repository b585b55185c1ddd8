//! The runtime extracted-variables map.

use std::collections::HashMap;

use serde_json::Value;

/// `string -> any`, appended to as steps produce output; lifetime is one
/// script run.
#[derive(Debug, Clone, Default)]
pub struct ExtractedVariables(HashMap<String, Value>);

impl ExtractedVariables {
    /// An empty map, as a script starts with.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, overwriting any prior value (a step may
    /// legitimately re-run in a loop construct a future action adds).
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Resolve a dotted path (`h`, `row.0.name`, …) against the map: the
    /// first segment names a top-level variable, remaining segments index
    /// into arrays (by position) or objects (by key). Returns `None` for an
    /// unknown variable or a path that runs off the end of the value.
    pub fn lookup(&self, path: &str) -> Option<String> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let mut current = self.0.get(root)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(scalar_to_string(current))
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_top_level_string_variable() {
        let mut vars = ExtractedVariables::new();
        vars.set("h", Value::String("Example Domain".into()));
        assert_eq!(vars.lookup("h").as_deref(), Some("Example Domain"));
    }

    #[test]
    fn resolves_dotted_path_into_table_row() {
        let mut vars = ExtractedVariables::new();
        vars.set(
            "rows",
            serde_json::json!([{"name": "Widget", "qty": "3"}]),
        );
        assert_eq!(vars.lookup("rows.0.qty").as_deref(), Some("3"));
    }

    #[test]
    fn missing_variable_is_none() {
        let vars = ExtractedVariables::new();
        assert_eq!(vars.lookup("missing"), None);
    }
}
