use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single test report as returned by the service.
///
/// There is no fixed schema: the service has produced many shapes over time,
/// so the record keeps the raw JSON object and logical fields are resolved on
/// read (see [`super::fields`]). Records are snapshots and are never edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(Map<String, Value>);

impl Report {
  /// Wrap a JSON value. Anything but an object (including `null`) is not a report.
  pub fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Object(map) => Some(Self(map)),
      _ => None,
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// Non-blank text stored under `key`. Numbers are rendered as text.
  pub fn text(&self, key: &str) -> Option<String> {
    self.get(key).and_then(scalar_text)
  }

  /// Server id, rendered as text so numeric and string ids look the same.
  pub fn id(&self) -> Option<String> {
    self.text("id")
  }
}

impl From<Map<String, Value>> for Report {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// Render a scalar JSON value as non-blank text.
///
/// Integral floats lose their fractional part so `3`, `3.0` and `"3"` agree.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        Some(i.to_string())
      } else if let Some(u) = n.as_u64() {
        Some(u.to_string())
      } else {
        n.as_f64().map(|f| {
          if f.fract() == 0.0 && f.abs() < 1e15 {
            format!("{}", f as i64)
          } else {
            f.to_string()
          }
        })
      }
    }
    _ => None,
  }
}
