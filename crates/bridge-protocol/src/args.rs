use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{BridgeError, Result};

/// Named command arguments.
///
/// Accessors distinguish "absent" from "present with the wrong type": a
/// missing optional yields `Ok(None)`, a mistyped one yields
/// `InvalidArgument`. A JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Map<String, Value>);

impl Args {
    /// Empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Raw lookup; `null` reads as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Optional string argument.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mistyped(key, "string", other)),
        }
    }

    /// Required string argument.
    pub fn str(&self, key: &str) -> Result<&str> {
        self.opt_str(key)?
            .ok_or_else(|| BridgeError::invalid_argument(format!("'{key}' is required")))
    }

    /// Optional boolean argument.
    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mistyped(key, "bool", other)),
        }
    }

    /// Optional integer argument.
    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| mistyped(key, "integer", v)),
        }
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn mistyped(key: &str, expected: &str, got: &Value) -> BridgeError {
    BridgeError::invalid_argument(format!("'{key}' must be a {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn missing_and_mistyped_are_distinguished() {
        let args = Args::new().with("number", "555").with("level", "loud");
        assert_eq!(args.str("number").unwrap(), "555");
        assert_eq!(args.opt_str("absent").unwrap(), None);
        assert_eq!(
            args.str("absent").unwrap_err().kind,
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            args.opt_i64("level").unwrap_err().kind,
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn null_reads_as_absent() {
        let args: Args = serde_json::from_value(json!({"enable": null, "n": 5})).unwrap();
        assert_eq!(args.opt_bool("enable").unwrap(), None);
        assert_eq!(args.opt_i64("n").unwrap(), Some(5));
    }
}
