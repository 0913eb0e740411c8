// Values crossing the script boundary.
//
// The script-language embedding itself lives outside this crate. What
// reaches the bindings is already marshaled into `ScriptValue`: null, bool,
// number, string, object (string-keyed, ordered), or a callable function.
// This module reads the few shapes the bindings accept:
//
// - pathing hint objects (`hints_from_script`): keys `nodeTypeFunction`,
//   `penaltyFunction`, `followRange`, `reachDistance`, `maxPathLength`.
//   `nodeTypeFunction` is called as `(x, y, z, block)` where `block` is the
//   lowercase `BlockKind` name of that voxel;
// - `{x, y, z}` position objects (`voxel_from_object`), floored to a voxel;
// - target functions returning such an object, wrapped as a `ScriptTarget`
//   resolver by `executor.rs`.
//
// Shape mismatches are caller contract violations (`MalformedHint`,
// `MalformedValue`), never coerced. Missing or null keys mean "use the
// default".
//
// `From<serde_json::Value>` converts plain JSON data (no functions), which
// is how tests and the demo build script values.

use crate::error::ControlError;
use crate::hints::TraversalHints;
use crate::types::{Vec3, VoxelCoord};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A callable script function.
pub type ScriptFunction =
    Arc<dyn Fn(&[ScriptValue]) -> Result<ScriptValue, ControlError> + Send + Sync>;

/// A value marshaled out of the script runtime.
#[derive(Clone, Default)]
pub enum ScriptValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(BTreeMap<String, ScriptValue>),
    Function(ScriptFunction),
}

impl ScriptValue {
    pub fn function(
        f: impl Fn(&[ScriptValue]) -> Result<ScriptValue, ControlError> + Send + Sync + 'static,
    ) -> Self {
        ScriptValue::Function(Arc::new(f))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, ScriptValue)>) -> Self {
        ScriptValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Position object `{x, y, z}`.
    pub fn position(pos: Vec3) -> Self {
        Self::object([
            ("x", ScriptValue::Number(pos.x)),
            ("y", ScriptValue::Number(pos.y)),
            ("z", ScriptValue::Number(pos.z)),
        ])
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(_) => "object",
            ScriptValue::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }

    /// Member lookup; `None` for missing keys and for non-objects.
    pub fn get(&self, key: &str) -> Option<&ScriptValue> {
        match self {
            ScriptValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Result<f64, ControlError> {
        match self {
            ScriptValue::Number(n) => Ok(*n),
            other => Err(mismatch("number", other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ControlError> {
        match self {
            ScriptValue::Bool(b) => Ok(*b),
            other => Err(mismatch("boolean", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, ControlError> {
        match self {
            ScriptValue::String(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    pub fn as_function(&self) -> Result<&ScriptFunction, ControlError> {
        match self {
            ScriptValue::Function(f) => Ok(f),
            other => Err(mismatch("function", other)),
        }
    }

    /// Call this value as a function.
    pub fn call(&self, args: &[ScriptValue]) -> Result<ScriptValue, ControlError> {
        (self.as_function()?)(args)
    }

    /// Plain-data view of this value; functions become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScriptValue::Null | ScriptValue::Function(_) => serde_json::Value::Null,
            ScriptValue::Bool(b) => serde_json::Value::Bool(*b),
            ScriptValue::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ScriptValue::String(s) => serde_json::Value::String(s.clone()),
            ScriptValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn mismatch(expected: &'static str, got: &ScriptValue) -> ControlError {
    ControlError::MalformedValue {
        expected,
        got: got.kind().to_string(),
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => f.write_str("Null"),
            ScriptValue::Bool(b) => write!(f, "Bool({b})"),
            ScriptValue::Number(n) => write!(f, "Number({n})"),
            ScriptValue::String(s) => write!(f, "String({s:?})"),
            ScriptValue::Object(map) => f.debug_map().entries(map.iter()).finish(),
            ScriptValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<serde_json::Value> for ScriptValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ScriptValue::Null,
            serde_json::Value::Bool(b) => ScriptValue::Bool(b),
            serde_json::Value::Number(n) => ScriptValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => ScriptValue::String(s),
            // Arrays are objects keyed by index, like script arrays.
            serde_json::Value::Array(items) => ScriptValue::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.into()))
                    .collect(),
            ),
            serde_json::Value::Object(map) => {
                ScriptValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Read an `{x, y, z}` object as a continuous position.
pub fn vec_from_object(value: &ScriptValue) -> Result<Vec3, ControlError> {
    if !matches!(value, ScriptValue::Object(_)) {
        return Err(mismatch("object", value));
    }
    let axis = |key: &str| {
        value
            .get(key)
            .ok_or(ControlError::MalformedValue {
                expected: "number",
                got: "undefined".to_string(),
            })
            .and_then(ScriptValue::as_number)
    };
    Ok(Vec3::new(axis("x")?, axis("y")?, axis("z")?))
}

/// Read an `{x, y, z}` object as the voxel containing it.
pub fn voxel_from_object(value: &ScriptValue) -> Result<VoxelCoord, ControlError> {
    Ok(VoxelCoord::containing(vec_from_object(value)?))
}

fn optional_number(hints: &ScriptValue, key: &str) -> Result<Option<f64>, ControlError> {
    match hints.get(key) {
        None | Some(ScriptValue::Null) => Ok(None),
        Some(v) => v.as_number().map(Some),
    }
}

fn optional_function(hints: &ScriptValue, key: &str) -> Result<Option<ScriptFunction>, ControlError> {
    match hints.get(key) {
        None | Some(ScriptValue::Null) => Ok(None),
        Some(ScriptValue::Function(f)) => Ok(Some(f.clone())),
        Some(other) => Err(ControlError::MalformedHint(format!(
            "{key} must be a function, got {}",
            other.kind()
        ))),
    }
}

/// Build traversal hints from a script hint object. `null` means no hints.
pub fn hints_from_script(value: &ScriptValue) -> Result<TraversalHints, ControlError> {
    let mut hints = TraversalHints::new();
    match value {
        ScriptValue::Null => return Ok(hints),
        ScriptValue::Object(_) => {}
        other => {
            return Err(ControlError::MalformedHint(format!(
                "hints must be an object, got {}",
                other.kind()
            )));
        }
    }

    if let Some(f) = optional_function(value, "nodeTypeFunction")? {
        hints = hints.with_node_types(move |view, pos| {
            let args = [
                ScriptValue::Number(f64::from(pos.x)),
                ScriptValue::Number(f64::from(pos.y)),
                ScriptValue::Number(f64::from(pos.z)),
                ScriptValue::from(view.block_at(pos).name()),
            ];
            match f(&args)? {
                ScriptValue::Null => Ok(None),
                ScriptValue::String(name) => Ok(Some(name)),
                other => Err(ControlError::MalformedHint(format!(
                    "nodeTypeFunction returned {}, expected string or null",
                    other.kind()
                ))),
            }
        });
    }

    if let Some(f) = optional_function(value, "penaltyFunction")? {
        hints = hints.with_penalties(move |ty| {
            match f(&[ScriptValue::String(ty.name().to_string())])? {
                ScriptValue::Null => Ok(None),
                ScriptValue::Number(n) => Ok(Some(n as f32)),
                other => Err(ControlError::MalformedHint(format!(
                    "penaltyFunction returned {}, expected number or null",
                    other.kind()
                ))),
            }
        });
    }

    if let Some(range) = optional_number(value, "followRange")? {
        hints = hints.with_follow_range(range as f32);
    }
    if let Some(reach) = optional_number(value, "reachDistance")? {
        if !reach.is_finite() || reach < 0.0 {
            return Err(ControlError::MalformedHint(format!(
                "reachDistance must be a non-negative number, got {reach}"
            )));
        }
        hints = hints.with_reach_distance(reach as u32);
    }
    if let Some(length) = optional_number(value, "maxPathLength")? {
        hints = hints.with_max_path_length(length as f32);
    }
    Ok(hints)
}
