use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::script::behavior::Value;

/// A typed property override from a scene or template document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&OverrideValue> for Value {
    fn from(v: &OverrideValue) -> Self {
        match v {
            OverrideValue::Bool(b) => Value::Bool(*b),
            OverrideValue::Int(i) => Value::Int(*i),
            OverrideValue::Float(f) => Value::Float(*f),
            OverrideValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// One entry of an actor's `components` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentDoc {
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(flatten)]
    pub overrides: BTreeMap<String, OverrideValue>,
}

/// An actor as written in a scene or template file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActorDoc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentDoc>,
}

/// Contents of a `.scene` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SceneDoc {
    #[serde(default)]
    pub actors: Vec<ActorDoc>,
}

impl SceneDoc {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ActorDoc {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Read and parse a JSON document. Missing files and bad JSON are both fatal.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EngineError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scene_with_overrides() {
        let scene = SceneDoc::from_json(
            r#"{
                "actors": [
                    {
                        "name": "player",
                        "template": "Hero",
                        "components": {
                            "a": { "type": "Mover", "speed": 2.5, "lives": 3, "tag": "p1", "solid": true },
                            "b": { "speed": -1 }
                        }
                    },
                    { "name": "empty" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.actors.len(), 2);
        let player = &scene.actors[0];
        assert_eq!(player.name.as_deref(), Some("player"));
        assert_eq!(player.template.as_deref(), Some("Hero"));

        let a = &player.components["a"];
        assert_eq!(a.type_name.as_deref(), Some("Mover"));
        assert_eq!(a.overrides["speed"], OverrideValue::Float(2.5));
        assert_eq!(a.overrides["lives"], OverrideValue::Int(3));
        assert_eq!(a.overrides["tag"], OverrideValue::Str("p1".into()));
        assert_eq!(a.overrides["solid"], OverrideValue::Bool(true));
        assert!(!a.overrides.contains_key("type"));

        let b = &player.components["b"];
        assert!(b.type_name.is_none());
        assert_eq!(b.overrides["speed"], OverrideValue::Int(-1));

        assert!(scene.actors[1].components.is_empty());
    }

    #[test]
    fn nested_override_values_are_rejected() {
        let result = ActorDoc::from_json(r#"{"components": {"a": {"type": "Mover", "dir": [1, 2]}}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn read_document_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document::<SceneDoc>(&dir.path().join("nope.scene")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn read_document_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.scene");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_document::<SceneDoc>(&path).unwrap_err();
        assert!(matches!(err, EngineError::Malformed { .. }));
    }
}
