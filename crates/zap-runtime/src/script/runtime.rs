use std::collections::HashMap;

use glam::Vec2;

use crate::script::behavior::{Behavior, Value};

/// The scripting backend the component registry compiles component types with.
pub trait ScriptRuntime {
    /// File extension of component type sources, without the dot.
    fn extension(&self) -> &str;

    /// Turn the source of component type `type_name` into its template object.
    /// The error string is reported together with the source path.
    fn evaluate(&self, type_name: &str, source: &str) -> Result<Behavior, String>;
}

type Binding = Box<dyn Fn(&Behavior)>;

/// Component types written as JSON field defaults, with callbacks supplied by
/// Rust closures registered under a binding name.
///
/// ```json
/// { "behavior": "Spinner", "speed": 90.0, "label": "wheel" }
/// ```
///
/// Without a `behavior` key the binding registered under the type name is used,
/// if there is one. A type with no binding at all is pure data.
pub struct BindingRuntime {
    bindings: HashMap<String, Binding>,
}

impl BindingRuntime {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Register a binding. `install` receives the fresh template and sets callbacks on it.
    pub fn bind(&mut self, name: &str, install: impl Fn(&Behavior) + 'static) {
        self.bindings.insert(name.to_string(), Box::new(install));
    }

    pub fn with_binding(mut self, name: &str, install: impl Fn(&Behavior) + 'static) -> Self {
        self.bind(name, install);
        self
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

impl Default for BindingRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRuntime for BindingRuntime {
    fn extension(&self) -> &str {
        "json"
    }

    fn evaluate(&self, type_name: &str, source: &str) -> Result<Behavior, String> {
        let doc: serde_json::Value = serde_json::from_str(source).map_err(|e| e.to_string())?;
        let serde_json::Value::Object(fields) = doc else {
            return Err("component type must be a JSON object".to_string());
        };

        let template = Behavior::new();

        let binding = match fields.get("behavior") {
            Some(serde_json::Value::String(name)) => match self.bindings.get(name) {
                Some(binding) => Some(binding),
                None => return Err(format!("unknown behavior binding `{name}`")),
            },
            Some(_) => return Err("`behavior` must name a binding".to_string()),
            None => self.bindings.get(type_name),
        };
        if let Some(install) = binding {
            install(&template);
        }

        for (name, value) in fields.iter().filter(|(name, _)| name.as_str() != "behavior") {
            // A null never clears a callback the binding installed.
            if value.is_null() && template.callback(name).is_some() {
                continue;
            }
            template.set(name, json_to_value(name, value)?);
        }

        Ok(template)
    }
}

fn json_to_value(name: &str, value: &serde_json::Value) -> Result<Value, String> {
    match value {
        serde_json::Value::Null => Ok(Value::Nil),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("field `{name}` is not a representable number")),
        },
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => match items.as_slice() {
            [x, y] => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => Ok(Value::Vec2(Vec2::new(x as f32, y as f32))),
                _ => Err(format!("field `{name}`: only [x, y] number pairs are supported")),
            },
            _ => Err(format!("field `{name}`: only [x, y] number pairs are supported")),
        },
        serde_json::Value::Object(_) => Err(format!("field `{name}`: nested objects are not supported")),
    }
}
