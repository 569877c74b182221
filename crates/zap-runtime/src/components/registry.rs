use std::collections::HashMap;

use crate::api::config::AssetPaths;
use crate::components::component::Component;
use crate::components::rigidbody;
use crate::error::{EngineError, EngineResult};
use crate::script::behavior::Behavior;
use crate::script::runtime::ScriptRuntime;

pub const COMPONENT_TYPES_DIR: &str = "component_types";

/// Loads component types on first use and builds every component instance.
///
/// Templates are cached by type name: instances inherit from the cached
/// template, so one template serves every component of its type.
pub struct ComponentRegistry {
    paths: AssetPaths,
    runtime: Box<dyn ScriptRuntime>,
    templates: HashMap<String, Behavior>,
}

impl ComponentRegistry {
    pub fn new(paths: AssetPaths, runtime: Box<dyn ScriptRuntime>) -> Self {
        Self {
            paths,
            runtime,
            templates: HashMap::new(),
        }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Register a type template directly, bypassing the search path.
    pub fn define(&mut self, type_name: &str, template: Behavior) {
        self.templates.insert(type_name.to_string(), template);
    }

    pub fn is_native(type_name: &str) -> bool {
        type_name == rigidbody::TYPE_NAME
    }

    pub fn is_loaded(&self, type_name: &str) -> bool {
        self.templates.contains_key(type_name)
    }

    /// A fresh component of `type_name` under `key`. Unknown types are fatal.
    pub fn load(&mut self, key: &str, type_name: &str) -> EngineResult<Component> {
        let behavior = if Self::is_native(type_name) {
            rigidbody::new_behavior()
        } else {
            Behavior::inheriting(&self.template(type_name)?)
        };
        Ok(Component::new(type_name, key, behavior))
    }

    /// A new component of the same type whose fields start out equal to
    /// `existing`'s, including its overrides. The two share no mutable state.
    pub fn clone_component(&self, existing: &Component, new_key: &str) -> Component {
        let behavior = if Self::is_native(existing.type_name()) {
            rigidbody::duplicate(existing.behavior())
        } else {
            Behavior::inheriting(&existing.behavior().snapshot())
        };
        Component::new(existing.type_name(), new_key, behavior)
    }

    fn template(&mut self, type_name: &str) -> EngineResult<Behavior> {
        if let Some(template) = self.templates.get(type_name) {
            return Ok(template.clone());
        }

        let path = self
            .paths
            .resolve(COMPONENT_TYPES_DIR, type_name, self.runtime.extension())
            .ok_or_else(|| EngineError::MissingComponentType(type_name.to_string()))?;
        let source = std::fs::read_to_string(&path).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        let template = self
            .runtime
            .evaluate(type_name, &source)
            .map_err(|message| EngineError::Script {
                path: path.clone(),
                message,
            })?;

        log::debug!("loaded component type {} from {}", type_name, path.display());
        self.templates.insert(type_name.to_string(), template.clone());
        Ok(template)
    }
}
