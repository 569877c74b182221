use std::collections::HashMap;

use crate::api::config::AssetPaths;
use crate::assets::documents::{read_document, ActorDoc, SceneDoc};
use crate::components::registry::ComponentRegistry;
use crate::core::actor::Actor;
use crate::error::{EngineError, EngineResult};

pub const TEMPLATES_DIR: &str = "actor_templates";
pub const TEMPLATE_EXT: &str = "template";
pub const SCENES_DIR: &str = "scenes";
pub const SCENE_EXT: &str = "scene";

/// Actor templates, loaded once and copied on every instantiation.
pub struct TemplateDb {
    paths: AssetPaths,
    templates: HashMap<String, Actor>,
}

impl TemplateDb {
    pub fn new(paths: AssetPaths) -> Self {
        Self {
            paths,
            templates: HashMap::new(),
        }
    }

    /// A fresh copy of template `name`. Copies never share component state
    /// with the cached template or with each other.
    pub fn instantiate(&mut self, name: &str, registry: &mut ComponentRegistry) -> EngineResult<Actor> {
        if let Some(template) = self.templates.get(name) {
            return Ok(template.copy(registry));
        }

        let path = self
            .paths
            .resolve(TEMPLATES_DIR, name, TEMPLATE_EXT)
            .ok_or_else(|| EngineError::MissingTemplate(name.to_string()))?;
        let doc: ActorDoc = read_document(&path)?;

        let mut template = Actor::new(doc.name.as_deref().unwrap_or(name));
        template.set_template_name(name);
        template.apply_definition(&doc, registry)?;
        log::debug!("template {} loaded from {}", name, path.display());

        let copy = template.copy(registry);
        self.templates.insert(name.to_string(), template);
        Ok(copy)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

/// Parsed scene documents, cached by name so a scene can be reloaded cheaply.
pub struct SceneDb {
    paths: AssetPaths,
    docs: HashMap<String, SceneDoc>,
}

impl SceneDb {
    pub fn new(paths: AssetPaths) -> Self {
        Self {
            paths,
            docs: HashMap::new(),
        }
    }

    /// Build the actors of scene `name`, in document order. Actors naming a
    /// template start as a copy of it; the document's components layer on top.
    pub fn load(
        &mut self,
        name: &str,
        templates: &mut TemplateDb,
        registry: &mut ComponentRegistry,
    ) -> EngineResult<Vec<Actor>> {
        if !self.docs.contains_key(name) {
            let path = self
                .paths
                .resolve(SCENES_DIR, name, SCENE_EXT)
                .ok_or_else(|| EngineError::MissingScene(name.to_string()))?;
            let doc: SceneDoc = read_document(&path)?;
            self.docs.insert(name.to_string(), doc);
        }
        let Some(doc) = self.docs.get(name) else {
            return Err(EngineError::MissingScene(name.to_string()));
        };

        let mut actors = Vec::with_capacity(doc.actors.len());
        for actor_doc in &doc.actors {
            let mut actor = match &actor_doc.template {
                Some(template) => templates.instantiate(template, registry)?,
                None => Actor::new(""),
            };
            if let Some(actor_name) = &actor_doc.name {
                actor.set_name(actor_name);
            }
            actor.apply_definition(actor_doc, registry)?;
            actors.push(actor);
        }
        Ok(actors)
    }
}
