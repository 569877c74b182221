//! Fixtures shared by the unit tests: an on-disk resource tree and a call log.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::api::config::{AssetPaths, GameConfig};
use crate::api::context::EngineContext;
use crate::api::engine::Engine;
use crate::assets::templates::{SCENES_DIR, SCENE_EXT, TEMPLATES_DIR, TEMPLATE_EXT};
use crate::components::registry::{ComponentRegistry, COMPONENT_TYPES_DIR};
use crate::script::runtime::BindingRuntime;

/// A temporary project: `resources/` is the project tier, `core/` the builtin tier.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn resources(&self) -> PathBuf {
        self.dir.path().join("resources")
    }

    pub fn builtin(&self) -> PathBuf {
        self.dir.path().join("core")
    }

    pub fn paths(&self) -> AssetPaths {
        AssetPaths::new(self.resources(), self.builtin())
    }

    pub fn write(&self, path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn component_type(&self, name: &str, json: &str) {
        let path = self.resources().join(COMPONENT_TYPES_DIR).join(format!("{name}.json"));
        self.write(&path, json);
    }

    pub fn builtin_type(&self, name: &str, json: &str) {
        let path = self.builtin().join(COMPONENT_TYPES_DIR).join(format!("{name}.json"));
        self.write(&path, json);
    }

    pub fn template(&self, name: &str, json: &str) {
        let path = self.resources().join(TEMPLATES_DIR).join(format!("{name}.{TEMPLATE_EXT}"));
        self.write(&path, json);
    }

    pub fn scene(&self, name: &str, json: &str) {
        let path = self.resources().join(SCENES_DIR).join(format!("{name}.{SCENE_EXT}"));
        self.write(&path, json);
    }

    /// A context with default config and an empty binding runtime. No scene is loaded.
    pub fn context(&self) -> EngineContext {
        let config = GameConfig::default().with_initial_scene("main");
        EngineContext::new(config, self.paths(), Box::new(BindingRuntime::new()))
    }

    /// A started engine sitting at `initial_scene`.
    pub fn engine(&self, runtime: BindingRuntime, initial_scene: &str) -> Engine {
        let config = GameConfig::default().with_initial_scene(initial_scene);
        let mut engine = Engine::new(config, self.paths(), Box::new(runtime));
        engine.start().unwrap();
        engine
    }
}

/// Records callback invocations in order.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// A registry over a fresh project, with `setup` applied to it.
pub fn memory_registry(setup: impl FnOnce(&mut ComponentRegistry)) -> (ComponentRegistry, Project) {
    let project = Project::new();
    let mut registry = ComponentRegistry::new(project.paths(), Box::new(BindingRuntime::new()));
    setup(&mut registry);
    (registry, project)
}
