use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use crate::api::context::EngineContext;
use crate::api::types::ActorId;
use crate::core::physics::Collision;
use crate::error::ScriptResult;

/// Signature of every callable stored on a behavior object.
/// Receives the engine context, the behavior it was looked up on (`self`) and call arguments.
pub type NativeFn = dyn Fn(&mut EngineContext, &Behavior, &[Value]) -> ScriptResult;

/// A callable field value.
#[derive(Clone)]
pub struct Callback(Rc<NativeFn>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut EngineContext, &Behavior, &[Value]) -> ScriptResult + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, ctx: &mut EngineContext, this: &Behavior, args: &[Value]) -> ScriptResult {
        (self.0)(ctx, this, args)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A field value on a behavior object.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vec2(Vec2),
    Actor(ActorId),
    Collision(Collision),
    Object(Behavior),
    Function(Callback),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `Nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_actor(&self) -> Option<ActorId> {
        match self {
            Value::Actor(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_collision(&self) -> Option<&Collision> {
        match self {
            Value::Collision(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Behavior> {
        match self {
            Value::Object(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callback> {
        match self {
            Value::Function(cb) => Some(cb),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Vec2(_) => "vec2",
            Value::Actor(_) => "actor",
            Value::Collision(_) => "collision",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Vec2(v) => write!(f, "{v:?}"),
            Value::Actor(id) => write!(f, "actor {id}"),
            Value::Collision(c) => write!(f, "{c:?}"),
            Value::Object(_) | Value::Function(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vec2(a), Value::Vec2(b)) => a == b,
            (Value::Actor(a), Value::Actor(b)) => a == b,
            (Value::Collision(a), Value::Collision(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vec2(v)
    }
}

impl From<ActorId> for Value {
    fn from(id: ActorId) -> Self {
        Value::Actor(id)
    }
}

impl From<Collision> for Value {
    fn from(c: Collision) -> Self {
        Value::Collision(c)
    }
}

impl From<Behavior> for Value {
    fn from(b: Behavior) -> Self {
        Value::Object(b)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Function(cb)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

struct Object {
    fields: HashMap<String, Value>,
    parent: Option<Behavior>,
}

/// A reference-counted bag of named fields with a prototype chain.
///
/// Reads walk instance -> parent -> grandparent until a field is found.
/// Writes always land on the instance itself, so a template shared by many
/// instances is never modified through one of them.
#[derive(Clone)]
pub struct Behavior(Rc<RefCell<Object>>);

impl Behavior {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Object {
            fields: HashMap::new(),
            parent: None,
        })))
    }

    /// A fresh, empty object whose lookups fall back to `parent`.
    pub fn inheriting(parent: &Behavior) -> Self {
        Self(Rc::new(RefCell::new(Object {
            fields: HashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    pub fn parent(&self) -> Option<Behavior> {
        self.0.borrow().parent.clone()
    }

    /// Look a field up through the inheritance chain. Absent fields read as `Nil`.
    pub fn get(&self, name: &str) -> Value {
        let mut current = self.clone();
        loop {
            let next = {
                let obj = current.0.borrow();
                if let Some(value) = obj.fields.get(name) {
                    return value.clone();
                }
                obj.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Value::Nil,
            }
        }
    }

    /// Assign an own field. Assigning `Nil` deletes it, re-exposing the inherited value.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut obj = self.0.borrow_mut();
        if value.is_nil() {
            obj.fields.remove(name);
        } else {
            obj.fields.insert(name.to_string(), value);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_nil()
    }

    /// True if the field is set on this object itself, not inherited.
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().fields.contains_key(name)
    }

    /// Names of fields set on this object itself, sorted.
    pub fn own_field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().fields.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set_callback<F>(&self, name: &str, f: F)
    where
        F: Fn(&mut EngineContext, &Behavior, &[Value]) -> ScriptResult + 'static,
    {
        self.set(name, Value::Function(Callback::new(f)));
    }

    /// The callable stored under `name`, if any (own or inherited).
    pub fn callback(&self, name: &str) -> Option<Callback> {
        match self.get(name) {
            Value::Function(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Behavior) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A detached copy of this object's own fields, sharing the same parent.
    /// Later writes to either side are invisible to the other.
    pub fn snapshot(&self) -> Behavior {
        let obj = self.0.borrow();
        Self(Rc::new(RefCell::new(Object {
            fields: obj.fields.clone(),
            parent: obj.parent.clone(),
        })))
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(obj) => {
                let mut names: Vec<&String> = obj.fields.keys().collect();
                names.sort();
                f.debug_struct("Behavior")
                    .field("fields", &names)
                    .field("inherits", &obj.parent.is_some())
                    .finish()
            }
            Err(_) => write!(f, "Behavior(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_parent() {
        let template = Behavior::new();
        template.set("speed", 5);
        let instance = Behavior::inheriting(&template);
        assert_eq!(instance.get("speed"), Value::Int(5));
        assert!(!instance.has_own("speed"));
        assert_eq!(instance.get("missing"), Value::Nil);
    }

    #[test]
    fn writes_stay_on_the_instance() {
        let template = Behavior::new();
        template.set("speed", 5);
        let a = Behavior::inheriting(&template);
        let b = Behavior::inheriting(&template);
        a.set("speed", 9);
        assert_eq!(a.get("speed"), Value::Int(9));
        assert_eq!(b.get("speed"), Value::Int(5));
        assert_eq!(template.get("speed"), Value::Int(5));
    }

    #[test]
    fn setting_nil_reexposes_inherited_value() {
        let template = Behavior::new();
        template.set("name", "base");
        let instance = Behavior::inheriting(&template);
        instance.set("name", "own");
        instance.set("name", Value::Nil);
        assert_eq!(instance.get("name"), Value::from("base"));
    }

    #[test]
    fn snapshot_is_isolated_both_ways() {
        let original = Behavior::new();
        original.set("hp", 10);
        let frozen = original.snapshot();
        let copy = Behavior::inheriting(&frozen);

        original.set("hp", 1);
        assert_eq!(copy.get("hp"), Value::Int(10));

        copy.set("hp", 50);
        assert_eq!(original.get("hp"), Value::Int(1));
    }

    #[test]
    fn callbacks_are_found_through_the_chain() {
        let template = Behavior::new();
        template.set_callback("OnUpdate", |_, _, _| Ok(()));
        let instance = Behavior::inheriting(&template);
        assert!(instance.callback("OnUpdate").is_some());
        assert!(instance.callback("OnStart").is_none());
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::Float(3.0).as_int(), Some(3));
        assert_eq!(Value::Float(3.5).as_int(), None);
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert!(Value::Int(0).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert_eq!(Value::from(None::<i64>), Value::Nil);
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Behavior::new();
        let b = Behavior::new();
        assert_eq!(Value::from(a.clone()), Value::from(a));
        assert_ne!(Value::from(b), Value::from(Behavior::new()));
    }
}
