//! Core types for spark-fiber.
//!
//! These are the view descriptors the reconciler consumes. A descriptor says
//! what a tree position should look like; the reconciler decides which host
//! mutations get it there.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::error::{ReconcileError, Result};
use crate::reconciler::Hooks;

// =============================================================================
// Key
// =============================================================================

/// Stable identity token distinguishing siblings under the same parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    /// Create a key from anything string-like.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Property values
// =============================================================================

/// A single attribute value on a host element.
///
/// Compared by value during the property diff, so floats use `PartialEq`
/// semantics (`NaN` always counts as changed).
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropValue {
    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by hosts for flag-like attributes.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty() && s != "false",
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Bool(b) => *b,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Property set of a tree position.
///
/// Host elements use `attributes` and `children`; host text uses `content`.
/// Function components receive the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    pub attributes: BTreeMap<String, PropValue>,
    pub children: Children,
    pub content: Option<String>,
}

impl Props {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Property set of a host text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Replace the children.
    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    /// Look up an attribute.
    pub fn attr(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    /// Text content, empty when unset.
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

// =============================================================================
// Children
// =============================================================================

/// What a parent renders beneath itself.
///
/// Only a single element or a single text child is reconciled. `List` is
/// accepted so callers can express it, but the reconciler reports it as
/// unsupported and renders nothing in its place.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Children {
    #[default]
    Empty,
    Element(Rc<Element>),
    Text(String),
    List(Vec<Children>),
}

impl Children {
    /// True when nothing should be rendered.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Element> for Children {
    fn from(value: Element) -> Self {
        Self::Element(Rc::new(value))
    }
}

impl From<Option<Element>> for Children {
    fn from(value: Option<Element>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

impl From<&str> for Children {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Children {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Children>> for Children {
    fn from(value: Vec<Children>) -> Self {
        Self::List(value)
    }
}

// =============================================================================
// Element descriptor
// =============================================================================

/// Declarative description of one tree position.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub element_type: ElementType,
    pub key: Option<Key>,
    pub props: Props,
}

impl Element {
    /// Host element with the given tag.
    pub fn host(tag: impl Into<String>, props: Props) -> Self {
        Self {
            element_type: ElementType::Host(tag.into()),
            key: None,
            props,
        }
    }

    /// Function component element.
    pub fn component(component: &Component, props: Props) -> Self {
        Self {
            element_type: ElementType::Component(component.clone()),
            key: None,
            props,
        }
    }

    /// Attach a key.
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Type discriminant of a descriptor.
///
/// A host tag produces a host element node, a component produces a function
/// component node.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Host(String),
    Component(Component),
}

impl ElementType {
    /// Host tag, if this is a host element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Host(tag) => Some(tag),
            Self::Component(_) => None,
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Component(component) => component.name(),
        }
    }
}

// =============================================================================
// Function components
// =============================================================================

/// Render function of a function component.
pub type RenderFn = dyn Fn(&Props, &mut Hooks) -> Result<Children>;

/// A named function component.
///
/// Two components are the same type only if they share the same render
/// function allocation; cloning a `Component` keeps its identity.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    /// Create a component from a render function that cannot fail.
    pub fn new(
        name: impl AsRef<str>,
        render: impl Fn(&Props, &mut Hooks) -> Children + 'static,
    ) -> Self {
        Self::try_new(name, move |props, hooks| Ok(render(props, hooks)))
    }

    /// Create a component whose render function can fail.
    ///
    /// An `Err` abandons the whole render; the committed tree stays as it was.
    pub fn try_new(
        name: impl AsRef<str>,
        render: impl Fn(&Props, &mut Hooks) -> Result<Children> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name.as_ref()),
            render: Rc::new(render),
        }
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the render function. A panic is caught and reported as
    /// [`ReconcileError::Render`].
    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks) -> Result<Children> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.render)(props, hooks))).unwrap_or_else(|payload| {
            Err(ReconcileError::Render {
                component: self.name.to_string(),
                message: panic_message(payload.as_ref()),
            })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_builders() {
        let props = Props::new()
            .with_attr("id", "main")
            .with_attr("tabindex", 2)
            .with_children("hi");

        assert_eq!(props.attr("id"), Some(&PropValue::Str("main".into())));
        assert_eq!(props.attr("tabindex"), Some(&PropValue::Int(2)));
        assert_eq!(props.children, Children::Text("hi".into()));
        assert_eq!(Props::text("x").content(), "x");
        assert_eq!(Props::new().content(), "");
    }

    #[test]
    fn test_component_identity() {
        let a = Component::new("A", |_, _| Children::Empty);
        let b = Component::new("A", |_, _| Children::Empty);

        // Same name, different render function
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(format!("{a:?}"), "Component(\"A\")");
    }

    #[test]
    fn test_render_errors_and_panics_become_render_errors() {
        use std::rc::Weak;

        use crate::engine::{NodeId, ScheduleUpdate};
        use crate::reconciler::FlushOutcome;

        struct Never;
        impl ScheduleUpdate for Never {
            fn schedule_update_on_node(&self, _: NodeId) -> Result<FlushOutcome> {
                Err(ReconcileError::Unmounted)
            }
        }
        let strong: Rc<dyn ScheduleUpdate> = Rc::new(Never);
        let scheduler: Weak<dyn ScheduleUpdate> = Rc::downgrade(&strong);
        let mut hooks = Hooks::mount(NodeId::default(), "test", scheduler);

        let failing = Component::try_new("Failing", |_, _| {
            Err(ReconcileError::Render {
                component: "Failing".into(),
                message: "no data".into(),
            })
        });
        assert_eq!(
            failing.render(&Props::new(), &mut hooks),
            Err(ReconcileError::Render {
                component: "Failing".into(),
                message: "no data".into(),
            })
        );

        let panicking = Component::new("Panicking", |_, _| panic!("boom"));
        assert_eq!(
            panicking.render(&Props::new(), &mut hooks),
            Err(ReconcileError::Render {
                component: "Panicking".into(),
                message: "boom".into(),
            })
        );

        let formatted = Component::new("Formatted", |_, _| panic!("bad index {}", 3));
        match formatted.render(&Props::new(), &mut hooks) {
            Err(ReconcileError::Render { message, .. }) => assert_eq!(message, "bad index 3"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_element_type_names() {
        let host = ElementType::Host("div".into());
        assert_eq!(host.tag(), Some("div"));
        assert_eq!(host.name(), "div");

        let comp = Component::new("Counter", |_, _| Children::Empty);
        let ty = ElementType::Component(comp);
        assert_eq!(ty.tag(), None);
        assert_eq!(ty.name(), "Counter");
    }

    #[test]
    fn test_truthiness() {
        assert!(PropValue::Bool(true).is_truthy());
        assert!(!PropValue::Str("false".into()).is_truthy());
        assert!(!PropValue::Int(0).is_truthy());
        assert!(PropValue::from("yes").is_truthy());
    }

    #[test]
    fn test_children_conversions() {
        assert!(Children::from(None::<Element>).is_empty());
        let el = Element::host("p", Props::new()).with_key("k");
        match Children::from(el) {
            Children::Element(e) => assert_eq!(e.key, Some(Key::from("k"))),
            other => panic!("unexpected {other:?}"),
        }
    }
}
