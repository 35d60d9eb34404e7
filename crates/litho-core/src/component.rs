use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RenderError;
use crate::scope::ComponentScope;

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An immutable UI descriptor. Rendering is a pure function of the
/// component's props, its hook state and the tree props it reads.
pub trait Component: AsAny + fmt::Debug + Send + Sync + 'static {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError>;

    /// Props equivalence against a component of any type. Returning `false`
    /// forces an update whenever the component is re-rendered.
    fn is_equivalent(&self, other: &dyn Component) -> bool {
        let _ = other;
        false
    }

    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn component_type(&self) -> TypeId {
        self.as_any().type_id()
    }
}

/// Equivalence for components whose props implement `PartialEq`.
///
/// ```ignore
/// fn is_equivalent(&self, other: &dyn Component) -> bool {
///     props_equal(self, other)
/// }
/// ```
pub fn props_equal<T: Component + PartialEq>(this: &T, other: &dyn Component) -> bool {
    other.downcast_ref::<T>().is_some_and(|other| other == this)
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A shared handle to a component plus the optional manual key the parent
/// assigned to it.
#[derive(Clone)]
pub struct ComponentRef {
    component: Arc<dyn Component>,
    key: Option<Arc<str>>,
}

impl ComponentRef {
    pub fn new<C: Component>(component: C) -> Self {
        Self {
            component: Arc::new(component),
            key: None,
        }
    }

    pub fn from_arc(component: Arc<dyn Component>) -> Self {
        Self {
            component,
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.component.as_ref().name()
    }

    pub fn component_type(&self) -> TypeId {
        self.component.as_ref().component_type()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.component.as_ref().downcast_ref::<T>()
    }

    /// Same type, same manual key, and equivalent props.
    pub fn is_equivalent(&self, other: &ComponentRef) -> bool {
        if self.key != other.key {
            return false;
        }
        if Arc::ptr_eq(&self.component, &other.component) {
            return true;
        }
        self.component_type() == other.component_type()
            && self.component.is_equivalent(other.component.as_ref())
    }
}

impl<C: Component> From<C> for ComponentRef {
    fn from(component: C) -> Self {
        ComponentRef::new(component)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{:?} #{key}", self.component),
            None => fmt::Debug::fmt(&self.component, f),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Rendered {
    /// Delegates to another component without producing a host of its own.
    Component(ComponentRef),
    Node(NodeSpec),
    Nothing,
}

impl Rendered {
    pub fn component(component: impl Into<ComponentRef>) -> Self {
        Rendered::Component(component.into())
    }
}

impl From<NodeSpec> for Rendered {
    fn from(spec: NodeSpec) -> Self {
        Rendered::Node(spec)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

/// Box style consumed by the layout solver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Style {
    pub direction: FlexDirection,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub padding: f32,
}

impl Style {
    pub fn row() -> Self {
        Self {
            direction: FlexDirection::Row,
            ..Self::default()
        }
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn size(self, width: f32, height: f32) -> Self {
        self.width(width).height(height)
    }

    pub fn padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }
}

/// Identifies which pool a host view comes from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewType(Arc<str>);

impl ViewType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ViewType {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Debug for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewType({})", self.0)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(Arc<str>),
    Int(i64),
    Float(f32),
    Bool(bool),
    Color(u32),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(Arc::from(value))
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(Arc::from(value))
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

pub type ViewAttrs = BTreeMap<&'static str, AttrValue>;

/// What a host node mounts: the view type and the attributes bound to it.
#[derive(Clone, Debug, PartialEq)]
pub struct MountSpec {
    pub view_type: ViewType,
    pub attrs: ViewAttrs,
}

impl MountSpec {
    pub fn new(view_type: impl Into<ViewType>) -> Self {
        Self {
            view_type: view_type.into(),
            attrs: ViewAttrs::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name, value.into());
        self
    }
}

/// A host node: the layout style, the children in order, and optionally the
/// view it mounts. Nodes without a mount spec only take part in layout.
#[derive(Clone, Debug, Default)]
pub struct NodeSpec {
    pub style: Style,
    pub children: Vec<ComponentRef>,
    pub mount: Option<MountSpec>,
}

impl NodeSpec {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn leaf(style: Style, mount: MountSpec) -> Self {
        Self {
            style,
            children: Vec::new(),
            mount: Some(mount),
        }
    }

    pub fn child(mut self, child: impl Into<ComponentRef>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ComponentRef>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn mount(mut self, mount: MountSpec) -> Self {
        self.mount = Some(mount);
        self
    }
}
