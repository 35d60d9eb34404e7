use std::fmt;
use std::sync::Arc;

use litho_core::hash::hash_one;
use litho_core::{ComponentRef, Deps, Diffable};

/// A child id: explicit, or generated by the enclosing [`CollectionScope`].
///
/// [`CollectionScope`]: crate::CollectionScope
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Int(i64),
    Str(Arc<str>),
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Int(value)
    }
}

impl From<i32> for ItemId {
    fn from(value: i32) -> Self {
        ItemId::Int(value.into())
    }
}

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        ItemId::Int(value.into())
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Str(Arc::from(value))
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId::Str(Arc::from(value))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(value) => write!(f, "{value}"),
            ItemId::Str(value) => f.write_str(value),
        }
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(value) => write!(f, "{value}"),
            ItemId::Str(value) => write!(f, "{value:?}"),
        }
    }
}

/// Ids of the sub-collections enclosing a child, outermost first.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopePath(Arc<[ItemId]>);

impl ScopePath {
    pub fn root() -> Self {
        ScopePath(Arc::from(Vec::new()))
    }

    pub fn child(&self, id: ItemId) -> Self {
        let mut ids = self.0.to_vec();
        ids.push(id);
        ScopePath(Arc::from(ids))
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ScopePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for id in self.0.iter() {
            write!(f, "/{id}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Effective identity of a collection child: its local id qualified by the
/// enclosing scope path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub local: ItemId,
    pub scope: ScopePath,
}

impl ItemKey {
    pub fn new(local: impl Into<ItemId>, scope: ScopePath) -> Self {
        Self {
            local: local.into(),
            scope,
        }
    }

    /// Root-scope key.
    pub fn root(local: impl Into<ItemId>) -> Self {
        Self::new(local, ScopePath::root())
    }

    /// Hash of the key, usable as a stable adapter item id.
    pub fn stable_id(&self) -> u64 {
        hash_one(self)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_root() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{}@{}", self.local, self.scope)
        }
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub type ComponentFactory = Arc<dyn Fn() -> Option<ComponentRef> + Send + Sync>;

#[derive(Clone)]
pub enum ChildContent {
    Component(ComponentRef),
    /// Rendered lazily; may produce nothing.
    Factory(ComponentFactory),
}

impl ChildContent {
    pub fn render(&self) -> Option<ComponentRef> {
        match self {
            ChildContent::Component(component) => Some(component.clone()),
            ChildContent::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for ChildContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildContent::Component(component) => {
                f.debug_tuple("Component").field(component).finish()
            }
            ChildContent::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Layout hints forwarded to the host list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutHints {
    pub is_sticky: bool,
    pub is_full_span: bool,
    pub span_size: Option<u32>,
}

/// Per-child options accepted by the [`CollectionScope`] builders.
///
/// [`CollectionScope`]: crate::CollectionScope
#[derive(Clone, Debug, Default)]
pub struct ChildOptions {
    pub id: Option<ItemId>,
    pub hints: LayoutHints,
}

impl ChildOptions {
    pub fn id(id: impl Into<ItemId>) -> Self {
        Self::default().with_id(id)
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sticky(mut self) -> Self {
        self.hints.is_sticky = true;
        self
    }

    pub fn full_span(mut self) -> Self {
        self.hints.is_full_span = true;
        self
    }

    pub fn span_size(mut self, span: u32) -> Self {
        self.hints.span_size = Some(span);
        self
    }
}

#[derive(Clone, Debug)]
pub struct CollectionChild {
    pub key: ItemKey,
    pub content: ChildContent,
    pub deps: Option<Deps>,
    pub hints: LayoutHints,
}

impl Diffable for CollectionChild {
    type Key = ItemKey;

    fn diff_key(&self) -> &ItemKey {
        &self.key
    }

    /// Dependency arrays decide when both sides carry one. Otherwise the
    /// rendered components are compared.
    fn is_content_equivalent(&self, other: &Self) -> bool {
        if self.hints != other.hints {
            return false;
        }
        if let (Some(lhs), Some(rhs)) = (&self.deps, &other.deps) {
            return lhs == rhs;
        }
        match (self.content.render(), other.content.render()) {
            (Some(lhs), Some(rhs)) => lhs.is_equivalent(&rhs),
            _ => false,
        }
    }
}
