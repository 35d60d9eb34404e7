use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use litho_core::collections::map::HashMap;
use litho_core::{ComponentRef, Deps, LithoError};

use crate::changes::ChangesInfo;
use crate::item::{ChildContent, ChildOptions, CollectionChild, ItemId, ItemKey, ScopePath};

/// Id generation state of one (sub-)collection level.
#[derive(Default)]
struct Frame {
    scope: ScopePath,
    next_static_id: usize,
    type_frequency: HashMap<&'static str, usize>,
    next_anonymous_scope: usize,
}

/// Builder passed to [`Collection::build`] and to sub-collection closures.
///
/// Children without an explicit id get `"<Type>:<n>"` (per-type counter,
/// starting at 1) when they are components, or `"staticId:<n>"` otherwise.
/// Counters restart inside every sub-collection, whose id qualifies the keys
/// of everything built inside it.
pub struct CollectionScope {
    children: Vec<CollectionChild>,
    frames: Vec<Frame>,
}

impl CollectionScope {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            frames: vec![Frame::default()],
        }
    }

    fn frame(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn resolve_key(&mut self, id: Option<ItemId>, component: Option<&ComponentRef>) -> ItemKey {
        let frame = self.frame();
        let local = match (id, component) {
            (Some(id), _) => id,
            (None, Some(component)) => {
                let name = component.name();
                let count = frame.type_frequency.entry(name).or_insert(0);
                *count += 1;
                ItemId::from(format!("{name}:{count}"))
            }
            (None, None) => {
                let id = frame.next_static_id;
                frame.next_static_id += 1;
                ItemId::from(format!("staticId:{id}"))
            }
        };
        ItemKey::new(local, frame.scope.clone())
    }

    pub fn child(&mut self, component: impl Into<ComponentRef>) {
        self.child_with(ChildOptions::default(), component);
    }

    pub fn child_with(&mut self, options: ChildOptions, component: impl Into<ComponentRef>) {
        self.optional_child(options, Some(component.into()));
    }

    /// A `None` component adds nothing but still consumes a generated id, so
    /// the ids of later siblings do not depend on it.
    pub fn optional_child(&mut self, options: ChildOptions, component: Option<ComponentRef>) {
        let key = self.resolve_key(options.id, component.as_ref());
        if let Some(component) = component {
            self.children.push(CollectionChild {
                key,
                content: ChildContent::Component(component),
                deps: None,
                hints: options.hints,
            });
        }
    }

    /// A child rendered by `factory`, considered unchanged while `deps` is.
    pub fn child_with_deps<F>(&mut self, options: ChildOptions, deps: Deps, factory: F)
    where
        F: Fn() -> Option<ComponentRef> + Send + Sync + 'static,
    {
        let key = self.resolve_key(options.id, None);
        self.children.push(CollectionChild {
            key,
            content: ChildContent::Factory(Arc::new(factory)),
            deps: Some(deps),
            hints: options.hints,
        });
    }

    /// Builds a nested group inline. Without an id the group gets
    /// `"subCollection:<n>"`, counted per enclosing level.
    pub fn sub_collection(&mut self, id: Option<ItemId>, build: impl FnOnce(&mut CollectionScope)) {
        self.push_scope(id);
        build(self);
        self.frames.pop();
    }

    pub fn add_sub_collection(&mut self, id: Option<ItemId>, sub: &SubCollection) {
        self.push_scope(id);
        (sub.build)(self);
        self.frames.pop();
    }

    fn push_scope(&mut self, id: Option<ItemId>) {
        let frame = self.frame();
        let id = id.unwrap_or_else(|| {
            let n = frame.next_anonymous_scope;
            frame.next_anonymous_scope += 1;
            ItemId::from(format!("subCollection:{n}"))
        });
        let scope = frame.scope.child(id);
        self.frames.push(Frame {
            scope,
            ..Frame::default()
        });
    }
}

/// A reusable group of children, added with
/// [`CollectionScope::add_sub_collection`].
#[derive(Clone)]
pub struct SubCollection {
    build: Arc<dyn Fn(&mut CollectionScope) + Send + Sync>,
}

impl SubCollection {
    pub fn new(build: impl Fn(&mut CollectionScope) + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
        }
    }
}

impl fmt::Debug for SubCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubCollection(..)")
    }
}

/// The flattened item model of a collection.
#[derive(Clone, Debug, Default)]
pub struct Collection {
    children: Vec<CollectionChild>,
}

impl Collection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Runs `build` and checks that every effective key is unique.
    pub fn build(build: impl FnOnce(&mut CollectionScope)) -> Result<Self, LithoError> {
        let mut scope = CollectionScope::new();
        build(&mut scope);
        let children = scope.children;

        let mut seen: IndexMap<&ItemKey, usize> = IndexMap::with_capacity(children.len());
        for (position, child) in children.iter().enumerate() {
            if let Some(first) = seen.insert(&child.key, position) {
                log::error!(
                    "collection key {} used at positions {first} and {position}",
                    child.key
                );
                return Err(LithoError::IdentityKeyCollision {
                    key: child.key.to_string(),
                    side: "collection",
                });
            }
        }
        Ok(Self { children })
    }

    pub fn children(&self) -> &[CollectionChild] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.children.iter().map(|child| &child.key)
    }

    /// Changes that turn `self` into `next`.
    pub fn diff(&self, next: &Collection) -> Result<ChangesInfo<ItemKey>, LithoError> {
        litho_core::diff(&self.children, &next.children).map(ChangesInfo::new)
    }
}
