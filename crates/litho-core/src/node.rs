use std::fmt;
use std::sync::Arc;

use crate::component::{ComponentRef, MountSpec, Style};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    /// Position among siblings of the same component type.
    Index(usize),
    Manual(Arc<str>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: &'static str,
    pub key: SegmentKey,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            SegmentKey::Index(index) => write!(f, "{}[{index}]", self.name),
            SegmentKey::Manual(key) => write!(f, "{}[#{key}]", self.name),
        }
    }
}

/// Global identity of a component instance: the chain of segments from the
/// root. Hook state is keyed by this path, so an instance keeps its state as
/// long as it renders at the same path.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ComponentPath {
    segments: Arc<[PathSegment]>,
}

impl ComponentPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_ancestor_of(&self, other: &ComponentPath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in self.segments.iter() {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentPath({self})")
    }
}

/// A resolved layout node. `components` lists every component that rendered
/// into this node, outermost first; the last entry is the host.
#[derive(Clone, Debug)]
pub struct InternalNode {
    pub path: ComponentPath,
    pub components: Vec<ComponentRef>,
    pub style: Style,
    pub mount: Option<MountSpec>,
    pub children: Vec<InternalNode>,
}

impl InternalNode {
    pub fn host(&self) -> Option<&ComponentRef> {
        self.components.last()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(InternalNode::node_count)
            .sum::<usize>()
    }

    pub fn find(&self, path: &ComponentPath) -> Option<&InternalNode> {
        if &self.path == path {
            return Some(self);
        }
        if !self.path.is_ancestor_of(path) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Pre-order traversal.
    pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a InternalNode)) {
        visitor(self);
        for child in &self.children {
            child.visit(visitor);
        }
    }
}
