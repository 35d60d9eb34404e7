//! Resolution: renders a component tree into [`InternalNode`]s.
//!
//! A pass reads the previous hook store and writes a fresh one, so it never
//! mutates committed state and can run on any thread. Children of a node may
//! be resolved on the rayon pool; each subtree resolves sequentially.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::collections::map::{HashMap, HashSet};
use crate::component::{ComponentRef, Rendered};
use crate::error::{LithoError, RenderError, ResolutionErrors, ResolutionFailure};
use crate::hooks::{HookStore, PendingEffect};
use crate::node::{ComponentPath, InternalNode, PathSegment, SegmentKey};
use crate::scope::ComponentScope;
use crate::tree::TreeHandle;
use crate::tree_props::TreeProps;

/// Tells a running pass whether a newer request has superseded it.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl CancellationToken {
    pub fn new(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self { generation, latest }
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self::new(0, Arc::new(AtomicU64::new(0)))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    pub fn check(&self) -> Result<(), LithoError> {
        if self.is_cancelled() {
            Err(LithoError::Cancelled {
                generation: self.generation,
            })
        } else {
            Ok(())
        }
    }
}

pub struct ResolveOutput {
    /// `None` when the root rendered nothing or failed.
    pub root: Option<InternalNode>,
    pub hooks: HookStore,
    pub effects: Vec<PendingEffect>,
    pub failures: ResolutionErrors,
}

#[derive(Default)]
struct Accumulator {
    hooks: Vec<(ComponentPath, crate::hooks::HookSlots)>,
    effects: Vec<PendingEffect>,
    failures: ResolutionErrors,
}

impl Accumulator {
    fn merge(&mut self, other: Accumulator) {
        self.hooks.extend(other.hooks);
        self.effects.extend(other.effects);
        self.failures.extend(other.failures);
    }
}

pub struct Resolver<'a> {
    previous: &'a HookStore,
    owner: &'a TreeHandle,
    cancel: &'a CancellationToken,
    parallel: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(previous: &'a HookStore, owner: &'a TreeHandle, cancel: &'a CancellationToken) -> Self {
        Self {
            previous,
            owner,
            cancel,
            parallel: false,
        }
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Resolves `root` with `props` as the inherited tree props.
    ///
    /// Render failures are isolated and reported in
    /// [`ResolveOutput::failures`]; hook order violations and cancellation
    /// abort the pass.
    pub fn resolve(&self, root: &ComponentRef, props: &TreeProps) -> Result<ResolveOutput, LithoError> {
        let path = ComponentPath::root().child(segment_for(root, 0));
        let mut acc = Accumulator::default();
        let node = self.resolve_component(root, path, props, &mut acc)?;

        let mut hooks = HookStore::new();
        for (path, slots) in acc.hooks {
            hooks.insert(path, slots);
        }
        log::debug!(
            "resolved generation {}: {} node(s), {} instance(s), {} failure(s)",
            self.cancel.generation(),
            node.as_ref().map_or(0, InternalNode::node_count),
            hooks.len(),
            acc.failures.len()
        );
        Ok(ResolveOutput {
            root: node,
            hooks,
            effects: acc.effects,
            failures: acc.failures,
        })
    }

    /// Follows the host-less chain starting at `component` until it reaches a
    /// host node, nothing, or a failure.
    fn resolve_component(
        &self,
        component: &ComponentRef,
        path: ComponentPath,
        props: &TreeProps,
        acc: &mut Accumulator,
    ) -> Result<Option<InternalNode>, LithoError> {
        let mut current = component.clone();
        let mut path = path;
        let mut props = props.clone();
        let mut chain = Vec::new();

        loop {
            self.cancel.check()?;
            let previous = self.previous.get(&path);
            let mut scope = ComponentScope::new(&path, previous, &props, self.owner);
            let rendered = match current.component().render(&mut scope) {
                Ok(rendered) => rendered,
                Err(RenderError::HookOrder(violation)) => return Err(violation.into()),
                Err(RenderError::Failed(message)) => {
                    // A render that bailed out early may call fewer hooks;
                    // only violations it actually hit are fatal.
                    scope.abandon()?;
                    log::error!("{} at {path} failed to render: {message}", current.name());
                    if let Some(previous) = previous {
                        acc.hooks.push((path.clone(), previous.clone()));
                    }
                    acc.failures.push(ResolutionFailure {
                        path,
                        component: current.name(),
                        message,
                    });
                    return Ok(None);
                }
            };
            let output = scope.finish()?;

            acc.hooks.push((path.clone(), output.slots));
            acc.effects.extend(output.effects);
            if let Some(child_props) = output.child_props {
                props = child_props;
            }
            chain.push(current);

            match rendered {
                Rendered::Nothing => return Ok(None),
                Rendered::Component(next) => {
                    path = path.child(segment_for(&next, 0));
                    current = next;
                }
                Rendered::Node(spec) => {
                    let children = self.resolve_children(&path, &spec.children, &props, acc)?;
                    return Ok(Some(InternalNode {
                        path,
                        components: chain,
                        style: spec.style,
                        mount: spec.mount,
                        children,
                    }));
                }
            }
        }
    }

    fn resolve_children(
        &self,
        parent: &ComponentPath,
        children: &[ComponentRef],
        props: &TreeProps,
        acc: &mut Accumulator,
    ) -> Result<Vec<InternalNode>, LithoError> {
        let jobs: Vec<(&ComponentRef, ComponentPath)> = child_segments(parent, children)
            .into_iter()
            .zip(children)
            .map(|(segment, child)| (child, parent.child(segment)))
            .collect();

        let mut nodes = Vec::with_capacity(jobs.len());
        if self.parallel && jobs.len() > 1 {
            let results: Vec<Result<(Option<InternalNode>, Accumulator), LithoError>> = jobs
                .into_par_iter()
                .map(|(child, path)| {
                    let mut local = Accumulator::default();
                    let node = self.resolve_component(child, path, props, &mut local)?;
                    Ok((node, local))
                })
                .collect();
            for result in results {
                let (node, local) = result?;
                acc.merge(local);
                nodes.extend(node);
            }
        } else {
            for (child, path) in jobs {
                nodes.extend(self.resolve_component(child, path, props, acc)?);
            }
        }
        Ok(nodes)
    }
}

fn segment_for(component: &ComponentRef, index: usize) -> PathSegment {
    PathSegment {
        name: component.name(),
        key: match component.key() {
            Some(key) => SegmentKey::Manual(Arc::from(key)),
            None => SegmentKey::Index(index),
        },
    }
}

/// Path segments for a list of siblings: manual keys where given, otherwise
/// the position among siblings of the same type. A repeated manual key gets
/// `!<n>` appended, with `n` starting at the sibling index and skipping any
/// key already given to a sibling of the same type.
fn child_segments(parent: &ComponentPath, children: &[ComponentRef]) -> Vec<PathSegment> {
    let reserved: HashSet<(&'static str, String)> = children
        .iter()
        .filter_map(|child| child.key().map(|key| (child.name(), key.to_owned())))
        .collect();
    let mut used: HashSet<(&'static str, String)> = HashSet::default();
    let mut type_counts: HashMap<&'static str, usize> = HashMap::default();
    children
        .iter()
        .enumerate()
        .map(|(position, child)| {
            let name = child.name();
            let key = match child.key() {
                Some(key) if !used.contains(&(name, key.to_owned())) => {
                    used.insert((name, key.to_owned()));
                    SegmentKey::Manual(Arc::from(key))
                }
                Some(key) => {
                    let mut n = position;
                    let unique = loop {
                        let candidate = (name, format!("{key}!{n}"));
                        if !reserved.contains(&candidate) && !used.contains(&candidate) {
                            break candidate;
                        }
                        n += 1;
                    };
                    log::warn!(
                        "duplicate key {key:?} for {name} under {parent}; using {}",
                        unique.1
                    );
                    let segment = SegmentKey::Manual(Arc::from(unique.1.as_str()));
                    used.insert(unique);
                    segment
                }
                None => {
                    let count = type_counts.entry(name).or_insert(0);
                    let index = *count;
                    *count += 1;
                    SegmentKey::Index(index)
                }
            };
            PathSegment { name, key }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, MountSpec, NodeSpec, Style};

    #[derive(Debug)]
    struct Leaf;

    impl Component for Leaf {
        fn render(&self, _scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
            Ok(NodeSpec::leaf(Style::default(), MountSpec::new("leaf")).into())
        }
    }

    #[derive(Debug)]
    struct Other;

    impl Component for Other {
        fn render(&self, _scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
            Ok(Rendered::Nothing)
        }
    }

    #[test]
    fn sibling_segments_count_per_type() {
        let children = vec![
            ComponentRef::new(Leaf),
            ComponentRef::new(Other),
            ComponentRef::new(Leaf),
            ComponentRef::new(Leaf).with_key("k"),
        ];
        let segments = child_segments(&ComponentPath::root(), &children);
        let keys: Vec<&SegmentKey> = segments.iter().map(|s| &s.key).collect();
        assert_eq!(
            keys,
            vec![
                &SegmentKey::Index(0),
                &SegmentKey::Index(0),
                &SegmentKey::Index(1),
                &SegmentKey::Manual(Arc::from("k")),
            ]
        );
    }

    #[test]
    fn duplicate_manual_keys_are_disambiguated() {
        let children = vec![
            ComponentRef::new(Leaf).with_key("k"),
            ComponentRef::new(Leaf).with_key("k"),
        ];
        let segments = child_segments(&ComponentPath::root(), &children);
        assert_eq!(segments[1].key, SegmentKey::Manual(Arc::from("k!1")));
    }

    #[test]
    fn disambiguated_keys_skip_keys_taken_by_siblings() {
        let children = vec![
            ComponentRef::new(Leaf).with_key("k"),
            ComponentRef::new(Leaf).with_key("k"),
            ComponentRef::new(Leaf).with_key("k!1"),
            ComponentRef::new(Leaf).with_key("k"),
        ];
        let segments = child_segments(&ComponentPath::root(), &children);
        let keys: Vec<&SegmentKey> = segments.iter().map(|s| &s.key).collect();
        assert_eq!(
            keys,
            vec![
                &SegmentKey::Manual(Arc::from("k")),
                &SegmentKey::Manual(Arc::from("k!2")),
                &SegmentKey::Manual(Arc::from("k!1")),
                &SegmentKey::Manual(Arc::from("k!3")),
            ]
        );
    }

    #[test]
    fn cancelled_token_aborts_resolution() {
        let latest = Arc::new(AtomicU64::new(2));
        let token = CancellationToken::new(1, latest);
        let store = HookStore::new();
        let owner = TreeHandle::detached();
        let result = Resolver::new(&store, &owner, &token).resolve(&ComponentRef::new(Leaf), &TreeProps::new());
        assert!(matches!(result, Err(LithoError::Cancelled { generation: 1 })));
    }
}
