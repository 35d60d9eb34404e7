#![doc = r"Core runtime for Litho-RS: component resolution, hooks, tree props, diffing and mounting."]

extern crate self as litho_core;

pub mod collections;
pub mod config;
pub mod deps;
pub mod diff;
pub mod error;
pub mod hash;
pub mod hooks;
pub mod layout;
pub mod mount;
pub mod platform;
pub mod resolve;
pub mod tree;

mod component;
mod node;
mod scope;
mod tree_props;

pub use component::{
    props_equal, AttrValue, Component, ComponentRef, FlexDirection, MountSpec, NodeSpec,
    Rendered, Style, ViewAttrs, ViewType,
};
pub use config::{ComponentsConfiguration, RecyclingMode};
pub use deps::{Dep, Deps};
pub use diff::{diff, Change, ChangeCounts, ChangeKind, ChangeSet, Diffable};
pub use error::{
    HookOrderDetail, HookOrderViolation, HostError, LithoError, MountError, RenderError,
    ResolutionErrors, ResolutionFailure,
};
pub use hooks::{Cleanup, HookKind, HookStore, StateCell};
pub use layout::{Constraints, LayoutBox, LayoutSolver, Rect, StackLayoutSolver};
pub use mount::{MountContent, MountCoordinator, MountHost, MountReport, RecyclePool, RenderUnit};
pub use node::{ComponentPath, InternalNode, PathSegment, SegmentKey};
pub use platform::{ImmediateScheduler, Scheduler, Task};
pub use resolve::{CancellationToken, ResolveOutput, Resolver};
pub use scope::ComponentScope;
pub use tree::{CommitReport, ComponentTree, LayoutState, TreeHandle, TreeStats};
pub use tree_props::TreeProps;
