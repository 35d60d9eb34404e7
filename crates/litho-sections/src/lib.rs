//! Collections for Litho-RS: a builder DSL for keyed list items, diffing of
//! item models and a binder that mounts them through a recycling coordinator.

mod binder;
mod changes;
mod collection;
mod item;

pub use binder::{BindOutcome, RecyclerBinder, EMPTY_VIEW_TYPE};
pub use changes::ChangesInfo;
pub use collection::{Collection, CollectionScope, SubCollection};
pub use item::{
    ChildContent, ChildOptions, CollectionChild, ComponentFactory, ItemId, ItemKey, LayoutHints,
    ScopePath,
};
