use litho_core::{
    ComponentsConfiguration, LithoError, MountContent, MountCoordinator, MountError, MountHost,
    MountReport, RenderUnit, ViewType,
};

use crate::changes::ChangesInfo;
use crate::collection::Collection;
use crate::item::{CollectionChild, ItemKey};

/// View type used for children whose factory rendered nothing.
pub const EMPTY_VIEW_TYPE: &str = "litho:empty";

#[derive(Debug)]
pub struct BindOutcome {
    pub info: ChangesInfo<ItemKey>,
    pub report: MountReport,
}

/// Keeps a host list in sync with successive [`Collection`]s.
///
/// Each child becomes one view whose type is the name of its rendered
/// component. Views are recycled per type by the underlying coordinator.
pub struct RecyclerBinder<H: MountHost> {
    current: Collection,
    coordinator: MountCoordinator<H, ItemKey>,
    viewport: Option<(usize, usize)>,
}

impl<H: MountHost> RecyclerBinder<H> {
    pub fn new(host: H, config: &ComponentsConfiguration) -> Self {
        Self {
            current: Collection::empty(),
            coordinator: MountCoordinator::new(host, config),
            viewport: None,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.current
    }

    pub fn coordinator(&self) -> &MountCoordinator<H, ItemKey> {
        &self.coordinator
    }

    pub fn host(&self) -> &H {
        self.coordinator.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.coordinator.host_mut()
    }

    /// Positions `first..=last` currently on screen; only used for logging
    /// how much of an update is visible.
    pub fn set_viewport(&mut self, first: usize, last: usize) {
        self.viewport = Some((first, last));
    }

    pub fn prefill(&mut self, view_type: &ViewType, count: usize) -> Result<usize, MountError> {
        self.coordinator.prefill(view_type, count)
    }

    /// Diffs `next` against the bound collection and applies the changes.
    pub fn update(&mut self, next: Collection) -> Result<BindOutcome, LithoError> {
        let info = self.current.diff(&next)?;
        let units: Vec<RenderUnit<ItemKey>> = next.children().iter().map(render_unit).collect();
        let report = self.coordinator.apply(info.changes(), &units);

        if let Some((first, last)) = self.viewport {
            log::debug!(
                "collection update: {} changes, {} visible in {first}..={last}",
                info.changes().len(),
                info.visible_changes(first, last, 0).len()
            );
        }
        self.current = next;
        Ok(BindOutcome { info, report })
    }

    /// Unbinds every child and returns the views to the pool.
    pub fn clear(&mut self) -> MountReport {
        self.current = Collection::empty();
        self.coordinator.unmount_all()
    }
}

fn render_unit(child: &CollectionChild) -> RenderUnit<ItemKey> {
    let component = child.content.render();
    let view_type = component
        .as_ref()
        .map_or(EMPTY_VIEW_TYPE, |component| component.name());
    let mut content = MountContent::new(view_type);
    content.attrs.insert("key", child.key.to_string().into());
    content.attrs.insert("sticky", child.hints.is_sticky.into());
    content
        .attrs
        .insert("full_span", child.hints.is_full_span.into());
    if let Some(span) = child.hints.span_size {
        content.attrs.insert("span_size", i64::from(span).into());
    }
    content.component = component;
    RenderUnit {
        key: child.key.clone(),
        content,
    }
}
