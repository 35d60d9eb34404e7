use litho_core::collections::map::HashMap;
use litho_core::{AttrValue, HostError, MountContent, MountHost, ViewAttrs, ViewType};

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryView {
    pub id: usize,
    pub view_type: ViewType,
    pub attrs: ViewAttrs,
    pub bind_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Create { id: usize, view_type: String },
    Bind { id: usize },
    Unbind { id: usize },
    Attach { id: usize, index: usize },
    Detach { id: usize, index: usize },
    Move { id: usize, from: usize, to: usize },
    Destroy { id: usize },
}

/// In-memory container that records every host operation.
#[derive(Debug, Default)]
pub struct MemoryViewHost {
    next_id: usize,
    attached: Vec<usize>,
    bound: HashMap<usize, ViewAttrs>,
    events: Vec<HostEvent>,
    failing_binds: HashMap<ViewType, usize>,
    failing_creates: HashMap<ViewType, usize>,
}

impl MemoryViewHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` binds of `view_type` fail.
    pub fn fail_binds(&mut self, view_type: impl Into<ViewType>, count: usize) {
        self.failing_binds.insert(view_type.into(), count);
    }

    /// Makes the next `count` creations of `view_type` fail.
    pub fn fail_creates(&mut self, view_type: impl Into<ViewType>, count: usize) {
        self.failing_creates.insert(view_type.into(), count);
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn created(&self) -> usize {
        self.next_id
    }

    pub fn count(&self, matches: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.iter().filter(|event| matches(event)).count()
    }

    /// Ids of attached views in container order.
    pub fn attached(&self) -> &[usize] {
        &self.attached
    }

    /// Attributes of attached views in container order.
    pub fn attached_attrs(&self) -> Vec<ViewAttrs> {
        self.attached
            .iter()
            .map(|id| self.bound.get(id).cloned().unwrap_or_default())
            .collect()
    }

    /// The `text` attribute of every attached view, in order.
    pub fn texts(&self) -> Vec<String> {
        self.attr_texts("text")
    }

    /// Text attribute `name` of every attached view that has one, in order.
    pub fn attr_texts(&self, name: &str) -> Vec<String> {
        self.attached_attrs()
            .iter()
            .filter_map(|attrs| match attrs.get(name) {
                Some(AttrValue::Text(text)) => Some(text.to_string()),
                _ => None,
            })
            .collect()
    }

    fn take_failure(counts: &mut HashMap<ViewType, usize>, view_type: &ViewType) -> bool {
        match counts.get_mut(view_type) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl MountHost for MemoryViewHost {
    type View = MemoryView;

    fn create_view(&mut self, view_type: &ViewType) -> Result<MemoryView, HostError> {
        if Self::take_failure(&mut self.failing_creates, view_type) {
            return Err(HostError::new(format!("cannot create {view_type}")));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(HostEvent::Create {
            id,
            view_type: view_type.to_string(),
        });
        Ok(MemoryView {
            id,
            view_type: view_type.clone(),
            attrs: ViewAttrs::new(),
            bind_count: 0,
        })
    }

    fn bind(&mut self, view: &mut MemoryView, content: &MountContent) -> Result<(), HostError> {
        if Self::take_failure(&mut self.failing_binds, &content.view_type) {
            return Err(HostError::new(format!("bind rejected by view {}", view.id)));
        }
        view.attrs = content.attrs.clone();
        view.bind_count += 1;
        self.bound.insert(view.id, content.attrs.clone());
        self.events.push(HostEvent::Bind { id: view.id });
        Ok(())
    }

    fn unbind(&mut self, view: &mut MemoryView, _content: &MountContent) {
        view.attrs.clear();
        self.bound.remove(&view.id);
        self.events.push(HostEvent::Unbind { id: view.id });
    }

    fn attach(&mut self, view: &MemoryView, index: usize) {
        self.attached.insert(index, view.id);
        self.events.push(HostEvent::Attach { id: view.id, index });
    }

    fn detach(&mut self, view: &MemoryView, index: usize) {
        debug_assert_eq!(self.attached.get(index), Some(&view.id));
        self.attached.remove(index);
        self.events.push(HostEvent::Detach { id: view.id, index });
    }

    fn move_view(&mut self, view: &MemoryView, from: usize, to: usize) {
        let id = self.attached.remove(from);
        debug_assert_eq!(id, view.id);
        self.attached.insert(to, id);
        self.events.push(HostEvent::Move {
            id: view.id,
            from,
            to,
        });
    }

    fn destroy_view(&mut self, view: MemoryView) {
        self.bound.remove(&view.id);
        self.events.push(HostEvent::Destroy { id: view.id });
    }
}
