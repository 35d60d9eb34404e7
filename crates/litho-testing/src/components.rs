//! Small components shared by the test suites and the demo.

use std::sync::{Arc, Mutex};

use litho_core::{
    deps, props_equal, Cleanup, Component, ComponentRef, ComponentScope, MountSpec, NodeSpec,
    RenderError, Rendered, StateCell, Style,
};

pub const TEXT_VIEW: &str = "text";
pub const TEXT_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Component for Text {
    fn render(&self, _scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        Ok(NodeSpec::leaf(
            Style::default().height(TEXT_HEIGHT),
            MountSpec::new(TEXT_VIEW).attr("text", self.text.as_str()),
        )
        .into())
    }

    fn is_equivalent(&self, other: &dyn Component) -> bool {
        props_equal(self, other)
    }
}

/// Layout-only container; it mounts no view of its own.
#[derive(Debug, Clone, Default)]
pub struct Column {
    pub style: Style,
    pub children: Vec<ComponentRef>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ComponentRef>,
    {
        Self::new().children(children)
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
}

impl Component for Column {
    fn render(&self, _scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        Ok(NodeSpec::new(self.style).children(self.children.iter().cloned()).into())
    }

    fn is_equivalent(&self, other: &dyn Component) -> bool {
        other.downcast_ref::<Column>().is_some_and(|other| {
            self.style == other.style
                && self.children.len() == other.children.len()
                && self
                    .children
                    .iter()
                    .zip(&other.children)
                    .all(|(lhs, rhs)| lhs.is_equivalent(rhs))
        })
    }
}

/// Renders straight into its child without a host of its own.
#[derive(Debug, Clone)]
pub struct Wrapper {
    pub child: ComponentRef,
}

impl Wrapper {
    pub fn new(child: impl Into<ComponentRef>) -> Self {
        Self {
            child: child.into(),
        }
    }
}

impl Component for Wrapper {
    fn render(&self, _scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        Ok(Rendered::Component(self.child.clone()))
    }
}

pub type CellProbe<T> = Arc<Mutex<Option<StateCell<T>>>>;

/// Shows `"<label>: <count>"` from a `use_state` slot and exposes the cell
/// through `probe`.
#[derive(Debug, Clone)]
pub struct Counter {
    pub label: &'static str,
    pub probe: CellProbe<i32>,
}

impl Counter {
    pub fn new(label: &'static str) -> (Self, CellProbe<i32>) {
        let probe = CellProbe::default();
        (
            Self {
                label,
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }
}

impl Component for Counter {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        let count = scope.use_state(|| 0)?;
        let text = format!("{}: {}", self.label, count.get());
        if let Ok(mut probe) = self.probe.lock() {
            *probe = Some(count);
        }
        Ok(Rendered::component(Text::new(text)))
    }
}

#[derive(Debug, Clone)]
pub struct Failing {
    pub message: &'static str,
}

impl Component for Failing {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        scope.use_state(|| ())?;
        Err(RenderError::msg(self.message))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme(pub &'static str);

/// Sets [`Theme`] for its subtree.
#[derive(Debug, Clone)]
pub struct ThemeProvider {
    pub theme: &'static str,
    pub child: ComponentRef,
}

impl Component for ThemeProvider {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        scope.set_tree_prop(Theme(self.theme));
        Ok(Rendered::Component(self.child.clone()))
    }
}

/// Renders `"<label>:<theme>"`, or `"<label>:none"` without a theme above it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemedText {
    pub label: &'static str,
}

impl Component for ThemedText {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        let theme = scope.tree_prop::<Theme>().map_or("none", |theme| theme.0);
        Ok(Rendered::component(Text::new(format!("{}:{theme}", self.label))))
    }
}

/// Sets a theme and reads it back in the same render; the read must not see
/// its own write.
#[derive(Debug, Clone)]
pub struct SelfThemed;

impl Component for SelfThemed {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        scope.set_tree_prop(Theme("own"));
        let seen = scope.tree_prop::<Theme>().map_or("none", |theme| theme.0);
        Ok(NodeSpec::new(Style::default())
            .child(Text::new(format!("self:{seen}")))
            .child(ThemedText { label: "child" })
            .into())
    }
}

pub type EffectLog = Arc<Mutex<Vec<String>>>;

fn record(log: &EffectLog, entry: String) {
    if let Ok(mut entries) = log.lock() {
        entries.push(entry);
    }
}

/// Logs `mount <tag>:<value>` when `value` changes and `cleanup <tag>:<value>`
/// before the next run or on removal.
#[derive(Debug, Clone)]
pub struct EffectProbe {
    pub tag: &'static str,
    pub value: u32,
    pub log: EffectLog,
}

impl Component for EffectProbe {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        let log = Arc::clone(&self.log);
        let entry = format!("{}:{}", self.tag, self.value);
        scope.use_effect(Some(deps![self.value]), move || {
            record(&log, format!("mount {entry}"));
            Some(Box::new(move || record(&log, format!("cleanup {entry}"))) as Cleanup)
        })?;
        Ok(Rendered::component(Text::new(self.tag)))
    }
}

/// Calls one extra `use_state` when `extra` is set.
#[derive(Debug, Clone)]
pub struct ConditionalHooks {
    pub extra: bool,
}

impl Component for ConditionalHooks {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        scope.use_state(|| 0)?;
        if self.extra {
            scope.use_state(|| 1)?;
        }
        Ok(Rendered::component(Text::new("conditional")))
    }
}
