use std::error::Error;
use std::sync::Arc;

use litho_core::{
    deps, props_equal, Component, ComponentPath, ComponentRef, ComponentScope, HostError,
    MountContent, MountCoordinator, MountHost, MountSpec, NodeSpec, RenderError, Rendered,
    StateCell, Style, ViewType,
};
use litho_runtime_std::StdRuntime;
use litho_sections::{ChildOptions, Collection, RecyclerBinder};

/// Prints every host operation instead of touching real views.
#[derive(Debug, Default)]
struct LogHost {
    name: &'static str,
    next_id: usize,
    attached: Vec<usize>,
}

#[derive(Debug)]
struct LogView {
    id: usize,
    view_type: ViewType,
}

impl LogHost {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

impl MountHost for LogHost {
    type View = LogView;

    fn create_view(&mut self, view_type: &ViewType) -> Result<LogView, HostError> {
        self.next_id += 1;
        log::info!("[{}] create {view_type} #{}", self.name, self.next_id);
        Ok(LogView {
            id: self.next_id,
            view_type: view_type.clone(),
        })
    }

    fn bind(&mut self, view: &mut LogView, content: &MountContent) -> Result<(), HostError> {
        log::info!(
            "[{}] bind #{} ({}) {:?}",
            self.name,
            view.id,
            view.view_type,
            content.attrs
        );
        Ok(())
    }

    fn attach(&mut self, view: &LogView, index: usize) {
        self.attached.insert(index, view.id);
        log::info!("[{}] attach #{} at {index}", self.name, view.id);
    }

    fn detach(&mut self, view: &LogView, index: usize) {
        self.attached.remove(index);
        log::info!("[{}] detach #{} from {index}", self.name, view.id);
    }

    fn move_view(&mut self, view: &LogView, from: usize, to: usize) {
        let id = self.attached.remove(from);
        self.attached.insert(to, id);
        log::info!("[{}] move #{} {from} -> {to}", self.name, view.id);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Accent(&'static str);

#[derive(Debug, Clone, PartialEq)]
struct Label {
    text: String,
}

impl Component for Label {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        let accent = scope.tree_prop::<Accent>().map_or("plain", |accent| accent.0);
        Ok(NodeSpec::leaf(
            Style::default().height(24.0),
            MountSpec::new("label")
                .attr("text", self.text.as_str())
                .attr("accent", accent),
        )
        .into())
    }

    fn is_equivalent(&self, other: &dyn Component) -> bool {
        props_equal(self, other)
    }
}

type LikesProbe = Arc<std::sync::Mutex<Option<StateCell<u32>>>>;

/// A header with a like counter above a keyed list of labels.
#[derive(Debug, Clone)]
struct Feed {
    items: Vec<&'static str>,
    likes: LikesProbe,
}

impl Component for Feed {
    fn render(&self, scope: &mut ComponentScope<'_>) -> Result<Rendered, RenderError> {
        let likes = scope.use_state(|| 0u32)?;
        let count = self.items.len();
        let summary = scope.use_cached(deps![count], || format!("{count} item(s)"))?;
        scope.use_effect(Some(deps![count]), move || {
            log::info!("feed now shows {count} item(s)");
            None
        })?;
        scope.set_tree_prop(Accent("feed"));
        if let Ok(mut probe) = self.likes.lock() {
            *probe = Some(likes.clone());
        }

        let header = Label {
            text: format!("{summary}, {} like(s)", likes.get()),
        };
        let rows = self
            .items
            .iter()
            .map(|item| ComponentRef::new(Label { text: item.to_string() }).with_key(*item));
        Ok(NodeSpec::new(Style::default())
            .child(header)
            .children(rows)
            .into())
    }
}

fn run_tree(runtime: &StdRuntime) -> Result<(), Box<dyn Error>> {
    let mut tree = runtime.create_tree();
    let mut coordinator: MountCoordinator<LogHost, ComponentPath> =
        MountCoordinator::new(LogHost::new("tree"), runtime.config());
    let likes = LikesProbe::default();

    tree.set_root(Feed {
        items: vec!["alpha", "beta", "gamma"],
        likes: Arc::clone(&likes),
    });
    runtime.settle();
    if let Some(report) = tree.mount(&mut coordinator)? {
        log::info!("first commit: {:?}", report.mount);
    }

    if let Some(cell) = likes.lock().ok().and_then(|probe| probe.clone()) {
        cell.update(|likes| *likes += 1);
    }
    tree.set_root(Feed {
        items: vec!["gamma", "alpha", "beta", "delta"],
        likes,
    });
    runtime.settle();
    if let Some(report) = tree.mount(&mut coordinator)? {
        log::info!("second commit: {:?}", report.mount);
    }
    log::info!("tree stats: {:?}", tree.stats());

    let released = tree.release(&mut coordinator);
    log::info!("released {} view(s)", released.deleted);
    Ok(())
}

fn build_feed(posts: &[u32], pinned: bool) -> Result<Collection, Box<dyn Error>> {
    let posts = posts.to_vec();
    Ok(Collection::build(move |scope| {
        scope.sub_collection(Some("header".into()), |header| {
            let options = if pinned {
                ChildOptions::default().sticky().full_span()
            } else {
                ChildOptions::default()
            };
            header.child_with(options, Label { text: "Inbox".into() });
        });
        scope.sub_collection(Some("posts".into()), |body| {
            for post in posts {
                body.child_with_deps(ChildOptions::id(post), deps![post], move || {
                    Some(Label { text: format!("post #{post}") }.into())
                });
            }
        });
    })?)
}

fn run_collection(runtime: &StdRuntime) -> Result<(), Box<dyn Error>> {
    let mut binder = RecyclerBinder::new(LogHost::new("list"), runtime.config());
    binder.set_viewport(0, 2);
    binder.prefill(&ViewType::from("Label"), 2)?;

    for (posts, pinned) in [(&[1, 2, 3][..], false), (&[3, 1, 4][..], true)] {
        let outcome = binder.update(build_feed(posts, pinned)?)?;
        log::info!(
            "collection update {:?}: {} visible change(s), {:?}",
            outcome.info.counts(),
            outcome.info.visible_changes(0, 2, 0).len(),
            outcome.report
        );
    }
    binder.clear();
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let runtime = StdRuntime::new()?;
    log::info!("using {:?}", runtime.config());
    run_tree(&runtime)?;
    run_collection(&runtime)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("collection demo failed: {err}");
        std::process::exit(1);
    }
}
