use std::sync::{Arc, Mutex};

use litho_core::{
    ComponentTree, ComponentsConfiguration, HookOrderDetail, LithoError, SegmentKey,
    StackLayoutSolver,
};
use litho_testing::prelude::*;

fn keyed(text: &str) -> litho_core::ComponentRef {
    litho_core::ComponentRef::new(Text::new(text)).with_key(text)
}

#[test]
fn tree_props_reach_descendants_only() {
    let mut harness = TreeHarness::new();
    harness
        .render(Column::of([
            litho_core::ComponentRef::new(ThemeProvider {
                theme: "dark",
                child: ThemedText { label: "a" }.into(),
            }),
            ThemedText { label: "b" }.into(),
        ]))
        .unwrap();
    assert_eq!(harness.texts(), vec!["a:dark", "b:none"]);
}

#[test]
fn component_does_not_see_its_own_tree_prop() {
    let mut harness = TreeHarness::new();
    harness.render(SelfThemed).unwrap();
    assert_eq!(harness.texts(), vec!["self:none", "child:own"]);
}

#[test]
fn hostless_chain_collapses_into_one_node() {
    let mut harness = TreeHarness::new();
    harness
        .render(Wrapper::new(Wrapper::new(Text::new("x"))))
        .unwrap();

    let state = harness.tree.committed().unwrap();
    let root = state.root.as_ref().unwrap();
    let names: Vec<&str> = root.components.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Wrapper", "Wrapper", "Text"]);
    assert!(root.children.is_empty());
    assert_eq!(root.path.depth(), 3);
}

#[test]
fn node_count_includes_every_descendant() {
    let mut harness = TreeHarness::new();
    harness
        .render(Column::of([
            litho_core::ComponentRef::new(Column::of([Text::new("a"), Text::new("b")])),
            Text::new("c").into(),
        ]))
        .unwrap();

    let state = harness.tree.committed().unwrap();
    let root = state.root.as_ref().unwrap();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.node_count(), 5);
    assert_eq!(root.children[1].node_count(), 1);
}

#[test]
fn state_update_re_resolves_and_rebinds() {
    let mut harness = TreeHarness::new();
    let (counter, probe) = Counter::new("clicks");
    harness.render(counter).unwrap();
    assert_eq!(harness.texts(), vec!["clicks: 0"]);

    let cell = probe.lock().unwrap().clone().unwrap();
    cell.update(|count| *count += 1);
    assert!(harness.tree.has_pending());

    let report = harness.mount().unwrap().unwrap();
    assert_eq!(report.mount.updated, 1);
    assert_eq!(report.mount.created, 0);
    assert_eq!(harness.texts(), vec!["clicks: 1"]);

    let again = probe.lock().unwrap().clone().unwrap();
    assert!(cell.ptr_eq(&again));
}

#[test]
fn changed_hook_count_fails_the_pass() {
    let mut harness = TreeHarness::new();
    harness.render(ConditionalHooks { extra: false }).unwrap();

    let err = harness
        .tree
        .set_root_sync(ConditionalHooks { extra: true })
        .unwrap_err();
    match err {
        LithoError::HookOrderViolation(violation) => {
            assert_eq!(
                violation.detail,
                HookOrderDetail::CountMismatch {
                    expected: 1,
                    actual: 2
                }
            );
            assert_eq!(violation.path.last().unwrap().name, "ConditionalHooks");
        }
        other => panic!("expected hook order violation, got {other:?}"),
    }
    assert_eq!(harness.tree.stats().failed, 1);
    assert!(harness.tree.take_error().is_some());
    assert!(!harness.tree.has_pending());
    assert_eq!(harness.texts(), vec!["conditional"]);
}

#[test]
fn failing_render_is_isolated_to_its_subtree() {
    let mut harness = TreeHarness::new();
    let root = Column::of([
        litho_core::ComponentRef::new(Text::new("a")),
        Failing { message: "boom" }.into(),
        Text::new("b").into(),
    ]);

    let report = harness.render(root.clone()).unwrap();
    assert_eq!(harness.texts(), vec!["a", "b"]);
    assert_eq!(report.resolution_failures.len(), 1);
    let failure = &report.resolution_failures.failures[0];
    assert_eq!(failure.component, "Failing");
    assert_eq!(failure.message, "boom");
    assert_eq!(failure.path.to_string(), "/Column[0]/Failing[0]");

    match harness.tree.set_root_sync(root) {
        Err(LithoError::Resolution(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("expected resolution errors, got {other:?}"),
    }
}

#[test]
fn effects_run_after_commit_and_clean_up_on_removal() {
    let log = EffectLog::default();
    let probe = |value| EffectProbe {
        tag: "p",
        value,
        log: Arc::clone(&log),
    };
    let mut harness = TreeHarness::new();

    assert_eq!(harness.render(probe(1)).unwrap().effects_run, 1);
    assert_eq!(harness.render(probe(1)).unwrap().effects_run, 0);
    assert_eq!(harness.render(probe(2)).unwrap().effects_run, 1);
    let report = harness.render(Text::new("gone")).unwrap();

    assert_eq!(report.disposed, 2);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["mount p:1", "cleanup p:1", "mount p:2", "cleanup p:2"]
    );
}

#[test]
fn keyed_reorder_moves_views_instead_of_recreating() {
    let mut harness = TreeHarness::new();
    harness
        .render(Column::of([keyed("a"), keyed("b"), keyed("c")]))
        .unwrap();
    assert_eq!(harness.host().created(), 3);

    let report = harness
        .render(Column::of([keyed("c"), keyed("a"), keyed("b")]))
        .unwrap();
    assert_eq!(report.mount.moved, 1);
    assert_eq!(report.mount.inserted, 0);
    assert_eq!(report.mount.deleted, 0);
    assert_eq!(harness.host().created(), 3);
    assert_eq!(harness.texts(), vec!["c", "a", "b"]);

    let state = harness.tree.committed().unwrap();
    let first = &state.units[0].key;
    assert_eq!(
        first.last().unwrap().key,
        SegmentKey::Manual(Arc::from("c"))
    );
}

#[test]
fn removed_view_is_recycled_for_the_next_insert() {
    let mut harness = TreeHarness::new();
    harness
        .render(Column::of([Text::new("a"), Text::new("b")]))
        .unwrap();
    harness.render(Column::of([Text::new("a")])).unwrap();
    assert_eq!(harness.coordinator.pool().total(), 1);

    let report = harness
        .render(Column::of([Text::new("a"), Text::new("c")]))
        .unwrap();
    assert_eq!(report.mount.recycled, 1);
    assert_eq!(report.mount.created, 0);
    assert_eq!(harness.texts(), vec!["a", "c"]);
}

#[test]
fn bind_failure_retries_on_a_fresh_view() {
    let mut harness = TreeHarness::new();
    harness.host_mut().fail_binds("text", 1);

    let report = harness.render(Text::new("a")).unwrap();
    assert!(report.mount.is_clean());
    assert_eq!(report.mount.created, 2);
    assert_eq!(harness.texts(), vec!["a"]);
    assert_eq!(harness.host().count(|e| matches!(e, HostEvent::Destroy { .. })), 1);
}

#[test]
fn second_bind_failure_leaves_a_placeholder() {
    let mut harness = TreeHarness::new();
    harness.host_mut().fail_binds("text", 2);

    let report = harness.render(Text::new("a")).unwrap();
    assert_eq!(report.mount.failures.len(), 1);
    assert_eq!(harness.coordinator.placeholders(), 1);
    assert!(harness.texts().is_empty());

    harness.render(Text::new("b")).unwrap();
    assert_eq!(harness.coordinator.placeholders(), 0);
    assert_eq!(harness.texts(), vec!["b"]);
}

#[test]
fn superseded_passes_are_cancelled_not_failed() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut tree = ComponentTree::new(
        ComponentsConfiguration::default(),
        scheduler.clone(),
        Arc::new(StackLayoutSolver),
    );
    let mut coordinator =
        litho_core::MountCoordinator::new(MemoryViewHost::new(), tree.config());

    tree.set_root(Text::new("1"));
    tree.set_root(Text::new("2"));
    let last = tree.set_root(Text::new("3"));
    assert_eq!(scheduler.run_background(), 3);

    let stats = tree.stats();
    assert_eq!(stats.requested, 3);
    assert_eq!(stats.cancelled, 2);
    assert_eq!(stats.published, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(tree.pending_generation(), Some(last));

    let report = tree.mount(&mut coordinator).unwrap().unwrap();
    assert_eq!(report.generation, last);
    assert_eq!(coordinator.host().texts(), vec!["3"]);
    assert_eq!(tree.stats().committed, 1);
}

#[test]
fn replaced_layout_hands_its_effects_to_the_next_one() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut tree = ComponentTree::new(
        ComponentsConfiguration::default(),
        scheduler.clone(),
        Arc::new(StackLayoutSolver),
    );
    let mut coordinator =
        litho_core::MountCoordinator::new(MemoryViewHost::new(), tree.config());
    let log = EffectLog::default();
    let probe = EffectProbe {
        tag: "p",
        value: 1,
        log: Arc::clone(&log),
    };

    tree.set_root(probe.clone());
    scheduler.run_background();
    tree.set_root(probe);
    scheduler.run_background();
    assert_eq!(tree.stats().published, 2);

    let report = tree.mount(&mut coordinator).unwrap().unwrap();
    assert_eq!(report.effects_run, 1);
    assert_eq!(*log.lock().unwrap(), vec!["mount p:1"]);
}

#[test]
fn instance_re_added_before_mount_cleans_up_the_mounted_one() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut tree = ComponentTree::new(
        ComponentsConfiguration::default(),
        scheduler.clone(),
        Arc::new(StackLayoutSolver),
    );
    let mut coordinator =
        litho_core::MountCoordinator::new(MemoryViewHost::new(), tree.config());
    let log = EffectLog::default();
    let with_effect = || {
        Column::of([litho_core::ComponentRef::new(EffectProbe {
            tag: "p",
            value: 1,
            log: Arc::clone(&log),
        })])
    };

    tree.set_root(with_effect());
    scheduler.run_background();
    tree.mount(&mut coordinator).unwrap().unwrap();

    // Removed and re-added between two mounts: a fresh instance.
    tree.set_root(Column::new());
    scheduler.run_background();
    tree.set_root(with_effect());
    scheduler.run_background();
    let report = tree.mount(&mut coordinator).unwrap().unwrap();
    assert_eq!(report.disposed, 1);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["mount p:1", "cleanup p:1", "mount p:1"]
    );

    tree.set_root(Column::new());
    scheduler.run_background();
    tree.mount(&mut coordinator).unwrap().unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["mount p:1", "cleanup p:1", "mount p:1", "cleanup p:1"]
    );
}

#[test]
fn duplicate_keys_do_not_collide_with_sibling_keys() {
    let mut harness = TreeHarness::new();
    let keyed_as = |key: &str, text: &str| {
        litho_core::ComponentRef::new(Text::new(text)).with_key(key)
    };
    harness
        .render(Column::of([
            keyed_as("k", "a"),
            keyed_as("k", "b"),
            keyed_as("k!1", "c"),
        ]))
        .unwrap();

    assert_eq!(harness.texts(), vec!["a", "b", "c"]);
    assert!(!harness.tree.has_pending());
}

#[test]
fn failed_mount_keeps_the_layout_pending() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut tree = ComponentTree::new(
        ComponentsConfiguration::default(),
        scheduler.clone(),
        Arc::new(StackLayoutSolver),
    );
    let mut coordinator =
        litho_core::MountCoordinator::new(MemoryViewHost::new(), tree.config());
    tree.set_root(Column::of([Text::new("a")]));
    scheduler.run_background();
    tree.mount(&mut coordinator).unwrap().unwrap();

    // Corrupt the mounted units so the next diff rejects them.
    let mounted = coordinator.units().to_vec();
    let duplicate = litho_core::ChangeSet::from_changes(vec![litho_core::Change::Insert {
        index: 1,
        next_index: 0,
        key: mounted[0].key.clone(),
    }]);
    coordinator.apply(&duplicate, &mounted);

    let generation = tree.set_root(Column::of([Text::new("b")]));
    scheduler.run_background();
    assert!(matches!(
        tree.mount(&mut coordinator),
        Err(LithoError::IdentityKeyCollision { .. })
    ));
    assert_eq!(tree.pending_generation(), Some(generation));
    assert!(tree.mount(&mut coordinator).is_err());
    assert_eq!(tree.stats().committed, 1);
}

#[test]
fn layout_ready_listener_runs_on_main() {
    let scheduler = Arc::new(ManualScheduler::new());
    let tree = ComponentTree::new(
        ComponentsConfiguration::default(),
        scheduler.clone(),
        Arc::new(StackLayoutSolver),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tree.set_on_layout_ready(move |generation| sink.lock().unwrap().push(generation));

    let generation = tree.set_root(Text::new("a"));
    scheduler.run_background();
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(scheduler.run_main(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![generation]);
}

#[test]
fn parallel_resolution_matches_sequential() {
    let root = || {
        Column::of((0..8).map(|i| {
            litho_core::ComponentRef::new(ThemeProvider {
                theme: if i % 2 == 0 { "even" } else { "odd" },
                child: ThemedText { label: "t" }.into(),
            })
        }))
    };
    let mut sequential = TreeHarness::new();
    sequential.render(root()).unwrap();
    let mut parallel =
        TreeHarness::with_config(ComponentsConfiguration::default().with_parallel_resolution(true));
    parallel.render(root()).unwrap();

    assert_eq!(sequential.texts(), parallel.texts());
    assert_eq!(parallel.texts()[1], "t:odd");
}

#[test]
fn release_unmounts_and_disposes_everything() {
    let log = EffectLog::default();
    let mut harness = TreeHarness::new();
    harness
        .render(Column::of([
            litho_core::ComponentRef::new(EffectProbe {
                tag: "x",
                value: 0,
                log: Arc::clone(&log),
            }),
            Text::new("y").into(),
        ]))
        .unwrap();

    let report = harness.tree.release(&mut harness.coordinator);
    assert_eq!(report.deleted, 2);
    assert!(harness.host().attached().is_empty());
    assert_eq!(harness.coordinator.pool().total(), 2);
    assert_eq!(*log.lock().unwrap(), vec!["mount x:0", "cleanup x:0"]);
}
