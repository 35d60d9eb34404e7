use litho_core::{
    diff, ComponentsConfiguration, MountContent, MountCoordinator, RecyclingMode, RenderUnit,
    ViewType,
};
use litho_testing::prelude::*;

fn unit(key: u32, view_type: &str, text: &str) -> RenderUnit<u32> {
    let mut content = MountContent::new(view_type);
    content.attrs.insert("text", text.into());
    RenderUnit { key, content }
}

fn coordinator(config: ComponentsConfiguration) -> MountCoordinator<MemoryViewHost, u32> {
    init_logging();
    MountCoordinator::new(MemoryViewHost::new(), &config)
}

#[test]
fn host_order_follows_next_list() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    let first = vec![unit(1, "text", "A"), unit(2, "text", "B"), unit(3, "text", "C")];
    let second = vec![unit(2, "text", "B"), unit(1, "text", "A"), unit(4, "text", "D")];

    mount.reconcile(&first).unwrap();
    let report = mount.reconcile(&second).unwrap();

    assert_eq!(mount.host().texts(), vec!["B", "A", "D"]);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.moved, 1);
    assert_eq!(report.recycled, 1);
    assert_eq!(mount.host().created(), 3);
}

#[test]
fn pool_capacity_bounds_released_views() {
    let mut mount = coordinator(ComponentsConfiguration::default().with_pool_capacity(1));
    mount
        .reconcile(&[unit(1, "text", "a"), unit(2, "text", "b"), unit(3, "text", "c")])
        .unwrap();
    mount.reconcile(&[]).unwrap();

    assert_eq!(mount.pool().len(&ViewType::from("text")), 1);
    assert_eq!(
        mount
            .host()
            .count(|event| matches!(event, HostEvent::Destroy { .. })),
        2
    );
}

#[test]
fn pools_are_per_view_type() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    mount.reconcile(&[unit(1, "image", "x")]).unwrap();
    mount.reconcile(&[]).unwrap();

    let report = mount.reconcile(&[unit(2, "text", "y")]).unwrap();
    assert_eq!(report.recycled, 0);
    assert_eq!(report.created, 1);
    assert_eq!(mount.pool().len(&ViewType::from("image")), 1);
}

#[test]
fn view_type_change_swaps_the_view() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    mount.reconcile(&[unit(1, "text", "a")]).unwrap();
    let report = mount.reconcile(&[unit(1, "image", "a")]).unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 1);
    assert_eq!(mount.pool().len(&ViewType::from("text")), 1);
    assert_eq!(mount.view(0).unwrap().view_type, ViewType::from("image"));
    assert_eq!(mount.host().attached().len(), 1);
}

#[test]
fn no_view_reuse_destroys_released_views() {
    let mut mount = coordinator(
        ComponentsConfiguration::default().with_recycling_mode(RecyclingMode::NoViewReuse),
    );
    assert_eq!(mount.prefill(&ViewType::from("text"), 2).unwrap(), 2);

    let report = mount.reconcile(&[unit(1, "text", "a")]).unwrap();
    assert_eq!(report.recycled, 1);
    mount.reconcile(&[]).unwrap();
    assert_eq!(mount.pool().total(), 1);
}

#[test]
fn no_pooling_ignores_prefill() {
    let mut mount = coordinator(
        ComponentsConfiguration::default().with_recycling_mode(RecyclingMode::NoPooling),
    );
    assert_eq!(mount.prefill(&ViewType::from("text"), 3).unwrap(), 0);
    let report = mount.reconcile(&[unit(1, "text", "a")]).unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.recycled, 0);
}

#[test]
fn disabled_retry_reports_first_failure() {
    let mut mount =
        coordinator(ComponentsConfiguration::default().with_retry_failed_binds(false));
    mount.host_mut().fail_binds("text", 1);

    let report = mount.reconcile(&[unit(1, "text", "a")]).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key(), "1");
    assert_eq!(mount.placeholders(), 1);
    assert_eq!(mount.len(), 1);
}

#[test]
fn create_failure_is_reported() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    mount.host_mut().fail_creates("text", 1);

    let report = mount
        .reconcile(&[unit(1, "text", "a"), unit(2, "text", "b")])
        .unwrap();
    // Inserts are placed from the tail, so the failed creation is key 2.
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key(), "2");
    assert_eq!(mount.host().texts(), vec!["a"]);
}

#[test]
fn placeholders_do_not_shift_host_indices() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    mount.host_mut().fail_binds("text", 2);
    mount
        .reconcile(&[unit(1, "text", "a"), unit(2, "text", "b"), unit(3, "text", "c")])
        .unwrap();
    assert_eq!(mount.host().texts(), vec!["a", "b"]);
    assert_eq!(mount.placeholders(), 1);

    let next = vec![unit(3, "text", "c"), unit(2, "text", "b"), unit(1, "text", "a")];
    let changes = diff(mount.units(), &next).unwrap();
    mount.apply(&changes, &next);
    assert_eq!(mount.host().texts(), vec!["b", "a"]);
}

#[test]
fn unmount_all_returns_views_to_pool() {
    let mut mount = coordinator(ComponentsConfiguration::default());
    mount
        .reconcile(&[unit(1, "text", "a"), unit(2, "text", "b")])
        .unwrap();
    let report = mount.unmount_all();
    assert_eq!(report.deleted, 2);
    assert!(mount.is_empty());
    assert_eq!(mount.pool().total(), 2);
    assert!(mount.host().attached().is_empty());
}
