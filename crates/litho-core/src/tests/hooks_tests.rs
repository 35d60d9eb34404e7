use super::*;
use crate::deps;
use crate::node::{PathSegment, SegmentKey};
use std::sync::atomic::{AtomicUsize, Ordering};

fn path() -> ComponentPath {
    ComponentPath::root().child(PathSegment {
        name: "Counter",
        key: SegmentKey::Index(0),
    })
}

fn render(
    previous: Option<&HookSlots>,
    body: impl FnOnce(&mut HookScope<'_>) -> Result<(), HookOrderViolation>,
) -> Result<(HookSlots, Vec<PendingEffect>), HookOrderViolation> {
    let path = path();
    let owner = TreeHandle::detached();
    let mut scope = HookScope::new(&path, previous, &owner);
    body(&mut scope)?;
    scope.finish()
}

#[test]
fn state_cells_are_stable_across_renders() {
    let mut first = Vec::new();
    let (slots, _) = render(None, |scope| {
        first.push(scope.use_state(|| 1)?);
        scope.use_state(|| "a".to_string())?;
        Ok(())
    })
    .unwrap();

    let mut inits = 0;
    let mut second = Vec::new();
    render(Some(&slots), |scope| {
        second.push(scope.use_state(|| {
            inits += 1;
            99
        })?);
        scope.use_state(|| String::new())?;
        Ok(())
    })
    .unwrap();

    assert_eq!(inits, 0);
    assert!(first[0].ptr_eq(&second[0]));
    assert_eq!(second[0].get(), 1);
}

#[test]
fn state_writes_are_visible_to_next_render() {
    let mut cell = None;
    let (slots, _) = render(None, |scope| {
        cell = Some(scope.use_state(|| 0u32)?);
        Ok(())
    })
    .unwrap();
    cell.unwrap().update(|value| *value += 5);

    render(Some(&slots), |scope| {
        assert_eq!(scope.use_state(|| 0u32)?.get(), 5);
        Ok(())
    })
    .unwrap();
}

#[test]
fn kind_mismatch_is_a_violation() {
    let (slots, _) = render(None, |scope| {
        scope.use_state(|| 1)?;
        Ok(())
    })
    .unwrap();

    let err = render(Some(&slots), |scope| {
        scope.use_cached(deps![], || 1)?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(
        err.detail,
        HookOrderDetail::KindMismatch {
            index: 0,
            expected: HookKind::State,
            found: HookKind::Cached,
        }
    );
    assert_eq!(err.path, path());
}

#[test]
fn type_mismatch_is_a_violation() {
    let (slots, _) = render(None, |scope| {
        scope.use_state(|| 1i32)?;
        Ok(())
    })
    .unwrap();

    let err = render(Some(&slots), |scope| {
        scope.use_state(|| "x")?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(
        err.detail,
        HookOrderDetail::TypeMismatch { index: 0, .. }
    ));
}

#[test]
fn fewer_hooks_than_last_render_is_a_violation() {
    let (slots, _) = render(None, |scope| {
        scope.use_state(|| 1)?;
        scope.use_state(|| 2)?;
        Ok(())
    })
    .unwrap();

    let err = render(Some(&slots), |scope| {
        scope.use_state(|| 1)?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(
        err.detail,
        HookOrderDetail::CountMismatch {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn swallowed_violation_still_fails_finish() {
    let (slots, _) = render(None, |scope| {
        scope.use_state(|| 1)?;
        Ok(())
    })
    .unwrap();

    let err = render(Some(&slots), |scope| {
        let _ = scope.use_effect(None, || None);
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err.detail, HookOrderDetail::KindMismatch { .. }));
}

#[test]
fn cached_value_recomputes_only_when_deps_change() {
    let computed = AtomicUsize::new(0);
    let compute = |value: u32| {
        computed.fetch_add(1, Ordering::SeqCst);
        value * 10
    };

    let (slots, _) = render(None, |scope| {
        assert_eq!(scope.use_cached(deps![1u32], || compute(1))?, 10);
        Ok(())
    })
    .unwrap();
    let (slots, _) = render(Some(&slots), |scope| {
        assert_eq!(scope.use_cached(deps![1u32], || compute(1))?, 10);
        Ok(())
    })
    .unwrap();
    render(Some(&slots), |scope| {
        assert_eq!(scope.use_cached(deps![2u32], || compute(2))?, 20);
        Ok(())
    })
    .unwrap();

    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[test]
fn effect_runs_on_dep_change_and_cleans_up_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let effect = |tag: &'static str| {
        let log = Arc::clone(&log);
        move || {
            log.lock().unwrap().push(format!("run {tag}"));
            let log = Arc::clone(&log);
            Some(Box::new(move || log.lock().unwrap().push(format!("clean {tag}"))) as Cleanup)
        }
    };

    let (slots, effects) = render(None, |scope| scope.use_effect(Some(deps![1]), effect("a"))).unwrap();
    assert_eq!(effects.len(), 1);
    effects.into_iter().for_each(PendingEffect::run);

    let (slots, effects) =
        render(Some(&slots), |scope| scope.use_effect(Some(deps![1]), effect("b"))).unwrap();
    assert!(effects.is_empty());

    let (slots, effects) =
        render(Some(&slots), |scope| scope.use_effect(Some(deps![2]), effect("c"))).unwrap();
    effects.into_iter().for_each(PendingEffect::run);
    slots.dispose();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["run a", "clean a", "run c", "clean c"]
    );
}

#[test]
fn effect_without_deps_runs_every_render() {
    let (slots, effects) = render(None, |scope| scope.use_effect(None, || None)).unwrap();
    assert_eq!(effects.len(), 1);
    let (_, effects) = render(Some(&slots), |scope| scope.use_effect(None, || None)).unwrap();
    assert_eq!(effects.len(), 1);
}
