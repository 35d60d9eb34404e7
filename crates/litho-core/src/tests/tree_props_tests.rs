use super::*;

#[derive(Debug, PartialEq)]
struct Theme(&'static str);

#[derive(Debug, PartialEq)]
struct Density(u32);

#[test]
fn absent_value_reads_none() {
    let props = TreeProps::new();
    assert!(props.get::<Theme>().is_none());
    assert!(props.is_empty());
}

#[test]
fn fork_does_not_touch_parent() {
    let parent = TreeProps::new().with(Theme("light"));
    let child = parent.with(Theme("dark")).with(Density(2));

    assert_eq!(*parent.get::<Theme>().unwrap(), Theme("light"));
    assert!(parent.get::<Density>().is_none());
    assert_eq!(*child.get::<Theme>().unwrap(), Theme("dark"));
    assert_eq!(*child.get::<Density>().unwrap(), Density(2));
}

#[test]
fn sibling_forks_are_independent() {
    let parent = TreeProps::new().with(Density(1));
    let left = parent.with(Theme("left"));
    let right = parent.with(Theme("right"));

    assert_eq!(*left.get::<Theme>().unwrap(), Theme("left"));
    assert_eq!(*right.get::<Theme>().unwrap(), Theme("right"));
    assert_eq!(*right.get::<Density>().unwrap(), Density(1));
    assert_eq!(parent.len(), 1);
}

#[test]
fn in_place_insert_copies_shared_map() {
    let parent = TreeProps::new().with(Density(1));
    let mut child = parent.clone();
    child.insert(Density(3));

    assert_eq!(*parent.get::<Density>().unwrap(), Density(1));
    assert_eq!(*child.get::<Density>().unwrap(), Density(3));
}
