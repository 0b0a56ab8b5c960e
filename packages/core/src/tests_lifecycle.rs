// Lifecycle tests: instances follow the document through the trait system

use crate::test_support::{mount, recorder, recording_system, Journal};
use crate::host::MutationSource;
use crate::vdom::{VElement, VirtualDocument};
use crate::{ConfigError, TraitInstance, TraitSystem, TraitsConfig};
use std::rc::Rc;

#[test]
fn test_highlight_glow_scenario() {
    let (system, journal) = recording_system(&["highlight"]);

    let div = mount(&system, "highlight");
    assert_eq!(journal.take(), vec!["up:highlight#0"]);

    // glow is not registered: ignored, highlight untouched
    div.set_attribute("traits", "highlight glow");
    system.flush();
    assert!(journal.take().is_empty());
    assert_eq!(system.trait_names(&div), vec!["highlight"]);

    div.set_attribute("traits", "");
    system.flush();
    assert_eq!(journal.take(), vec!["down:highlight#0"]);
    assert!(system.tracked_elements().is_empty());

    // Already torn down
    div.remove();
    system.flush();
    assert!(journal.take().is_empty());
}

#[test]
fn test_bootstrap_instantiates_existing_elements() {
    let journal = Rc::new(Journal::default());
    let document = VirtualDocument::new();
    let early = VElement::new("div").with_attr("traits", "highlight");
    let nested = VElement::new("span").with_attr("traits", "highlight");
    document.body().append_child(&early).unwrap();
    early.append_child(&nested).unwrap();

    let system = TraitSystem::with_defaults(document);
    system.define_trait("highlight", recorder("highlight", &journal)).unwrap();

    let reports = system.start();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].records, 2);
    assert_eq!(reports[0].instantiated, 2);
    assert_eq!(journal.count("up:"), 2);

    // The records queued while building the document are redundant now
    system.flush();
    assert_eq!(journal.count("up:"), 2);
    assert_eq!(system.instance_count(), 2);
}

#[test]
fn test_start_runs_once() {
    let (system, journal) = recording_system(&["highlight"]);
    mount(&system, "highlight");
    journal.take();

    assert!(system.is_started());
    assert!(system.start().is_empty());
    assert!(journal.take().is_empty());
}

#[test]
fn test_removing_ancestor_tears_down_descendants() {
    let (system, journal) = recording_system(&["highlight", "glow"]);

    let section = VElement::new("section").with_attr("traits", "glow");
    let child = VElement::new("div").with_attr("traits", "highlight glow");
    let grandchild = VElement::new("span").with_attr("traits", "highlight");
    section.append_child(&child).unwrap();
    child.append_child(&grandchild).unwrap();
    system.document().body().append_child(&section).unwrap();
    system.flush();
    assert_eq!(system.instance_count(), 4);
    journal.take();

    section.remove();
    system.flush();

    let events = journal.take();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|event| event.starts_with("down:")));
    assert_eq!(system.instance_count(), 0);
    assert!(system.trait_names(&grandchild).is_empty());
}

#[test]
fn test_attribute_change_is_a_delta() {
    let (system, journal) = recording_system(&["highlight", "glow", "fade"]);

    let div = mount(&system, "highlight glow");
    journal.take();

    div.set_attribute("traits", "glow fade");
    system.flush();

    assert_eq!(journal.take(), vec!["down:highlight#0", "up:fade#2"]);
    assert_eq!(system.trait_names(&div), vec!["glow", "fade"]);
}

#[test]
fn test_same_value_is_noop() {
    let (system, journal) = recording_system(&["highlight"]);
    let div = mount(&system, "highlight");
    journal.take();

    div.set_attribute("traits", "highlight");
    let reports = system.flush();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].instantiated, 0);
    assert_eq!(reports[0].destroyed, 0);
    assert!(journal.take().is_empty());
}

#[test]
fn test_token_order_does_not_matter() {
    let (system, journal) = recording_system(&["highlight", "glow"]);
    let div = mount(&system, "highlight glow");
    journal.take();

    div.set_attribute("traits", "  glow   highlight ");
    system.flush();

    assert!(journal.take().is_empty());
    assert_eq!(system.instance_count(), 2);
}

#[test]
fn test_removing_attribute_tears_down() {
    let (system, journal) = recording_system(&["highlight", "glow"]);
    let div = mount(&system, "highlight glow");
    journal.take();

    div.remove_attribute("traits");
    system.flush();

    assert_eq!(journal.take(), vec!["down:highlight#0", "down:glow#1"]);
    assert!(system.trait_names(&div).is_empty());
}

#[test]
fn test_reinsert_instantiates_again() {
    let (system, journal) = recording_system(&["highlight"]);
    let div = mount(&system, "highlight");

    div.remove();
    system.flush();
    system.document().body().append_child(&div).unwrap();
    system.flush();

    assert_eq!(
        journal.take(),
        vec!["up:highlight#0", "down:highlight#0", "up:highlight#1"]
    );
}

#[test]
fn test_move_within_one_batch_converges() {
    let (system, journal) = recording_system(&["highlight"]);
    let left = VElement::new("left");
    let right = VElement::new("right");
    system.document().body().append_child(&left).unwrap();
    system.document().body().append_child(&right).unwrap();
    let item = VElement::new("item").with_attr("traits", "highlight");
    left.append_child(&item).unwrap();
    system.flush();
    journal.take();

    right.append_child(&item).unwrap();
    system.flush();

    // Removal then re-addition: one instance remains
    assert_eq!(system.trait_names(&item), vec!["highlight"]);
    assert_eq!(system.instance_count(), 1);
    assert_eq!(journal.count("up:"), journal.count("down:"));
}

#[test]
fn test_add_then_remove_in_one_batch_leaves_nothing() {
    let (system, journal) = recording_system(&["highlight"]);

    let div = VElement::new("div").with_attr("traits", "highlight");
    system.document().body().append_child(&div).unwrap();
    div.remove();
    system.flush();

    assert_eq!(system.instance_count(), 0);
    assert_eq!(journal.count("up:"), journal.count("down:"));
}

#[test]
fn test_retroactive_define() {
    let journal = Rc::new(Journal::default());
    let config = TraitsConfig {
        retroactive_define: true,
        ..TraitsConfig::default()
    };
    let system = TraitSystem::new(VirtualDocument::new(), config).unwrap();
    system.start();

    let div = VElement::new("div").with_attr("traits", "late other");
    let plain = VElement::new("div").with_attr("traits", "other");
    system.document().body().append_child(&div).unwrap();
    system.document().body().append_child(&plain).unwrap();
    system.flush();
    assert_eq!(system.instance_count(), 0);

    system.define_trait("late", recorder("late", &journal)).unwrap();

    assert_eq!(journal.take(), vec!["up:late#0"]);
    assert_eq!(system.trait_names(&div), vec!["late"]);
    assert!(system.trait_names(&plain).is_empty());
}

#[test]
fn test_define_after_start_is_not_retroactive_by_default() {
    let (system, journal) = recording_system(&[]);
    let div = mount(&system, "late");

    system.define_trait("late", recorder("late", &journal)).unwrap();
    assert!(system.trait_names(&div).is_empty());

    // The next change to the element picks it up
    div.set_attribute("traits", "late ");
    system.flush();
    assert_eq!(journal.take(), vec!["up:late#0"]);
}

#[test]
fn test_custom_attribute_name() {
    let journal = Rc::new(Journal::default());
    let config = TraitsConfig::from_json(r#"{ "attribute": "data-traits" }"#).unwrap();
    let system = TraitSystem::new(VirtualDocument::new(), config).unwrap();
    system.define_trait("glow", recorder("glow", &journal)).unwrap();
    system.start();

    let ignored = VElement::new("div").with_attr("traits", "glow");
    let used = VElement::new("div").with_attr("data-traits", "glow");
    system.document().body().append_child(&ignored).unwrap();
    system.document().body().append_child(&used).unwrap();
    system.flush();

    assert!(system.trait_names(&ignored).is_empty());
    assert_eq!(system.trait_names(&used), vec!["glow"]);
}

#[test]
fn test_invalid_attribute_rejected_at_construction() {
    let config = TraitsConfig {
        attribute: "my traits".to_string(),
        ..TraitsConfig::default()
    };

    let result = TraitSystem::new(VirtualDocument::new(), config);
    assert!(matches!(result, Err(ConfigError::InvalidAttribute(name)) if name == "my traits"));
}

#[test]
fn test_shutdown_tears_everything_down() {
    let (system, journal) = recording_system(&["highlight", "glow"]);
    mount(&system, "highlight");
    mount(&system, "glow highlight");
    journal.take();

    let report = system.shutdown();
    assert_eq!(report.destroyed.len(), 3);
    assert_eq!(journal.count("down:"), 3);
    assert_eq!(system.instance_count(), 0);
}

#[test]
fn test_sweep_reclaims_dropped_elements() {
    struct Noop;
    impl TraitInstance for Noop {}

    let system = TraitSystem::with_defaults(VirtualDocument::new());
    system
        .define_trait("highlight", |_: &VElement| Ok(Box::new(Noop) as Box<dyn TraitInstance>))
        .unwrap();
    system.start();

    let orphan = mount(&system, "highlight");
    assert_eq!(system.instance_count(), 1);

    // Detached with its removal record discarded: no teardown ever follows
    orphan.remove();
    system.document().take_records();
    assert!(system.sweep().is_noop());
    drop(orphan);

    let report = system.sweep();
    assert_eq!(report.destroyed, vec!["highlight"]);
    assert_eq!(system.instance_count(), 0);
}
