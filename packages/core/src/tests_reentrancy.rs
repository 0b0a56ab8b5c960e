// Callbacks that mutate the document or the registry while a batch drains

use crate::test_support::{init_tracing, recorder, Journal};
use crate::host::MutationSource;
use crate::vdom::{VElement, VirtualDocument};
use crate::{ObserverState, TraitInstance, TraitSystem};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct Noop;

impl TraitInstance for Noop {}

/// System handle a constructor can reach back into
type SharedSystem = Rc<RefCell<Weak<TraitSystem<VirtualDocument>>>>;

fn system_slot() -> SharedSystem {
    Rc::new(RefCell::new(Weak::new()))
}

#[test]
fn test_constructor_mutations_form_a_later_batch() {
    init_tracing();
    let journal = Rc::new(Journal::default());
    let system = Rc::new(TraitSystem::with_defaults(VirtualDocument::new()));

    // "spawner" appends a child carrying "highlight" to its own element
    system
        .define_trait("spawner", |element: &VElement| {
            let child = VElement::new("span").with_attr("traits", "highlight");
            element.append_child(&child)?;
            Ok(Box::new(Noop) as Box<dyn TraitInstance>)
        })
        .unwrap();
    system.define_trait("highlight", recorder("highlight", &journal)).unwrap();
    system.start();

    let div = VElement::new("div").with_attr("traits", "spawner");
    system.document().body().append_child(&div).unwrap();
    let reports = system.flush();

    // The first batch already reaches the spawned span through div's subtree;
    // the span's own record arrives as a second batch and changes nothing
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].instantiated, 0);
    assert_eq!(journal.take(), vec!["up:highlight#0"]);
    assert_eq!(system.instance_count(), 2);
}

#[test]
fn test_delivery_during_drain_is_queued() {
    init_tracing();
    let journal = Rc::new(Journal::default());
    let slot = system_slot();
    let system = Rc::new(TraitSystem::with_defaults(VirtualDocument::new()));
    *slot.borrow_mut() = Rc::downgrade(&system);

    let observed_state = Rc::new(RefCell::new(Vec::new()));
    let target = VElement::new("aside").with_attr("traits", "highlight");

    {
        let slot = slot.clone();
        let observed_state = observed_state.clone();
        let target = target.clone();
        system
            .define_trait("relay", move |_: &VElement| {
                let system = slot.borrow().upgrade().expect("system alive");
                observed_state.borrow_mut().push(system.state());

                // Nested delivery: must not run inside this constructor
                let drained = system.deliver(vec![crate::MutationRecord::added(target.clone())]);
                assert!(drained.is_empty());
                assert!(system.trait_names(&target).is_empty());
                assert!(system.inspect(|store| store.len()).is_none());
                Ok(Box::new(Noop) as Box<dyn TraitInstance>)
            })
            .unwrap();
    }
    system.define_trait("highlight", recorder("highlight", &journal)).unwrap();
    system.start();

    // Connect both quietly, then hand over the batch by hand
    let div = VElement::new("div").with_attr("traits", "relay");
    system.document().body().append_child(&div).unwrap();
    system.document().body().append_child(&target).unwrap();
    system.document().take_records();
    let reports = system.deliver(vec![crate::MutationRecord::added(div)]);

    // The queued batch ran after the outer one, inside the same call
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].instantiated, 1);
    assert_eq!(*observed_state.borrow(), vec![ObserverState::Draining]);
    assert_eq!(system.state(), ObserverState::Idle);
    assert_eq!(system.trait_names(&target), vec!["highlight"]);
    assert_eq!(system.inspect(|store| store.len()), Some(2));
    assert_eq!(journal.take(), vec!["up:highlight#0"]);
}

#[test]
fn test_constructor_defining_a_trait() {
    init_tracing();
    let journal = Rc::new(Journal::default());
    let slot = system_slot();
    let system = Rc::new(TraitSystem::with_defaults(VirtualDocument::new()));
    *slot.borrow_mut() = Rc::downgrade(&system);

    {
        let slot = slot.clone();
        let journal = journal.clone();
        system
            .define_trait("loader", move |_: &VElement| {
                let system = slot.borrow().upgrade().expect("system alive");
                system.define_trait("loaded", recorder("loaded", &journal))?;
                Ok(Box::new(Noop) as Box<dyn TraitInstance>)
            })
            .unwrap();
    }
    system.start();

    // Both names listed: "loaded" is defined by the first constructor, before
    // the engine reaches it
    let div = VElement::new("div").with_attr("traits", "loader loaded");
    system.document().body().append_child(&div).unwrap();
    system.flush();

    assert_eq!(system.trait_names(&div), vec!["loader", "loaded"]);
    assert_eq!(journal.take(), vec!["up:loaded#0"]);
}

#[test]
fn test_teardown_mutating_document() {
    struct Cleaner {
        sibling: VElement,
    }

    impl TraitInstance for Cleaner {
        fn disconnected(self: Box<Self>) -> anyhow::Result<()> {
            self.sibling.remove();
            Ok(())
        }
    }

    init_tracing();
    let journal = Rc::new(Journal::default());
    let system = TraitSystem::with_defaults(VirtualDocument::new());
    let sibling = VElement::new("p").with_attr("traits", "highlight");

    {
        let sibling = sibling.clone();
        system
            .define_trait("cleaner", move |_: &VElement| {
                Ok(Box::new(Cleaner {
                    sibling: sibling.clone(),
                }) as Box<dyn TraitInstance>)
            })
            .unwrap();
    }
    system.define_trait("highlight", recorder("highlight", &journal)).unwrap();
    system.start();

    let div = VElement::new("div").with_attr("traits", "cleaner");
    system.document().body().append_child(&div).unwrap();
    system.document().body().append_child(&sibling).unwrap();
    system.flush();
    assert_eq!(system.instance_count(), 2);

    div.remove();
    system.flush();

    assert_eq!(system.instance_count(), 0);
    assert_eq!(journal.take(), vec!["up:highlight#0", "down:highlight#0"]);
}
