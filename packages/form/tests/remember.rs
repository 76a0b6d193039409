//! Mirroring data and errors into a remember store, and restoring from it.

use std::rc::Rc;

use peregrine_core::{
    Errors, ManualScheduler, MemoryDispatcher, MemoryStore, Page, RememberStore, VisitOptions,
};
use peregrine_form::Form;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
struct Signup {
    name: String,
    company: String,
}

impl Signup {
    fn blank() -> Self {
        Self {
            name: String::new(),
            company: String::new(),
        }
    }
}

fn remembered_form(store: &Rc<MemoryStore>) -> Form<Signup> {
    Form::builder(
        Rc::new(MemoryDispatcher::new()),
        Rc::new(ManualScheduler::new()),
        Signup::blank(),
    )
    .remember("NewUser", store.clone())
    .build()
}

#[test]
fn mutations_mirror_into_the_store() {
    let store = Rc::new(MemoryStore::new());
    let form = remembered_form(&store);

    form.set_field("name", "Ada").unwrap();

    assert_eq!(
        store.get("NewUser:data"),
        Some(json!({"name": "Ada", "company": ""}))
    );
    assert_eq!(store.get("NewUser:errors"), Some(json!({})));

    form.set_field_error("name", "has already been taken");
    assert_eq!(
        store.get("NewUser:errors"),
        Some(json!({"name": "has already been taken"}))
    );
}

#[test]
fn a_recreated_form_restores_data_and_errors() {
    let store = Rc::new(MemoryStore::new());
    let first = remembered_form(&store);
    first.set_field("name", "Ada").unwrap();
    first.set_field_error("company", "required");

    let second = remembered_form(&store);

    assert_eq!(second.data().name, "Ada");
    // defaults stay at the initial values, so restored data reads as dirty
    assert_eq!(second.defaults(), Signup::blank());
    assert!(second.is_dirty());
    // restored errors re-establish the has_errors invariant
    assert!(second.has_errors());
    assert_eq!(second.error("company").as_deref(), Some("required"));
}

#[test]
fn ill_typed_snapshots_fall_back_to_the_initial_values() {
    let store = Rc::new(MemoryStore::new());
    store.set("NewUser:data", json!(42));
    store.set("NewUser:errors", json!("not a map"));

    let form = remembered_form(&store);

    assert_eq!(form.data(), Signup::blank());
    assert!(!form.has_errors());
}

#[test]
fn lifecycle_outcomes_are_mirrored_too() {
    let store = Rc::new(MemoryStore::new());
    let dispatcher = Rc::new(MemoryDispatcher::new());
    let form = Form::builder(
        dispatcher.clone(),
        Rc::new(ManualScheduler::new()),
        Signup::blank(),
    )
    .remember("NewUser", store.clone())
    .build();

    form.post("/signup", VisitOptions::default()).unwrap();
    let errors: Errors = [("name".to_string(), "required".to_string())]
        .into_iter()
        .collect();
    dispatcher.fail(errors);
    assert_eq!(store.get("NewUser:errors"), Some(json!({"name": "required"})));

    form.post("/signup", VisitOptions::default()).unwrap();
    dispatcher.succeed(Page::new("welcome", "/welcome"));
    assert_eq!(store.get("NewUser:errors"), Some(json!({})));
}

#[test]
fn forms_without_a_key_leave_the_store_alone() {
    let store = Rc::new(MemoryStore::new());
    let form = Form::new(
        Rc::new(MemoryDispatcher::new()),
        Rc::new(ManualScheduler::new()),
        Signup::blank(),
    );

    form.set_field("name", "Ada").unwrap();

    assert!(store.is_empty());
}
