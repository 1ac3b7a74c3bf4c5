#![allow(missing_docs)]

use std::collections::HashMap;

use facet::Facet;
use formbind::{BindErrorKind, Keymap};

#[derive(Facet, Default, Debug)]
struct Signup {
    #[facet(form = "user", binding = "required")]
    name: String,
    #[facet(binding = "required")]
    age: u8,
    #[facet(required)]
    roles: Vec<String>,
}

fn required_key(keymap: &Keymap) -> String {
    let err = formbind::bind::<Signup>(keymap, "form").unwrap_err();
    match err.into_kind() {
        BindErrorKind::Required { field } => field,
        other => panic!("expected a required error, got {other}"),
    }
}

#[test]
fn present_values_satisfy_required() {
    let keymap = Keymap::from_iter([("user", "gopher"), ("age", "3"), ("roles", "admin")]);
    let signup: Signup = formbind::bind(&keymap, "form").unwrap();
    assert_eq!(signup.name, "gopher");
    assert_eq!(signup.age, 3);
}

#[test]
fn missing_required_keys_are_named() {
    assert_eq!(required_key(&Keymap::new()), "user");
    assert_eq!(required_key(&Keymap::from_iter([("user", "gopher")])), "age");
    assert_eq!(
        required_key(&Keymap::from_iter([("user", "gopher"), ("age", "1")])),
        "roles"
    );
}

#[test]
fn zero_values_count_as_missing() {
    let keymap = Keymap::from_iter([("user", "gopher"), ("age", "0")]);
    assert_eq!(required_key(&keymap), "age");

    let keymap = Keymap::from_iter([("user", "")]);
    assert_eq!(required_key(&keymap), "user");

    let mut keymap = Keymap::from_iter([("user", "gopher"), ("age", "1")]);
    keymap.insert("roles", Vec::<String>::new());
    assert_eq!(required_key(&keymap), "roles");
}

#[test]
fn the_key_is_reported_under_the_active_namespace() {
    let err = formbind::bind::<Signup>(&Keymap::new(), "json").unwrap_err();
    assert_eq!(
        err.to_string(),
        "binding: required field 'name' with zero value"
    );
}

#[test]
fn present_optionals_satisfy_required() {
    #[derive(Facet, Default, Debug)]
    struct Poll {
        #[facet(required)]
        answer: Option<bool>,
    }

    let poll: Poll = formbind::bind(&Keymap::from_iter([("answer", "false")]), "form").unwrap();
    assert_eq!(poll.answer, Some(false));

    let err = formbind::bind::<Poll>(&Keymap::new(), "form").unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::Required { field } if field == "answer"));
}

#[test]
fn skipped_fields_are_never_bound_nor_required() {
    #[derive(Facet, Default, Debug)]
    struct Secret {
        #[facet(skip)]
        token: String,
        #[facet(binding = "-")]
        salt: String,
        #[facet(form = "-")]
        pepper: String,
    }

    let keymap = Keymap::from_iter([("token", "t"), ("salt", "s"), ("pepper", "p")]);
    let secret: Secret = formbind::bind(&keymap, "form").unwrap();
    assert_eq!(secret.token, "");
    assert_eq!(secret.salt, "");
    assert_eq!(secret.pepper, "");

    let secret: Secret = formbind::bind(&keymap, "json").unwrap();
    assert_eq!(secret.token, "");
    assert_eq!(secret.pepper, "p");
}

#[test]
fn skipped_fields_may_have_any_type() {
    #[derive(Facet, Default, Debug)]
    struct Session {
        user: String,
        #[facet(binding = "-")]
        cache: HashMap<String, u8>,
    }

    let keymap = Keymap::from_iter([("user", "gopher"), ("cache", "1")]);
    let session: Session = formbind::bind(&keymap, "form").unwrap();
    assert_eq!(session.user, "gopher");
    assert!(session.cache.is_empty());
}
