//! Binding tags, read from a field's `#[facet(...)]` attributes.
//!
//! `#[facet(form = "user", json = "username")]` gives the key a field is
//! looked up under, per namespace. `#[facet(binding = "required")]` and
//! `#[facet(binding = "-")]` are directives that hold in every namespace.

use facet_core::{Field, FieldAttribute};

/// Namespace of the directive tag.
pub const DIRECTIVE_NAMESPACE: &str = "binding";

/// What the `binding` directive asks of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// The field must not be left at its zero value.
    Required,
    /// The field is never bound.
    Skip,
}

// `form = "user"` reads as ("form", Some("user")), `skip` as ("skip", None).
fn split(attribute: &'static str) -> (&'static str, Option<&'static str>) {
    match attribute.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
        None => (attribute.trim(), None),
    }
}

fn arbitrary(field: &Field) -> impl Iterator<Item = (&'static str, Option<&'static str>)> {
    field.attributes.iter().filter_map(|attribute| {
        if let FieldAttribute::Arbitrary(attribute) = attribute {
            Some(split(*attribute))
        } else {
            None
        }
    })
}

/// The field's tag under `namespace`, if it declares one.
pub fn tag(field: &Field, namespace: &str) -> Option<&'static str> {
    arbitrary(field).find_map(|(name, value)| (name == namespace).then_some(value).flatten())
}

/// The field's directive. A bare `skip` or `required` attribute counts too.
pub fn directive(field: &Field) -> Option<Directive> {
    arbitrary(field).find_map(|attribute| match attribute {
        (DIRECTIVE_NAMESPACE, Some("required")) | ("required", None) => {
            Some(Directive::Required)
        }
        (DIRECTIVE_NAMESPACE, Some("-")) | ("skip", None) => Some(Directive::Skip),
        _ => None,
    })
}
