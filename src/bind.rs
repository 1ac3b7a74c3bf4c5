use std::borrow::Cow;

use facet_core::{Def, Facet, Field, Shape, Type, UserType};
use facet_reflect::Partial;

use crate::{
    BindErrorKind, Decode, Keymap, Result,
    coerce::{Decoder, coerce, find_decoder},
    keymap::normalize_key,
    tags::{self, Directive},
};

/// A binding configuration: which tag namespace selects the keys of fields,
/// and which types decode themselves.
///
/// ```
/// use facet::Facet;
/// use formbind::{Binder, Keymap};
///
/// #[derive(Facet, Default)]
/// struct Page {
///     #[facet(query = "p")]
///     number: u32,
/// }
///
/// let binder = Binder::new("query");
/// let page: Page = binder.bind(&Keymap::from_iter([("p", "3")]))?;
/// assert_eq!(page.number, 3);
/// # Ok::<(), formbind::BindError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Binder<'ns> {
    namespace: &'ns str,
    decoders: Vec<Decoder>,
}

impl<'ns> Binder<'ns> {
    /// A binder matching fields through their tags under `namespace`.
    pub const fn new(namespace: &'ns str) -> Self {
        Self {
            namespace,
            decoders: Vec::new(),
        }
    }

    /// The tag namespace in use.
    pub fn namespace(&self) -> &'ns str {
        self.namespace
    }

    /// Decodes every `T` this binder meets, including `T` inside `Option`,
    /// `Box` and `Vec`, with `T`'s [`Decode`] implementation.
    ///
    /// Decoding starts from `T::default()`, and the result counts as zero
    /// for `binding = "required"` when it equals that default.
    pub fn with_decoder<T>(mut self) -> Self
    where
        T: Facet<'static> + Decode + Default + PartialEq,
    {
        self.decoders.push(Decoder::of::<T>());
        self
    }

    /// Binds `keymap` onto a fresh `T`.
    pub fn bind<T: Facet<'static>>(&self, keymap: &Keymap) -> Result<T> {
        log::trace!(
            "Binding {} under namespace {:?}",
            T::SHAPE,
            self.namespace
        );

        if !matches!(T::SHAPE.ty, Type::User(UserType::Struct(_))) {
            return Err(BindErrorKind::NotStruct {
                type_name: T::SHAPE.type_identifier,
            }
            .into());
        }

        let keymap = keymap.normalize();
        let mut typed_partial = Partial::alloc::<T>()?;
        RecordBinder {
            keymap: &keymap,
            namespace: self.namespace,
            decoders: &self.decoders,
        }
        .bind_record(typed_partial.inner_mut())?;

        let boxed_value = typed_partial.build()?;
        log::trace!("Record fully built");

        Ok(*boxed_value)
    }

    /// Binds `keymap` onto a fresh `T` and stores it in `target`. On error
    /// `target` is left untouched.
    pub fn bind_into<T: Facet<'static>>(&self, target: &mut T, keymap: &Keymap) -> Result<()> {
        *target = self.bind(keymap)?;
        Ok(())
    }
}

/// How a field is matched against the keymap.
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    /// The field is never bound.
    Skip,
    /// The field is a record bound from the whole keymap.
    Recurse,
    /// The field is bound from the values of this key.
    Lookup(Cow<'static, str>),
}

fn is_record(shape: &Shape) -> bool {
    matches!(shape.ty, Type::User(UserType::Struct(_)))
}

fn resolve(field: &Field, namespace: &str, decoders: &[Decoder]) -> Resolution {
    let tag = tags::tag(field, namespace);
    if tag == Some("-") || tags::directive(field) == Some(Directive::Skip) {
        return Resolution::Skip;
    }

    match tag {
        Some(key) if !key.is_empty() => Resolution::Lookup(Cow::Borrowed(key)),
        _ => {
            let shape = (field.shape)();
            if is_record(shape) && find_decoder(decoders, shape).is_none() {
                Resolution::Recurse
            } else {
                let name = field.name.strip_prefix("r#").unwrap_or(field.name);
                Resolution::Lookup(Cow::Owned(normalize_key(name)))
            }
        }
    }
}

struct RecordBinder<'a> {
    /// Already normalized.
    keymap: &'a Keymap,
    namespace: &'a str,
    decoders: &'a [Decoder],
}

impl RecordBinder<'_> {
    fn bind_record(&self, partial: &mut Partial<'static>) -> Result<()> {
        let shape = partial.shape();
        log::trace!("Entering `bind_record` method for {shape}");

        let Type::User(UserType::Struct(record)) = &shape.ty else {
            return Err(BindErrorKind::NotStruct {
                type_name: shape.type_identifier,
            }
            .into());
        };

        for (index, field) in record.fields.iter().enumerate() {
            let resolution = resolve(field, self.namespace, self.decoders);
            log::trace!("Field `{}` of {shape} resolved to {resolution:?}", field.name);

            let key = match resolution {
                Resolution::Skip => {
                    log::debug!("Skipping field `{}` of {shape}", field.name);
                    partial.set_nth_field_to_default(index)?;
                    continue;
                }
                Resolution::Recurse => {
                    partial.begin_field(field.name)?;
                    self.bind_record(partial)?;
                    partial.end()?;
                    continue;
                }
                Resolution::Lookup(key) => key,
            };

            partial.begin_field(field.name)?;
            let zero = self.bind_field(partial, &key)?;
            partial.end()?;

            if zero && tags::directive(field) == Some(Directive::Required) {
                return Err(BindErrorKind::Required {
                    field: key.into_owned(),
                }
                .into());
            }
        }

        log::trace!("Exiting `bind_record` method for {shape}");
        Ok(())
    }

    /// Binds the field under construction in `partial`, returning whether it
    /// was left at its zero value.
    fn bind_field(&self, partial: &mut Partial<'static>, key: &str) -> Result<bool> {
        let values = match self.keymap.get(key) {
            Some(values) if !values.is_empty() => values,
            _ => {
                log::debug!("No value for key {key:?}, leaving {} at zero", partial.shape());
                partial.set_default()?;
                return Ok(true);
            }
        };

        let shape = partial.shape();
        if matches!(shape.def, Def::List(_)) && find_decoder(self.decoders, shape).is_none() {
            log::trace!("Filling {shape} with {} item(s) of key {key:?}", values.len());
            partial.begin_list()?;
            for value in values {
                partial.begin_list_item()?;
                coerce(partial, value, self.decoders)?;
                partial.end()?;
            }
            return Ok(false);
        }

        coerce(partial, &values[0], self.decoders)
    }
}
