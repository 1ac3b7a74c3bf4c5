#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_core::Facet;
use facet_reflect::ScalarType;
use facet_reflect::ReflectError;

mod bind;
mod coerce;
mod keymap;
mod source;
mod tags;

pub use bind::Binder;
pub use coerce::{Decode, DecodeError};
pub use keymap::{Keymap, normalize_key};
pub use source::{
    MIME_APPLICATION_FORM, MIME_APPLICATION_JSON, MIME_MULTIPART_FORM, MediaType, Source,
};
pub use tags::{DIRECTIVE_NAMESPACE, Directive};

/// Error type for binding.
#[derive(Debug)]
pub struct BindError {
    kind: BindErrorKind,
}

impl BindError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// Consumes the error, returning its kind.
    pub fn into_kind(self) -> BindErrorKind {
        self.kind
    }
}

impl Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "binding: {kind}")
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            BindErrorKind::Decode(e) => Some(&**e),
            #[cfg(feature = "json")]
            BindErrorKind::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl<K: Into<BindErrorKind>> From<K> for BindError {
    fn from(value: K) -> Self {
        let kind = value.into();
        BindError { kind }
    }
}

/// Detailed classification of binding errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum BindErrorKind {
    /// The bind target, or a field bound recursively, is not a record.
    NotStruct {
        /// Full name of the offending type.
        type_name: &'static str,
    },
    /// A field's type is not one the binder converts into: a scalar, an
    /// `Option` or `Box` of one, a `Vec` of those, a record, or a type with a
    /// registered decoder.
    UnsupportedValue {
        /// Full name of the offending type.
        type_name: &'static str,
    },
    /// A present value could not be parsed into the field's scalar type.
    Conversion {
        /// The raw input.
        value: String,
        /// The scalar type it was parsed as.
        scalar: ScalarType,
    },
    /// A required field was left at its zero value.
    Required {
        /// The key the field was looked up under.
        field: String,
    },
    /// A custom-decode type rejected its input.
    Decode(DecodeError),
    /// Building the value through reflection failed, for instance on a field
    /// type without a default value.
    Reflect(ReflectError),
    /// The request content type cannot be bound.
    UnsupportedMediaType(String),
    /// The JSON body is malformed.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
    /// A JSON member holds a value that cannot be flattened into strings.
    #[cfg(feature = "json")]
    InvalidJsonValue {
        /// The member's key.
        key: String,
    },
}

impl Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::NotStruct { type_name } => {
                write!(f, "binding element must be a struct, got `{type_name}`")
            }
            BindErrorKind::UnsupportedValue { type_name } => {
                write!(f, "unsupported field type `{type_name}`")
            }
            BindErrorKind::Conversion { value, scalar } => {
                let (name, category) = coerce::scalar_name(*scalar);
                write!(f, "cannot convert {value:?} into {name} ({category})")
            }
            BindErrorKind::Required { field } => {
                write!(f, "required field '{field}' with zero value")
            }
            BindErrorKind::Decode(e) => write!(f, "{e}"),
            BindErrorKind::Reflect(reflect_error) => write!(f, "{reflect_error}"),
            BindErrorKind::UnsupportedMediaType(content_type) => {
                write!(f, "binding an unsupported content type '{content_type}'")
            }
            #[cfg(feature = "json")]
            BindErrorKind::Json(e) => write!(f, "{e}"),
            #[cfg(feature = "json")]
            BindErrorKind::InvalidJsonValue { key } => {
                write!(
                    f,
                    "JSON member '{key}' must be a string, number, boolean, null or an array of those"
                )
            }
        }
    }
}

impl From<ReflectError> for BindErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for BindErrorKind {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

type Result<T> = std::result::Result<T, BindError>;

/// Binds `keymap` onto a fresh `T`, matching fields through their tags under
/// `namespace`.
///
/// Returns the first error met while walking the fields in declaration order.
///
/// # Example
/// ```
/// use facet::Facet;
/// use formbind::Keymap;
///
/// #[derive(Facet, Default, Debug, PartialEq)]
/// struct Login {
///     #[facet(form = "user", binding = "required")]
///     name: String,
///     remember_me: bool,
/// }
///
/// let keymap = Keymap::from_iter([("user", "gopher"), ("Remember-Me", "true")]);
/// let login: Login = formbind::bind(&keymap, "form")?;
/// assert_eq!(login, Login { name: "gopher".into(), remember_me: true });
/// # Ok::<(), formbind::BindError>(())
/// ```
pub fn bind<T: Facet<'static>>(keymap: &Keymap, namespace: &str) -> Result<T> {
    log::trace!("Entering `bind` function");

    Binder::new(namespace).bind(keymap)
}

/// Like [`bind`], but stores the bound record in an existing value.
///
/// On error `target` is left untouched.
pub fn bind_into<T: Facet<'static>>(target: &mut T, keymap: &Keymap, namespace: &str) -> Result<()> {
    log::trace!("Entering `bind_into` function");

    Binder::new(namespace).bind_into(target, keymap)
}

/// Binds a URL query string (with or without its leading `?`) under the
/// `query` namespace.
#[cfg(feature = "urlencoded")]
pub fn bind_query<T: Facet<'static>>(query: &str) -> Result<T> {
    let query = query.strip_prefix('?').unwrap_or(query);
    Source::Query
        .binder()
        .bind(&Keymap::from_urlencoded(query.as_bytes()))
}

/// Binds an `application/x-www-form-urlencoded` body under the `form`
/// namespace.
#[cfg(feature = "urlencoded")]
pub fn bind_form<T: Facet<'static>>(body: &[u8]) -> Result<T> {
    Source::Form.binder().bind(&Keymap::from_urlencoded(body))
}

/// Binds a flat JSON object under the `json` namespace.
///
/// See [`Keymap::from_json`] for the accepted member values.
#[cfg(feature = "json")]
pub fn bind_json<T: Facet<'static>>(body: &[u8]) -> Result<T> {
    Source::Json.binder().bind(&Keymap::from_json(body)?)
}

/// Binds a request body, choosing the decoding and the namespace from its
/// content type.
///
/// Multipart bodies must be turned into a [`Keymap`] by the transport layer
/// and bound with [`Source::Form`]; they are rejected here.
#[cfg(all(feature = "json", feature = "urlencoded"))]
pub fn bind_body<T: Facet<'static>>(content_type: &str, body: &[u8]) -> Result<T> {
    log::trace!("Entering `bind_body` function for {content_type:?}");

    match MediaType::from_content_type(content_type)? {
        MediaType::Json => bind_json(body),
        MediaType::UrlEncoded => bind_form(body),
        MediaType::Multipart => {
            Err(BindErrorKind::UnsupportedMediaType(content_type.to_owned()).into())
        }
    }
}
