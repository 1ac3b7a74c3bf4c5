//! Where keymaps come from, and which tag namespace each source binds with.

use crate::{BindErrorKind, Binder, Result};

/// MIME type of urlencoded forms.
pub const MIME_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// MIME type of JSON bodies.
pub const MIME_APPLICATION_JSON: &str = "application/json";
/// MIME type of multipart forms.
pub const MIME_MULTIPART_FORM: &str = "multipart/form-data";

/// The origin of a keymap. Each source reads its own tag namespace, so one
/// record can carry different keys for JSON, form and query input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// A flat JSON object; tag namespace `json`.
    Json,
    /// A urlencoded or multipart form; tag namespace `form`.
    Form,
    /// A URL query string; tag namespace `query`.
    Query,
}

impl Source {
    /// The tag namespace fields are matched under.
    pub const fn namespace(self) -> &'static str {
        match self {
            Source::Json => "json",
            Source::Form => "form",
            Source::Query => "query",
        }
    }

    /// A [`Binder`] for this source's namespace.
    pub const fn binder(self) -> Binder<'static> {
        Binder::new(self.namespace())
    }
}

/// Request body encodings that can be turned into a keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `multipart/form-data`
    Multipart,
}

impl MediaType {
    /// Sniffs the media type of a `Content-Type` header value. Parameters such
    /// as `charset` or `boundary` are ignored.
    ///
    /// ```
    /// use formbind::{MediaType, Source};
    ///
    /// let media_type = MediaType::from_content_type("application/json; charset=utf-8")?;
    /// assert_eq!(media_type, MediaType::Json);
    /// assert_eq!(media_type.source(), Source::Json);
    /// assert!(MediaType::from_content_type("text/plain").is_err());
    /// # Ok::<(), formbind::BindError>(())
    /// ```
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let normalized = content_type.trim_start().to_ascii_lowercase();
        let media_type = if normalized.starts_with(MIME_APPLICATION_JSON) {
            MediaType::Json
        } else if normalized.starts_with(MIME_MULTIPART_FORM) {
            MediaType::Multipart
        } else if normalized.starts_with(MIME_APPLICATION_FORM) {
            MediaType::UrlEncoded
        } else {
            return Err(BindErrorKind::UnsupportedMediaType(content_type.to_owned()).into());
        };

        log::trace!("Content type {content_type:?} is {media_type:?}");
        Ok(media_type)
    }

    /// The MIME type.
    pub const fn mime(self) -> &'static str {
        match self {
            MediaType::Json => MIME_APPLICATION_JSON,
            MediaType::UrlEncoded => MIME_APPLICATION_FORM,
            MediaType::Multipart => MIME_MULTIPART_FORM,
        }
    }

    /// The keymap source bodies of this type produce.
    pub const fn source(self) -> Source {
        match self {
            MediaType::Json => Source::Json,
            MediaType::UrlEncoded | MediaType::Multipart => Source::Form,
        }
    }
}
