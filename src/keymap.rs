use indexmap::IndexMap;

#[cfg(feature = "json")]
use crate::{BindErrorKind, Result};

/// Canonicalizes a key for matching: drops every `_` and `-` and lower-cases
/// the rest.
///
/// ```
/// assert_eq!(formbind::normalize_key("User-Name"), "username");
/// assert_eq!(formbind::normalize_key("user_name"), "username");
/// ```
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// An insertion-ordered, multi-valued string map, as produced by parsing a
/// query string, a form body or a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    entries: IndexMap<String, Vec<String>>,
}

impl Keymap {
    /// Creates an empty keymap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets all values of `key`, returning the previous ones.
    pub fn insert<K, I>(&mut self, key: K, values: I) -> Option<Vec<String>>
    where
        K: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.entries
            .insert(key.into(), values.into_iter().map(Into::into).collect())
    }

    /// Appends one value to `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// All values of `key`, in insertion order.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The first value of `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)?.first().map(String::as_str)
    }

    /// Whether `key` is present, with or without values.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys and their values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Returns a copy with every key passed through [`normalize_key`].
    ///
    /// When distinct keys normalize to the same string, the one inserted last
    /// wins.
    pub fn normalize(&self) -> Keymap {
        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (key, values) in &self.entries {
            let normalized = normalize_key(key);
            if let Some(previous) = entries.insert(normalized, values.clone()) {
                log::debug!("Key {key:?} overrides {} earlier value(s)", previous.len());
            }
        }
        Keymap { entries }
    }

    /// Parses `application/x-www-form-urlencoded` input. Repeated keys
    /// accumulate their values.
    #[cfg(feature = "urlencoded")]
    pub fn from_urlencoded(input: &[u8]) -> Self {
        form_urlencoded::parse(input).collect()
    }

    /// Flattens a JSON object into a keymap.
    ///
    /// Member values may be strings, numbers or booleans (one value each),
    /// `null` (the key with no values), or arrays of those.
    ///
    /// ```
    /// let keymap = formbind::Keymap::from_json(br#"{"name": "gopher", "tags": ["a", 1, true]}"#)?;
    /// assert_eq!(keymap.first("name"), Some("gopher"));
    /// assert_eq!(keymap.get("tags").unwrap(), ["a", "1", "true"]);
    /// # Ok::<(), formbind::BindError>(())
    /// ```
    #[cfg(feature = "json")]
    pub fn from_json(input: &[u8]) -> Result<Self> {
        use serde_json::{Map, Value};

        let object: Map<String, Value> = serde_json::from_slice(input)?;
        let mut keymap = Keymap::new();
        for (key, value) in object {
            let values = match value {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| json_scalar(&key, item))
                    .collect::<Result<Vec<_>>>()?,
                Value::Null => Vec::new(),
                other => vec![json_scalar(&key, other)?],
            };
            keymap.insert(key, values);
        }
        Ok(keymap)
    }
}

#[cfg(feature = "json")]
fn json_scalar(key: &str, value: serde_json::Value) -> Result<String> {
    use serde_json::Value;

    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(BindErrorKind::InvalidJsonValue {
            key: key.to_owned(),
        }
        .into()),
    }
}

impl<K, V> FromIterator<(K, V)> for Keymap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut keymap = Keymap::new();
        keymap.extend(iter);
        keymap
    }
}

impl<K, V> Extend<(K, V)> for Keymap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}
