use std::{error::Error, fmt, str::FromStr};

use facet_core::{Def, Facet, Shape};
use facet_reflect::{Partial, ScalarType};

use crate::{BindError, BindErrorKind, Result};

/// Error returned by a [`Decode`] implementation. Passed through to the
/// caller unchanged, as [`BindErrorKind::Decode`].
pub type DecodeError = Box<dyn Error + Send + Sync + 'static>;

/// Types that decode themselves from a single form or query parameter.
///
/// Register an implementation with
/// [`Binder::with_decoder`](crate::Binder::with_decoder). Decoding then takes
/// precedence over the binder's own handling of the type, records included.
///
/// ```
/// use facet::Facet;
/// use formbind::{Binder, Decode, DecodeError, Keymap};
///
/// #[derive(Facet, Default, Debug, PartialEq)]
/// struct Csv(Vec<String>);
///
/// impl Decode for Csv {
///     fn decode_param(&mut self, param: &str) -> Result<(), DecodeError> {
///         self.0 = param.split(',').map(str::to_owned).collect();
///         Ok(())
///     }
/// }
///
/// #[derive(Facet, Default)]
/// struct Search {
///     fields: Csv,
/// }
///
/// let binder = Binder::new("query").with_decoder::<Csv>();
/// let search: Search = binder.bind(&Keymap::from_iter([("fields", "a,b")]))?;
/// assert_eq!(search.fields, Csv(vec!["a".into(), "b".into()]));
/// # Ok::<(), formbind::BindError>(())
/// ```
pub trait Decode {
    /// Decodes `param` into `self`, which starts out as the zero value.
    fn decode_param(&mut self, param: &str) -> std::result::Result<(), DecodeError>;
}

type DecodeFn = fn(&mut Partial<'static>, &str) -> Result<bool>;

/// A [`Decode`] implementation, keyed by the shape it decodes.
#[derive(Clone, Copy)]
pub(crate) struct Decoder {
    shape: &'static Shape,
    decode: DecodeFn,
}

impl Decoder {
    pub(crate) fn of<T>() -> Self
    where
        T: Facet<'static> + Decode + Default + PartialEq,
    {
        Decoder {
            shape: T::SHAPE,
            decode: decode_with::<T>,
        }
    }

    fn decodes(&self, shape: &Shape) -> bool {
        self.shape.id == shape.id
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("shape", &self.shape.type_identifier)
            .finish()
    }
}

pub(crate) fn find_decoder<'d>(decoders: &'d [Decoder], shape: &Shape) -> Option<&'d Decoder> {
    decoders.iter().find(|decoder| decoder.decodes(shape))
}

// Nothing is stored unless decode succeeds.
fn decode_with<T>(partial: &mut Partial<'static>, raw: &str) -> Result<bool>
where
    T: Facet<'static> + Decode + Default + PartialEq,
{
    let mut value = T::default();
    value.decode_param(raw).map_err(BindErrorKind::Decode)?;
    set(partial, value)
}

/// Converts `raw` into the value under construction in `partial`.
///
/// Returns whether the stored value is the zero value of its type. Optional
/// and boxed values are never zero once stored.
pub(crate) fn coerce(partial: &mut Partial<'static>, raw: &str, decoders: &[Decoder]) -> Result<bool> {
    let shape = partial.shape();

    if let Some(decoder) = find_decoder(decoders, shape) {
        log::trace!("Decoding {raw:?} with the custom decode of {shape}");
        return (decoder.decode)(partial, raw);
    }

    match &shape.def {
        Def::Option(_) => {
            partial.begin_some()?;
            coerce(partial, raw, decoders)?;
            partial.end()?;
            return Ok(false);
        }
        Def::Pointer(ptr_def) => {
            log::trace!("Allocating the pointee of {shape} ({:?})", ptr_def.known);
            partial.begin_smart_ptr()?;
            coerce(partial, raw, decoders)?;
            partial.end()?;
            return Ok(false);
        }
        _ => {}
    }

    match ScalarType::try_from_shape(shape) {
        Some(scalar) => set_scalar(partial, scalar, raw),
        None => Err(BindErrorKind::UnsupportedValue {
            type_name: shape.type_identifier,
        }
        .into()),
    }
}

fn set_scalar(partial: &mut Partial<'static>, scalar: ScalarType, raw: &str) -> Result<bool> {
    log::trace!("Parsing {raw:?} as {}", scalar_name(scalar).0);

    match scalar {
        ScalarType::Bool => set(partial, parse_bool(raw)?),
        ScalarType::String => set(partial, raw.to_owned()),
        ScalarType::I8 => set(partial, parse_integer::<i8>(raw, scalar)?),
        ScalarType::I16 => set(partial, parse_integer::<i16>(raw, scalar)?),
        ScalarType::I32 => set(partial, parse_integer::<i32>(raw, scalar)?),
        ScalarType::I64 => set(partial, parse_integer::<i64>(raw, scalar)?),
        ScalarType::I128 => set(partial, parse_integer::<i128>(raw, scalar)?),
        ScalarType::ISize => set(partial, parse_integer::<isize>(raw, scalar)?),
        ScalarType::U8 => set(partial, parse_integer::<u8>(raw, scalar)?),
        ScalarType::U16 => set(partial, parse_integer::<u16>(raw, scalar)?),
        ScalarType::U32 => set(partial, parse_integer::<u32>(raw, scalar)?),
        ScalarType::U64 => set(partial, parse_integer::<u64>(raw, scalar)?),
        ScalarType::U128 => set(partial, parse_integer::<u128>(raw, scalar)?),
        ScalarType::USize => set(partial, parse_integer::<usize>(raw, scalar)?),
        ScalarType::F32 => {
            let value = parse_float::<f32>(raw, scalar)?;
            if value.is_infinite() && !names_infinity(raw) {
                return Err(conversion(raw, scalar));
            }
            set(partial, value)
        }
        ScalarType::F64 => {
            let value = parse_float::<f64>(raw, scalar)?;
            if value.is_infinite() && !names_infinity(raw) {
                return Err(conversion(raw, scalar));
            }
            set(partial, value)
        }
        _ => Err(BindErrorKind::UnsupportedValue {
            type_name: partial.shape().type_identifier,
        }
        .into()),
    }
}

fn set<T: Facet<'static> + Default + PartialEq>(partial: &mut Partial<'static>, value: T) -> Result<bool> {
    let zero = value == T::default();
    partial.set(value)?;
    Ok(zero)
}

/// Rust name and kind of the scalars the binder converts into.
pub(crate) fn scalar_name(scalar: ScalarType) -> (&'static str, &'static str) {
    match scalar {
        ScalarType::Bool => ("bool", "boolean"),
        ScalarType::String => ("String", "string"),
        ScalarType::I8 => ("i8", "integer"),
        ScalarType::I16 => ("i16", "integer"),
        ScalarType::I32 => ("i32", "integer"),
        ScalarType::I64 => ("i64", "integer"),
        ScalarType::I128 => ("i128", "integer"),
        ScalarType::ISize => ("isize", "integer"),
        ScalarType::U8 => ("u8", "unsigned integer"),
        ScalarType::U16 => ("u16", "unsigned integer"),
        ScalarType::U32 => ("u32", "unsigned integer"),
        ScalarType::U64 => ("u64", "unsigned integer"),
        ScalarType::U128 => ("u128", "unsigned integer"),
        ScalarType::USize => ("usize", "unsigned integer"),
        ScalarType::F32 => ("f32", "float"),
        ScalarType::F64 => ("f64", "float"),
        _ => ("scalar", "other"),
    }
}

fn is_unsigned(scalar: ScalarType) -> bool {
    matches!(
        scalar,
        ScalarType::U8
            | ScalarType::U16
            | ScalarType::U32
            | ScalarType::U64
            | ScalarType::U128
            | ScalarType::USize
    )
}

fn conversion(raw: &str, scalar: ScalarType) -> BindError {
    BindErrorKind::Conversion {
        value: raw.to_owned(),
        scalar,
    }
    .into()
}

// Empty input is the zero value; anything else must parse. Unsigned kinds
// take no sign at all.
fn parse_integer<N: FromStr>(raw: &str, scalar: ScalarType) -> Result<N> {
    if raw.starts_with('+') && is_unsigned(scalar) {
        return Err(conversion(raw, scalar));
    }
    let input = if raw.is_empty() { "0" } else { raw };
    input.parse().map_err(|_| conversion(raw, scalar))
}

fn parse_float<N: FromStr>(raw: &str, scalar: ScalarType) -> Result<N> {
    let input = if raw.is_empty() { "0.0" } else { raw };
    input.parse().map_err(|_| conversion(raw, scalar))
}

// A finite literal that overflows the float's width is out of range, not infinity.
fn names_infinity(raw: &str) -> bool {
    raw.to_ascii_lowercase().contains("inf")
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw {
        "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        _ => Err(conversion(raw, ScalarType::Bool)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce_into<T: Facet<'static>>(raw: &str) -> Result<T> {
        let mut typed_partial = Partial::alloc::<T>()?;
        coerce(typed_partial.inner_mut(), raw, &[])?;
        let boxed_value = typed_partial.build()?;
        Ok(*boxed_value)
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(coerce_into::<i32>("").unwrap(), 0);
        assert_eq!(coerce_into::<u64>("").unwrap(), 0);
        assert_eq!(coerce_into::<f32>("").unwrap(), 0.0);
        assert!(!coerce_into::<bool>("").unwrap());
        assert_eq!(coerce_into::<String>("").unwrap(), "");
    }

    #[test]
    fn integers_respect_their_width() {
        assert_eq!(coerce_into::<i8>("-128").unwrap(), -128);
        assert_eq!(coerce_into::<i64>("+42").unwrap(), 42);
        assert_eq!(coerce_into::<u16>("65535").unwrap(), u16::MAX);

        let err = coerce_into::<i8>("128").unwrap_err();
        assert!(matches!(
            err.kind(),
            BindErrorKind::Conversion { value, scalar: ScalarType::I8 } if value == "128"
        ));

        let err = coerce_into::<u32>("-1").unwrap_err();
        assert!(matches!(
            err.kind(),
            BindErrorKind::Conversion { scalar: ScalarType::U32, .. }
        ));

        let err = coerce_into::<u32>("+5").unwrap_err();
        assert!(matches!(
            err.kind(),
            BindErrorKind::Conversion { value, scalar: ScalarType::U32 } if value == "+5"
        ));
        assert!(coerce_into::<u8>("+0").is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(coerce_into::<f64>("3.25").unwrap(), 3.25);
        assert_eq!(coerce_into::<f64>("-1e3").unwrap(), -1000.0);
        assert!(coerce_into::<f64>("inf").unwrap().is_infinite());

        let err = coerce_into::<f32>("1e39").unwrap_err();
        assert!(matches!(
            err.kind(),
            BindErrorKind::Conversion { scalar: ScalarType::F32, .. }
        ));
        assert!(coerce_into::<f64>("1e39").is_ok());
        assert!(coerce_into::<f64>("1.5.2").is_err());
    }

    #[test]
    fn canonical_booleans_only() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(coerce_into::<bool>(raw).unwrap(), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!coerce_into::<bool>(raw).unwrap(), "{raw}");
        }
        for raw in ["yes", "on", "tRUE", " true"] {
            assert!(coerce_into::<bool>(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(
            coerce_into::<String>("  Hello, World! ").unwrap(),
            "  Hello, World! "
        );
    }

    #[test]
    fn optional_and_boxed_scalars_are_allocated() {
        assert_eq!(coerce_into::<Option<u8>>("7").unwrap(), Some(7));
        assert_eq!(
            coerce_into::<Option<Option<bool>>>("t").unwrap(),
            Some(Some(true))
        );
        assert_eq!(*coerce_into::<Box<i16>>("-3").unwrap(), -3);
    }

    #[test]
    fn zero_values_are_reported() {
        let mut typed_partial = Partial::alloc::<u32>().unwrap();
        assert!(coerce(typed_partial.inner_mut(), "0", &[]).unwrap());

        let mut typed_partial = Partial::alloc::<String>().unwrap();
        assert!(!coerce(typed_partial.inner_mut(), "x", &[]).unwrap());

        let mut typed_partial = Partial::alloc::<Option<u32>>().unwrap();
        assert!(!coerce(typed_partial.inner_mut(), "0", &[]).unwrap());
    }

    #[test]
    fn containers_of_containers_are_unsupported() {
        let err = coerce_into::<Vec<i32>>("1").unwrap_err();
        assert!(matches!(err.kind(), BindErrorKind::UnsupportedValue { .. }));

        let err = coerce_into::<Option<Vec<i32>>>("1").unwrap_err();
        assert!(matches!(err.kind(), BindErrorKind::UnsupportedValue { .. }));
    }
}
