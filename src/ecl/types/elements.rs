//! Typed array payloads.
//!
//! Loaded payloads are a closed sum type over the supported element types.
//! Typed access goes through [`ArrayElement`], which performs a checked
//! variant match instead of a cast.

use super::error::{EclError, Result};
use super::models::ArrayType;

/// Payload of one loaded array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Inte(Vec<i32>),
    Real(Vec<f32>),
    Doub(Vec<f64>),
    Logi(Vec<bool>),
    /// Both `CHAR` and `C0NN` payloads, right-trimmed.
    Str(Vec<String>),
    Mess,
}

impl ArrayData {
    /// Number of elements held.
    pub fn len(&self) -> usize {
        match self {
            Self::Inte(v) => v.len(),
            Self::Real(v) => v.len(),
            Self::Doub(v) => v.len(),
            Self::Logi(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Mess => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inte(_) => "INTE",
            Self::Real(_) => "REAL",
            Self::Doub(_) => "DOUB",
            Self::Logi(_) => "LOGI",
            Self::Str(_) => "CHAR/C0NN",
            Self::Mess => "MESS",
        }
    }

    /// Whether this payload variant can hold values of the given type tag.
    pub fn matches(&self, array_type: ArrayType) -> bool {
        matches!(
            (self, array_type),
            (Self::Inte(_), ArrayType::Inte)
                | (Self::Real(_), ArrayType::Real)
                | (Self::Doub(_), ArrayType::Doub)
                | (Self::Logi(_), ArrayType::Logi)
                | (Self::Str(_), ArrayType::Char | ArrayType::C0nn(_))
                | (Self::Mess, ArrayType::Mess)
        )
    }
}

/// Element types that can be borrowed out of an [`ArrayData`].
pub trait ArrayElement: Sized {
    /// Human readable element kind used in type mismatch errors.
    const KIND: &'static str;

    /// Whether arrays stored with this tag can be read as `Self`.
    fn accepts(array_type: ArrayType) -> bool;

    /// Borrows the payload if the variant matches.
    fn slice(data: &ArrayData) -> Option<&[Self]>;
}

impl ArrayElement for i32 {
    const KIND: &'static str = "INTE";
    fn accepts(array_type: ArrayType) -> bool {
        array_type == ArrayType::Inte
    }
    fn slice(data: &ArrayData) -> Option<&[Self]> {
        match data {
            ArrayData::Inte(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for f32 {
    const KIND: &'static str = "REAL";
    fn accepts(array_type: ArrayType) -> bool {
        array_type == ArrayType::Real
    }
    fn slice(data: &ArrayData) -> Option<&[Self]> {
        match data {
            ArrayData::Real(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for f64 {
    const KIND: &'static str = "DOUB";
    fn accepts(array_type: ArrayType) -> bool {
        array_type == ArrayType::Doub
    }
    fn slice(data: &ArrayData) -> Option<&[Self]> {
        match data {
            ArrayData::Doub(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for bool {
    const KIND: &'static str = "LOGI";
    fn accepts(array_type: ArrayType) -> bool {
        array_type == ArrayType::Logi
    }
    fn slice(data: &ArrayData) -> Option<&[Self]> {
        match data {
            ArrayData::Logi(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for String {
    const KIND: &'static str = "CHAR/C0NN";
    fn accepts(array_type: ArrayType) -> bool {
        matches!(array_type, ArrayType::Char | ArrayType::C0nn(_))
    }
    fn slice(data: &ArrayData) -> Option<&[Self]> {
        match data {
            ArrayData::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// A named array held in memory, used when writing files.
#[derive(Debug, Clone, PartialEq)]
pub struct EclArray {
    pub name: String,
    pub array_type: ArrayType,
    pub data: ArrayData,
}

impl EclArray {
    /// Builds an array, checking that the payload variant fits the type tag.
    pub fn new(name: impl Into<String>, array_type: ArrayType, data: ArrayData) -> Result<Self> {
        let name = name.into();
        if !data.matches(array_type) {
            return Err(EclError::TypeMismatch {
                name,
                expected: array_type.name(),
                actual: data.kind().to_string(),
            });
        }
        Ok(Self { name, array_type, data })
    }

    pub fn inte(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self { name: name.into(), array_type: ArrayType::Inte, data: ArrayData::Inte(values) }
    }

    pub fn real(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self { name: name.into(), array_type: ArrayType::Real, data: ArrayData::Real(values) }
    }

    pub fn doub(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), array_type: ArrayType::Doub, data: ArrayData::Doub(values) }
    }

    pub fn logi(name: impl Into<String>, values: Vec<bool>) -> Self {
        Self { name: name.into(), array_type: ArrayType::Logi, data: ArrayData::Logi(values) }
    }

    /// Fixed 8-character strings; longer values are truncated on write.
    pub fn char<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            array_type: ArrayType::Char,
            data: ArrayData::Str(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Strings of a declared width (`C0NN`).
    pub fn c0nn<S: Into<String>>(
        name: impl Into<String>,
        width: usize,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            array_type: ArrayType::C0nn(width),
            data: ArrayData::Str(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn mess(name: impl Into<String>) -> Self {
        Self { name: name.into(), array_type: ArrayType::Mess, data: ArrayData::Mess }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Numeric element types supported by the array statistics helpers.
pub trait Numeric: Copy + PartialOrd {
    fn to_f64(self) -> f64;
}

impl Numeric for i32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Numeric for f32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Numeric for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// Sum of all elements, accumulated in `f64` so integer arrays cannot
/// overflow.
pub fn element_sum<T: Numeric>(values: &[T]) -> f64 {
    values.iter().map(|v| v.to_f64()).sum()
}

/// Smallest and largest element, `None` for an empty slice.
///
/// Incomparable values (NaN) never replace the current extremes.
pub fn min_max<T: Numeric>(values: &[T]) -> Option<(T, T)> {
    let (&first, rest) = values.split_first()?;
    Some(rest.iter().fold((first, first), |(min, max), &v| {
        (if v < min { v } else { min }, if v > max { v } else { max })
    }))
}
