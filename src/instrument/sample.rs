//! Coercion of deferred return values into metric samples

use std::fmt::Display;

use crate::errors::{ExporterError, Result};

/// A value a deferred function may return.
///
/// Numbers convert directly, strings are parsed, `None` and unparsable
/// strings fail with `ValueCoercion`, and an `Err` fails the snapshot with
/// `CollectorFailed`.
pub trait IntoSample {
    fn into_sample(self) -> Result<f64>;
}

macro_rules! impl_into_sample_lossless {
    ($($t:ty),*) => {
        $(
            impl IntoSample for $t {
                fn into_sample(self) -> Result<f64> {
                    Ok(f64::from(self))
                }
            }
        )*
    };
}

macro_rules! impl_into_sample_cast {
    ($($t:ty),*) => {
        $(
            impl IntoSample for $t {
                fn into_sample(self) -> Result<f64> {
                    Ok(self as f64)
                }
            }
        )*
    };
}

impl_into_sample_lossless!(f64, f32, i8, i16, i32, u8, u16, u32);
impl_into_sample_cast!(i64, i128, isize, u64, u128, usize);

impl IntoSample for bool {
    fn into_sample(self) -> Result<f64> {
        Ok(if self { 1.0 } else { 0.0 })
    }
}

impl IntoSample for &str {
    fn into_sample(self) -> Result<f64> {
        self.trim().parse::<f64>().map_err(|_| {
            ExporterError::value_coercion(format!("cannot convert {:?} to a number", self))
        })
    }
}

impl IntoSample for String {
    fn into_sample(self) -> Result<f64> {
        self.as_str().into_sample()
    }
}

impl<T: IntoSample> IntoSample for Option<T> {
    fn into_sample(self) -> Result<f64> {
        match self {
            Some(value) => value.into_sample(),
            None => Err(ExporterError::value_coercion(
                "cannot convert an empty value to a number",
            )),
        }
    }
}

impl<T: IntoSample, E: Display> IntoSample for std::result::Result<T, E> {
    fn into_sample(self) -> Result<f64> {
        match self {
            Ok(value) => value.into_sample(),
            Err(e) => Err(ExporterError::collector_failed(e.to_string())),
        }
    }
}
