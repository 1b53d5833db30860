//! Error types shared across the navgraph core library.
//!
//! Every public error enum is paired with a stable machine-readable code enum
//! so the CLI and any service wrapper can report failures without matching on
//! display strings.

use thiserror::Error;

/// Generates a `Copy` code enum mirroring the variants of an error enum along
/// with `as_str`, `Display`, and a `code()` accessor on the error type.
///
/// Exported for the provider crates; not part of the stable API.
#[doc(hidden)]
#[macro_export]
macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl ::core::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::VectorStore`] lookups.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum VectorStoreError {
    /// Requested id was outside the store's bounds.
    #[error("vector id {index} is out of bounds")]
    OutOfBounds {
        /// The requested id that exceeded the store bounds.
        index: usize,
    },
    /// A row did not match the store dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality declared by the store.
        expected: usize,
        /// Dimensionality of the offending row.
        actual: usize,
    },
    /// Store contained no rows.
    #[error("vector store contains no rows")]
    EmptyData,
    /// Store rows must have positive dimension.
    #[error("vector store rows must have positive dimension")]
    ZeroDimension,
}

define_error_codes! {
    /// Stable codes describing [`VectorStoreError`] variants.
    enum VectorStoreErrorCode for VectorStoreError {
        /// Requested id was outside the store's bounds.
        OutOfBounds => OutOfBounds { .. } => "VECTOR_STORE_OUT_OF_BOUNDS",
        /// A row did not match the store dimensionality.
        DimensionMismatch => DimensionMismatch { .. } => "VECTOR_STORE_DIMENSION_MISMATCH",
        /// Store contained no rows.
        EmptyData => EmptyData => "VECTOR_STORE_EMPTY",
        /// Store rows must have positive dimension.
        ZeroDimension => ZeroDimension => "VECTOR_STORE_ZERO_DIMENSION",
    }
}
