//! Defines helper macros for generating domain error enums.
//!
//! Each variant gets a snake-case constructor whose parameters accept
//! `impl Into<T>`, so call sites can pass `&str` for `String` fields or a bare
//! `u16` for an `Option<u16>` field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated constructors.
    define_port_error! {
        pub enum ProbeError {
            Unreachable { host: String } => "unreachable: {host}",
            Rejected { status: Option<u16> } => "rejected: {status:?}",
            Mixed { host: String, attempts: u32 } => "mixed: {host} ({attempts})",
            Closed => "closed",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ProbeError::unreachable("upstream.invalid");
        assert_eq!(err.to_string(), "unreachable: upstream.invalid");
    }

    #[test]
    fn constructors_lift_values_into_options() {
        let err = ProbeError::rejected(403_u16);
        assert_eq!(err, ProbeError::Rejected { status: Some(403) });
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ProbeError::mixed("upstream.invalid", 3_u32);
        assert_eq!(err.to_string(), "mixed: upstream.invalid (3)");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(ProbeError::closed().to_string(), "closed");
    }
}
