//! Helper macro generating port error enums with `impl Into` constructors.
//!
//! Every variant becomes a `thiserror` variant plus a snake_case constructor,
//! so adapters write `CreditStoreError::query(err.to_string())`.

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
    //! Regression coverage for the generated constructors.
    define_port_error! {
        pub enum SamplePortError {
            Offline { message: String } => "offline: {message}",
            Missing { id: u64 } => "record {id} is missing",
            Partial { message: String, id: u64 } => "partial write of {id}: {message}",
            Rejected { reasons: Vec<String> } => "rejected: {reasons:?}",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::offline("queue down");
        assert_eq!(err.to_string(), "offline: queue down");
    }

    #[test]
    fn constructors_preserve_numeric_fields() {
        let err = SamplePortError::missing(42_u64);
        assert_eq!(err.to_string(), "record 42 is missing");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SamplePortError::partial("disk full", 7_u64);
        assert_eq!(err.to_string(), "partial write of 7: disk full");
    }

    #[test]
    fn constructors_accept_collections() {
        let err = SamplePortError::rejected(vec!["amount".to_owned()]);
        assert_eq!(err.to_string(), r#"rejected: ["amount"]"#);
    }
}
