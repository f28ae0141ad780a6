//! Declarative helpers for implementing [`Wire`](crate::Wire).

/// Implement [`Wire`](crate::Wire) for a record, field by field in the
/// listed order.
///
/// Optional trailers attach a version descriptor, a bulk-safety tag and
/// conversion through [`Versioned`](crate::Versioned):
///
/// ```
/// use polywire::{wire_record, InterfaceId, VersionDescriptor};
///
/// const POINT: VersionDescriptor = VersionDescriptor::new(InterfaceId(0x51), 1, &[1]);
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// wire_record!(Point { x, y }, version = POINT);
/// ```
///
/// `bulk = <BulkSafety variant>` requires the type to implement
/// `zerocopy::{FromBytes, IntoBytes, Immutable}`. A trailing `convert`
/// routes version mismatches through the type's `Versioned` impl.
#[macro_export]
macro_rules! wire_record {
    (@impl $name:ident { $($field:ident),* }
        [$($desc:expr)?] [$($bulk:ident)?] [$($extra:tt)*]) => {
        impl $crate::codec::Wire for $name {
            $(
                const VERSION: ::core::option::Option<&'static $crate::version::VersionDescriptor> =
                    ::core::option::Option::Some(&$desc);
            )?
            $(
                const BULK: $crate::codec::BulkSafety = $crate::codec::BulkSafety::$bulk;
                $crate::bulk_hooks!();
            )?

            fn encode_body(&self, enc: &mut $crate::codec::Encoder<'_>) -> $crate::error::Result<()> {
                let _ = &enc;
                $( enc.field(&self.$field)?; )*
                ::core::result::Result::Ok(())
            }

            fn decode_body(dec: &mut $crate::codec::Decoder<'_>) -> $crate::error::Result<Self> {
                let _ = &dec;
                ::core::result::Result::Ok($name {
                    $( $field: dec.field()?, )*
                })
            }

            $($extra)*
        }
    };
    ($name:ident { $($field:ident),* $(,)? }
        $(, version = $desc:expr)? $(, bulk = $bulk:ident)?, convert $(,)?) => {
        $crate::wire_record!(@impl $name { $($field),* }
            [$($desc)?] [$($bulk)?] [$crate::convert_with_older!();]);
    };
    ($name:ident { $($field:ident),* $(,)? }
        $(, version = $desc:expr)? $(, bulk = $bulk:ident)? $(,)?) => {
        $crate::wire_record!(@impl $name { $($field),* } [$($desc)?] [$($bulk)?] []);
    };
}

/// Bulk-copy hooks for a type implementing `zerocopy`'s byte traits.
///
/// Expands to `bulk_bytes`/`from_bulk_bytes` inside a `Wire` impl.
#[macro_export]
macro_rules! bulk_hooks {
    () => {
        fn bulk_bytes(items: &[Self]) -> ::core::option::Option<&[u8]> {
            ::core::option::Option::Some($crate::__private::zerocopy::IntoBytes::as_bytes(items))
        }

        fn from_bulk_bytes(bytes: &[u8]) -> ::core::option::Option<::std::vec::Vec<Self>> {
            $crate::codec::read_bulk::<Self>(bytes)
        }
    };
}

/// Version-conversion hooks for a type implementing
/// [`Versioned`](crate::Versioned).
#[macro_export]
macro_rules! convert_with_older {
    () => {
        fn encode_converted(
            &self,
            enc: &mut $crate::codec::Encoder<'_>,
        ) -> $crate::error::Result<()> {
            $crate::version::encode_converted(self, enc)
        }

        fn decode_converted(dec: &mut $crate::codec::Decoder<'_>) -> $crate::error::Result<Self> {
            $crate::version::decode_converted(dec)
        }
    };
}
