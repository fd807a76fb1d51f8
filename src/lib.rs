//! Shared engine for the wire-format codecs in this workspace: the
//! intermediate [`Value`] model, the [`Translate`] mapping between native
//! types and values, the per-namespace schema cache and the buffered
//! byte source every decoder reads from.

pub mod error;
pub mod reader;
pub mod schema;
pub mod translate;
pub mod value;

pub use error::{CodecError, ErrorKind};
pub use reader::ByteReader;
pub use schema::{Field, Label, Record, Translator};
pub use translate::Translate;
pub use value::{CLASS_KEY, DYNAMIC_PREFIX, Value};

/// Declare a record type that translates to and from [`Value`].
///
/// Each field may carry per-namespace wire tags of the form
/// `name,flag1,flag2,...` (empty name defaults to the field identifier,
/// `omitempty` elides structurally zero values, `-` excludes the field):
///
/// ```
/// wirevalue::record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Handshake {
///         pub version: i64 => amf = "v",
///         pub token: String => amf = "token,omitempty" bencode = "token",
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
                $(=> $($namespace:ident = $tag:literal)+)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Record for $name {
            const FIELDS: &'static [$crate::Field<Self>] = &[
                $(
                    $crate::Field {
                        name: stringify!($field),
                        tags: &[$($((stringify!($namespace), $tag),)+)?],
                        get: |record: &Self| &record.$field as &dyn $crate::Translate,
                        get_mut: |record: &mut Self| {
                            &mut record.$field as &mut dyn $crate::Translate
                        },
                    },
                )*
            ];
        }

        impl $crate::Translate for $name {
            fn to_value(
                &self,
                translator: &$crate::Translator,
            ) -> ::std::result::Result<$crate::Value, $crate::CodecError> {
                translator.record_to_value(self)
            }

            fn from_value(
                &mut self,
                value: &$crate::Value,
                translator: &$crate::Translator,
            ) -> ::std::result::Result<(), $crate::CodecError> {
                translator.record_from_value(self, value)
            }

            fn is_zero(&self) -> bool {
                <Self as $crate::Record>::FIELDS
                    .iter()
                    .all(|field| (field.get)(self).is_zero())
            }

            fn clear(&mut self) {
                for field in <Self as $crate::Record>::FIELDS {
                    (field.get_mut)(self).clear();
                }
            }
        }
    };
}
