//! Helper macros for entry-point table generation.

/// Generate a table of optional typed entry points.
///
/// # Usage
///
/// ```ignore
/// entry_point_table! {
///     /// Doc comment for the table.
///     pub struct InstanceFunctions {
///         destroy_instance: PfnDestroyInstance = c"vkDestroyInstance",
///     }
/// }
/// ```
///
/// Each field is `Option<Pfn>`. `load` resolves every name once through the
/// given resolver and casts the raw address to the field's type; unresolved
/// names stay `None`. `missing` lists the names that did not resolve.
macro_rules! entry_point_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident {
            $( $field:ident : $pfn:ty = $name:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default)]
        pub struct $table {
            $( pub $field: Option<$pfn>, )*
        }

        impl $table {
            /// Every entry-point name in table order.
            pub const NAMES: &'static [&'static ::std::ffi::CStr] = &[$($name),*];

            /// Resolve every entry point through `resolve`.
            ///
            /// # Safety
            ///
            /// Every address `resolve` returns for a name must point to a
            /// function with the signature of that name's `Pfn*` type.
            pub unsafe fn load<R>(mut resolve: R) -> Self
            where
                R: FnMut(&::std::ffi::CStr) -> Option<$crate::library::RawFn>,
            {
                Self {
                    $(
                        // SAFETY: caller guarantees the resolved address has this signature.
                        $field: resolve($name).map(|f| unsafe {
                            ::std::mem::transmute::<$crate::library::RawFn, $pfn>(f)
                        }),
                    )*
                }
            }

            /// Names that did not resolve.
            #[must_use]
            pub fn missing(&self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $(
                    if self.$field.is_none() {
                        out.push($crate::macros::cstr_name($name));
                    }
                )*
                out
            }

            /// Number of resolved entry points.
            #[must_use]
            pub fn resolved(&self) -> usize {
                Self::NAMES.len() - self.missing().len()
            }
        }

        impl ::std::fmt::Debug for $table {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($table))
                    .field("resolved", &self.resolved())
                    .field("missing", &self.missing())
                    .finish()
            }
        }
    };
}

/// Entry-point names are ASCII literals, so the conversion cannot fail in practice.
pub(crate) fn cstr_name(name: &'static std::ffi::CStr) -> &'static str {
    name.to_str().unwrap_or("?")
}

pub(crate) use entry_point_table;
