//! Macros for ergonomic state declarations.

/// Declare an enum usable as a machine state.
///
/// Derives the traits a state needs, implements `Display` with the variant
/// name and adds an `ALL` constant listing every variant in order.
///
/// # Example
///
/// ```
/// use stategate::state_enum;
///
/// state_enum! {
///     pub enum Turnstile {
///         Locked,
///         Unlocked,
///     }
/// }
///
/// assert_eq!(Turnstile::ALL, &[Turnstile::Locked, Turnstile::Unlocked]);
/// assert_eq!(Turnstile::Unlocked.to_string(), "Unlocked");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant))),+
                }
            }
        }
    };
}
