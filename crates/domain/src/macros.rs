//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Keeps the string form used on the wire (JSON, alarm names, logs) and the
//! Rust variant in one table.
//!
//! # Example
//!
//! ```rust
//! use feedminder_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Calendar,
//!     Email,
//! }
//!
//! impl_wire_name_conversions!(Channel {
//!     Calendar => "calendar",
//!     Email => "email",
//! });
//!
//! assert_eq!(Channel::Email.to_string(), "email");
//! assert_eq!("CALENDAR".parse::<Channel>().unwrap(), Channel::Calendar);
//! ```

/// Implements Display and case-insensitive FromStr for simple enums
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
