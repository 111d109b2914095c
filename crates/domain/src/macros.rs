//! Macro for implementing Display and FromStr for wire-token enums
//!
//! Several small enums (HTTP verbs, correlation modes) travel as fixed
//! string tokens in payloads and configuration. This macro gives them a
//! canonical `Display` form and a case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use graphlink_domain::impl_wire_token_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Consistency {
//!     Eventual,
//!     Strong,
//! }
//!
//! impl_wire_token_conversions!(Consistency {
//!     Eventual => "eventual",
//!     Strong => "strong",
//! });
//!
//! assert_eq!(Consistency::Strong.to_string(), "strong");
//! assert_eq!("EVENTUAL".parse::<Consistency>().unwrap(), Consistency::Eventual);
//! ```

/// Implements Display and FromStr for enums with fixed wire tokens
///
/// - Display writes the token exactly as given
/// - FromStr matches tokens case-insensitively and fails with
///   `GraphLinkError::InvalidInput`
#[macro_export]
macro_rules! impl_wire_token_conversions {
    ($enum_name:ident { $($variant:ident => $token:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire token for this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::errors::GraphLinkError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($token) {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::errors::GraphLinkError::InvalidInput(format!(
                    "Invalid {}: {}",
                    stringify!($enum_name),
                    s
                )))
            }
        }
    };
}
