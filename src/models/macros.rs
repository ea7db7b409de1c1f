//! Declarative macro for enums stored as lower-case text columns.
//!
//! Every domain enum is persisted as its string value (MySQL `ENUM`, a
//! `CHECK` constraint elsewhere), so each one needs the same conversions:
//! text rendering, parsing, serde names and binding as a query parameter.

/// Generate a text-backed enum.
///
/// # Example
///
/// ```ignore
/// string_enum! {
///     /// Lifecycle of a ride.
///     pub enum RideStatus {
///         Scheduled => "scheduled",
///         Active => "active",
///     }
/// }
/// ```
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Stored text of every variant.
            pub fn values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $text => Ok($name::$variant), )+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl From<$name> for $crate::models::QueryParam {
            fn from(value: $name) -> Self {
                $crate::models::QueryParam::String(value.as_str().to_string())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    string_enum! {
        enum Fruit {
            Apple => "apple",
            BloodOrange => "blood_orange",
        }
    }

    #[test]
    fn test_string_enum_conversions() {
        assert_eq!(Fruit::BloodOrange.as_str(), "blood_orange");
        assert_eq!("apple".parse::<Fruit>().unwrap(), Fruit::Apple);
        assert!("pear".parse::<Fruit>().unwrap_err().contains("Fruit"));
        assert_eq!(Fruit::values(), vec!["apple", "blood_orange"]);
        assert_eq!(
            serde_json::to_string(&Fruit::BloodOrange).unwrap(),
            "\"blood_orange\""
        );
        assert_eq!(
            crate::models::QueryParam::from(Fruit::Apple),
            crate::models::QueryParam::String("apple".into())
        );
    }
}
