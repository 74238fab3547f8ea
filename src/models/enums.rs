use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(EmergencyStatus {
    Active => "active",
    Resolved => "resolved",
    Cancelled => "cancelled",
});

str_enum!(PriceRange {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(NoticeVariant {
    Default => "default",
    Destructive => "destructive",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn booking_status_parses_backend_values() {
        for (variant, s) in [
            (BookingStatus::Pending, "pending"),
            (BookingStatus::Confirmed, "confirmed"),
            (BookingStatus::Completed, "completed"),
            (BookingStatus::Cancelled, "cancelled"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(BookingStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn booking_status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let parsed: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, BookingStatus::Cancelled);
    }

    #[test]
    fn emergency_status_parses() {
        assert_eq!(EmergencyStatus::from_str("active").unwrap(), EmergencyStatus::Active);
        assert_eq!(EmergencyStatus::Resolved.to_string(), "resolved");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(BookingStatus::from_str("archived").is_err());
        assert!(EmergencyStatus::from_str("").is_err());
        assert!(PriceRange::from_str("cheap").is_err());
    }
}
