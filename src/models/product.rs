use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Slot a product fills in an outfit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Top,
    Bottom,
    Footwear,
    Accessory,
    Other,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Top,
        Role::Bottom,
        Role::Footwear,
        Role::Accessory,
        Role::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Bottom => "bottom",
            Role::Footwear => "footwear",
            Role::Accessory => "accessory",
            Role::Other => "other",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Role::Top),
            "bottom" => Ok(Role::Bottom),
            "footwear" => Ok(Role::Footwear),
            "accessory" => Ok(Role::Accessory),
            "other" => Ok(Role::Other),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A catalog product after normalization
///
/// Attribute sets (`colors`, `seasons`, `occasions`, `styles`) are deduplicated
/// and keep first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub title: String,
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub product_type: String,
    /// Empty means unisex
    #[serde(default)]
    pub gender: String,
    pub price: f64,
    pub role: Role,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub seasons: Vec<String>,
    #[serde(default)]
    pub occasions: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Empty gender on either side matches anything
    pub fn gender_compatible(&self, other: &Product) -> bool {
        self.gender.is_empty() || other.gender.is_empty() || self.gender == other.gender
    }

    pub fn has_season(&self, season: &str) -> bool {
        self.seasons.iter().any(|s| s == season)
    }

    pub fn has_occasion(&self, occasion: &str) -> bool {
        self.occasions.iter().any(|o| o == occasion)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("hat".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Footwear).unwrap(), "\"footwear\"");
    }

    #[test]
    fn test_gender_wildcard() {
        let mut a = product("A", Role::Top, 10.0, &[]);
        let mut b = product("B", Role::Bottom, 10.0, &[]);
        assert!(a.gender_compatible(&b));

        a.gender = "men".to_string();
        assert!(a.gender_compatible(&b));

        b.gender = "women".to_string();
        assert!(!a.gender_compatible(&b));

        b.gender = "men".to_string();
        assert!(a.gender_compatible(&b));
    }
}
