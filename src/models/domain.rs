use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Shortest height offered by the profile form, in inches (4' 0")
pub const MIN_HEIGHT_INCHES: u8 = 48;
/// Tallest height offered by the profile form, in inches (7' 0")
pub const MAX_HEIGHT_INCHES: u8 = 84;

/// Youngest age a partner preference may name
pub const MIN_PARTNER_AGE: u8 = 18;
/// Oldest age a partner preference may name
pub const MAX_PARTNER_AGE: u8 = 99;

/// Height band drawn from the fixed feet/inches domain.
///
/// Both the profile's own height and the partner height range use this
/// domain, so ordering comparisons between them are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeightBand(u8);

impl HeightBand {
    pub fn from_inches(inches: u8) -> Option<Self> {
        (MIN_HEIGHT_INCHES..=MAX_HEIGHT_INCHES)
            .contains(&inches)
            .then_some(Self(inches))
    }

    pub fn inches(&self) -> u8 {
        self.0
    }

    /// Approximate height in centimetres, as shown next to each band
    pub fn centimetres(&self) -> u16 {
        (f64::from(self.0) * 2.54).round() as u16
    }

    /// Every band in ascending order
    pub fn all() -> impl Iterator<Item = HeightBand> {
        (MIN_HEIGHT_INCHES..=MAX_HEIGHT_INCHES).map(HeightBand)
    }
}

impl fmt::Display for HeightBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}' {}\"", self.0 / 12, self.0 % 12)
    }
}

impl FromStr for HeightBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || format!("'{}' is not a height between 4' 0\" and 7' 0\"", trimmed);

        let (feet, rest) = trimmed.split_once('\'').ok_or_else(invalid)?;
        let inches = rest.trim().strip_suffix('"').ok_or_else(invalid)?;

        let feet: u8 = feet.trim().parse().map_err(|_| invalid())?;
        let inches: u8 = inches.trim().parse().map_err(|_| invalid())?;
        if inches >= 12 {
            return Err(invalid());
        }

        feet.checked_mul(12)
            .and_then(|total| total.checked_add(inches))
            .and_then(HeightBand::from_inches)
            .ok_or_else(invalid)
    }
}

impl Serialize for HeightBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HeightBand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Annual income band, in lakh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeBand {
    #[serde(rename = "0-2")]
    UpTo2,
    #[serde(rename = "2-4")]
    From2To4,
    #[serde(rename = "4-6")]
    From4To6,
    #[serde(rename = "6-8")]
    From6To8,
    #[serde(rename = "8-10")]
    From8To10,
    #[serde(rename = "10+")]
    Above10,
}

impl IncomeBand {
    pub const ALL: [IncomeBand; 6] = [
        IncomeBand::UpTo2,
        IncomeBand::From2To4,
        IncomeBand::From4To6,
        IncomeBand::From6To8,
        IncomeBand::From8To10,
        IncomeBand::Above10,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeBand::UpTo2 => "0-2",
            IncomeBand::From2To4 => "2-4",
            IncomeBand::From4To6 => "4-6",
            IncomeBand::From6To8 => "6-8",
            IncomeBand::From8To10 => "8-10",
            IncomeBand::Above10 => "10+",
        }
    }
}

impl fmt::Display for IncomeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        IncomeBand::ALL
            .into_iter()
            .find(|band| band.as_str() == trimmed)
            .ok_or_else(|| {
                format!(
                    "'{}' is not an income band (expected one of 0-2, 2-4, 4-6, 6-8, 8-10, 10+)",
                    trimmed
                )
            })
    }
}

/// Registered account. Authentication fields never leave the account service.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Account data handed to the store on registration
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Desired attributes of a match, one-to-one with a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPreferences {
    pub gender: String,
    pub age_range_from: u8,
    pub age_range_to: u8,
    pub height_range_from: HeightBand,
    pub height_range_to: HeightBand,
    pub religion: String,
    pub mother_tongue: String,
    pub marital_status: String,
    pub education: String,
    pub occupation: String,
    pub income: IncomeBand,
}

/// Profile attributes owned by the profile service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub full_name: String,
    pub dob: chrono::NaiveDate,
    pub height: HeightBand,
    pub mother_tongue: String,
    pub religion: String,
    pub marital_status: String,
    pub gender: String,
    pub income: IncomeBand,
    pub education: String,
    pub occupation: String,
    pub about: String,
    pub interests: Vec<String>,
    pub profile_image: Option<String>,
    pub partner_preferences: Option<PartnerPreferences>,
}

/// Stored profile: attributes plus bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub fields: ProfileFields,
    pub revision: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Identity established from a verified session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_band_labels() {
        let bands: Vec<HeightBand> = HeightBand::all().collect();
        assert_eq!(bands.len(), 37);
        assert_eq!(bands[0].to_string(), "4' 0\"");
        assert_eq!(bands[36].to_string(), "7' 0\"");

        for band in bands {
            assert_eq!(band.to_string().parse::<HeightBand>().unwrap(), band);
        }
    }

    #[test]
    fn test_height_band_parse_tolerance() {
        let band: HeightBand = " 5'7\" ".parse().unwrap();
        assert_eq!(band.inches(), 67);
        assert_eq!(band.centimetres(), 170);
    }

    #[test]
    fn test_height_band_rejects_out_of_domain() {
        assert!("7' 1\"".parse::<HeightBand>().is_err());
        assert!("3' 11\"".parse::<HeightBand>().is_err());
        assert!("5' 12\"".parse::<HeightBand>().is_err());
        assert!("170cm".parse::<HeightBand>().is_err());
    }

    #[test]
    fn test_height_band_ordering() {
        let short: HeightBand = "5' 2\"".parse().unwrap();
        let tall: HeightBand = "6' 0\"".parse().unwrap();
        assert!(short < tall);
    }

    #[test]
    fn test_income_band_serde() {
        let json = serde_json::to_string(&IncomeBand::Above10).unwrap();
        assert_eq!(json, "\"10+\"");
        assert_eq!("8-10".parse::<IncomeBand>().unwrap(), IncomeBand::From8To10);
        assert!("12-14".parse::<IncomeBand>().is_err());
    }
}
