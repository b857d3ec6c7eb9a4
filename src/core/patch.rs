use serde::{Deserialize, Deserializer};

use crate::core::error::FieldError;
use crate::models::{HeightBand, IncomeBand, PartnerPreferences, ProfileFields};

/// One field of a partial update: either supplied with a value or left out.
///
/// Deserializes from the field's JSON value; pair it with `#[serde(default)]`
/// so a missing key becomes `Absent`. For optional fields wrap an `Option`,
/// which makes an explicit `null` mean "clear".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Absent,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(FieldUpdate::Set)
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, FieldUpdate::Set(_))
    }

    pub fn as_ref(&self) -> FieldUpdate<&T> {
        match self {
            FieldUpdate::Absent => FieldUpdate::Absent,
            FieldUpdate::Set(value) => FieldUpdate::Set(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FieldUpdate<U> {
        match self {
            FieldUpdate::Absent => FieldUpdate::Absent,
            FieldUpdate::Set(value) => FieldUpdate::Set(f(value)),
        }
    }

    /// Overwrite `target` if a value was supplied
    pub fn apply_to(self, target: &mut T) {
        if let FieldUpdate::Set(value) = self {
            *target = value;
        }
    }

    /// Resolve against the stored value
    pub fn or_keep(self, current: T) -> T {
        match self {
            FieldUpdate::Absent => current,
            FieldUpdate::Set(value) => value,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            FieldUpdate::Absent => None,
            FieldUpdate::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldUpdate::Absent, FieldUpdate::Set)
    }
}

/// Validated partial update of the partner-preference sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerPreferencesPatch {
    pub gender: FieldUpdate<String>,
    pub age_range_from: FieldUpdate<u8>,
    pub age_range_to: FieldUpdate<u8>,
    pub height_range_from: FieldUpdate<HeightBand>,
    pub height_range_to: FieldUpdate<HeightBand>,
    pub religion: FieldUpdate<String>,
    pub mother_tongue: FieldUpdate<String>,
    pub marital_status: FieldUpdate<String>,
    pub education: FieldUpdate<String>,
    pub occupation: FieldUpdate<String>,
    pub income: FieldUpdate<IncomeBand>,
}

impl PartnerPreferencesPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge field-by-field over the stored preferences
    pub fn merge_into(self, current: &PartnerPreferences) -> PartnerPreferences {
        let mut merged = current.clone();
        self.gender.apply_to(&mut merged.gender);
        self.age_range_from.apply_to(&mut merged.age_range_from);
        self.age_range_to.apply_to(&mut merged.age_range_to);
        self.height_range_from.apply_to(&mut merged.height_range_from);
        self.height_range_to.apply_to(&mut merged.height_range_to);
        self.religion.apply_to(&mut merged.religion);
        self.mother_tongue.apply_to(&mut merged.mother_tongue);
        self.marital_status.apply_to(&mut merged.marital_status);
        self.education.apply_to(&mut merged.education);
        self.occupation.apply_to(&mut merged.occupation);
        self.income.apply_to(&mut merged.income);
        merged
    }

    /// Build a fresh record when nothing is stored yet; every field must be set.
    pub fn into_complete(self) -> Result<PartnerPreferences, Vec<FieldError>> {
        let PartnerPreferencesPatch {
            gender,
            age_range_from,
            age_range_to,
            height_range_from,
            height_range_to,
            religion,
            mother_tongue,
            marital_status,
            education,
            occupation,
            income,
        } = self;
        let mut missing = Vec::new();

        macro_rules! take {
            ($value:expr, $name:literal) => {
                match $value {
                    FieldUpdate::Set(value) => Some(value),
                    FieldUpdate::Absent => {
                        missing.push(FieldError::new(
                            concat!("partnerPreferences.", $name),
                            "is required when no partner preferences are saved yet",
                        ));
                        None
                    }
                }
            };
        }

        let gender = take!(gender, "gender");
        let age_range_from = take!(age_range_from, "ageRangeFrom");
        let age_range_to = take!(age_range_to, "ageRangeTo");
        let height_range_from = take!(height_range_from, "heightRangeFrom");
        let height_range_to = take!(height_range_to, "heightRangeTo");
        let religion = take!(religion, "religion");
        let mother_tongue = take!(mother_tongue, "motherTongue");
        let marital_status = take!(marital_status, "maritalStatus");
        let education = take!(education, "education");
        let occupation = take!(occupation, "occupation");
        let income = take!(income, "income");

        let (
            Some(gender),
            Some(age_range_from),
            Some(age_range_to),
            Some(height_range_from),
            Some(height_range_to),
            Some(religion),
            Some(mother_tongue),
            Some(marital_status),
            Some(education),
            Some(occupation),
            Some(income),
        ) = (
            gender,
            age_range_from,
            age_range_to,
            height_range_from,
            height_range_to,
            religion,
            mother_tongue,
            marital_status,
            education,
            occupation,
            income,
        )
        else {
            return Err(missing);
        };

        Ok(PartnerPreferences {
            gender,
            age_range_from,
            age_range_to,
            height_range_from,
            height_range_to,
            religion,
            mother_tongue,
            marital_status,
            education,
            occupation,
            income,
        })
    }
}

/// Validated partial update of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub full_name: FieldUpdate<String>,
    pub dob: FieldUpdate<chrono::NaiveDate>,
    pub height: FieldUpdate<HeightBand>,
    pub mother_tongue: FieldUpdate<String>,
    pub religion: FieldUpdate<String>,
    pub marital_status: FieldUpdate<String>,
    pub gender: FieldUpdate<String>,
    pub income: FieldUpdate<IncomeBand>,
    pub education: FieldUpdate<String>,
    pub occupation: FieldUpdate<String>,
    pub about: FieldUpdate<String>,
    pub interests: FieldUpdate<Vec<String>>,
    pub profile_image: FieldUpdate<Option<String>>,
    pub partner_preferences: FieldUpdate<PartnerPreferencesPatch>,
}

impl ProfilePatch {
    /// True when applying the patch cannot change a stored profile.
    /// A nested preferences object with no fields counts as empty.
    pub fn is_empty(&self) -> bool {
        let nested_empty = match &self.partner_preferences {
            FieldUpdate::Absent => true,
            FieldUpdate::Set(patch) => patch.is_empty(),
        };
        nested_empty
            && Self {
                partner_preferences: FieldUpdate::Absent,
                ..self.clone()
            } == Self::default()
    }

    /// Merge over the stored fields. Absent fields keep their stored value;
    /// nested preferences merge field-by-field. Fails only when preferences
    /// must be created from an incomplete patch.
    pub fn apply(self, current: &ProfileFields) -> Result<ProfileFields, Vec<FieldError>> {
        let partner_preferences = match (self.partner_preferences, &current.partner_preferences) {
            (FieldUpdate::Absent, existing) => existing.clone(),
            (FieldUpdate::Set(patch), Some(existing)) => Some(patch.merge_into(existing)),
            (FieldUpdate::Set(patch), None) if patch.is_empty() => None,
            (FieldUpdate::Set(patch), None) => Some(patch.into_complete()?),
        };

        let mut merged = current.clone();
        self.full_name.apply_to(&mut merged.full_name);
        self.dob.apply_to(&mut merged.dob);
        self.height.apply_to(&mut merged.height);
        self.mother_tongue.apply_to(&mut merged.mother_tongue);
        self.religion.apply_to(&mut merged.religion);
        self.marital_status.apply_to(&mut merged.marital_status);
        self.gender.apply_to(&mut merged.gender);
        self.income.apply_to(&mut merged.income);
        self.education.apply_to(&mut merged.education);
        self.occupation.apply_to(&mut merged.occupation);
        self.about.apply_to(&mut merged.about);
        self.interests.apply_to(&mut merged.interests);
        self.profile_image.apply_to(&mut merged.profile_image);
        merged.partner_preferences = partner_preferences;

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn height(label: &str) -> HeightBand {
        label.parse().unwrap()
    }

    fn preferences() -> PartnerPreferences {
        PartnerPreferences {
            gender: "female".to_string(),
            age_range_from: 24,
            age_range_to: 30,
            height_range_from: height("5' 0\""),
            height_range_to: height("5' 8\""),
            religion: "hindu".to_string(),
            mother_tongue: "hindi".to_string(),
            marital_status: "never_married".to_string(),
            education: "masters".to_string(),
            occupation: "doctor".to_string(),
            income: IncomeBand::From6To8,
        }
    }

    fn fields() -> ProfileFields {
        ProfileFields {
            full_name: "Arjun Mehta".to_string(),
            dob: NaiveDate::from_ymd_opt(1994, 3, 14).unwrap(),
            height: height("5' 10\""),
            mother_tongue: "gujarati".to_string(),
            religion: "hindu".to_string(),
            marital_status: "never_married".to_string(),
            gender: "male".to_string(),
            income: IncomeBand::From8To10,
            education: "bachelors".to_string(),
            occupation: "software_engineer".to_string(),
            about: "Weekend trekker and amateur cook.".to_string(),
            interests: vec!["Travel".to_string(), "Cooking".to_string()],
            profile_image: Some("https://cdn.example.com/a.jpg".to_string()),
            partner_preferences: Some(preferences()),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        name: FieldUpdate<String>,
        #[serde(default)]
        image: FieldUpdate<Option<String>>,
    }

    #[test]
    fn test_field_update_deserialize_absent_vs_present() {
        let sample: Sample = serde_json::from_str(r#"{"name": "Asha"}"#).unwrap();
        assert_eq!(sample.name, FieldUpdate::Set("Asha".to_string()));
        assert_eq!(sample.image, FieldUpdate::Absent);

        let sample: Sample = serde_json::from_str(r#"{"image": null}"#).unwrap();
        assert_eq!(sample.name, FieldUpdate::Absent);
        assert_eq!(sample.image, FieldUpdate::Set(None));
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let current = fields();
        let merged = ProfilePatch::default().apply(&current).unwrap();
        assert_eq!(merged, current);
    }

    #[test]
    fn test_empty_nested_preferences_is_empty_patch() {
        let patch = ProfilePatch {
            partner_preferences: FieldUpdate::Set(PartnerPreferencesPatch::default()),
            ..Default::default()
        };
        assert!(patch.is_empty());

        let patch = ProfilePatch {
            occupation: FieldUpdate::Set("architect".to_string()),
            partner_preferences: FieldUpdate::Set(PartnerPreferencesPatch::default()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let current = fields();
        let patch = ProfilePatch {
            occupation: FieldUpdate::Set("architect".to_string()),
            ..Default::default()
        };

        let merged = patch.apply(&current).unwrap();
        assert_eq!(merged.occupation, "architect");

        let mut expected = current.clone();
        expected.occupation = "architect".to_string();
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_nested_merge_keeps_age_range() {
        let current = fields();
        let patch = ProfilePatch {
            partner_preferences: FieldUpdate::Set(PartnerPreferencesPatch {
                religion: FieldUpdate::Set("jain".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = patch.apply(&current).unwrap();
        let prefs = merged.partner_preferences.unwrap();
        assert_eq!(prefs.religion, "jain");
        assert_eq!(prefs.age_range_from, 24);
        assert_eq!(prefs.age_range_to, 30);
    }

    #[test]
    fn test_null_image_clears() {
        let current = fields();
        let patch = ProfilePatch {
            profile_image: FieldUpdate::Set(None),
            ..Default::default()
        };

        let merged = patch.apply(&current).unwrap();
        assert_eq!(merged.profile_image, None);
    }

    #[test]
    fn test_partial_preferences_without_existing_record() {
        let mut current = fields();
        current.partner_preferences = None;

        let patch = ProfilePatch {
            partner_preferences: FieldUpdate::Set(PartnerPreferencesPatch {
                religion: FieldUpdate::Set("sikh".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let errors = patch.apply(&current).unwrap_err();
        assert_eq!(errors.len(), 10);
        assert!(errors.iter().any(|e| e.field == "partnerPreferences.ageRangeFrom"));
        assert!(!errors.iter().any(|e| e.field == "partnerPreferences.religion"));
    }
}
