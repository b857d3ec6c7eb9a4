use chrono::NaiveDate;
use uuid::Uuid;
use validator::ValidateUrl;

use crate::core::error::FieldError;
use crate::core::interests::normalize_interests;
use crate::core::patch::{FieldUpdate, PartnerPreferencesPatch, ProfilePatch};
use crate::models::domain::{MAX_PARTNER_AGE, MIN_PARTNER_AGE};
use crate::models::{
    AgeInput, CreateProfileRequest, HeightBand, IncomeBand, InterestsInput, PartnerPreferences,
    PartnerPreferencesInput, PartnerPreferencesUpdate, ProfileFields, UpdateProfileRequest,
};

/// Minimum age of a profile owner
pub const MIN_OWNER_AGE: u32 = 18;

const MIN_NAME_CHARS: usize = 2;
const MIN_ABOUT_CHARS: usize = 20;
const MAX_SHORT_TEXT_CHARS: usize = 100;
const MAX_ABOUT_CHARS: usize = 2000;
const PREFERENCES: &str = "partnerPreferences.";

/// Accumulates every field error instead of stopping at the first one
#[derive(Debug, Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    fn text(&mut self, field: &str, value: String, min_chars: usize, max_chars: usize) -> Option<String> {
        let trimmed = value.trim();
        let chars = trimmed.chars().count();

        if chars == 0 {
            self.push(field, "must not be blank");
            None
        } else if chars < min_chars {
            self.push(field, format!("must be at least {} characters", min_chars));
            None
        } else if chars > max_chars {
            self.push(field, format!("must be at most {} characters", max_chars));
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn short_text(&mut self, field: &str, value: String) -> Option<String> {
        self.text(field, value, 1, MAX_SHORT_TEXT_CHARS)
    }

    fn date_of_birth(&mut self, field: &str, value: String, today: NaiveDate) -> Option<NaiveDate> {
        let Some(dob) = parse_date(&value) else {
            self.push(field, "must be a date in YYYY-MM-DD format");
            return None;
        };

        match today.years_since(dob) {
            None => {
                self.push(field, "must not be in the future");
                None
            }
            Some(age) if age < MIN_OWNER_AGE => {
                self.push(field, format!("owner must be at least {} years old", MIN_OWNER_AGE));
                None
            }
            Some(_) => Some(dob),
        }
    }

    fn height(&mut self, field: &str, value: String) -> Option<HeightBand> {
        value
            .parse()
            .map_err(|reason: String| self.push(field, reason))
            .ok()
    }

    fn income(&mut self, field: &str, value: String) -> Option<IncomeBand> {
        value
            .parse()
            .map_err(|reason: String| self.push(field, reason))
            .ok()
    }

    fn age(&mut self, field: &str, value: AgeInput) -> Option<u8> {
        let parsed = match value {
            AgeInput::Number(n) => Some(n),
            AgeInput::Text(text) => text.trim().parse::<i64>().ok(),
        };

        match parsed {
            Some(age) if (i64::from(MIN_PARTNER_AGE)..=i64::from(MAX_PARTNER_AGE)).contains(&age) => {
                u8::try_from(age).ok()
            }
            Some(_) => {
                self.push(
                    field,
                    format!("must be between {} and {}", MIN_PARTNER_AGE, MAX_PARTNER_AGE),
                );
                None
            }
            None => {
                self.push(field, "must be a whole number");
                None
            }
        }
    }

    fn interests(&mut self, field: &str, value: InterestsInput) -> Option<Vec<String>> {
        let tags = normalize_interests(value);
        if tags.is_empty() {
            self.push(field, "must contain at least one interest");
            None
        } else {
            Some(tags)
        }
    }

    /// Images are URL references; uploads are handled elsewhere.
    /// Blank means "no image".
    fn image(&mut self, field: &str, value: Option<String>) -> Option<Option<String>> {
        let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
            return Some(None);
        };

        let http = url.starts_with("http://") || url.starts_with("https://");
        if http && url.validate_url() {
            Some(Some(url))
        } else {
            self.push(field, "must be an http(s) URL");
            None
        }
    }

    fn owner_id(&mut self, field: &str, value: Option<String>) -> Option<Uuid> {
        let raw = self.required(field, value)?;
        Uuid::parse_str(raw.trim())
            .map_err(|_| self.push(field, "must be a valid UUID"))
            .ok()
    }

    fn update<T, U>(
        &mut self,
        update: FieldUpdate<T>,
        check: impl FnOnce(&mut Self, T) -> Option<U>,
    ) -> FieldUpdate<U> {
        match update {
            FieldUpdate::Absent => FieldUpdate::Absent,
            FieldUpdate::Set(value) => check(self, value).into(),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn pref(name: &str) -> String {
    format!("{}{}", PREFERENCES, name)
}

/// Validate a create request into the owner id and a complete field set.
pub fn validate_new_profile(
    request: CreateProfileRequest,
    today: NaiveDate,
) -> Result<(Uuid, ProfileFields), Vec<FieldError>> {
    let mut c = Collector::default();

    let owner_id = c.owner_id("ownerId", request.owner_id);
    let full_name = c
        .required("fullName", request.full_name)
        .and_then(|v| c.text("fullName", v, MIN_NAME_CHARS, MAX_SHORT_TEXT_CHARS));
    let dob = c
        .required("dob", request.dob)
        .and_then(|v| c.date_of_birth("dob", v, today));
    let height = c.required("height", request.height).and_then(|v| c.height("height", v));
    let mother_tongue = c
        .required("motherTongue", request.mother_tongue)
        .and_then(|v| c.short_text("motherTongue", v));
    let religion = c
        .required("religion", request.religion)
        .and_then(|v| c.short_text("religion", v));
    let marital_status = c
        .required("maritalStatus", request.marital_status)
        .and_then(|v| c.short_text("maritalStatus", v));
    let gender = c.required("gender", request.gender).and_then(|v| c.short_text("gender", v));
    let income = c.required("income", request.income).and_then(|v| c.income("income", v));
    let education = c
        .required("education", request.education)
        .and_then(|v| c.short_text("education", v));
    let occupation = c
        .required("occupation", request.occupation)
        .and_then(|v| c.short_text("occupation", v));
    let about = c
        .required("about", request.about)
        .and_then(|v| c.text("about", v, MIN_ABOUT_CHARS, MAX_ABOUT_CHARS));
    let interests = c
        .required("interests", request.interests)
        .and_then(|v| c.interests("interests", v));
    let profile_image = c.image("profileImage", request.profile_image);
    let partner_preferences = match request.partner_preferences {
        None => Some(None),
        Some(input) => new_preferences(&mut c, input).map(Some),
    };

    let (
        Some(owner_id),
        Some(full_name),
        Some(dob),
        Some(height),
        Some(mother_tongue),
        Some(religion),
        Some(marital_status),
        Some(gender),
        Some(income),
        Some(education),
        Some(occupation),
        Some(about),
        Some(interests),
        Some(profile_image),
        Some(partner_preferences),
    ) = (
        owner_id,
        full_name,
        dob,
        height,
        mother_tongue,
        religion,
        marital_status,
        gender,
        income,
        education,
        occupation,
        about,
        interests,
        profile_image,
        partner_preferences,
    )
    else {
        return Err(c.errors);
    };

    c.finish((
        owner_id,
        ProfileFields {
            full_name,
            dob,
            height,
            mother_tongue,
            religion,
            marital_status,
            gender,
            income,
            education,
            occupation,
            about,
            interests,
            profile_image,
            partner_preferences,
        },
    ))
}

fn new_preferences(c: &mut Collector, input: PartnerPreferencesInput) -> Option<PartnerPreferences> {
    let gender = c
        .required(&pref("gender"), input.gender)
        .and_then(|v| c.short_text(&pref("gender"), v));
    let age_range_from = c
        .required(&pref("ageRangeFrom"), input.age_range_from)
        .and_then(|v| c.age(&pref("ageRangeFrom"), v));
    let age_range_to = c
        .required(&pref("ageRangeTo"), input.age_range_to)
        .and_then(|v| c.age(&pref("ageRangeTo"), v));
    let height_range_from = c
        .required(&pref("heightRangeFrom"), input.height_range_from)
        .and_then(|v| c.height(&pref("heightRangeFrom"), v));
    let height_range_to = c
        .required(&pref("heightRangeTo"), input.height_range_to)
        .and_then(|v| c.height(&pref("heightRangeTo"), v));
    let religion = c
        .required(&pref("religion"), input.religion)
        .and_then(|v| c.short_text(&pref("religion"), v));
    let mother_tongue = c
        .required(&pref("motherTongue"), input.mother_tongue)
        .and_then(|v| c.short_text(&pref("motherTongue"), v));
    let marital_status = c
        .required(&pref("maritalStatus"), input.marital_status)
        .and_then(|v| c.short_text(&pref("maritalStatus"), v));
    let education = c
        .required(&pref("education"), input.education)
        .and_then(|v| c.short_text(&pref("education"), v));
    let occupation = c
        .required(&pref("occupation"), input.occupation)
        .and_then(|v| c.short_text(&pref("occupation"), v));
    let income = c
        .required(&pref("income"), input.income)
        .and_then(|v| c.income(&pref("income"), v));

    let preferences = PartnerPreferences {
        gender: gender?,
        age_range_from: age_range_from?,
        age_range_to: age_range_to?,
        height_range_from: height_range_from?,
        height_range_to: height_range_to?,
        religion: religion?,
        mother_tongue: mother_tongue?,
        marital_status: marital_status?,
        education: education?,
        occupation: occupation?,
        income: income?,
    };

    let range_errors = check_partner_ranges(&preferences);
    if range_errors.is_empty() {
        Some(preferences)
    } else {
        c.errors.extend(range_errors);
        None
    }
}

/// Validate the supplied fields of a partial update.
///
/// Ordering of the age and height ranges is checked later, against the
/// merged record.
pub fn validate_patch(
    request: UpdateProfileRequest,
    today: NaiveDate,
) -> Result<ProfilePatch, Vec<FieldError>> {
    let mut c = Collector::default();

    let patch = ProfilePatch {
        full_name: c.update(request.full_name, |c, v| {
            c.text("fullName", v, MIN_NAME_CHARS, MAX_SHORT_TEXT_CHARS)
        }),
        dob: c.update(request.dob, |c, v| c.date_of_birth("dob", v, today)),
        height: c.update(request.height, |c, v| c.height("height", v)),
        mother_tongue: c.update(request.mother_tongue, |c, v| c.short_text("motherTongue", v)),
        religion: c.update(request.religion, |c, v| c.short_text("religion", v)),
        marital_status: c.update(request.marital_status, |c, v| c.short_text("maritalStatus", v)),
        gender: c.update(request.gender, |c, v| c.short_text("gender", v)),
        income: c.update(request.income, |c, v| c.income("income", v)),
        education: c.update(request.education, |c, v| c.short_text("education", v)),
        occupation: c.update(request.occupation, |c, v| c.short_text("occupation", v)),
        about: c.update(request.about, |c, v| {
            c.text("about", v, MIN_ABOUT_CHARS, MAX_ABOUT_CHARS)
        }),
        interests: c.update(request.interests, |c, v| c.interests("interests", v)),
        profile_image: c.update(request.profile_image, |c, v| c.image("profileImage", v)),
        partner_preferences: c.update(request.partner_preferences, |c, v| {
            Some(preferences_patch(c, v))
        }),
    };

    c.finish(patch)
}

fn preferences_patch(c: &mut Collector, update: PartnerPreferencesUpdate) -> PartnerPreferencesPatch {
    PartnerPreferencesPatch {
        gender: c.update(update.gender, |c, v| c.short_text(&pref("gender"), v)),
        age_range_from: c.update(update.age_range_from, |c, v| c.age(&pref("ageRangeFrom"), v)),
        age_range_to: c.update(update.age_range_to, |c, v| c.age(&pref("ageRangeTo"), v)),
        height_range_from: c.update(update.height_range_from, |c, v| {
            c.height(&pref("heightRangeFrom"), v)
        }),
        height_range_to: c.update(update.height_range_to, |c, v| {
            c.height(&pref("heightRangeTo"), v)
        }),
        religion: c.update(update.religion, |c, v| c.short_text(&pref("religion"), v)),
        mother_tongue: c.update(update.mother_tongue, |c, v| {
            c.short_text(&pref("motherTongue"), v)
        }),
        marital_status: c.update(update.marital_status, |c, v| {
            c.short_text(&pref("maritalStatus"), v)
        }),
        education: c.update(update.education, |c, v| c.short_text(&pref("education"), v)),
        occupation: c.update(update.occupation, |c, v| c.short_text(&pref("occupation"), v)),
        income: c.update(update.income, |c, v| c.income(&pref("income"), v)),
    }
}

/// Check the ordering invariants of a (possibly merged) preference record
pub fn check_partner_ranges(preferences: &PartnerPreferences) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if preferences.age_range_from > preferences.age_range_to {
        errors.push(FieldError::new(
            pref("ageRange"),
            format!(
                "ageRangeFrom ({}) must not be greater than ageRangeTo ({})",
                preferences.age_range_from, preferences.age_range_to
            ),
        ));
    }

    if preferences.height_range_from > preferences.height_range_to {
        errors.push(FieldError::new(
            pref("heightRange"),
            format!(
                "heightRangeFrom ({}) must not be greater than heightRangeTo ({})",
                preferences.height_range_from, preferences.height_range_to
            ),
        ));
    }

    errors
}
