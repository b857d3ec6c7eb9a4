// Integration tests for the profile service against the in-memory store

use saathi::core::{FieldUpdate, ProfileService, ServiceError};
use saathi::models::{
    AgeInput, CreateProfileRequest, HeightBand, IncomeBand, InterestsInput, ListProfilesQuery,
    NewAccount, PartnerPreferencesInput, PartnerPreferencesUpdate, UpdateProfileRequest,
};
use saathi::services::{MemoryStore, ProfileStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    service: ProfileService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let service = ProfileService::new(store.clone(), Duration::from_secs(1), 10, 100);
        Self { store, service }
    }

    async fn account(&self, email: &str) -> Uuid {
        self.store
            .insert_account(NewAccount {
                email: email.to_string(),
                password_hash: "$2b$04$placeholder".to_string(),
                name: "Test".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn profile(&self, email: &str) -> Uuid {
        let owner = self.account(email).await;
        self.service.create_profile(full_request(owner)).await.unwrap()
    }
}

fn preferences() -> PartnerPreferencesInput {
    PartnerPreferencesInput {
        gender: Some("Male".to_string()),
        age_range_from: Some(AgeInput::Number(27)),
        age_range_to: Some(AgeInput::Text("33".to_string())),
        height_range_from: Some("5' 6\"".to_string()),
        height_range_to: Some("6' 2\"".to_string()),
        religion: Some("Hindu".to_string()),
        mother_tongue: Some("Marathi".to_string()),
        marital_status: Some("Never Married".to_string()),
        education: Some("Post Graduate".to_string()),
        occupation: Some("Doctor".to_string()),
        income: Some("8-10".to_string()),
    }
}

fn full_request(owner: Uuid) -> CreateProfileRequest {
    CreateProfileRequest {
        owner_id: Some(owner.to_string()),
        full_name: Some("Ananya Kulkarni".to_string()),
        dob: Some("1995-07-21".to_string()),
        height: Some("5' 5\"".to_string()),
        mother_tongue: Some("Marathi".to_string()),
        religion: Some("Hindu".to_string()),
        marital_status: Some("Never Married".to_string()),
        gender: Some("Female".to_string()),
        income: Some("4-6".to_string()),
        education: Some("MBBS".to_string()),
        occupation: Some("Doctor".to_string()),
        about: Some("Paediatrician in Pune who loves monsoon hikes.".to_string()),
        interests: Some(InterestsInput::List(vec![
            "Hiking".to_string(),
            "Cooking".to_string(),
        ])),
        profile_image: Some("https://cdn.example.com/ananya.jpg".to_string()),
        partner_preferences: Some(preferences()),
    }
}

#[tokio::test]
async fn test_create_then_get_returns_submitted_values() {
    let h = Harness::new();
    let id = h.profile("ananya@example.com").await;

    let view = h.service.get_profile(id).await.unwrap();
    let fields = &view.fields;

    assert_eq!(view.id, id);
    assert!(view.complete);
    assert_eq!(fields.full_name, "Ananya Kulkarni");
    assert_eq!(fields.dob.to_string(), "1995-07-21");
    assert_eq!(fields.height, HeightBand::from_inches(65).unwrap());
    assert_eq!(fields.income, IncomeBand::From4To6);
    assert_eq!(fields.interests, vec!["Hiking", "Cooking"]);
    assert_eq!(
        fields.profile_image.as_deref(),
        Some("https://cdn.example.com/ananya.jpg")
    );

    let prefs = fields.partner_preferences.as_ref().unwrap();
    assert_eq!(prefs.age_range_from, 27);
    assert_eq!(prefs.age_range_to, 33);
    assert_eq!(prefs.height_range_to.to_string(), "6' 2\"");
    assert_eq!(prefs.income, IncomeBand::From8To10);
}

#[tokio::test]
async fn test_subset_update_leaves_other_fields_unchanged() {
    let h = Harness::new();
    let id = h.profile("subset@example.com").await;
    let before = h.service.get_profile(id).await.unwrap();

    let update = UpdateProfileRequest {
        occupation: FieldUpdate::Set("Surgeon".to_string()),
        income: FieldUpdate::Set("10+".to_string()),
        ..Default::default()
    };
    let returned = h.service.update_profile(id, update).await.unwrap();
    let after = h.service.get_profile(id).await.unwrap();
    assert_eq!(returned, after);

    let mut expected = before.fields.clone();
    expected.occupation = "Surgeon".to_string();
    expected.income = IncomeBand::Above10;
    assert_eq!(after.fields, expected);
    assert_eq!(after.revision, before.revision + 1);
}

#[tokio::test]
async fn test_preference_religion_update_keeps_age_range() {
    let h = Harness::new();
    let id = h.profile("religion@example.com").await;

    let update = UpdateProfileRequest {
        partner_preferences: FieldUpdate::Set(PartnerPreferencesUpdate {
            religion: FieldUpdate::Set("Jain".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let view = h.service.update_profile(id, update).await.unwrap();

    let prefs = view.fields.partner_preferences.unwrap();
    assert_eq!(prefs.religion, "Jain");
    assert_eq!(prefs.age_range_from, 27);
    assert_eq!(prefs.age_range_to, 33);
    assert_eq!(prefs.mother_tongue, "Marathi");
}

#[tokio::test]
async fn test_inverted_age_range_is_rejected_on_create() {
    let h = Harness::new();
    let owner = h.account("inverted@example.com").await;

    let mut request = full_request(owner);
    let mut prefs = preferences();
    prefs.age_range_from = Some(AgeInput::Number(30));
    prefs.age_range_to = Some(AgeInput::Number(25));
    request.partner_preferences = Some(prefs);

    let err = h.service.create_profile(request).await.unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.iter().any(|f| f.field == "partnerPreferences.ageRange"));
    assert!(!h.service.has_profile(owner).await.unwrap());
}

#[tokio::test]
async fn test_inverted_age_range_is_rejected_after_merge() {
    let h = Harness::new();
    let id = h.profile("merge-range@example.com").await;

    let update = UpdateProfileRequest {
        partner_preferences: FieldUpdate::Set(PartnerPreferencesUpdate {
            age_range_to: FieldUpdate::Set(AgeInput::Number(25)),
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = h.service.update_profile(id, update).await.unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "partnerPreferences.ageRange");
}

#[tokio::test]
async fn test_inverted_height_range_is_rejected_after_merge() {
    let h = Harness::new();
    let id = h.profile("merge-height@example.com").await;
    let before = h.service.get_profile(id).await.unwrap();

    let update = UpdateProfileRequest {
        partner_preferences: FieldUpdate::Set(PartnerPreferencesUpdate {
            height_range_from: FieldUpdate::Set("6' 4\"".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = h.service.update_profile(id, update).await.unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "partnerPreferences.heightRange");

    let after = h.service.get_profile(id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_create_reports_every_missing_field() {
    let h = Harness::new();
    let owner = h.account("missing@example.com").await;

    let request = CreateProfileRequest {
        owner_id: Some(owner.to_string()),
        full_name: Some("Ananya".to_string()),
        ..Default::default()
    };
    let err = h.service.create_profile(request).await.unwrap_err();
    let fields: HashSet<&str> = err
        .field_errors()
        .unwrap()
        .iter()
        .map(|f| f.field.as_str())
        .collect();

    for name in ["dob", "height", "religion", "income", "about", "interests"] {
        assert!(fields.contains(name), "missing error for {}", name);
    }
    assert!(!fields.contains("fullName"));
    assert!(!fields.contains("profileImage"));
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let h = Harness::new();
    let err = h.service.get_profile(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // An account without a profile is not a partial profile
    let owner = h.account("bare@example.com").await;
    let err = h.service.get_profile(owner).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = h
        .service
        .update_profile(owner, UpdateProfileRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_pages_reproduce_creation_order() {
    for n in [0usize, 1, 10, 23] {
        let h = Harness::new();
        let mut created = Vec::new();
        for i in 0..n {
            created.push(h.profile(&format!("user{}@example.com", i)).await);
        }

        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let result = h
                .service
                .list_profiles(ListProfilesQuery {
                    page: Some(page),
                    page_size: Some(10),
                })
                .await
                .unwrap();
            assert_eq!(result.total, n as u64);
            assert_eq!(result.total_pages, (n as u64).div_ceil(10));
            if result.items.is_empty() {
                break;
            }
            seen.extend(result.items.into_iter().map(|p| p.id));
            page += 1;
        }

        assert_eq!(seen, created, "page walk differs for {} profiles", n);
    }
}

#[tokio::test]
async fn test_delimited_interests_are_normalized() {
    let h = Harness::new();
    let owner = h.account("interests@example.com").await;

    let mut request = full_request(owner);
    request.interests = Some(InterestsInput::Delimited("Travel, Music, Travel".to_string()));
    h.service.create_profile(request).await.unwrap();

    let view = h.service.get_profile(owner).await.unwrap();
    assert_eq!(view.fields.interests, vec!["Travel", "Music"]);
}

#[tokio::test]
async fn test_stale_revision_conflicts_and_leaves_record() {
    let h = Harness::new();
    let id = h.profile("stale@example.com").await;
    let original = h.service.get_profile(id).await.unwrap();

    let first = UpdateProfileRequest {
        education: FieldUpdate::Set("MD".to_string()),
        revision: Some(original.revision),
        ..Default::default()
    };
    let updated = h.service.update_profile(id, first).await.unwrap();

    // Second writer still holds the original revision
    let second = UpdateProfileRequest {
        education: FieldUpdate::Set("MS".to_string()),
        revision: Some(original.revision),
        ..Default::default()
    };
    let err = h.service.update_profile(id, second).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let current = h.service.get_profile(id).await.unwrap();
    assert_eq!(current, updated);
    assert_eq!(current.fields.education, "MD");
}

#[tokio::test]
async fn test_store_rejects_compare_and_swap_on_old_revision() {
    let h = Harness::new();
    let id = h.profile("cas@example.com").await;
    let record = h.store.find_profile(id).await.unwrap().unwrap();

    let mut fields = record.fields.clone();
    fields.religion = "Buddhist".to_string();
    h.store.update_profile(id, record.revision, &fields).await.unwrap();

    let mut late = record.fields.clone();
    late.gender = "Other".to_string();
    assert!(h.store.update_profile(id, record.revision, &late).await.is_err());

    let stored = h.store.find_profile(id).await.unwrap().unwrap();
    assert_eq!(stored.fields.religion, "Buddhist");
    assert_eq!(stored.fields.gender, "Female");
}

#[tokio::test]
async fn test_null_image_clears_and_absent_keeps() {
    let h = Harness::new();
    let id = h.profile("image@example.com").await;

    let keep = UpdateProfileRequest {
        about: FieldUpdate::Set("Now living in Bengaluru, still hiking.".to_string()),
        ..Default::default()
    };
    let view = h.service.update_profile(id, keep).await.unwrap();
    assert!(view.fields.profile_image.is_some());

    let clear = UpdateProfileRequest {
        profile_image: FieldUpdate::Set(None),
        ..Default::default()
    };
    let view = h.service.update_profile(id, clear).await.unwrap();
    assert_eq!(view.fields.profile_image, None);
}

#[tokio::test]
async fn test_partial_preferences_need_existing_record() {
    let h = Harness::new();
    let owner = h.account("noprefs@example.com").await;
    let mut request = full_request(owner);
    request.partner_preferences = None;
    h.service.create_profile(request).await.unwrap();

    let update = UpdateProfileRequest {
        partner_preferences: FieldUpdate::Set(PartnerPreferencesUpdate {
            religion: FieldUpdate::Set("Sikh".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = h.service.update_profile(owner, update).await.unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.iter().any(|f| f.field == "partnerPreferences.ageRangeFrom"));
    assert!(!fields.iter().any(|f| f.field == "partnerPreferences.religion"));
}
