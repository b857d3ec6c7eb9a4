// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Account, HeightBand, IncomeBand, NewAccount, PartnerPreferences, ProfileFields, ProfileRecord,
    Session,
};
pub use requests::{
    AgeInput, CreateProfileRequest, EmailQuery, InterestsInput, ListProfilesQuery,
    PartnerPreferencesInput, PartnerPreferencesUpdate, SignInRequest, SignUpRequest,
    UpdateProfileRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, IdResponse, ProfilePage, ProfileView, SessionResponse,
};
