//! Signed-in user's own provider profile.
//!
//! - `PUT /api/me/professional`: save the provider form

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::error::{mutation_failed, ApiError};
use crate::api::types::{ApiContext, UserContext};
use crate::forms::ProfessionalProfileForm;
use crate::marketplace;
use crate::models::{Professional, Profile};
use crate::notice::Notice;

#[derive(Serialize)]
pub struct SavedProfessional {
    pub profile: Profile,
    pub professional: Professional,
    pub notice: Notice,
}

/// `PUT /api/me/professional`
pub async fn save_professional(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(form): Json<ProfessionalProfileForm>,
) -> Result<Json<SavedProfessional>, ApiError> {
    let user_id = user.user_id;
    let (profile, professional) = ctx
        .blocking(move |backend| {
            marketplace::save_professional_profile(backend, user.actor(), &form, Utc::now())
        })
        .await?
        .map_err(|e| mutation_failed(e, Notice::profile_failed()))?;

    ctx.sessions_write()?.set_profile(&user_id, profile.clone());

    Ok(Json(SavedProfessional {
        profile,
        professional,
        notice: Notice::profile_updated(),
    }))
}
