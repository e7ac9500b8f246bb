use crate::error::AppError;
use crate::models::User;
use crate::profile::{ProfileOverview, ProfileUpdate};
use crate::AppState;
use tauri::State;

#[tauri::command]
pub async fn profile_overview(state: State<'_, AppState>) -> Result<ProfileOverview, AppError> {
    state.profile.overview().await
}

#[tauri::command]
pub async fn update_profile(
    state: State<'_, AppState>,
    update: ProfileUpdate,
) -> Result<User, AppError> {
    state.profile.update_profile(&update).await
}

#[tauri::command]
pub async fn change_password(
    state: State<'_, AppState>,
    current_password: String,
    new_password: String,
    confirm_password: String,
) -> Result<(), AppError> {
    state
        .profile
        .change_password(&current_password, &new_password, &confirm_password)
        .await
}
