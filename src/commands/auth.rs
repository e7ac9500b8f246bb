use crate::error::AppError;
use crate::models::User;
use crate::session::RegisterRequest;
use crate::AppState;
use tauri::State;

#[tauri::command]
pub async fn verify_session(state: State<'_, AppState>) -> Result<Option<User>, AppError> {
    state.auth.verify().await
}

#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<User, AppError> {
    let user = state.auth.login(&email, &password).await?;
    state.save_session()?;
    Ok(user)
}

#[tauri::command]
pub async fn register(
    state: State<'_, AppState>,
    request: RegisterRequest,
) -> Result<User, AppError> {
    let user = state.auth.register(&request).await?;
    state.save_session()?;
    Ok(user)
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<(), AppError> {
    let result = state.auth.logout().await;
    state.forget_session()?;
    result
}

#[tauri::command]
pub fn current_user(state: State<'_, AppState>) -> Option<User> {
    state.session().current_user()
}
