use crate::error::AppError;
use crate::lawyers::{ConnectionResponse, LawyerProfile, LawyerView, SearchParams};
use crate::models::{Category, Connection, LawyerStats, Pagination, User};
use crate::AppState;
use tauri::State;

#[tauri::command]
pub async fn search_lawyers(
    state: State<'_, AppState>,
    mut params: SearchParams,
) -> Result<LawyerView, AppError> {
    params.per_page.get_or_insert(state.config.page_size);
    state.lawyers.search(params).await?;
    Ok(state.lawyers.render())
}

#[tauri::command]
pub async fn go_to_page(state: State<'_, AppState>, page: u32) -> Result<LawyerView, AppError> {
    state.lawyers.go_to_page(page).await?;
    Ok(state.lawyers.render())
}

#[tauri::command]
pub fn render_lawyers(state: State<'_, AppState>) -> LawyerView {
    state.lawyers.render()
}

#[tauri::command]
pub async fn lawyer_profile(
    state: State<'_, AppState>,
    lawyer_id: i64,
) -> Result<LawyerProfile, AppError> {
    state.lawyers.lawyer_profile(lawyer_id).await
}

#[tauri::command]
pub async fn connect_lawyer(
    state: State<'_, AppState>,
    lawyer_id: i64,
    case_description: String,
    urgent: bool,
) -> Result<Connection, AppError> {
    state
        .lawyers
        .connect(lawyer_id, &case_description, urgent)
        .await
}

#[tauri::command]
pub async fn list_connections(state: State<'_, AppState>) -> Result<Vec<Connection>, AppError> {
    state.lawyers.load_connections().await
}

#[tauri::command]
pub async fn respond_connection(
    state: State<'_, AppState>,
    connection_id: i64,
    response: ConnectionResponse,
) -> Result<Connection, AppError> {
    state.lawyers.respond(connection_id, response).await
}

#[tauri::command]
pub async fn lawyer_stats(state: State<'_, AppState>) -> Result<LawyerStats, AppError> {
    state.lawyers.stats().await
}

#[tauri::command]
pub async fn featured_lawyers(state: State<'_, AppState>) -> Result<Vec<User>, AppError> {
    state.lawyers.featured().await
}

#[tauri::command]
pub async fn specializations(state: State<'_, AppState>) -> Result<Vec<Category>, AppError> {
    state.lawyers.specializations().await
}

#[tauri::command]
pub async fn lawyer_directory(
    state: State<'_, AppState>,
    page: Option<u32>,
) -> Result<(Vec<User>, Pagination), AppError> {
    state
        .lawyers
        .directory(page.unwrap_or(1), Some(state.config.page_size))
        .await
}
