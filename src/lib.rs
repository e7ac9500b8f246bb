pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod lawyers;
pub mod logging;
pub mod models;
pub mod profile;
pub mod session;

#[cfg(feature = "desktop")]
mod commands;

use api::ApiClient;
use chat::ChatManager;
use config::AppConfig;
use db::{Database, KEY_SESSION_COOKIE};
use documents::DocumentManager;
use error::Result;
use lawyers::LawyerManager;
use profile::ProfileManager;
use session::{AuthManager, SessionState};
use std::path::Path;

/// One client: the settings store, a shared HTTP session and a manager per page.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub api: ApiClient,
    pub auth: AuthManager,
    pub documents: DocumentManager,
    pub chat: ChatManager,
    pub lawyers: LawyerManager,
    pub profile: ProfileManager,
}

impl AppState {
    /// Open the settings database under `data_dir` and resolve configuration.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let db = Database::new(data_dir)?;
        let config = AppConfig::load(&db)?;
        Self::with_config(db, config)
    }

    pub fn with_config(db: Database, config: AppConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url)?;
        if let Some(cookie) = db.get_setting(KEY_SESSION_COOKIE)? {
            api.import_cookies(&cookie);
            tracing::debug!("Restored saved session cookie");
        }
        let session = SessionState::new();
        Ok(Self {
            auth: AuthManager::new(api.clone(), session.clone()),
            documents: DocumentManager::new(api.clone(), session.clone()),
            chat: ChatManager::new(api.clone(), session.clone()),
            lawyers: LawyerManager::new(api.clone(), session.clone()),
            profile: ProfileManager::new(api.clone(), session),
            db,
            config,
            api,
        })
    }

    pub fn session(&self) -> &SessionState {
        self.auth.session()
    }

    /// Persist the cookie jar so the next start resumes the login.
    pub fn save_session(&self) -> Result<()> {
        match self.api.export_cookies() {
            Some(cookie) => self.db.set_setting(KEY_SESSION_COOKIE, &cookie),
            None => self.db.delete_setting(KEY_SESSION_COOKIE),
        }
    }

    pub fn forget_session(&self) -> Result<()> {
        self.db.delete_setting(KEY_SESSION_COOKIE)
    }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    logging::init(false);
    let result = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let state = AppState::open(&app_dir)?;
            tracing::info!(api = %state.config.api_base_url, "Desktop shell starting");
            app.manage(state);

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let state = handle.state::<AppState>();
                if let Err(e) = state.auth.verify().await {
                    tracing::warn!(error = %e, "Session verification failed");
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::auth::verify_session,
            commands::auth::login,
            commands::auth::register,
            commands::auth::logout,
            commands::auth::current_user,
            commands::documents::list_documents,
            commands::documents::render_documents,
            commands::documents::document_stats,
            commands::documents::upload_document,
            commands::documents::get_document,
            commands::documents::delete_document,
            commands::documents::reanalyze_document,
            commands::documents::download_document,
            commands::chat::list_sessions,
            commands::chat::render_sessions,
            commands::chat::create_session,
            commands::chat::select_session,
            commands::chat::new_chat,
            commands::chat::send_message,
            commands::chat::delete_session,
            commands::chat::export_transcript,
            commands::chat::legal_categories,
            commands::chat::quick_question,
            commands::lawyers::search_lawyers,
            commands::lawyers::go_to_page,
            commands::lawyers::render_lawyers,
            commands::lawyers::lawyer_profile,
            commands::lawyers::connect_lawyer,
            commands::lawyers::list_connections,
            commands::lawyers::respond_connection,
            commands::lawyers::lawyer_stats,
            commands::lawyers::featured_lawyers,
            commands::lawyers::specializations,
            commands::lawyers::lawyer_directory,
            commands::profile::profile_overview,
            commands::profile::update_profile,
            commands::profile::change_password,
            commands::settings::get_settings,
            commands::settings::set_setting,
            commands::settings::delete_setting,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!(error = %e, "Desktop shell exited with an error");
    }
}
