pub mod api;
pub mod chat;
pub mod classification;
pub mod db;
pub mod language;
pub mod settings;
pub mod telemetry;
pub mod utils;

#[cfg(feature = "app")]
mod prediction_commands;

#[cfg(feature = "app")]
pub use shell::run;

#[cfg(feature = "app")]
mod shell {
    use log::warn;
    use tauri::{Emitter, Manager, State};

    use crate::api::ApiClient;
    use crate::chat::{
        commands::{
            check_api_connection, clear_chat_context_field, extract_chat_context,
            format_chat_message, get_chat_session, reset_chat_session, send_chat_message,
            set_chat_language,
        },
        ChatController,
    };
    use crate::db::Database;
    use crate::prediction_commands::{
        classify_ripeness, get_api_health, get_last_prediction, list_markets, predict_disease,
        predict_price, recommend_market,
    };
    use crate::settings::{SettingsStore, UserSettings};
    use crate::telemetry::commands::{
        get_telemetry_summary, irrigation_settings_snapshot, parse_irrigation_settings,
        parse_sensor_data, select_historical_window, select_telemetry_window,
    };
    use crate::utils::logging;

    pub(crate) struct AppState {
        pub(crate) db: Database,
        pub(crate) api: ApiClient,
        pub(crate) chat: ChatController,
        pub(crate) settings: SettingsStore,
    }

    #[tauri::command]
    fn get_settings(state: State<AppState>) -> Result<UserSettings, String> {
        Ok(state.settings.get())
    }

    /// Endpoint changes apply from the next launch; language applies now.
    #[tauri::command]
    async fn update_settings(
        settings: UserSettings,
        state: State<'_, AppState>,
        app_handle: tauri::AppHandle,
    ) -> Result<(), String> {
        state
            .settings
            .update(settings.clone())
            .map_err(|e| e.to_string())?;

        if let Err(err) = state.chat.set_language(&settings.language).await {
            warn!("Chat language not applied: {err:#}");
        }

        app_handle
            .emit("settings-updated", &settings)
            .map_err(|e| e.to_string())?;

        Ok(())
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        logging::init();

        log::info!("Smart Musa starting up...");

        tauri::Builder::default()
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let db_path = app_data_dir.join("smart-musa.sqlite3");
                    let database = Database::new(db_path)?;

                    let settings_path = app_data_dir.join("settings.json");
                    let settings_store = SettingsStore::new(settings_path)?;

                    let api = ApiClient::new(settings_store.api())?;
                    let defaults = settings_store.price_defaults();

                    // Resume the conversation the farmer was last in.
                    let chat = {
                        let db = database.clone();
                        let api = api.clone();
                        tauri::async_runtime::block_on(async move {
                            let chat = match db.latest_chat_session_id().await? {
                                Some(session_id) => {
                                    ChatController::restore(api, db, defaults, &session_id)
                                        .await?
                                }
                                None => ChatController::new(api, db, defaults),
                            };
                            Ok::<ChatController, anyhow::Error>(chat)
                        })?
                    };

                    let language = settings_store.language();
                    let chat_for_language = chat.clone();
                    tauri::async_runtime::spawn(async move {
                        chat_for_language.check_connection().await;
                        if let Err(err) = chat_for_language.set_language(&language).await {
                            warn!("Saved chat language not applied: {err:#}");
                        }
                    });

                    app.manage(AppState {
                        db: database,
                        api,
                        chat,
                        settings: settings_store,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                extract_chat_context,
                format_chat_message,
                send_chat_message,
                get_chat_session,
                clear_chat_context_field,
                reset_chat_session,
                check_api_connection,
                set_chat_language,
                predict_price,
                recommend_market,
                list_markets,
                get_api_health,
                classify_ripeness,
                predict_disease,
                get_last_prediction,
                select_telemetry_window,
                select_historical_window,
                parse_sensor_data,
                get_telemetry_summary,
                parse_irrigation_settings,
                irrigation_settings_snapshot,
                get_settings,
                update_settings,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}

#[cfg(feature = "app")]
pub(crate) use shell::AppState;
