use std::sync::Arc;

use sea_orm::DatabaseConnection;
use shared::{get_db_connection, get_redis_connection, Config};
use tracing::{info, warn};

use crate::auth::SessionStore;
use crate::services::account_service::AccountService;
use crate::services::ai_assist::AiAssistant;
use crate::services::email::Mailer;
use crate::services::gemini::GeminiService;
use crate::services::storage::StorageService;

pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<DatabaseConnection>,
    pub sessions: SessionStore,
    pub accounts: Arc<AccountService>,
    pub ai: AiAssistant,
    pub mailer: Option<Mailer>,
    pub storage: Option<StorageService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let db = Arc::new(get_db_connection(&config.database_url).await?);
        info!("Connected to database successfully");

        let redis = get_redis_connection(&config.redis_url).await?;
        let sessions = SessionStore::new(redis, config.session_ttl_secs);

        let gemini = match &config.gemini {
            Some(gemini) => Some(GeminiService::from_config(gemini)?),
            None => {
                warn!("GEMINI_API_KEY not set, AI endpoints will return fallback payloads");
                None
            }
        };

        let mailer = match &config.smtp {
            Some(smtp) => Some(Mailer::from_config(smtp)?),
            None => {
                warn!("SMTP not configured, emails will not be sent");
                None
            }
        };

        let storage = config.cloudinary.as_ref().map(StorageService::from_config);
        if storage.is_none() {
            warn!("Cloudinary not configured, uploads are disabled");
        }

        let accounts = Arc::new(AccountService::new(db.clone()));

        Ok(AppState {
            config: Arc::new(config),
            db,
            sessions,
            accounts,
            ai: AiAssistant::new(gemini),
            mailer,
            storage,
        })
    }
}
