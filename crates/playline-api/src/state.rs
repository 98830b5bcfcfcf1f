//! Application state.

use playline_core::AggregateOptions;
use playline_firestore::{
    AnnotationRepository, FirestoreClient, InteractionSessionRepository, UserSessionRepository,
};

use crate::config::ApiConfig;
use crate::security::load_or_generate_secret_key;
use crate::services::{AggregateService, IngestService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub firestore: FirestoreClient,
    pub sessions: InteractionSessionRepository,
    pub users: UserSessionRepository,
    pub annotations: AnnotationRepository,
    pub ingest: IngestService,
    pub aggregate: AggregateService,
    pub secret_key: String,
}

impl AppState {
    /// Create new application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let firestore = FirestoreClient::from_env().await?;
        let secret_key = load_or_generate_secret_key(&config.secret_key_path)?;
        Ok(Self::with_client(config, firestore, secret_key))
    }

    /// Assemble state around an existing store client (used by tests).
    pub fn with_client(config: ApiConfig, firestore: FirestoreClient, secret_key: String) -> Self {
        let sessions = InteractionSessionRepository::new(firestore.clone());
        let users = UserSessionRepository::new(firestore.clone());
        let annotations = AnnotationRepository::new(firestore.clone());

        let options = AggregateOptions {
            zero_interval_policy: config.zero_interval_policy,
        };

        Self {
            ingest: IngestService::new(sessions.clone(), users.clone()),
            aggregate: AggregateService::new(
                sessions.clone(),
                users.clone(),
                annotations.clone(),
                options,
            ),
            config,
            firestore,
            sessions,
            users,
            annotations,
            secret_key,
        }
    }
}
