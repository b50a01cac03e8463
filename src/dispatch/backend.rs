//! The resident backend: single owner of the session and its services

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::handlers;
use super::markers::Marker;
use super::MarkerHandler;
use crate::agent::Orchestrator;
use crate::channels::{Clipboard, Notifier, Speech};
use crate::config::{Config, LlmConfig};
use crate::core::errors::{DispatchError, StoreError};
use crate::core::session::Session;
use crate::core::types::SessionStyle;
use crate::llm::LlmProvider;
use crate::storage::{ArtifactStore, ChatStore};

/// Channels to the input device and the user
pub struct Channels {
    pub clipboard: Box<dyn Clipboard>,
    pub speech: Box<dyn Speech>,
    pub notifier: Box<dyn Notifier>,
}

/// Everything a handler needs besides the session
pub struct Services {
    pub orchestrator: Orchestrator,
    pub artifacts: ArtifactStore,
    pub chats: ChatStore,
    pub clipboard: Box<dyn Clipboard>,
    pub speech: Box<dyn Speech>,
    pub notifier: Box<dyn Notifier>,
    pub llm: LlmConfig,
    /// Chat platform named in spoken confirmations
    pub platform: String,
    pub notify_delay: Duration,
    /// Last text this process put on the clipboard
    last_published: Mutex<Option<String>>,
}

impl Services {
    /// Put `text` on the clipboard and ping the input device
    pub async fn publish(&self, text: &str) -> Result<(), DispatchError> {
        self.clipboard.set_text(text)?;
        *self
            .last_published
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(text.trim().to_string());
        tokio::time::sleep(self.notify_delay).await;
        self.notifier.notify();
        Ok(())
    }

    /// Publish `text` and read it aloud
    ///
    /// A clipboard failure is logged; the text is still spoken.
    pub async fn deliver(&self, text: &str) {
        if let Err(e) = self.publish(text).await {
            tracing::error!("Failed to publish reply: {}", e);
        }
        self.speech.speak(text);
    }

    /// Whether `text` is what this process last put on the clipboard
    pub fn is_own_output(&self, text: &str) -> bool {
        self.last_published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_deref()
            == Some(text.trim())
    }
}

pub struct Backend {
    session: Session,
    services: Services,
}

impl Backend {
    pub fn new(
        config: &Config,
        provider: Box<dyn LlmProvider>,
        channels: Channels,
    ) -> Result<Self, StoreError> {
        let artifacts = ArtifactStore::new(config.paths.artifacts_dir())?;
        let chats = ChatStore::new(config.paths.chats_dir())?;

        let services = Services {
            orchestrator: Orchestrator::new(provider, config),
            artifacts,
            chats,
            clipboard: channels.clipboard,
            speech: channels.speech,
            notifier: channels.notifier,
            llm: config.llm.clone(),
            platform: config.chat_context.platform.clone(),
            notify_delay: Duration::from_millis(config.dispatcher.notify_delay_ms),
            last_published: Mutex::new(None),
        };

        let session = Session::new(config.dispatcher.initial_style, &config.llm);
        tracing::info!(
            "Backend ready: style {}, provider {}",
            session.style(),
            services.orchestrator.provider_name()
        );

        Ok(Self { session, services })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Spoken sentence for a recoverable failure, or `None` when it is not one
    fn recoverable_message(marker: Marker, error: &DispatchError) -> Option<String> {
        let record = match marker {
            Marker::ReadChat | Marker::ResumeChat | Marker::DeleteChat => "della chat",
            _ => "dell'artefatto",
        };
        match error {
            DispatchError::InvalidNumber(_) => {
                Some(format!("Per favore, specifica il numero {record}."))
            }
            DispatchError::Store(e) if e.is_recoverable() => Some(match e {
                StoreError::OutOfRange { count, .. } => {
                    format!("Numero non valido. Ci sono {count} elementi.")
                }
                StoreError::EmptyChat => {
                    "Non c'è contenuto da salvare nella sessione corrente.".to_string()
                }
                _ => "L'elemento richiesto non è più disponibile.".to_string(),
            }),
            _ => None,
        }
    }
}

#[async_trait(?Send)]
impl MarkerHandler for Backend {
    async fn handle(&mut self, marker: Marker) -> Result<(), DispatchError> {
        let Backend { session, services } = self;

        match marker {
            Marker::CleanHistory => handlers::clean_history(session),
            Marker::ProcessClipboard => handlers::process_clipboard(session, services).await?,
            Marker::ModeChat
            | Marker::ModeExplore
            | Marker::ModeTranslate
            | Marker::ModeWrite
            | Marker::ModeCreate => {
                if let Some(style) = marker.target_style() {
                    handlers::switch_mode(session, services, style);
                }
            }
            Marker::TtsPause => services.speech.pause(),
            Marker::TtsResume => services.speech.resume(),
            Marker::TtsStop => services.speech.stop(),
            Marker::TtsRestart => services.speech.restart(),
            Marker::Retry => handlers::retry(session, services).await?,
            Marker::PrintArtifact => handlers::print_artifact(session, services).await?,
            Marker::ListArtifact => handlers::list_artifacts(services)?,
            Marker::ReadArtifact => handlers::read_artifact(services).await?,
            Marker::ResumeCreativeArtifact => {
                handlers::resume_artifact(session, services, SessionStyle::CreativeWriting).await?
            }
            Marker::ResumeArticleArtifact => {
                handlers::resume_artifact(session, services, SessionStyle::ArticleWriting).await?
            }
            Marker::DeleteArtifact => handlers::delete_artifact(services)?,
            Marker::SaveChat => handlers::save_chat(session, services)?,
            Marker::ListChats => handlers::list_chats(services)?,
            Marker::ReadChat => handlers::read_chat(services)?,
            Marker::ResumeChat => handlers::resume_chat(session, services)?,
            Marker::DeleteChat => handlers::delete_chat(services)?,
            Marker::PrepareMessage => handlers::prepare_message(session, services).await?,
        }
        Ok(())
    }

    async fn report(&mut self, marker: Marker, error: &DispatchError) {
        if let Some(message) = Self::recoverable_message(marker, error) {
            tracing::info!("{}: {}", marker, error);
            self.services.speech.speak(&message);
            return;
        }

        tracing::error!("Handler {} failed: {}", marker, error);
        let message = match error {
            DispatchError::Provider(e) => e.user_message().to_string(),
            _ => "Si è verificato un errore durante l'operazione richiesta.".to_string(),
        };
        self.services.deliver(&message).await;
    }

    fn shutdown(&mut self) {
        self.services.speech.stop();
    }
}
