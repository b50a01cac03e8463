//! One function per marker
//!
//! Each handler receives the live session and the shared services
//! explicitly. Recoverable conditions (empty session, bad number, record
//! gone) are spoken here; anything else is returned to the dispatcher.

use crate::agent::APOLOGY;
use crate::core::errors::DispatchError;
use crate::core::session::Session;
use crate::core::types::{Role, SessionStyle};
use crate::storage::is_usable_title;

use super::backend::Services;

/// Read a 1-based record number from the clipboard
fn read_number(services: &Services) -> Result<usize, DispatchError> {
    let text = services.clipboard.get_text()?;
    let trimmed = text.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| DispatchError::InvalidNumber(trimmed.to_string()))
}

/// Clipboard text when it reads like a title (2 to 5 words)
fn clipboard_title(services: &Services) -> Result<Option<String>, DispatchError> {
    let text = services.clipboard.get_text()?;
    let trimmed = text.trim();
    Ok(is_usable_title(trimmed).then(|| trimmed.to_string()))
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

pub fn clean_history(session: &mut Session) {
    session.clear_history();
    tracing::info!("History cleared");
}

/// Content processing: the clipboard holds the user's prompt
pub async fn process_clipboard(
    session: &mut Session,
    services: &Services,
) -> Result<(), DispatchError> {
    let text = services.clipboard.get_text()?;
    let prompt = text.trim();

    if prompt.is_empty() {
        tracing::warn!("Clipboard is empty");
        return Ok(());
    }
    if services.orchestrator.is_retry(prompt) {
        return retry(session, services).await;
    }
    if services.orchestrator.is_emit_final(prompt) {
        return print_artifact(session, services).await;
    }

    if services.is_own_output(prompt) {
        tracing::info!("Clipboard holds text published by the backend, ignoring");
        return Ok(());
    }
    if let Some(last) = session.last_message() {
        if last.role == Role::Assistant && last.content.trim() == prompt {
            tracing::info!("Clipboard holds the last reply, ignoring");
            return Ok(());
        }
    }
    if let Some(last_prompt) = session.last_by_role(Role::User) {
        if last_prompt.content == prompt && !is_numeric(prompt) {
            tracing::info!("Prompt identical to the previous one, ignoring");
            return Ok(());
        }
    }

    let reply = services.orchestrator.respond(session, prompt).await?;
    services.deliver(&reply.content).await;
    Ok(())
}

pub fn switch_mode(session: &mut Session, services: &Services, style: SessionStyle) {
    if session.switch_style(style, &services.llm) {
        services
            .speech
            .speak(&format!("Modalità {}", style.spoken_name()));
    }
}

pub async fn retry(session: &mut Session, services: &Services) -> Result<(), DispatchError> {
    let reply = services.orchestrator.retry(session).await?;
    services.deliver(&reply.content).await;
    Ok(())
}

/// Emit the final content of the session and keep it as an artifact
pub async fn print_artifact(session: &Session, services: &Services) -> Result<(), DispatchError> {
    if session.is_empty() {
        services
            .speech
            .speak("Nessun contenuto disponibile nella sessione corrente.");
        return Ok(());
    }

    let reply = services.orchestrator.emit_final(session).await?;
    if !reply.accepted {
        services.deliver(APOLOGY).await;
        return Ok(());
    }

    let title = clipboard_title(services)
        .unwrap_or_else(|e| {
            tracing::warn!("Cannot read a title from the clipboard: {}", e);
            None
        })
        .or_else(|| session.title().map(String::from));
    let outcome = match services.artifacts.save(&reply.content, title.as_deref()) {
        Ok(name) => format!("Ho salvato l'artefatto come {name}"),
        Err(e) => {
            tracing::error!("Failed to save artifact: {}", e);
            "Non sono riuscito a salvare l'artefatto, ma te lo mostro comunque".to_string()
        }
    };

    services.publish(&reply.content).await?;
    services
        .speech
        .speak(&format!("{outcome}... {}", reply.content));
    Ok(())
}

pub fn list_artifacts(services: &Services) -> Result<(), DispatchError> {
    let listing = services.artifacts.format_listing()?;
    services.speech.speak(&listing);
    Ok(())
}

pub async fn read_artifact(services: &Services) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let artifact = services.artifacts.get_by_number(number)?;

    services.publish(&artifact.content).await?;
    services
        .speech
        .speak(&format!("{}... {}", artifact.name, artifact.content));
    Ok(())
}

/// Reopen an artifact for revision in `style`
///
/// The session is reset to `style` even when already active, titled after
/// the artifact, and the revision exchange becomes its first turn.
pub async fn resume_artifact(
    session: &mut Session,
    services: &Services,
    style: SessionStyle,
) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let artifact = services.artifacts.get_by_number(number)?;

    session.resume(style, Vec::new(), Some(artifact.name.clone()), &services.llm);
    let reply = services
        .orchestrator
        .revise_artifact(session, &artifact.content)
        .await?;
    services.speech.speak(&reply.content);
    Ok(())
}

pub fn delete_artifact(services: &Services) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let name = services.artifacts.delete_by_number(number)?;
    services
        .speech
        .speak(&format!("Artefatto {name} cancellato con successo"));
    Ok(())
}

pub fn save_chat(session: &mut Session, services: &Services) -> Result<(), DispatchError> {
    if session.is_empty() {
        services
            .speech
            .speak("Non c'è contenuto da salvare nella sessione corrente.");
        return Ok(());
    }

    let title = clipboard_title(services)
        .unwrap_or_else(|e| {
            tracing::warn!("Cannot read a title from the clipboard: {}", e);
            None
        })
        .or_else(|| session.title().map(String::from));
    let name = services
        .chats
        .save(session.style(), session.history(), title.as_deref())?;
    session.set_title(name.clone());

    services.speech.speak(&format!(
        "Ho salvato la sessione di {} come {}",
        session.style().spoken_name(),
        name
    ));
    Ok(())
}

pub fn list_chats(services: &Services) -> Result<(), DispatchError> {
    let listing = services.chats.format_listing()?;
    services.speech.speak(&listing);
    Ok(())
}

pub fn read_chat(services: &Services) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let chat = services.chats.get_by_number(number)?;

    let text = match chat.record.last_reply() {
        Some(reply) => format!(
            "Chat {} di tipo {}. Ultima risposta: {}",
            chat.name,
            chat.record.style.spoken_name(),
            reply
        ),
        None => "La chat non contiene risposte dell'assistente.".to_string(),
    };
    services.speech.speak(&text);
    Ok(())
}

pub fn resume_chat(session: &mut Session, services: &Services) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let chat = services.chats.get_by_number(number)?;
    let last_reply = chat.record.last_reply().map(String::from);

    session.resume(
        chat.record.style,
        chat.record.history,
        Some(chat.name.clone()),
        &services.llm,
    );

    let text = match last_reply {
        Some(reply) => format!("Ho ripreso la chat {}. Ultima risposta: {}", chat.name, reply),
        None => format!("Ho ripreso la chat {}", chat.name),
    };
    services.speech.speak(&text);
    Ok(())
}

pub fn delete_chat(services: &Services) -> Result<(), DispatchError> {
    let number = read_number(services)?;
    let name = services.chats.delete_by_number(number)?;
    services
        .speech
        .speak(&format!("Ho eliminato la chat {name}"));
    Ok(())
}

/// Condense the conversation into a message for the chat platform
pub async fn prepare_message(session: &Session, services: &Services) -> Result<(), DispatchError> {
    if session.is_empty() {
        services.speech.speak(
            "Non c'è contenuto disponibile nella sessione corrente per preparare un messaggio.",
        );
        return Ok(());
    }

    let reply = services.orchestrator.prepare_message(session).await?;
    if !reply.accepted {
        services.deliver(APOLOGY).await;
        return Ok(());
    }

    services.publish(&reply.content).await?;
    services.speech.speak(&format!(
        "Ecco il messaggio pronto per {}: {}",
        services.platform, reply.content
    ));
    Ok(())
}
