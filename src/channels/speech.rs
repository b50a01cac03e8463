//! Speech channel
//!
//! Fire-and-forget text-to-speech. Every operation is idempotent and never
//! fails the caller; problems are logged.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Speech {
    fn speak(&self, text: &str);
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
    /// Say the last utterance again from the start
    fn restart(&self);
}

/// Logs utterances instead of speaking them
#[derive(Debug, Default)]
pub struct LogSpeech;

impl Speech for LogSpeech {
    fn speak(&self, text: &str) {
        tracing::info!("[speech] {}", text);
    }

    fn pause(&self) {
        tracing::debug!("[speech] pause");
    }

    fn resume(&self) {
        tracing::debug!("[speech] resume");
    }

    fn stop(&self) {
        tracing::debug!("[speech] stop");
    }

    fn restart(&self) {
        tracing::debug!("[speech] restart");
    }
}

#[derive(Default)]
struct Playback {
    child: Option<Child>,
    last_text: Option<String>,
}

/// Runs an external synthesiser, one process per utterance
///
/// The text is appended as the last argument of `argv`. A new utterance
/// interrupts the previous one.
pub struct CommandSpeech {
    argv: Vec<String>,
    playback: Mutex<Playback>,
}

impl CommandSpeech {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            playback: Mutex::new(Playback::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Playback> {
        self.playback.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn kill_current(playback: &mut Playback) {
        if let Some(mut child) = playback.child.take() {
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill() {
                    tracing::warn!("Failed to stop speech process: {}", e);
                }
            }
            let _ = child.wait();
        }
    }

    fn launch(&self, playback: &mut Playback, text: &str) {
        let Some((program, args)) = self.argv.split_first() else {
            tracing::info!("[speech] {}", text);
            return;
        };

        match Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => playback.child = Some(child),
            Err(e) => tracing::error!("Failed to start speech command {}: {}", program, e),
        }
    }

    /// Send a job-control signal to the running synthesiser
    #[cfg(unix)]
    fn signal(&self, signal: &str) {
        let playback = self.lock();
        let Some(child) = playback.child.as_ref() else {
            return;
        };
        let status = Command::new("kill")
            .arg(format!("-{signal}"))
            .arg(child.id().to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            tracing::warn!("Failed to send SIG{} to speech process: {}", signal, e);
        }
    }

    #[cfg(not(unix))]
    fn signal(&self, signal: &str) {
        tracing::debug!("Speech {} is not supported on this platform", signal);
    }
}

impl Speech for CommandSpeech {
    fn speak(&self, text: &str) {
        let mut playback = self.lock();
        Self::kill_current(&mut playback);
        playback.last_text = Some(text.to_string());
        self.launch(&mut playback, text);
    }

    fn pause(&self) {
        self.signal("STOP");
    }

    fn resume(&self) {
        self.signal("CONT");
    }

    fn stop(&self) {
        Self::kill_current(&mut self.lock());
    }

    fn restart(&self) {
        let mut playback = self.lock();
        Self::kill_current(&mut playback);
        if let Some(text) = playback.last_text.clone() {
            self.launch(&mut playback, &text);
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        Self::kill_current(&mut self.lock());
    }
}

/// One recorded speech operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Speak(String),
    Pause,
    Resume,
    Stop,
    Restart,
}

/// Records every operation; clones share the log
#[derive(Clone, Default)]
pub struct RecordingSpeech {
    events: Arc<Mutex<Vec<SpeechEvent>>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: SpeechEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<SpeechEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts passed to `speak`, oldest first
    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SpeechEvent::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }
}

impl Speech for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.record(SpeechEvent::Speak(text.to_string()));
    }

    fn pause(&self) {
        self.record(SpeechEvent::Pause);
    }

    fn resume(&self) {
        self.record(SpeechEvent::Resume);
    }

    fn stop(&self) {
        self.record(SpeechEvent::Stop);
    }

    fn restart(&self) {
        self.record(SpeechEvent::Restart);
    }
}

/// Speech backend described by the `[speech]` config section
pub fn from_command(argv: &[String]) -> Box<dyn Speech> {
    if argv.is_empty() {
        Box::new(LogSpeech)
    } else {
        Box::new(CommandSpeech::new(argv.to_vec()))
    }
}
