//! System prompt construction per interaction style

use crate::config::{ChatContextConfig, CommandsConfig};
use crate::core::types::SessionStyle;

/// Most worked examples injected into the translation prompt
pub const MAX_TRANSLATION_EXAMPLES: usize = 3;

/// A symbol sequence and its natural rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationExample {
    pub source: String,
    pub translation: String,
}

impl TranslationExample {
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: translation.into(),
        }
    }
}

/// Built-in example bank
///
/// Every translation here passes Italian reply validation.
pub fn default_translation_examples() -> Vec<TranslationExample> {
    vec![
        TranslationExample::new(
            "IO VOLERE ANDARE MARE DOMANI FAMIGLIA",
            "Domani voglio andare al mare con la mia famiglia.",
        ),
        TranslationExample::new(
            "TU VENIRE CASA MIA SABATO CENA DOMANDA",
            "Sabato vieni a casa mia per la cena?",
        ),
        TranslationExample::new(
            "GRAZIE TUO REGALO BELLO",
            "Grazie per il tuo regalo, è bellissimo.",
        ),
    ]
}

fn base_prompt(commands: &CommandsConfig, language: &str) -> String {
    let language_line = match language {
        "it" => "Comunica sempre in italiano. ",
        "en" => "Comunica sempre in inglese. ",
        _ => "",
    };

    format!(
        "Sei un assistente specializzato nel supporto alla comunicazione per persone con disabilità. \
         {language_line}Le risposte devono essere chiare, dirette e adatte al contesto. \
         Rivolgiti all'utente in seconda persona. \
         L'utente ha gravi difficoltà motorie e scrive con una tastiera a simboli \
         che produce sequenze di parole in MAIUSCOLO con poca struttura grammaticale: \
         interpretale. Le tue risposte gli vengono lette dalla sintesi vocale. \
         Quando proponi approfondimenti o fai domande numera sempre le alternative, \
         così l'utente può rispondere con uno o più numeri. Sii conciso. \
         Quando l'utente scrive {retry}, formula una risposta alternativa all'ultima. \
         Quando l'utente scrive {emit}, rispondi solo con il contenuto finale \
         elaborato nella sessione, senza spiegazioni né commenti; se la sessione ha \
         prodotto più contenuti, fornisci solo l'ultimo significativo.",
        retry = commands.retry,
        emit = commands.emit_final,
    )
}

fn style_prompt(style: SessionStyle) -> &'static str {
    match style {
        SessionStyle::Exploration => {
            "Aiuta l'utente a esplorare concetti e idee. Dai spiegazioni dettagliate ma \
             accessibili e dividi le informazioni complesse in parti semplici."
        }
        SessionStyle::CreativeWriting => {
            "Assisti l'utente nella creazione di testi creativi: canzoni, racconti e poesie. \
             Mantieni uno stile vivace e coinvolgente, ma sempre comprensibile."
        }
        SessionStyle::ArticleWriting => {
            "Aiuta l'utente a preparare articoli, interventi e post di blog. Organizza il \
             contenuto in modo logico e strutturato, con un tono professionale ma accessibile."
        }
        SessionStyle::Translation => {
            "Il tuo compito è tradurre i messaggi dell'utente in italiano corretto e naturale, \
             mantenendo il significato originale. L'utente non usa punteggiatura. \
             I messaggi verranno inviati a un'altra persona, quindi 'TU' e 'TUO' si riferiscono \
             all'interlocutore dell'utente: mantieni la seconda persona e non aggiungere frasi \
             come 'di' al tuo interlocutore che'. \
             Traduci come domanda SOLO se il messaggio termina con la parola DOMANDA; altrimenti \
             traduci sempre come affermazione, senza punto interrogativo. \
             Rispondi solo con la traduzione, senza introduzioni né alternative."
        }
        SessionStyle::Chat => {
            "L'utente partecipa a una conversazione sui social e ti chiede di aiutarlo a \
             rispondere. Quando vuole tornare a un'alternativa precedente scrive INDIETRO \
             seguito dal numero dell'alternativa."
        }
    }
}

fn platform_guidelines(platform: &str) -> &'static str {
    match platform.to_lowercase().as_str() {
        "whatsapp" => {
            "Usa un tono amichevole e colloquiale. Le risposte devono essere concise. \
             Puoi usare emoji quando appropriato."
        }
        "telegram" => {
            "Puoi essere più dettagliato. Usa un tono semi-formale; le emoji sono accettabili \
             ma non eccessive."
        }
        "facebook" => {
            "Mantieni un tono informale ma rispettoso, con frasi brevi. Limita i messaggi \
             a una o due frasi."
        }
        _ => "Mantieni un tono appropriato al contesto.",
    }
}

fn tone_adjustment(tone: &str) -> Option<&'static str> {
    match tone.to_lowercase().as_str() {
        "informal" => Some("Usa un linguaggio colloquiale e amichevole."),
        "formal" => Some("Mantieni un tono professionale e cortese."),
        "friendly" => Some("Sii cordiale e aperto, ma sempre rispettoso."),
        _ => None,
    }
}

/// Run-time conversation parameters for the conversational style
pub fn chat_context_prompt(chat: &ChatContextConfig) -> String {
    let mut lines = vec![
        format!("Stai partecipando a una conversazione su {}.", chat.platform),
        platform_guidelines(&chat.platform).to_string(),
        format!(
            "Limita la lunghezza delle risposte a circa {} caratteri.",
            chat.max_length
        ),
    ];
    if let Some(tone) = tone_adjustment(&chat.tone) {
        lines.push(tone.to_string());
    }
    if !chat.participants.is_empty() {
        lines.push(format!("Partecipanti: {}.", chat.participants.join(", ")));
    }
    lines.push("Mantieni il contesto e rispondi in modo pertinente ai messaggi precedenti.".into());
    lines.join("\n")
}

/// Builds the system prompt for each style
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    commands: CommandsConfig,
    chat_context: ChatContextConfig,
    language: String,
    examples: Vec<TranslationExample>,
}

impl PromptBuilder {
    pub fn new(commands: CommandsConfig, chat_context: ChatContextConfig, language: &str) -> Self {
        Self {
            commands,
            chat_context,
            language: language.to_string(),
            examples: default_translation_examples(),
        }
    }

    pub fn with_examples(mut self, examples: Vec<TranslationExample>) -> Self {
        self.examples = examples;
        self
    }

    pub fn add_example(&mut self, example: TranslationExample) {
        self.examples.push(example);
    }

    pub fn system_prompt(&self, style: SessionStyle) -> String {
        let mut parts = vec![
            base_prompt(&self.commands, &self.language),
            style_prompt(style).to_string(),
        ];

        if style.is_conversational() {
            parts.push(chat_context_prompt(&self.chat_context));
        }

        if style == SessionStyle::Translation && !self.examples.is_empty() {
            parts.push("Esempi di traduzione:".to_string());
            for example in self.examples.iter().take(MAX_TRANSLATION_EXAMPLES) {
                parts.push(format!(
                    "Input: {}\nTraduzione: {}",
                    example.source, example.translation
                ));
            }
        }

        parts.join("\n\n")
    }

    /// Request that turns the conversation into a message for the chat platform
    pub fn platform_message_prompt(&self) -> String {
        format!(
            "Prepara un messaggio {} basato sulla nostra conversazione. Deve essere conciso, \
             chiaro e adatto a una chat. Puoi includere emoji ma nessuna formattazione speciale. \
             Non suggerire estensioni o modifiche.",
            self.chat_context.platform
        )
    }

    /// Request that reopens a stored artifact for revision
    pub fn revision_prompt(&self, style: SessionStyle, content: &str) -> String {
        let request = match style {
            SessionStyle::ArticleWriting => {
                "Ho un articolo esistente che vorrei revisionare. Analizzalo e suggeriscimi \
                 come migliorarlo in struttura, chiarezza, argomentazione e impatto."
            }
            _ => {
                "Ho un testo creativo esistente che vorrei sviluppare. Analizzalo e suggeriscimi \
                 diverse direzioni creative su stile, tono, struttura e contenuto."
            }
        };
        format!("{request} Ecco il testo originale:\n\n{content}")
    }
}
