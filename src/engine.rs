//! # Dialogue Engine Module
//!
//! Transport-agnostic core of the bot. The engine consumes inbound command
//! events, drives the per-chat dialogue state machine, and hands completed
//! queries to the report pipeline. It knows nothing about Telegram: the
//! adapter in [`crate::bot`] maps messages to [`InboundEvent`]s and delivers
//! the [`OutboundMessage`]s and report artifacts the engine returns.
//!
//! Events for the same chat are serialized through a keyed lock table, so
//! session transitions never interleave. The lock covers only session
//! reads and transitions; the (potentially slow) vacancy lookup runs with
//! no lock held.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::query::{normalize, Query};
use crate::report::{ReportGenerator, VacancySearch};
use crate::report_store::ReportStore;
use crate::session::{DialogSession, DialogState, SessionStore};

// User-facing texts, single-language like the original bot
pub const PROMPT_ROLE: &str = "Введите должность:";
pub const PROMPT_LOCATION: &str = "Город?";
pub const MSG_BLANK_INPUT: &str = "Пустой ответ не подойдёт.";
pub const MSG_SEARCHING: &str = "Собираю вакансии, это может занять до 1–2 минут…";
pub const MSG_CANCELLED: &str = "Поиск отменён. Чтобы начать заново, отправь /parse.";
pub const MSG_NOTHING_TO_CANCEL: &str = "Сейчас нет активного поиска.";
pub const MSG_NO_DIALOG_HINT: &str =
    "Чтобы начать поиск, отправь /parse или нажми «🔎 Поиск».";
pub const MSG_LOOKUP_FAILED: &str =
    "Не удалось получить отчёт: поиск завершился с ошибкой. Попробуй позже.";
pub const MSG_STORAGE_FAILED: &str =
    "Не удалось сохранить отчёт. Попробуй выполнить запрос ещё раз.";
pub const MSG_REPORT_READY: &str = "Готово! Отчёт во вложении.";
pub const MSG_STATUS_IDLE: &str = "Активного поиска нет. Отправь /parse, чтобы начать.";

pub const START_TEXT: &str = "Привет! Я HR-Assist — соберу вакансии по твоему запросу \
и пришлю файл с отчётом.\n\n\
Как пользоваться:\n\
1) Нажми «🔎 Поиск» — я спрошу должность и город.\n\
2) Или одной командой: /parse бариста; Москва\n\n\
Подробная помощь — /help.";

pub const HELP_TEXT: &str = "Памятка\n\n\
Как искать:\n\
• Кнопка «🔎 Поиск» — я спрошу должность и город.\n\
• Быстрая команда: /parse кассир; Москва\n\n\
Команды:\n\
• /parse — поиск\n\
• /cancel — отменить текущий диалог\n\
• /status — что сейчас происходит\n\
• /help — эта справка";

/// Command extracted from an inbound chat message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/parse` with its raw argument string (possibly empty)
    Parse(String),
    /// Free text inside a dialogue
    Text(String),
    Cancel,
    Start,
    Help,
    Status,
}

/// A single event handed to the engine by the transport layer
#[derive(Clone, Debug)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub command: Command,
}

/// A reply to deliver back to the chat
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Result of handling one inbound event
#[derive(Debug, Default)]
pub struct HandleOutcome {
    pub replies: Vec<OutboundMessage>,
    /// Path of a freshly written report artifact, when one was produced
    pub report_path: Option<PathBuf>,
}

impl HandleOutcome {
    fn reply(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            replies: vec![OutboundMessage {
                chat_id,
                text: text.into(),
            }],
            report_path: None,
        }
    }
}

/// Dialogue engine over an injected lookup capability
pub struct Engine<S: VacancySearch> {
    sessions: SessionStore,
    generator: ReportGenerator<S>,
    store: ReportStore,
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: VacancySearch> Engine<S> {
    pub fn new(searcher: S, report_dir: impl Into<PathBuf>, idle_timeout: Duration) -> Self {
        Self {
            sessions: SessionStore::new(idle_timeout),
            generator: ReportGenerator::new(searcher),
            store: ReportStore::new(report_dir),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Get or create the serialization lock for a chat
    fn chat_lock(&self, chat_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(chat_id).or_default())
    }

    /// Handle one inbound event and produce the replies to deliver.
    ///
    /// `now` is injected by the caller so idle expiry is testable without
    /// real time passing.
    pub async fn handle_event(&self, event: InboundEvent, now: DateTime<Utc>) -> HandleOutcome {
        let chat_id = event.chat_id;
        match event.command {
            Command::Start => {
                // A fresh /start always abandons any dialogue in progress
                let _guard = self.chat_lock(chat_id).lock_owned().await;
                self.sessions.clear(chat_id);
                HandleOutcome::reply(chat_id, START_TEXT)
            }
            Command::Help => HandleOutcome::reply(chat_id, HELP_TEXT),
            Command::Status => {
                let _guard = self.chat_lock(chat_id).lock_owned().await;
                let text = match self.sessions.get(chat_id, now) {
                    Some(session) => status_text(&session),
                    None => MSG_STATUS_IDLE.to_string(),
                };
                HandleOutcome::reply(chat_id, text)
            }
            Command::Cancel => {
                let _guard = self.chat_lock(chat_id).lock_owned().await;
                if self.sessions.get(chat_id, now).is_some() {
                    self.sessions.clear(chat_id);
                    info!(chat_id, "dialogue cancelled");
                    HandleOutcome::reply(chat_id, MSG_CANCELLED)
                } else {
                    HandleOutcome::reply(chat_id, MSG_NOTHING_TO_CANCEL)
                }
            }
            Command::Parse(args) => self.handle_parse(chat_id, &args, now).await,
            Command::Text(text) => self.handle_text(chat_id, &text, now).await,
        }
    }

    async fn handle_parse(&self, chat_id: i64, args: &str, now: DateTime<Utc>) -> HandleOutcome {
        let query = normalize(args);
        if query.is_complete() {
            // Single-shot path: no session is ever persisted
            info!(chat_id, role = %query.role, location = %query.location, "single-shot /parse");
            return self.run_report(chat_id, query, now).await;
        }

        let guard = self.chat_lock(chat_id).lock_owned().await;
        let mut session = self.sessions.get_or_create(chat_id, now);

        // Merge the fields the user did supply; never wipe a known field
        if !query.role.is_empty() {
            session.partial.role = query.role;
        }
        if !query.location.is_empty() {
            session.partial.location = query.location;
        }

        let prompt = if session.partial.role.is_empty() {
            session.state = DialogState::AwaitingRole;
            PROMPT_ROLE
        } else {
            session.state = DialogState::AwaitingLocation;
            PROMPT_LOCATION
        };
        self.sessions.update(session, now);
        drop(guard);

        HandleOutcome::reply(chat_id, prompt)
    }

    async fn handle_text(&self, chat_id: i64, text: &str, now: DateTime<Utc>) -> HandleOutcome {
        let guard = self.chat_lock(chat_id).lock_owned().await;
        let Some(mut session) = self.sessions.get(chat_id, now) else {
            // No live dialogue: stale replies after completion, cancellation
            // or expiry end up here and are answered with a hint
            drop(guard);
            return HandleOutcome::reply(chat_id, MSG_NO_DIALOG_HINT);
        };

        let answer = text.trim();
        if answer.is_empty() {
            // Blank input never advances the dialogue
            let prompt = match session.state {
                DialogState::AwaitingRole => PROMPT_ROLE,
                _ => PROMPT_LOCATION,
            };
            drop(guard);
            return HandleOutcome::reply(chat_id, format!("{MSG_BLANK_INPUT} {prompt}"));
        }

        // Answers are taken literally, a semicolon inside is not re-parsed
        match session.state {
            DialogState::AwaitingRole => {
                session.partial.role = answer.to_string();
                if session.partial.is_complete() {
                    return self.finish_dialog(session, guard, now).await;
                }
                session.state = DialogState::AwaitingLocation;
                self.sessions.update(session, now);
                drop(guard);
                HandleOutcome::reply(chat_id, PROMPT_LOCATION)
            }
            DialogState::AwaitingLocation => {
                session.partial.location = answer.to_string();
                self.finish_dialog(session, guard, now).await
            }
            // Ready/Completed/Expired sessions are never persisted, but a
            // stray one is treated like a missing dialogue
            _ => {
                self.sessions.clear(chat_id);
                drop(guard);
                HandleOutcome::reply(chat_id, MSG_NO_DIALOG_HINT)
            }
        }
    }

    /// Complete the dialogue: `Ready` -> report -> `Completed`, session cleared.
    ///
    /// The per-chat guard is released before the lookup runs.
    async fn finish_dialog(
        &self,
        mut session: DialogSession,
        guard: tokio::sync::OwnedMutexGuard<()>,
        now: DateTime<Utc>,
    ) -> HandleOutcome {
        let chat_id = session.chat_id;
        session.state = DialogState::Ready;
        let query = std::mem::take(&mut session.partial);
        session.state = DialogState::Completed;
        self.sessions.clear(chat_id);
        drop(guard);

        info!(chat_id, role = %query.role, location = %query.location, "dialogue completed");
        self.run_report(chat_id, query, now).await
    }

    /// Generate and persist a report for a completed query.
    ///
    /// Runs without any per-chat lock held. A lookup failure writes nothing;
    /// a storage failure discards the in-memory report. Either way the chat
    /// is left free to issue a new `/parse`.
    async fn run_report(&self, chat_id: i64, query: Query, now: DateTime<Utc>) -> HandleOutcome {
        let mut outcome = HandleOutcome::reply(chat_id, MSG_SEARCHING);

        let report = match self.generator.generate(query, chat_id, now).await {
            Ok(report) => report,
            Err(e) => {
                error!(chat_id, error = %e, "report generation failed");
                outcome.replies.push(OutboundMessage {
                    chat_id,
                    text: MSG_LOOKUP_FAILED.to_string(),
                });
                return outcome;
            }
        };

        let summary = if report.has_matches() {
            format!("{MSG_REPORT_READY} Вакансий в отчёте: {}.", report.records.len())
        } else {
            format!("{MSG_REPORT_READY} Совпадений не нашлось, отчёт с пометкой.")
        };

        match self.store.save(&report) {
            Ok(path) => {
                outcome.replies.push(OutboundMessage {
                    chat_id,
                    text: summary,
                });
                outcome.report_path = Some(path);
                outcome
            }
            Err(e) => {
                error!(chat_id, error = %e, "report persistence failed");
                outcome.replies.push(OutboundMessage {
                    chat_id,
                    text: MSG_STORAGE_FAILED.to_string(),
                });
                outcome
            }
        }
    }
}

fn status_text(session: &DialogSession) -> String {
    match session.state {
        DialogState::AwaitingRole => "Идёт диалог поиска: жду должность.".to_string(),
        DialogState::AwaitingLocation => format!(
            "Идёт диалог поиска по должности «{}»: жду город.",
            session.partial.role
        ),
        _ => MSG_STATUS_IDLE.to_string(),
    }
}
