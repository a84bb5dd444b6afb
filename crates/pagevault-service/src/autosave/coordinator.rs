//! Autosave coordinator: decides when an open document is saved.
//!
//! Each session runs as its own task owning the [`Document`]. Edits arrive
//! over a channel; a save fires when the edit counter reaches the configured
//! threshold or when the interval timer (armed by the first unsaved edit)
//! expires, whichever comes first. At most one save is in flight per
//! session and triggers that land while saving collapse into a single
//! follow-up save.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use pagevault_core::config::AutosaveConfig;
use pagevault_core::error::AppError;
use pagevault_core::result::AppResult;
use pagevault_core::traits::snapshot::SnapshotSink;
use pagevault_core::types::{Document, OrderingKey, ProjectId};

use super::status::{AutosaveState, AutosaveStatus};

/// Capacity of the command channel between handles and a session.
const COMMAND_BUFFER: usize = 256;

type EditFn = Box<dyn FnOnce(&mut Document) + Send + 'static>;

enum Command {
    Edit(EditFn),
    Replace(Document),
    SaveNow,
    Document(oneshot::Sender<Document>),
    Close(oneshot::Sender<AutosaveStatus>),
}

/// Opens autosave sessions against one project.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    sink: Arc<dyn SnapshotSink>,
    project_id: ProjectId,
    config: AutosaveConfig,
}

impl std::fmt::Debug for AutosaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveCoordinator")
            .field("project_id", &self.project_id)
            .field("config", &self.config)
            .finish()
    }
}

impl AutosaveCoordinator {
    /// Create a coordinator saving through `sink`.
    pub fn new(sink: Arc<dyn SnapshotSink>, project_id: ProjectId, config: AutosaveConfig) -> Self {
        Self {
            sink,
            project_id,
            config,
        }
    }

    /// Start a session editing `document` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&self, document: Document) -> AutosaveHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(AutosaveStatus::default());
        // One save in flight at a time, so one slot is enough.
        let (done_tx, done_rx) = mpsc::channel(1);

        let session = Session {
            sink: Arc::clone(&self.sink),
            project_id: self.project_id.clone(),
            edit_threshold: self.config.edit_threshold.max(1),
            interval: self.config.interval(),
            document,
            deadline: None,
            in_flight: false,
            saving_edits: 0,
            status: AutosaveStatus::default(),
            status_tx,
            done_tx,
            closing: false,
            close_replies: Vec::new(),
        };

        debug!(
            project_id = %self.project_id,
            edit_threshold = session.edit_threshold,
            interval_seconds = self.config.interval_seconds,
            "Autosave session opened"
        );
        tokio::spawn(session.run(command_rx, done_rx));

        AutosaveHandle {
            commands: command_tx,
            status: status_rx,
        }
    }
}

/// Editor-facing handle of one autosave session.
///
/// Clones share the session. The session ends after [`AutosaveHandle::close`]
/// or once every handle is dropped; either way pending edits get one final
/// save attempt.
#[derive(Debug, Clone)]
pub struct AutosaveHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<AutosaveStatus>,
}

impl AutosaveHandle {
    /// Apply a local edit to the session document.
    pub async fn edit<F>(&self, edit: F) -> AppResult<()>
    where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        self.send(Command::Edit(Box::new(edit))).await
    }

    /// Replace the whole document; counts as one edit.
    pub async fn replace(&self, document: Document) -> AppResult<()> {
        self.send(Command::Replace(document)).await
    }

    /// Save now, even without unsaved edits.
    pub async fn save_now(&self) -> AppResult<()> {
        self.send(Command::SaveNow).await
    }

    /// Current session document.
    pub async fn document(&self) -> AppResult<Document> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Document(reply)).await?;
        rx.await.map_err(|_| closed())
    }

    /// Latest published status.
    pub fn status(&self) -> AutosaveStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.status.clone()
    }

    /// End the session: wait for the in-flight save, flush unsaved edits
    /// once, and return the final status.
    pub async fn close(self) -> AppResult<AutosaveStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Close(reply)).await?;
        rx.await.map_err(|_| closed())
    }

    async fn send(&self, command: Command) -> AppResult<()> {
        self.commands.send(command).await.map_err(|_| closed())
    }
}

fn closed() -> AppError {
    AppError::service_unavailable("Autosave session is closed")
}

struct Session {
    sink: Arc<dyn SnapshotSink>,
    project_id: ProjectId,
    edit_threshold: u32,
    interval: Duration,
    document: Document,
    /// When the interval timer fires; `None` while disarmed.
    deadline: Option<Instant>,
    in_flight: bool,
    /// Edits covered by the in-flight save, restored if it fails.
    saving_edits: u32,
    status: AutosaveStatus,
    status_tx: watch::Sender<AutosaveStatus>,
    done_tx: mpsc::Sender<AppResult<OrderingKey>>,
    /// Set once a close was requested or every handle is gone.
    closing: bool,
    close_replies: Vec<oneshot::Sender<AutosaveStatus>>,
}

impl Session {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut done: mpsc::Receiver<AppResult<OrderingKey>>,
    ) {
        let mut commands_open = true;
        let mut final_save_started = false;

        loop {
            if self.closing && !self.in_flight {
                if self.has_unsaved() && !final_save_started {
                    final_save_started = true;
                    self.status.queued = false;
                    self.start_save("close");
                } else {
                    break;
                }
            }

            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(at) => time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle(command),
                    None => {
                        commands_open = false;
                        self.closing = true;
                    }
                },
                Some(result) = done.recv() => self.finish_save(result),
                _ = timer => {
                    debug!(project_id = %self.project_id, "Autosave interval elapsed");
                    self.trigger("interval");
                }
            }
        }

        if self.has_unsaved() {
            warn!(
                project_id = %self.project_id,
                pending_edits = self.status.pending_edits,
                "Autosave session closed with unsaved edits"
            );
        }
        debug!(project_id = %self.project_id, "Autosave session closed");
        // Later sends from surviving handles must fail.
        drop(commands);
        drop(done);
        for reply in std::mem::take(&mut self.close_replies) {
            let _ = reply.send(self.status.clone());
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Edit(edit) => {
                edit(&mut self.document);
                self.record_edit();
            }
            Command::Replace(document) => {
                self.document = document;
                self.record_edit();
            }
            Command::SaveNow => self.trigger("manual"),
            Command::Document(reply) => {
                let _ = reply.send(self.document.clone());
            }
            Command::Close(reply) => {
                self.closing = true;
                self.close_replies.push(reply);
            }
        }
    }

    fn record_edit(&mut self) {
        self.status.pending_edits = self.status.pending_edits.saturating_add(1);
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.interval);
        }

        if self.status.pending_edits >= self.edit_threshold {
            self.trigger("edit_threshold");
        } else {
            self.publish();
        }
    }

    /// Threshold reached, timer fired, or manual save requested.
    fn trigger(&mut self, reason: &'static str) {
        self.deadline = None;
        if self.in_flight {
            debug!(project_id = %self.project_id, reason, "Save in flight, queueing follow-up");
            self.status.queued = true;
            self.publish();
        } else {
            self.status.state = AutosaveState::PendingSave;
            self.publish();
            self.start_save(reason);
        }
    }

    fn start_save(&mut self, reason: &'static str) {
        self.deadline = None;
        self.in_flight = true;
        self.saving_edits = self.status.pending_edits;
        self.status.pending_edits = 0;
        self.status.state = AutosaveState::Saving;
        self.status.saves_started += 1;
        self.publish();

        debug!(
            project_id = %self.project_id,
            reason,
            edits = self.saving_edits,
            "Autosave started"
        );

        let sink = Arc::clone(&self.sink);
        let project_id = self.project_id.clone();
        let document = self.document.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = sink.save(&project_id, document).await;
            let _ = done.send(result).await;
        });
    }

    fn finish_save(&mut self, result: AppResult<OrderingKey>) {
        self.in_flight = false;
        self.status.state = AutosaveState::Idle;

        match result {
            Ok(key) => {
                info!(
                    project_id = %self.project_id,
                    ordering_key = %key,
                    edits = self.saving_edits,
                    "Autosave succeeded"
                );
                self.saving_edits = 0;
                self.status.last_key = Some(key);
                self.status.last_error = None;
                self.status.saves_succeeded += 1;
            }
            Err(e) => {
                warn!(
                    project_id = %self.project_id,
                    error = %e,
                    edits = self.saving_edits,
                    "Autosave failed, will retry on next trigger"
                );
                self.status.pending_edits = self
                    .status
                    .pending_edits
                    .saturating_add(std::mem::take(&mut self.saving_edits));
                self.status.last_error = Some(e.detail());
                self.status.saves_failed += 1;
                if self.status.pending_edits > 0 && self.deadline.is_none() {
                    self.deadline = Some(Instant::now() + self.interval);
                }
            }
        }

        // While closing, the loop issues the single final save instead.
        if self.status.queued && !self.closing {
            self.status.queued = false;
            self.trigger("queued");
        } else {
            self.publish();
        }
    }

    fn has_unsaved(&self) -> bool {
        self.status.pending_edits > 0 || self.status.queued
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}
