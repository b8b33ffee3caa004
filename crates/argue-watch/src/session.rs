//! Session view: one engine, one driver task, one optional stream reader.
//!
//! All inputs (stream frames, snapshot fetches, report results, action
//! outcomes) funnel through a single mpsc channel into the driver, which
//! is the only owner of the [`Engine`]. After every input it publishes a
//! fresh [`ViewSnapshot`] on a watch channel. Discarding the view cancels
//! the driver, the stream reader and any in-flight report fetch; nothing is
//! applied after that.

use std::sync::Arc;

use reconciler::model::{InviteRole, InviteView, JoinResponse, PersonaSnapshot, SessionSnapshot};
use reconciler::{ApplyStats, Effect, Engine, EngineConfig, Input, SessionAction, ViewSnapshot};
use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiResult, ArgumentApi};
use crate::config::WatchConfig;
use crate::stream::run_stream;

/// Inbound channel depth.
const INPUT_BUFFER: usize = 256;

pub const PERSONA_SAVED: &str = "persona saved";
pub const READY_LOCKED: &str = "ready locked in";
pub const ARGUMENT_STARTING: &str = "argument is starting...";

/// Everything the driver accepts.
#[derive(Debug)]
pub enum SessionInput {
    /// Raw text frame from the live stream.
    Raw(String),
    Connected,
    TransportError(String),
    StreamClosed,
    /// Already-typed engine input.
    Engine(Input),
}

/// Per-view knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub engine: EngineConfig,
    /// Re-fetch a failed report once when upstream signals it is ready.
    pub refresh_report_on_ready: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            refresh_report_on_ready: true,
        }
    }
}

impl From<&WatchConfig> for SessionOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            engine: config.engine_config(),
            refresh_report_on_ready: config.refresh_report_on_ready,
        }
    }
}

// ── Driver ──────────────────────────────────────────────────────────

struct Driver {
    engine: Engine,
    api: Arc<dyn ArgumentApi>,
    argument_id: String,
    inputs: mpsc::Sender<SessionInput>,
    snapshots: watch::Sender<ViewSnapshot>,
    cancel: CancellationToken,
    refresh_report_on_ready: bool,
    auto_refreshed: bool,
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::Receiver<SessionInput>) -> ApplyStats {
        loop {
            let input = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(input) => input,
                    None => break,
                },
            };

            let mut effects = match input {
                SessionInput::Raw(text) => self.engine.ingest_raw(&text),
                SessionInput::Connected => self.engine.apply(Input::Connected),
                SessionInput::TransportError(reason) => {
                    self.engine.apply(Input::TransportError(reason))
                }
                SessionInput::StreamClosed => self.engine.apply(Input::StreamClosed),
                SessionInput::Engine(input) => self.engine.apply(input),
            };
            effects.extend(self.maybe_auto_refresh());

            for effect in effects {
                self.dispatch(effect);
            }
            self.snapshots.send_replace(self.engine.snapshot());
        }

        debug!(argument_id = %self.argument_id, "session driver stopped");
        self.engine.stats().clone()
    }

    /// One automatic retry per view, when upstream says the report is
    /// ready but the last fetch came back empty.
    fn maybe_auto_refresh(&mut self) -> Vec<Effect> {
        if !self.refresh_report_on_ready || self.auto_refreshed {
            return Vec::new();
        }
        let lifecycle = self.engine.state().lifecycle();
        if !lifecycle.report_ready_hint() || !lifecycle.report().is_unavailable() {
            return Vec::new();
        }
        self.auto_refreshed = true;
        info!(argument_id = %self.argument_id, "report ready; refetching");
        self.engine.apply(Input::RefreshReport)
    }

    fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::FetchReport => {
                let api = Arc::clone(&self.api);
                let argument_id = self.argument_id.clone();
                let inputs = self.inputs.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        result = api.report(&argument_id) => result,
                    };
                    let input = match result {
                        Ok(report) => Input::ReportLoaded(report),
                        Err(e) => {
                            debug!(%argument_id, error = %e, "report fetch failed");
                            Input::ReportFailed(e.to_string())
                        }
                    };
                    if !cancel.is_cancelled() {
                        let _ = inputs.send(SessionInput::Engine(input)).await;
                    }
                });
            }
        }
    }
}

// ── View ────────────────────────────────────────────────────────────

/// A live view of one argument session.
pub struct SessionView {
    argument_id: String,
    api: Arc<dyn ArgumentApi>,
    inputs: mpsc::Sender<SessionInput>,
    snapshots: watch::Receiver<ViewSnapshot>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<ApplyStats>>,
}

impl SessionView {
    /// Start the driver and apply the initial snapshot. A failed load is
    /// surfaced in the view rather than returned.
    pub async fn open(
        api: Arc<dyn ArgumentApi>,
        argument_id: impl Into<String>,
        options: SessionOptions,
    ) -> Self {
        let view = Self::spawn(api, argument_id, options);
        if let Err(e) = view.reload().await {
            warn!(argument_id = %view.argument_id, error = %e, "initial load failed");
        }
        view
    }

    /// Start the driver without loading anything. Callers attach the
    /// stream and [`reload`](Self::reload) in whichever order they like.
    pub fn spawn(
        api: Arc<dyn ArgumentApi>,
        argument_id: impl Into<String>,
        options: SessionOptions,
    ) -> Self {
        let argument_id = argument_id.into();
        let (tx, rx) = mpsc::channel(INPUT_BUFFER);
        let engine = Engine::new(options.engine);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let cancel = CancellationToken::new();

        let driver = Driver {
            engine,
            api: Arc::clone(&api),
            argument_id: argument_id.clone(),
            inputs: tx.clone(),
            snapshots: snapshot_tx,
            cancel: cancel.clone(),
            refresh_report_on_ready: options.refresh_report_on_ready,
            auto_refreshed: false,
        };
        let handle = tokio::spawn(driver.run(rx));

        Self {
            argument_id,
            api,
            inputs: tx,
            snapshots: snapshot_rx,
            cancel,
            driver: Some(handle),
        }
    }

    pub fn argument_id(&self) -> &str {
        &self.argument_id
    }

    /// Attach the live stream reader. It stops with the view.
    pub fn attach_stream(&self, url: Url) -> JoinHandle<()> {
        info!(argument_id = %self.argument_id, "attaching live stream");
        tokio::spawn(run_stream(url, self.inputs.clone(), self.cancel.clone()))
    }

    /// Subscribe to snapshots.
    pub fn snapshots(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.clone()
    }

    pub fn current(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Raw input handle, for feeding the driver directly.
    pub fn sender(&self) -> mpsc::Sender<SessionInput> {
        self.inputs.clone()
    }

    pub fn is_discarded(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn enqueue(&self, input: Input) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.inputs.send(SessionInput::Engine(input)).await.is_err() {
            debug!(argument_id = %self.argument_id, "driver gone; input dropped");
        }
    }

    /// Fetch the argument and its turn history and apply them as one
    /// snapshot.
    pub async fn reload(&self) -> ApiResult<()> {
        let (argument, bundle) = tokio::join!(
            self.api.get_argument(&self.argument_id),
            self.api.turns(&self.argument_id),
        );
        match argument.and_then(|argument| {
            bundle.map(|bundle| SessionSnapshot::new(argument, bundle.turns))
        }) {
            Ok(snapshot) => {
                self.enqueue(Input::Snapshot(snapshot)).await;
                Ok(())
            }
            Err(e) => {
                self.enqueue(Input::ActionFailed {
                    action: SessionAction::Load,
                    message: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Full reload, then a report retry if the last fetch came back empty.
    pub async fn refresh(&self) -> ApiResult<()> {
        self.reload().await?;
        self.enqueue(Input::RefreshReport).await;
        Ok(())
    }

    /// Report an action outcome into the view. On success the argument is
    /// re-fetched so participant state catches up.
    async fn settle<T>(
        &self,
        action: SessionAction,
        success_message: &str,
        result: ApiResult<T>,
    ) -> ApiResult<T> {
        match result {
            Ok(value) => {
                self.enqueue(Input::ActionSucceeded {
                    action,
                    message: success_message.to_string(),
                })
                .await;
                match self.api.get_argument(&self.argument_id).await {
                    Ok(argument) => {
                        self.enqueue(Input::Snapshot(SessionSnapshot::argument_only(argument)))
                            .await;
                    }
                    Err(e) => warn!(%action, error = %e, "post-action refresh failed"),
                }
                Ok(value)
            }
            Err(e) => {
                self.enqueue(Input::ActionFailed {
                    action,
                    message: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    pub async fn join(&self, token: &str) -> ApiResult<JoinResponse> {
        let result = self.api.join(&self.argument_id, token).await;
        self.settle(SessionAction::Join, "", result).await
    }

    pub async fn set_persona(&self, persona: &PersonaSnapshot) -> ApiResult<()> {
        let result = self.api.set_persona(&self.argument_id, persona).await;
        self.settle(SessionAction::SetPersona, PERSONA_SAVED, result)
            .await
            .map(drop)
    }

    pub async fn ready(&self) -> ApiResult<()> {
        let result = self.api.ready(&self.argument_id).await;
        self.settle(SessionAction::Ready, READY_LOCKED, result)
            .await
            .map(drop)
    }

    pub async fn start(&self) -> ApiResult<()> {
        let result = self.api.start(&self.argument_id).await;
        self.settle(SessionAction::Start, ARGUMENT_STARTING, result)
            .await
            .map(drop)
    }

    pub async fn invite(&self, role: InviteRole) -> ApiResult<InviteView> {
        let result = self.api.create_invite(&self.argument_id, role).await;
        self.settle(SessionAction::Invite, "", result).await
    }

    /// The reaction itself shows up through the live stream; the view
    /// still re-fetches the argument like every other action.
    pub async fn react(&self, emoji: &str, turn_index: Option<u64>) -> ApiResult<()> {
        let result = self.api.react(&self.argument_id, emoji, turn_index).await;
        self.settle(SessionAction::React, "", result)
            .await
            .map(drop)
    }

    /// Stop everything and return the driver's counters.
    pub async fn discard(mut self) -> ApplyStats {
        self.cancel.cancel();
        match self.driver.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => ApplyStats::default(),
        }
    }
}

impl Drop for SessionView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
