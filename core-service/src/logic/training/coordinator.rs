//! Training Coordinator
//!
//! An actor task owns the `TrainingState` watch channel and is the only
//! writer of it. Train requests arrive over mpsc; the fit runs on a blocking
//! worker and its result comes back to the actor, which swaps the model,
//! resets the state and broadcasts `finished`.
//!
//! ```text
//!  idle ──train──► training ──fit ok / fit failed / cancelled──► idle
//!                     │
//!                     └── train ──► AlreadyRunning
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::logic::broadcast::{BroadcastHub, ServerMessage};
use crate::logic::dataset::TrainingDataRecorder;
use crate::logic::model::{InferenceEngine, TrainedModel};
use super::cancel::CancelToken;
use super::fit::ModelFitter;
use super::TrainingError;

const COMMAND_QUEUE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    #[default]
    Idle,
    Training,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRequest {
    pub device_id: String,
    #[serde(default)]
    pub optimize: bool,
}

pub enum TrainingCommand {
    Train {
        request: TrainingRequest,
        reply: oneshot::Sender<Result<(), TrainingError>>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
}

/// Everything a run touches besides the dataset snapshot
pub struct TrainingCoordinator {
    engine: Arc<InferenceEngine>,
    recorder: Arc<TrainingDataRecorder>,
    hub: Arc<BroadcastHub>,
    fitter: Arc<dyn ModelFitter>,
    model_path: PathBuf,
}

struct RunningJob {
    request: TrainingRequest,
    cancel: CancelToken,
    handle: JoinHandle<Result<TrainedModel, TrainingError>>,
}

impl TrainingCoordinator {
    pub fn new(
        engine: Arc<InferenceEngine>,
        recorder: Arc<TrainingDataRecorder>,
        hub: Arc<BroadcastHub>,
        fitter: Arc<dyn ModelFitter>,
        model_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            recorder,
            hub,
            fitter,
            model_path: model_path.into(),
        }
    }

    /// Start the actor on the current runtime
    pub fn spawn(self) -> TrainingHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(TrainingState::Idle);

        tokio::spawn(self.run(commands_rx, state_tx));

        TrainingHandle {
            commands: commands_tx,
            state: state_rx,
        }
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<TrainingCommand>,
        state: watch::Sender<TrainingState>,
    ) {
        log::info!("Training coordinator started");
        let mut job: Option<RunningJob> = None;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(TrainingCommand::Train { request, reply }) => {
                        let result = if job.is_some() {
                            log::warn!("Training request for {} rejected: already running", request.device_id);
                            Err(TrainingError::AlreadyRunning)
                        } else {
                            job = Some(self.start(request, &state));
                            Ok(())
                        };
                        let _ = reply.send(result);
                    }
                    Some(TrainingCommand::Cancel { reply }) => {
                        let cancelled = match &job {
                            Some(running) => {
                                log::info!("Cancelling training for {}", running.request.device_id);
                                running.cancel.cancel();
                                true
                            }
                            None => false,
                        };
                        let _ = reply.send(cancelled);
                    }
                    None => break,
                },
                result = join_job(&mut job) => {
                    if let Some(finished) = job.take() {
                        self.finish(finished.request, result, &state);
                    }
                }
            }
        }

        if let Some(running) = job {
            running.cancel.cancel();
        }
        log::info!("Training coordinator stopped");
    }

    fn start(&self, request: TrainingRequest, state: &watch::Sender<TrainingState>) -> RunningJob {
        state.send_replace(TrainingState::Training);
        self.hub.publish(ServerMessage::training_started(&request.device_id));
        log::info!(
            "Training started for {} (optimize: {})",
            request.device_id,
            request.optimize
        );

        // Snapshot taken here so later appends never reach the worker
        let snapshot = self.recorder.snapshot();
        let recorder = Arc::clone(&self.recorder);
        let fitter = Arc::clone(&self.fitter);
        let model_path = self.model_path.clone();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let worker_request = request.clone();

        let handle = tokio::task::spawn_blocking(move || -> Result<TrainedModel, TrainingError> {
            let dataset = match snapshot {
                Some(dataset) => dataset,
                None => recorder.load_persisted()?,
            };
            let model = fitter.fit(&dataset, &worker_request, &worker_cancel)?;
            if worker_cancel.is_cancelled() {
                return Err(TrainingError::Cancelled);
            }
            model.save(&model_path)?;
            Ok(model)
        });

        RunningJob {
            request,
            cancel,
            handle,
        }
    }

    fn finish(
        &self,
        request: TrainingRequest,
        result: Result<Result<TrainedModel, TrainingError>, JoinError>,
        state: &watch::Sender<TrainingState>,
    ) {
        let result = result.unwrap_or_else(|e| Err(TrainingError::Worker(e.to_string())));

        match result {
            Ok(model) => {
                let stats = model.stats;
                self.engine.swap(model);
                state.send_replace(TrainingState::Idle);
                self.hub
                    .publish(ServerMessage::training_finished(&request.device_id, stats));
                log::info!("Training finished for {}", request.device_id);
            }
            Err(e) => {
                state.send_replace(TrainingState::Idle);
                self.hub
                    .publish(ServerMessage::training_failed(&request.device_id, &e));
                log::warn!("Training failed for {}: {}", request.device_id, e);
            }
        }
    }
}

/// Resolves when the running job completes; pending forever when idle
async fn join_job(
    job: &mut Option<RunningJob>,
) -> Result<Result<TrainedModel, TrainingError>, JoinError> {
    match job {
        Some(running) => (&mut running.handle).await,
        None => std::future::pending().await,
    }
}

/// Cloneable front for the coordinator actor
#[derive(Clone)]
pub struct TrainingHandle {
    commands: mpsc::Sender<TrainingCommand>,
    state: watch::Receiver<TrainingState>,
}

impl TrainingHandle {
    /// Submit a run. Returns once accepted; completion is broadcast.
    pub async fn train(&self, request: TrainingRequest) -> Result<(), TrainingError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(TrainingCommand::Train { request, reply })
            .await
            .map_err(|_| TrainingError::CoordinatorStopped)?;
        rx.await.map_err(|_| TrainingError::CoordinatorStopped)?
    }

    /// Request cooperative cancellation; `false` when nothing is running
    pub async fn cancel(&self) -> Result<bool, TrainingError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(TrainingCommand::Cancel { reply })
            .await
            .map_err(|_| TrainingError::CoordinatorStopped)?;
        rx.await.map_err(|_| TrainingError::CoordinatorStopped)
    }

    pub fn state(&self) -> TrainingState {
        *self.state.borrow()
    }

    pub fn is_training(&self) -> bool {
        self.state() == TrainingState::Training
    }

    pub fn subscribe_state(&self) -> watch::Receiver<TrainingState> {
        self.state.clone()
    }
}
