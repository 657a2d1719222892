//! Production runner.
//!
//! Runs one `SceneDirector` per scene, strictly in order. Each scene is
//! started, awaited, saved and recorded before the next begins. A scene that
//! fails is recorded and the run moves on; only an empty run is an error.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use writers_room_types::character::CharacterCatalog;
use writers_room_types::error::SceneError;
use writers_room_types::production::{ProductionResult, SceneOutcome, SceneState, SceneStatus};
use writers_room_types::scene::SceneDefinition;

use crate::channel::BoxBroker;
use crate::director::{SceneDirector, SceneSettings};
use crate::event::EventBus;
use crate::llm::box_provider::BoxLlmProvider;
use crate::storage::TranscriptStore;

/// One entry of a production run.
#[derive(Debug, Clone)]
pub enum ScenePlan {
    Ready(SceneDefinition),
    /// A scene source that could not be loaded; recorded as failed.
    Invalid { source: String, error: String },
}

impl From<SceneDefinition> for ScenePlan {
    fn from(scene: SceneDefinition) -> Self {
        ScenePlan::Ready(scene)
    }
}

#[derive(Debug, Error)]
pub enum ProductionError {
    #[error("no scenes to run")]
    NoScenes,
}

pub struct ProductionRunner<S> {
    catalog: Arc<CharacterCatalog>,
    broker: Arc<BoxBroker>,
    provider: Arc<BoxLlmProvider>,
    store: Arc<S>,
    settings: SceneSettings,
    events: EventBus,
    current: Mutex<Option<Arc<SceneDirector<S>>>>,
    interrupted: CancellationToken,
}

impl<S: TranscriptStore> ProductionRunner<S> {
    pub fn new(
        catalog: CharacterCatalog,
        broker: BoxBroker,
        provider: BoxLlmProvider,
        store: S,
        settings: SceneSettings,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            broker: Arc::new(broker),
            provider: Arc::new(provider),
            store: Arc::new(store),
            settings,
            events: EventBus::default(),
            current: Mutex::new(None),
            interrupted: CancellationToken::new(),
        }
    }

    /// Lifecycle events of every scene in the run.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_cancelled()
    }

    /// Cut the current scene and skip the rest. The cut scene is still
    /// saved and recorded.
    pub async fn interrupt(&self) {
        if self.interrupted.is_cancelled() {
            return;
        }
        self.interrupted.cancel();
        info!("Production interrupted");
        let current = self.set_current(None);
        if let Some(director) = current {
            director.cut().await;
        }
    }

    /// Run every plan in order and return one result per scene attempted.
    pub async fn run(&self, plans: Vec<ScenePlan>) -> Result<Vec<ProductionResult>, ProductionError> {
        if plans.is_empty() {
            return Err(ProductionError::NoScenes);
        }

        let total = plans.len();
        let mut results = Vec::with_capacity(total);
        for (index, plan) in plans.into_iter().enumerate() {
            if self.interrupted.is_cancelled() {
                info!(skipped = total - index, "Skipping remaining scenes");
                break;
            }

            let result = match plan {
                ScenePlan::Invalid { source, error } => {
                    warn!(%source, %error, "Scene could not be loaded");
                    Some(ProductionResult::failed(source, error))
                }
                ScenePlan::Ready(scene) => self.run_scene(scene).await,
            };

            if let Some(result) = result {
                info!(
                    scene = %result.scene,
                    status = %result.status,
                    lines = result.statistics.total_lines,
                    "Scene finished"
                );
                results.push(result);
            }
        }

        Ok(results)
    }

    async fn run_scene(&self, scene: SceneDefinition) -> Option<ProductionResult> {
        let scene_id = scene.scene_id.clone();
        let director = Arc::new(SceneDirector::new(
            scene,
            Arc::clone(&self.catalog),
            Arc::clone(&self.broker),
            Arc::clone(&self.provider),
            Arc::clone(&self.store),
            self.events.clone(),
            self.settings.clone(),
        ));

        self.set_current(Some(Arc::clone(&director)));
        // An interrupt that landed before registration would miss this scene.
        if self.interrupted.is_cancelled() {
            self.set_current(None);
            return None;
        }

        let outcome = match director.start().await {
            Ok(()) => director.wait().await,
            // Interrupted while the cast was still subscribing.
            Err(SceneError::NotIdle { .. })
                if director.state() == SceneState::Stopped(SceneOutcome::Cut) =>
            {
                info!(scene = %scene_id, "Scene cut before it started");
                SceneOutcome::Cut
            }
            Err(e) => {
                self.set_current(None);
                warn!(scene = %scene_id, error = %e, "Scene failed to start");
                return Some(ProductionResult::failed(scene_id, e.to_string()));
            }
        };
        self.set_current(None);

        let statistics = director.statistics();
        let (status, error) = match outcome {
            SceneOutcome::Error(message) => (SceneStatus::Failed, Some(message)),
            other => (SceneStatus::from(&other), None),
        };

        let result = match director.save_transcript(None).await {
            Ok(path) => ProductionResult {
                scene: scene_id,
                transcript_path: Some(path),
                statistics,
                status,
                error,
            },
            Err(e) => {
                warn!(scene = %scene_id, error = %e, "Transcript could not be saved");
                ProductionResult {
                    scene: scene_id,
                    transcript_path: None,
                    statistics,
                    status: SceneStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        };
        Some(result)
    }

    fn set_current(
        &self,
        director: Option<Arc<SceneDirector<S>>>,
    ) -> Option<Arc<SceneDirector<S>>> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, director)
    }
}
