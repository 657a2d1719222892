//! Test doubles shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use writers_room_types::character::{CharacterCatalog, CharacterProfile};
use writers_room_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use writers_room_types::scene::SceneDefinition;

use crate::llm::LlmProvider;
use crate::storage::TranscriptStore;

/// What a `ScriptedProvider` does once its script runs out.
#[derive(Clone, Copy)]
enum WhenExhausted {
    /// Never resolve; the caller's turn stays in flight.
    Hang,
    /// Start again from the first line.
    Cycle,
    Fail,
}

struct ScriptState {
    script: Vec<Result<String, String>>,
    queue: Mutex<VecDeque<Result<String, String>>>,
    when_exhausted: WhenExhausted,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

/// Provider that replays canned responses in call order.
#[derive(Clone)]
pub struct ScriptedProvider {
    state: Arc<ScriptState>,
}

impl ScriptedProvider {
    fn build<I, S>(lines: I, when_exhausted: WhenExhausted) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script: Vec<Result<String, String>> = lines.into_iter().map(|l| Ok(l.into())).collect();
        Self::from_script(script, when_exhausted)
    }

    fn from_script(script: Vec<Result<String, String>>, when_exhausted: WhenExhausted) -> Self {
        Self {
            state: Arc::new(ScriptState {
                queue: Mutex::new(script.iter().cloned().collect()),
                script,
                when_exhausted,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Replay `lines`, then hang forever.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(lines, WhenExhausted::Hang)
    }

    /// Replay `lines` in a loop.
    pub fn cycling<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(lines, WhenExhausted::Cycle)
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self::from_script(Vec::new(), WhenExhausted::Fail)
    }

    /// Fail `failures` times, then replay `lines` and hang.
    pub fn flaky<I, S>(failures: usize, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut script: Vec<Result<String, String>> =
            (0..failures).map(|i| Err(format!("transient failure {i}"))).collect();
        script.extend(lines.into_iter().map(|l| Ok(l.into())));
        Self::from_script(script, WhenExhausted::Hang)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Option<Result<String, String>> {
        let mut queue = self.state.queue.lock().unwrap();
        if queue.is_empty() {
            match self.state.when_exhausted {
                WhenExhausted::Hang => return None,
                WhenExhausted::Fail => return Some(Err("scripted failure".to_string())),
                WhenExhausted::Cycle => queue.extend(self.state.script.iter().cloned()),
            }
        }
        queue.pop_front()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().unwrap().push(request.clone());

        match self.next_response() {
            Some(Ok(content)) => Ok(CompletionResponse {
                id: format!("scripted-{}", self.calls()),
                content,
                model: "scripted".to_string(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            Some(Err(message)) => Err(LlmError::Provider { message }),
            None => std::future::pending().await,
        }
    }
}

/// Transcript store that keeps files in memory.
#[derive(Clone, Default)]
pub struct MemoryTranscriptStore {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    async fn write_transcript(&self, path: &Path, content: &str) -> Result<(), std::io::Error> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Store whose writes always fail.
#[derive(Clone, Default)]
pub struct BrokenTranscriptStore;

impl TranscriptStore for BrokenTranscriptStore {
    async fn write_transcript(&self, _path: &Path, _content: &str) -> Result<(), std::io::Error> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        ))
    }
}

pub fn scene(id: &str, characters: &[&str]) -> SceneDefinition {
    SceneDefinition {
        scene_id: id.to_string(),
        scene_name: format!("Scene {id}"),
        location: "The diner".to_string(),
        week: Some(1),
        objectives: BTreeMap::new(),
        characters: characters.iter().map(|c| c.to_string()).collect(),
        context: "Late evening, the kitchen is closing.".to_string(),
    }
}

pub fn catalog(names: &[&str]) -> CharacterCatalog {
    names.iter().map(|n| CharacterProfile::named(*n)).collect()
}
