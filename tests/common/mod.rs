//! Shared test helpers: scripted provider and recording renderer.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use parley::error::ParleyError;
use parley::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use parley::render::Renderer;
use parley::types::*;

/// One canned reply.
pub enum Script {
    Text(String),
    Fragments(Vec<String>),
    FragmentsThenFault(Vec<String>, String),
    Fault(String),
}

/// A provider that replays queued scripts and counts calls.
pub struct ScriptedProvider {
    model_id: String,
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            scripts: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, script: Script) -> &Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue(Script::Text(text.to_string()))
    }

    pub fn queue_fragments(&self, parts: &[&str]) -> &Self {
        self.queue(Script::Fragments(parts.iter().map(|p| p.to_string()).collect()))
    }

    pub fn queue_fault_after(&self, parts: &[&str], message: &str) -> &Self {
        self.queue(Script::FragmentsThenFault(
            parts.iter().map(|p| p.to_string()).collect(),
            message.to_string(),
        ))
    }

    pub fn queue_fault(&self, message: &str) -> &Self {
        self.queue(Script::Fault(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, request: &ProviderRequest) -> Script {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(turn) = request.messages.last() {
            self.prompts.lock().unwrap().push(turn.text().to_string());
        }
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Text("Mock response".to_string()))
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ParleyError> {
        match self.next(request) {
            Script::Text(text) => Ok(ProviderResponse { text }),
            Script::Fragments(parts) => Ok(ProviderResponse {
                text: parts.concat(),
            }),
            Script::FragmentsThenFault(_, message) | Script::Fault(message) => {
                Err(ParleyError::Stream(message))
            }
        }
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<FragmentStream, ParleyError> {
        let (parts, fault) = match self.next(request) {
            Script::Text(text) => (vec![text], None),
            Script::Fragments(parts) => (parts, None),
            Script::FragmentsThenFault(parts, message) => (parts, Some(message)),
            Script::Fault(message) => return Err(ParleyError::api(500, message)),
        };

        let stream = async_stream::stream! {
            for part in parts {
                yield Ok(StreamFragment::new(part));
            }
            if let Some(message) = fault {
                yield Err(ParleyError::Stream(message));
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Everything a renderer was asked to show, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Render(Role, String),
    Warn(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<Shown>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts rendered for the assistant, in order.
    pub fn assistant_renders(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Shown::Render(Role::Assistant, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Shown::Warn(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Shown::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, role: Role, text: &str) {
        self.events.push(Shown::Render(role, text.to_string()));
    }

    fn warn(&mut self, message: &str) {
        self.events.push(Shown::Warn(message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.events.push(Shown::Error(message.to_string()));
    }
}
