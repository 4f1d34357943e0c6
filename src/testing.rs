//! Scripted [`LanguageModel`] for unit tests.

use crate::error::ModelError;
use crate::pipeline::llm::LanguageModel;
use async_trait::async_trait;
use edgequake_llm::ImageData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a scripted call answers.
pub enum Reply {
    Fixed(String),
    /// `"{prefix}{n}"` where `n` counts calls of that kind from 1.
    Counter(String),
    Fail(String),
    /// Never answers.
    Hang,
}

impl Reply {
    pub fn fixed(s: &str) -> Self {
        Reply::Fixed(s.to_string())
    }

    pub fn counter(prefix: &str) -> Self {
        Reply::Counter(prefix.to_string())
    }

    fn answer(&self, n: usize) -> Result<String, ModelError> {
        match self {
            Reply::Fixed(s) => Ok(s.clone()),
            Reply::Counter(prefix) => Ok(format!("{prefix}{n}")),
            Reply::Fail(msg) => Err(ModelError::Api(msg.clone())),
            Reply::Hang => unreachable!("hanging replies are awaited, not answered"),
        }
    }
}

pub struct ScriptedModel {
    image_reply: Reply,
    generate_reply: Reply,
    image_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(image_reply: Reply, generate_reply: Reply) -> Self {
        Self {
            image_reply,
            generate_reply,
            image_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// OCR answers "scanned text", generation answers "generated #n".
    pub fn echo() -> Self {
        Self::new(Reply::fixed("scanned text"), Reply::counter("generated #"))
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn read_image(&self, _instruction: &str, _image: ImageData) -> Result<String, ModelError> {
        let n = self.image_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.image_reply, Reply::Hang) {
            std::future::pending::<()>().await;
        }
        self.image_reply.answer(n)
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let n = self.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if matches!(self.generate_reply, Reply::Hang) {
            std::future::pending::<()>().await;
        }
        self.generate_reply.answer(n)
    }
}
