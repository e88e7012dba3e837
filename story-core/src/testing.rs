//! Testing utilities for story generation.
//!
//! [`ScriptedBackend`] stands in for a language model so generation can be
//! tested deterministically without API calls. It records every prompt it is
//! sent.

use crate::backend::{BackendError, StoryBackend};
use crate::segment::StoryModelSegment;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Responder = Box<dyn FnMut(&str, usize) -> Result<StoryModelSegment, BackendError> + Send>;

enum Script {
    /// Responses handed out in order.
    Queue(VecDeque<Result<StoryModelSegment, BackendError>>),
    /// Called with the prompt and the zero-based call index.
    Responder(Responder),
}

/// A backend that returns scripted responses.
pub struct ScriptedBackend {
    script: Mutex<Script>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Play back `responses` in order. Once they run out every call fails
    /// with [`BackendError::Unavailable`].
    pub fn new(responses: Vec<Result<StoryModelSegment, BackendError>>) -> Self {
        Self::with_script(Script::Queue(responses.into()))
    }

    /// Answer each call with `responder(prompt, call_index)`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: FnMut(&str, usize) -> Result<StoryModelSegment, BackendError> + Send + 'static,
    {
        Self::with_script(Script::Responder(Box::new(responder)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Add a response to the end of the queue. Ignored for closure scripts.
    pub fn queue_response(&self, response: Result<StoryModelSegment, BackendError>) {
        if let Script::Queue(queue) = &mut *lock(&self.script) {
            queue.push_back(response);
        }
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl StoryBackend for ScriptedBackend {
    async fn request_segment(&self, prompt: &str) -> Result<StoryModelSegment, BackendError> {
        let call_index = {
            let mut prompts = lock(&self.prompts);
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        match &mut *lock(&self.script) {
            Script::Queue(queue) => queue.pop_front().unwrap_or_else(|| {
                Err(BackendError::Unavailable(
                    "no more scripted responses".to_string(),
                ))
            }),
            Script::Responder(responder) => responder(prompt, call_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_plays_in_order_then_fails() {
        let backend = ScriptedBackend::new(vec![
            Ok(StoryModelSegment::ending("One", "First.")),
            Err(BackendError::Parse("bad json".to_string())),
        ]);
        backend.queue_response(Ok(StoryModelSegment::ending("Three", "Third.")));

        assert_eq!(backend.request_segment("a").await.unwrap().title, "One");
        assert!(matches!(
            backend.request_segment("b").await,
            Err(BackendError::Parse(_))
        ));
        assert_eq!(backend.request_segment("c").await.unwrap().title, "Three");
        assert!(matches!(
            backend.request_segment("d").await,
            Err(BackendError::Unavailable(_))
        ));

        assert_eq!(backend.calls(), 4);
        assert_eq!(backend.prompts(), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_responder_sees_prompt_and_index() {
        let backend = ScriptedBackend::from_fn(|prompt, index| {
            Ok(StoryModelSegment::ending(format!("{prompt}-{index}"), "x"))
        });

        assert_eq!(backend.request_segment("p").await.unwrap().title, "p-0");
        assert_eq!(backend.request_segment("q").await.unwrap().title, "q-1");
    }
}
