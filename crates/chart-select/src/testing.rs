//! Scripted classifier for tests.
//!
//! Replies are configured per task. A sequence is consumed front to back and
//! its last entry repeats, so a single reply answers every call.
//!
//! ```
//! use chart_select::ClassifierTask;
//! use chart_select::testing::ScriptedClassifier;
//!
//! let fake = ScriptedClassifier::new()
//!     .with_reply(ClassifierTask::Pattern, r#"{"pattern_id": "P01"}"#);
//! assert_eq!(fake.calls(ClassifierTask::Pattern), 0);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::classifier::{ClassificationRequest, Classifier, ClassifierError, ClassifierTask};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Fail(ClassifierError),
    /// Replies after a delay measured on the Tokio clock.
    Delayed(Duration, String),
    /// Never answers; the caller's timeout decides.
    Hang,
}

/// Fake [`Classifier`] with canned replies, forced failures and call counts.
///
/// Tasks without a script fail with [`ClassifierError::Unavailable`].
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    scripts: Mutex<BTreeMap<ClassifierTask, VecDeque<Script>>>,
    calls: Mutex<BTreeMap<ClassifierTask, usize>>,
    prompts: Mutex<Vec<ClassificationRequest>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sequence(self, task: ClassifierTask, scripts: Vec<Script>) -> Self {
        if let Ok(mut map) = self.scripts.lock() {
            map.insert(task, scripts.into());
        }
        self
    }

    #[must_use]
    pub fn with_reply(self, task: ClassifierTask, reply: impl Into<String>) -> Self {
        self.with_sequence(task, vec![Script::Reply(reply.into())])
    }

    #[must_use]
    pub fn with_failure(self, task: ClassifierTask, error: ClassifierError) -> Self {
        self.with_sequence(task, vec![Script::Fail(error)])
    }

    #[must_use]
    pub fn with_hang(self, task: ClassifierTask) -> Self {
        self.with_sequence(task, vec![Script::Hang])
    }

    /// Number of calls made for `task`.
    pub fn calls(&self, task: ClassifierTask) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&task).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Calls made for every task.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// Requests received, in call order.
    pub fn requests(&self) -> Vec<ClassificationRequest> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn next_script(&self, task: ClassifierTask) -> Option<Script> {
        let mut scripts = self.scripts.lock().ok()?;
        let queue = scripts.get_mut(&task)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(request.task).or_default() += 1;
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.clone());
        }
        match self.next_script(request.task) {
            Some(Script::Reply(text)) => Ok(text),
            Some(Script::Fail(error)) => Err(error),
            Some(Script::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Script::Hang) => std::future::pending().await,
            None => Err(ClassifierError::Unavailable),
        }
    }
}
