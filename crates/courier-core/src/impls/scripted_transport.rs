//! ScriptedTransport - 結果を台本どおりに返す開発用 Transport
//!
//! # 使用例
//! ```ignore
//! // 2 回失敗してから成功する
//! let transport = ScriptedTransport::with_script([Step::Fail, Step::Fail], Step::Succeed);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::ports::{Transport, TransportError};

/// Result of one scripted `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail,
    /// Panic inside the transport future.
    Panic,
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    attempts: Mutex<Vec<Value>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    /// Play `script` in order, then answer `fallback` forever.
    pub fn with_script(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn succeeding() -> Self {
        Self::with_script([], Step::Succeed)
    }

    pub fn failing() -> Self {
        Self::with_script([], Step::Fail)
    }

    /// Every `send` waits for one permit from `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Payloads of every attempted send, in call order.
    pub fn attempts(&self) -> Vec<Value> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: &Value, _headers: &Value) -> Result<(), TransportError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());

        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }

        match self.next_step() {
            Step::Succeed => Ok(()),
            Step::Fail => Err(TransportError::Rejected("scripted failure".to_string())),
            Step::Panic => panic!("scripted transport panic"),
        }
    }
}
