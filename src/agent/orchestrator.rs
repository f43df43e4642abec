//! Run pipeline: orchestration calls, cascading fan-outs, closing summary.
//!
//! A run streams `AgentResult`s through a bounded channel while work is
//! still in flight. Stages:
//!
//! 1. Presidents orchestration (safety verdict + keywords). Unsafe ends the
//!    run with a single blocked result.
//! 2. Leaders and scriptures orchestration start in parallel; the presidents
//!    fan-out starts immediately.
//! 3. The first presidents task to finish opens the cascade gate, so leaders
//!    begin while slower presidents tasks are still formatting.
//! 4. Scriptures fan out after every leaders task has reported.
//! 5. A summary result closes the stream.
//!
//! Key properties:
//! - The gate opens exactly once no matter how many tasks race it.
//! - Task outputs feed a shared accumulator so the summary sees sanitized,
//!   deduplicated sources without waiting on the consumer.
//! - A dropped receiver stops the run at the next stage boundary; nothing
//!   keeps generating for a page nobody is watching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::stream::{
    extract_first_object, merge_unique_quotes, merge_unique_scriptures, sanitize_quote,
    sanitize_scripture, sort_presidents_quotes,
};

use super::gemini::{
    default_safety_settings, Content, GenerateClient, GenerateRequest, GenerationConfig, Part,
    ThinkingConfig,
};
use super::prompts::{
    ORCHESTRATOR_LEADERS_PROMPT, ORCHESTRATOR_LEADERS_SCHEMA, ORCHESTRATOR_PRESIDENTS_PROMPT,
    ORCHESTRATOR_PRESIDENTS_SCHEMA, ORCHESTRATOR_SCRIPTURES_PROMPT,
    ORCHESTRATOR_SCRIPTURES_SCHEMA, SUMMARY_PROMPT, SUMMARY_SCHEMA,
};
use super::tasks::{leaders_tasks, presidents_tasks, scriptures_tasks, SearchTask};
use super::toolbox::ToolSource;
use super::types::{
    AgentResult, LeadersOrchestration, PresidentsOrchestration, ScripturesOrchestration,
    StructuredQuote, StructuredScripture, LEADERS_AGENT, ORCHESTRATOR_AGENT, PRESIDENTS_AGENT,
    SCRIPTURES_BIBLE, SCRIPTURES_BOM, SCRIPTURES_OTHER, SUMMARY_AGENT,
};
use super::AgentError;

/// Capacity of a run's result stream.
const RESULT_STREAM_CAPACITY: usize = 32;

// ═══════════════════════════════════════════════════════════
// Cascade gate
// ═══════════════════════════════════════════════════════════

/// One-shot gate between the presidents and leaders stages.
pub struct CascadeGate {
    opened: AtomicBool,
    notify: Notify,
}

impl CascadeGate {
    pub fn new() -> Self {
        Self {
            opened: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Opens the gate. Returns true only for the call that actually opened
    /// it; later calls are no-ops.
    pub fn open(&self) -> bool {
        let first = self
            .opened
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Waits until the gate is open. Returns immediately if it already is.
    pub async fn opened(&self) {
        if self.is_open() {
            return;
        }
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        // Re-check after registration so an open between the first check and
        // enable cannot strand us.
        if self.is_open() {
            return;
        }
        notified.await;
    }
}

impl Default for CascadeGate {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Agent
// ═══════════════════════════════════════════════════════════

/// Entry point for answering one question.
pub struct Agent {
    client: Arc<dyn GenerateClient>,
    tools: Arc<dyn ToolSource>,
}

impl Agent {
    pub fn new(client: Arc<dyn GenerateClient>, tools: Arc<dyn ToolSource>) -> Self {
        Self { client, tools }
    }

    /// Starts a run. Results arrive on the returned receiver as agents
    /// finish; the channel closes when the run is over.
    pub fn run(&self, question: &str) -> mpsc::Receiver<AgentResult> {
        let (tx, rx) = mpsc::channel(RESULT_STREAM_CAPACITY);
        let driver = RunDriver {
            client: Arc::clone(&self.client),
            tools: Arc::clone(&self.tools),
            question: question.to_string(),
            tx,
            sources: Arc::new(Mutex::new(SummarySources::default())),
        };
        tokio::spawn(driver.drive());
        rx
    }
}

/// Sanitized task outputs collected for the summary call.
#[derive(Default)]
struct SummarySources {
    presidents: Vec<StructuredQuote>,
    leaders: Vec<StructuredQuote>,
    scriptures: Vec<StructuredScripture>,
}

#[derive(Clone)]
struct RunDriver {
    client: Arc<dyn GenerateClient>,
    tools: Arc<dyn ToolSource>,
    question: String,
    tx: mpsc::Sender<AgentResult>,
    sources: Arc<Mutex<SummarySources>>,
}

impl RunDriver {
    async fn drive(self) {
        tracing::info!(question = %self.question, "run started");

        let verdict = match self
            .run_orchestrator::<PresidentsOrchestration>(
                "presidents",
                ORCHESTRATOR_PRESIDENTS_PROMPT,
                &ORCHESTRATOR_PRESIDENTS_SCHEMA,
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                self.send(AgentResult::failed(
                    ORCHESTRATOR_AGENT,
                    AgentError::Orchestrator {
                        stage: "presidents",
                        detail: e.to_string(),
                    },
                ))
                .await;
                return;
            }
        };

        if !verdict.safe {
            tracing::warn!(reason = %verdict.reason, "question blocked");
            self.send(AgentResult::failed(
                ORCHESTRATOR_AGENT,
                AgentError::Blocked(verdict.reason.clone()),
            ))
            .await;
            return;
        }

        // Leaders and scriptures keywords generate while presidents search.
        let leaders_orch = {
            let driver = self.clone();
            tokio::spawn(async move {
                driver
                    .run_orchestrator::<LeadersOrchestration>(
                        "leaders",
                        ORCHESTRATOR_LEADERS_PROMPT,
                        &ORCHESTRATOR_LEADERS_SCHEMA,
                    )
                    .await
            })
        };
        let scriptures_orch = {
            let driver = self.clone();
            tokio::spawn(async move {
                driver
                    .run_orchestrator::<ScripturesOrchestration>(
                        "scriptures",
                        ORCHESTRATOR_SCRIPTURES_PROMPT,
                        &ORCHESTRATOR_SCRIPTURES_SCHEMA,
                    )
                    .await
            })
        };

        let gate = Arc::new(CascadeGate::new());
        let leaders_stage = {
            let driver = self.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.opened().await;
                driver.run_leaders_stage(leaders_orch).await;
            })
        };

        tracing::info!("cascade launched");

        let tasks = presidents_tasks(&verdict.keywords);
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let driver = self.clone();
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                driver.run_task_to_stream(task).await;
                if gate.open() {
                    tracing::debug!("cascade gate opened by first presidents completion");
                }
            }));
        }
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "presidents task join failed");
            }
        }
        gate.open();

        if let Err(e) = leaders_stage.await {
            tracing::warn!(error = %e, "leaders stage join failed");
        }

        if self.tx.is_closed() {
            tracing::debug!("result stream abandoned, skipping scriptures");
            scriptures_orch.abort();
            return;
        }

        let keywords = match scriptures_orch.await {
            Ok(Ok(orch)) => orch.keywords,
            Ok(Err(e)) => {
                self.send(AgentResult::failed(
                    ORCHESTRATOR_AGENT,
                    AgentError::Orchestrator {
                        stage: "scriptures",
                        detail: e.to_string(),
                    },
                ))
                .await;
                return;
            }
            Err(e) => {
                self.send(AgentResult::failed(
                    ORCHESTRATOR_AGENT,
                    AgentError::Orchestrator {
                        stage: "scriptures",
                        detail: e.to_string(),
                    },
                ))
                .await;
                return;
            }
        };

        tracing::info!("scriptures fan-out started");
        let handles: Vec<_> = scriptures_tasks(&keywords)
            .into_iter()
            .map(|task| {
                let driver = self.clone();
                tokio::spawn(async move { driver.run_task_to_stream(task).await })
            })
            .collect();
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "scriptures task join failed");
            }
        }

        if self.tx.is_closed() {
            tracing::debug!("result stream abandoned, skipping summary");
            return;
        }

        self.run_summary().await;
        tracing::info!("run finished");
    }

    /// Awaits the leaders orchestration, then fans out its six tasks.
    async fn run_leaders_stage(
        &self,
        orchestration: JoinHandle<Result<LeadersOrchestration, AgentError>>,
    ) {
        if self.tx.is_closed() {
            orchestration.abort();
            return;
        }
        let keywords = match orchestration.await {
            Ok(Ok(orch)) => orch.keywords,
            Ok(Err(e)) => {
                self.send(AgentResult::failed(
                    ORCHESTRATOR_AGENT,
                    AgentError::Orchestrator {
                        stage: "leaders",
                        detail: e.to_string(),
                    },
                ))
                .await;
                return;
            }
            Err(e) => {
                self.send(AgentResult::failed(
                    ORCHESTRATOR_AGENT,
                    AgentError::Orchestrator {
                        stage: "leaders",
                        detail: e.to_string(),
                    },
                ))
                .await;
                return;
            }
        };

        let handles: Vec<_> = leaders_tasks(&keywords)
            .into_iter()
            .map(|task| {
                let driver = self.clone();
                tokio::spawn(async move { driver.run_task_to_stream(task).await })
            })
            .collect();
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "leaders task join failed");
            }
        }
    }

    /// One orchestration call: question in, typed keyword response out.
    async fn run_orchestrator<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        prompt: &'static str,
        schema: &Value,
    ) -> Result<T, AgentError> {
        tracing::info!(stage, "orchestration call");
        let request = build_request(&self.question, prompt, schema, "high");
        let response = self.client.generate(&request).await?;
        let text = response.extract_text();
        tracing::debug!(stage, response = %text, "orchestration response");
        serde_json::from_str(&text)
            .map_err(|e| AgentError::ResponseParsing(format!("{stage} orchestration output: {e}")))
    }

    /// Runs one search task and pushes its outcome onto the stream.
    async fn run_task_to_stream(&self, task: SearchTask) {
        let agent = task.agent;
        match self.run_search_task(&task).await {
            Ok(content) => {
                self.absorb(agent, &content);
                self.send(AgentResult::ok(agent, content)).await;
            }
            Err(e) => {
                tracing::warn!(task = task.name, error = %e, "search task failed");
                self.send(AgentResult::failed(agent, e)).await;
            }
        }
    }

    /// One retrieval call plus one format call, with per-task retry policy.
    async fn run_search_task(&self, task: &SearchTask) -> Result<String, AgentError> {
        let started = Instant::now();
        tracing::info!(task = task.name, keywords = %task.keywords, "search task started");

        let tool_started = Instant::now();
        let rows = self
            .tools
            .invoke(task.tool, task.args.clone())
            .await
            .map_err(|e| match e {
                AgentError::ToolNotFound(name) => AgentError::ToolNotFound(name),
                other => AgentError::ToolFailed {
                    name: task.tool.to_string(),
                    detail: other.to_string(),
                },
            })?;
        let rows_json = serde_json::to_string(&rows)
            .map_err(|e| AgentError::ResponseParsing(e.to_string()))?;
        tracing::debug!(
            task = task.name,
            bytes = rows_json.len(),
            tool_ms = tool_started.elapsed().as_millis() as u64,
            "retrieval finished"
        );

        let user_text = format!("Search results:\n{rows_json}\n\nKeywords: {}", task.keywords);

        let mut last_error: Option<AgentError> = None;
        for attempt in 1..=task.max_attempts {
            let request =
                build_request(&user_text, task.format_prompt, task.schema, task.thinking_level);
            let response = match self.client.generate(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        task = task.name,
                        attempt,
                        max = task.max_attempts,
                        error = %e,
                        "format call failed"
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            let text = response.extract_text();
            let finish_reason = response.finish_reason();
            tracing::info!(
                task = task.name,
                total_ms = started.elapsed().as_millis() as u64,
                finish_reason,
                response_len = text.len(),
                "search task finished"
            );
            if finish_reason != "STOP" && !finish_reason.is_empty() {
                tracing::warn!(task = task.name, finish_reason, response = %text, "non-stop finish");
            }

            if task.max_attempts > 1 && (finish_reason == "RECITATION" || text.trim().is_empty()) {
                tracing::warn!(
                    task = task.name,
                    attempt,
                    max = task.max_attempts,
                    finish_reason,
                    "retrying format"
                );
                last_error = Some(AgentError::Format("empty or recitation output".to_string()));
                continue;
            }

            return Ok(text);
        }

        Err(match last_error {
            Some(AgentError::Format(detail)) => AgentError::Format(detail),
            Some(other) => AgentError::Format(other.to_string()),
            None => AgentError::Format("unknown error".to_string()),
        })
    }

    /// Parses a task output into the summary accumulator. Outputs that fail
    /// to parse are simply skipped; the consumer reports those.
    fn absorb(&self, agent: &'static str, content: &str) {
        let Some(raw) = extract_first_object(content) else {
            return;
        };
        match agent {
            PRESIDENTS_AGENT | LEADERS_AGENT => {
                let Ok(payload) = serde_json::from_str::<super::types::QuotesPayload>(raw) else {
                    return;
                };
                let cleaned: Vec<StructuredQuote> =
                    payload.quotes.into_iter().map(sanitize_quote).collect();
                let mut sources = self.lock_sources();
                if agent == PRESIDENTS_AGENT {
                    merge_unique_quotes(&mut sources.presidents, cleaned);
                    sort_presidents_quotes(&mut sources.presidents);
                } else {
                    merge_unique_quotes(&mut sources.leaders, cleaned);
                }
            }
            SCRIPTURES_BIBLE | SCRIPTURES_BOM | SCRIPTURES_OTHER => {
                let Ok(payload) = serde_json::from_str::<super::types::ScripturesPayload>(raw)
                else {
                    return;
                };
                let cleaned: Vec<StructuredScripture> = payload
                    .scriptures
                    .into_iter()
                    .map(sanitize_scripture)
                    .collect();
                let mut sources = self.lock_sources();
                merge_unique_scriptures(&mut sources.scriptures, cleaned);
            }
            _ => {}
        }
    }

    /// Summary call over the accumulated sources; always the last result.
    async fn run_summary(&self) {
        let payload = {
            let sources = self.lock_sources();
            json!({
                "question": self.question,
                "presidents": sources.presidents.iter().take(3).collect::<Vec<_>>(),
                "leaders": sources.leaders.iter().take(3).collect::<Vec<_>>(),
                "scriptures": sources.scriptures.iter().take(6).collect::<Vec<_>>(),
            })
        };

        let request = build_request(&payload.to_string(), SUMMARY_PROMPT, &SUMMARY_SCHEMA, "low");
        match self.client.generate(&request).await {
            Ok(response) => {
                let text = response.extract_text();
                tracing::info!(response_len = text.len(), "summary finished");
                self.send(AgentResult::ok(SUMMARY_AGENT, text)).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "summary failed");
                self.send(AgentResult::failed(SUMMARY_AGENT, e)).await;
            }
        }
    }

    fn lock_sources(&self) -> std::sync::MutexGuard<'_, SummarySources> {
        self.sources.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send(&self, result: AgentResult) {
        if self.tx.send(result).await.is_err() {
            tracing::debug!("result stream closed, output dropped");
        }
    }
}

fn build_request(
    user_text: &str,
    system_prompt: &str,
    schema: &Value,
    thinking_level: &str,
) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: user_text.to_string(),
            }],
            role: "user".to_string(),
        }],
        system_instruction: Some(Content {
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
            role: "system".to_string(),
        }),
        generation_config: Some(GenerationConfig {
            temperature: Some(1.0),
            max_output_tokens: Some(64000),
            response_mime_type: Some("application/json".to_string()),
            response_json_schema: Some(schema.clone()),
            thinking_config: Some(ThinkingConfig {
                thinking_level: thinking_level.to_string(),
            }),
        }),
        safety_settings: default_safety_settings(),
    }
}
