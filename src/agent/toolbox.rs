//! Client for the retrieval toolbox service.
//!
//! The toolbox exposes named search tools grouped into toolsets. We load the
//! three toolsets once, lazily, on the first question; after that an invoke
//! is a single POST. Unknown tool names fail fast without a network call.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use super::AgentError;

/// Toolsets the pipeline draws its search tools from.
pub const TOOLSETS: &[&str] = &["presidents", "leaders", "scriptures"];

const TOOLBOX_TIMEOUT_SECS: u64 = 30;

/// Interface the search tasks retrieve through.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, AgentError>;
}

pub struct ToolboxClient {
    http: reqwest::Client,
    base_url: String,
    tools: OnceCell<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ToolsetManifest {
    #[serde(default)]
    tools: HashMap<String, ToolManifest>,
}

#[derive(Debug, Deserialize)]
struct ToolManifest {
    #[serde(default)]
    description: String,
}

impl ToolboxClient {
    pub fn new(base_url: &str) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOOLBOX_TIMEOUT_SECS))
            .build()
            .map_err(|e| AgentError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tools: OnceCell::new(),
        })
    }

    /// Tool registry, loaded on first use. A failed load is retried on the
    /// next call rather than cached.
    async fn registry(&self) -> Result<&HashMap<String, String>, AgentError> {
        self.tools.get_or_try_init(|| self.load_toolsets()).await
    }

    async fn load_toolsets(&self) -> Result<HashMap<String, String>, AgentError> {
        let mut tools = HashMap::new();
        for set in TOOLSETS {
            let manifest = self.fetch_toolset(set).await?;
            for (name, tool) in manifest.tools {
                tools.insert(name, tool.description);
            }
        }
        tracing::info!(tools = tools.len(), "toolbox registry loaded");
        Ok(tools)
    }

    async fn fetch_toolset(&self, name: &str) -> Result<ToolsetManifest, AgentError> {
        let url = format!("{}/api/toolset/{}", self.base_url, name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolboxApi {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParsing(e.to_string()))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_connect() {
            AgentError::ToolboxConnection(self.base_url.clone())
        } else if e.is_timeout() {
            AgentError::HttpClient(format!(
                "toolbox request timed out after {TOOLBOX_TIMEOUT_SECS}s"
            ))
        } else {
            AgentError::HttpClient(e.to_string())
        }
    }
}

#[async_trait]
impl ToolSource for ToolboxClient {
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, AgentError> {
        let registry = self.registry().await?;
        if !registry.contains_key(tool) {
            return Err(AgentError::ToolNotFound(tool.to_string()));
        }

        let url = format!("{}/api/tool/{}/invoke", self.base_url, tool);
        let response = self
            .http
            .post(&url)
            .json(&args)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolboxApi {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParsing(e.to_string()))?;
        Ok(unwrap_result(body))
    }
}

/// The invoke endpoint wraps its payload as `{"result": ...}`; older builds
/// return the payload bare. Accept both.
fn unwrap_result(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ═══════════════════════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════════════════════

/// Scriptable tool source that records which tools were invoked.
pub struct MockToolSource {
    #[allow(clippy::type_complexity)]
    handler: Box<dyn Fn(&str, &Value) -> Result<Value, AgentError> + Send + Sync>,
    invocations: std::sync::Mutex<Vec<String>>,
}

impl MockToolSource {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, AgentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Mock that answers every tool with the same payload.
    pub fn with_result(result: Value) -> Self {
        Self::new(move |_, _| Ok(result.clone()))
    }

    /// Names of tools invoked so far, in call order.
    pub fn invoked_tools(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, AgentError> {
        self.invocations.lock().unwrap().push(tool.to_string());
        (self.handler)(tool, &args)
    }
}
