use std::sync::Arc;

use pulpit::agent::gemini::GeminiClient;
use pulpit::agent::toolbox::ToolboxClient;
use pulpit::agent::Agent;
use pulpit::config::{Config, APP_NAME, APP_VERSION};

#[tokio::main]
async fn main() {
    pulpit::init_tracing();
    tracing::info!("{APP_NAME} starting v{APP_VERSION}");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = match GeminiClient::new(&config.gemini_api_key) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("generation client error: {e}");
            std::process::exit(1);
        }
    };
    let tools = match ToolboxClient::new(&config.toolbox_url) {
        Ok(tools) => tools,
        Err(e) => {
            tracing::error!("toolbox client error: {e}");
            std::process::exit(1);
        }
    };
    let agent = Agent::new(Arc::new(client), Arc::new(tools));

    if let Err(e) = pulpit::api::server::run(&config, agent).await {
        tracing::error!("kiosk server failed: {e}");
        std::process::exit(1);
    }
}
