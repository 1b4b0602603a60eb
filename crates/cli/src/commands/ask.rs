use std::time::Duration;

use crate::commands::{block_on, CommandResult};
use querymcp_agent::intake::{render_response, RequestBuilder};
use querymcp_core::config::{AppConfig, LoadOptions};
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub fn run(text: &str, dialect: &str, endpoint: Option<&str>) -> CommandResult {
    let endpoint = match endpoint {
        Some(endpoint) => endpoint.to_string(),
        None => match AppConfig::load(LoadOptions::default()) {
            Ok(config) => format!("http://{}/mcp", config.server.socket_address()),
            Err(error) => {
                return CommandResult::failure(
                    "ask",
                    "config_validation",
                    format!("configuration issue: {error}"),
                    2,
                );
            }
        },
    };

    send(&endpoint, text, dialect)
}

pub fn send(endpoint: &str, text: &str, dialect: &str) -> CommandResult {
    let request = RequestBuilder::new().with_dialect(dialect).build(text);

    let outcome = block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|error| format!("http client setup failed: {error}"))?;
        let response = client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| format!("request to `{endpoint}` failed: {error}"))?;
        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|error| format!("response from `{endpoint}` was not JSON: {error}"))?;
        Ok::<(u16, Value), String>((status.as_u16(), body))
    });

    match outcome {
        Err(message) => CommandResult::failure("ask", "runtime_init", message, 3),
        Ok(Err(message)) => CommandResult::failure("ask", "transport", message, 8),
        Ok(Ok((status, body))) if (200..300).contains(&status) => {
            CommandResult { exit_code: 0, output: render_response(&body) }
        }
        Ok(Ok((status, body))) => {
            let error_class = body["error"]["kind"].as_str().unwrap_or("http_error");
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("server answered with status {status}"));
            CommandResult::failure("ask", error_class, message, 7)
        }
    }
}
