//! Request payload sent to the invoke endpoint.

use itertools::Itertools;
use serde::Serialize;

use crate::config::{ModelConfig, DEFAULT_SENTINEL};
use crate::model::Message;
use crate::options::CallOptions;

const RUN_ACTION: &str = "run";

/// Top-level invoke body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub action: String,
    pub model_interface: String,
    pub data: RequestData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub text: String,
    /// Always empty; file upload is not supported
    pub files: Vec<String>,
    pub model_name: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub model_kwargs: ModelKwargs,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelKwargs {
    pub max_tokens: u32,
    pub temperature: f32,
    pub streaming: bool,
    pub top_p: f32,
}

impl RequestPayload {
    /// Build the invoke body for one call.
    ///
    /// The backend takes a single prompt string, so message contents are joined with one space
    /// in order and roles are dropped. This is lossy: a system message reads as plain text.
    ///
    /// `maxTokens` is the per-call override, else `optional_params.max_tokens`, else the model's
    /// configured default. Mode is left out when it is the `"default"` sentinel, and the session
    /// id only when the caller gave one.
    pub fn build(
        model: &str,
        messages: &[Message],
        options: &CallOptions,
        config: &ModelConfig,
        streaming: bool,
    ) -> Self {
        let text = messages.iter().map(|m| m.content.as_str()).join(" ");

        let max_tokens = options
            .max_tokens
            .or(options.optional_params.max_tokens)
            .unwrap_or(config.max_tokens);

        RequestPayload {
            action: RUN_ACTION.to_string(),
            model_interface: config.interface.clone(),
            data: RequestData {
                mode: Some(config.mode.clone()).filter(|mode| mode != DEFAULT_SENTINEL),
                text,
                files: Vec::new(),
                model_name: model.to_string(),
                provider: config.provider.clone(),
                session_id: options.session_id.clone().filter(|id| !id.is_empty()),
                model_kwargs: ModelKwargs {
                    max_tokens,
                    temperature: options.temperature.unwrap_or(config.temperature),
                    streaming,
                    top_p: options.top_p.unwrap_or(config.top_p),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionalParams;
    use serde_json::Value;

    fn messages() -> Vec<Message> {
        vec![
            Message::system("You are terse."),
            Message::user("What is the capital"),
            Message::assistant("of"),
            Message::user("France?"),
        ]
    }

    fn config_with_max_tokens(max_tokens: u32) -> ModelConfig {
        ModelConfig {
            max_tokens,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_prompt_is_space_joined_contents_in_order() {
        let payload = RequestPayload::build(
            "m",
            &messages(),
            &CallOptions::default(),
            &ModelConfig::default(),
            false,
        );
        assert_eq!(
            payload.data.text,
            "You are terse. What is the capital of France?"
        );
    }

    #[test]
    fn test_empty_messages_give_empty_prompt() {
        let payload =
            RequestPayload::build("m", &[], &CallOptions::default(), &ModelConfig::default(), false);
        assert_eq!(payload.data.text, "");
    }

    #[test]
    fn test_max_tokens_from_config_default() {
        let payload = RequestPayload::build(
            "m",
            &messages(),
            &CallOptions::default(),
            &config_with_max_tokens(4096),
            false,
        );
        assert_eq!(payload.data.model_kwargs.max_tokens, 4096);
    }

    #[test]
    fn test_max_tokens_from_optional_params() {
        let options = CallOptions::default().with_optional_params(OptionalParams {
            max_tokens: Some(300),
        });
        let payload =
            RequestPayload::build("m", &messages(), &options, &config_with_max_tokens(4096), false);
        assert_eq!(payload.data.model_kwargs.max_tokens, 300);
    }

    #[test]
    fn test_max_tokens_override_wins() {
        let options = CallOptions::default()
            .with_max_tokens(42)
            .with_optional_params(OptionalParams {
                max_tokens: Some(300),
            });
        let payload =
            RequestPayload::build("m", &messages(), &options, &config_with_max_tokens(4096), false);
        assert_eq!(payload.data.model_kwargs.max_tokens, 42);
    }

    #[test]
    fn test_sampling_defaults_and_overrides() {
        let payload = RequestPayload::build(
            "m",
            &messages(),
            &CallOptions::default(),
            &ModelConfig::default(),
            false,
        );
        assert_eq!(payload.data.model_kwargs.temperature, 0.6);
        assert_eq!(payload.data.model_kwargs.top_p, 0.9);

        let options = CallOptions::default().with_temperature(0.1).with_top_p(0.5);
        let payload =
            RequestPayload::build("m", &messages(), &options, &ModelConfig::default(), false);
        assert_eq!(payload.data.model_kwargs.temperature, 0.1);
        assert_eq!(payload.data.model_kwargs.top_p, 0.5);
    }

    #[test]
    fn test_default_mode_and_missing_session_are_omitted() {
        let payload = RequestPayload::build(
            "anthropic.claude-v2",
            &messages(),
            &CallOptions::default(),
            &ModelConfig::default(),
            false,
        );
        let json = serde_json::to_value(&payload).unwrap();
        let data = json["data"].as_object().unwrap();

        assert!(!data.contains_key("mode"));
        assert!(!data.contains_key("sessionId"));
        assert_eq!(json["action"], "run");
        assert_eq!(json["modelInterface"], "default");
        assert_eq!(data["modelName"], "anthropic.claude-v2");
        assert_eq!(data["provider"], "capgemini");
        assert_eq!(data["files"], Value::Array(vec![]));
        assert_eq!(data["modelKwargs"]["maxTokens"], 512);
        assert_eq!(data["modelKwargs"]["streaming"], false);
    }

    #[test]
    fn test_empty_session_id_is_omitted() {
        let payload = RequestPayload::build(
            "m",
            &messages(),
            &CallOptions::default().with_session_id(""),
            &ModelConfig::default(),
            false,
        );
        assert_eq!(payload.data.session_id, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["data"].get("sessionId").is_none());
    }

    #[test]
    fn test_configured_mode_and_session_are_sent() {
        let config = ModelConfig {
            interface: "langchain".to_string(),
            mode: "chain".to_string(),
            provider: "bedrock".to_string(),
            ..ModelConfig::default()
        };
        let options = CallOptions::default().with_session_id("s-1");

        let payload = RequestPayload::build("m", &messages(), &options, &config, true);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["modelInterface"], "langchain");
        assert_eq!(json["data"]["mode"], "chain");
        assert_eq!(json["data"]["provider"], "bedrock");
        assert_eq!(json["data"]["sessionId"], "s-1");
        assert_eq!(json["data"]["modelKwargs"]["streaming"], true);
    }

    #[test]
    fn test_float_kwargs_serialize_exactly() {
        let payload = RequestPayload::build(
            "m",
            &messages(),
            &CallOptions::default(),
            &ModelConfig::default(),
            false,
        );
        let body = serde_json::to_string(&payload).unwrap();
        assert!(body.contains(r#""temperature":0.6"#));
        assert!(body.contains(r#""topP":0.9"#));
    }
}
