use crate::ratelimit::{RateLimit, RateLimitError, RateLimitFields};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn limit_field_properties() -> serde_json::Map<String, serde_json::Value> {
    let mut props = serde_json::Map::new();
    for name in [
        "max_requests_per_1_minute",
        "max_tokens_per_1_minute",
        "max_images_per_1_minute",
        "max_audio_megabytes_per_1_minute",
        "max_requests_per_1_day",
        "batch_1_day_max_input_tokens",
    ] {
        props.insert(
            name.to_string(),
            serde_json::json!({"type": "integer", "minimum": 0}),
        );
    }
    props
}

pub fn tool_descriptors(include_ping: bool) -> Vec<ToolDescriptor> {
    let ping = ToolDescriptor {
        name: "ping".into(),
        description: "Health check; echoes a message.".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "message": {"type": "string"}
            }
        }),
    };

    let list_rate_limits = ToolDescriptor {
        name: "list_rate_limits".into(),
        description: "List rate limits of a project (first page only)".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "project_id": {"type": "string"}
            },
            "required": ["project_id"]
        }),
    };

    let get_rate_limit = ToolDescriptor {
        name: "get_rate_limit".into(),
        description: "Get a rate limit by model name or (partial) rate limit id".into(),
        input_schema: serde_json::json!({
            "type":"object","additionalProperties":false,
            "properties": {"project_id":{"type":"string"},"identifier":{"type":"string"}},
            "required":["project_id","identifier"]
        }),
    };

    let mut update_props = limit_field_properties();
    update_props.insert("project_id".into(), serde_json::json!({"type": "string"}));
    update_props.insert("identifier".into(), serde_json::json!({"type": "string"}));
    let update_rate_limit = ToolDescriptor {
        name: "update_rate_limit".into(),
        description: "Set one or more ceilings of a rate limit; omitted fields are left as-is"
            .into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": update_props,
            "required": ["project_id", "identifier"]
        }),
    };

    let reset_rate_limit = ToolDescriptor {
        name: "reset_rate_limit".into(),
        description: "Reset a rate limit to its model's documented defaults (the record is not deleted)".into(),
        input_schema: serde_json::json!({
            "type":"object","additionalProperties":false,
            "properties": {"project_id":{"type":"string"},"identifier":{"type":"string"}},
            "required":["project_id","identifier"]
        }),
    };

    let import_rate_limit = ToolDescriptor {
        name: "import_rate_limit".into(),
        description: "Read an existing rate limit from a <project_id>:<identifier> import id".into(),
        input_schema: serde_json::json!({"type":"object","additionalProperties":false,"properties":{"import_id":{"type":"string"}},"required":["import_id"]}),
    };

    let mut tools = Vec::new();
    if include_ping {
        tools.push(ping);
    }
    tools.extend([
        list_rate_limits,
        get_rate_limit,
        update_rate_limit,
        reset_rate_limit,
        import_rate_limit,
    ]);
    tools
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingInput {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingOutput {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Meta {
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

impl From<&RateLimitError> for ErrorShape {
    fn from(e: &RateLimitError) -> Self {
        ErrorShape {
            code: e.code().to_string(),
            message: e.to_string(),
            retriable: e.retriable(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRateLimitsInput {
    pub project_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListRateLimitsOutput {
    pub items: Option<Vec<RateLimit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitInput {
    pub project_id: String,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRateLimitInput {
    pub project_id: String,
    pub identifier: String,
    #[serde(flatten)]
    pub fields: RateLimitFields,
}

#[derive(Debug, Deserialize)]
pub struct ImportRateLimitInput {
    pub import_id: String,
}

#[derive(Debug, Serialize)]
pub struct RateLimitOutput {
    pub item: Option<RateLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl From<Result<RateLimit, RateLimitError>> for RateLimitOutput {
    fn from(res: Result<RateLimit, RateLimitError>) -> Self {
        match res {
            Ok(item) => RateLimitOutput {
                item: Some(item),
                error: None,
            },
            Err(e) => RateLimitOutput {
                item: None,
                error: Some(ErrorShape::from(&e)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetRateLimitOutput {
    pub ok: bool,
    pub item: Option<RateLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}
