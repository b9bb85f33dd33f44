use crate::config::Config;
use crate::http::HttpTransport;
use crate::mcp::mcp_wrap;
use crate::ratelimit::RateLimitService;
use crate::tools::*;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

// Minimal JSON-RPC 2.0 types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Id {
    Str(String),
    Num(i64),
    Null,
}

#[derive(Debug, Serialize, Deserialize)]
struct Request {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Response {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

fn rpc_error(id: Option<Id>, code: i64, message: &str, data: Option<Value>) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data,
        }),
        id,
    }
}

fn rpc_ok(id: Option<Id>, result: Value) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: Some(result),
        error: None,
        id,
    }
}

/// Serve newline-delimited JSON-RPC requests from stdin until EOF.
pub async fn run_stdio_server() -> anyhow::Result<()> {
    info!(
        "Starting openai-rate-limits stdio server; protocol={}",
        PROTOCOL_VERSION
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let req: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let resp = rpc_error(None, -32700, &format!("Parse error: {}", e), None);
                write_response(&mut out, &resp).await?;
                continue;
            }
        };
        debug!("Received method={}", req.method);
        // Notifications carry no id and get no response.
        if req.id.is_none() && req.method.starts_with("notifications/") {
            continue;
        }
        let resp = dispatch(req).await;
        write_response(&mut out, &resp).await?;
    }
    Ok(())
}

async fn write_response(out: &mut tokio::io::Stdout, resp: &Response) -> anyhow::Result<()> {
    let mut payload = serde_json::to_vec(resp)?;
    payload.push(b'\n');
    out.write_all(&payload).await?;
    out.flush().await?;
    Ok(())
}

async fn dispatch(req: Request) -> Response {
    match req.method.as_str() {
        "initialize" => handle_initialize(req.id),
        "tools/list" => handle_tools_list(req.id),
        "tools/call" => handle_tools_call(req.id, req.params).await,
        "ping" => rpc_ok(req.id, serde_json::json!({})),
        other => rpc_error(req.id, -32601, &format!("Method not found: {}", other), None),
    }
}

fn ping_enabled() -> bool {
    std::env::var("OPENAI_RATE_LIMITS_ENABLE_PING")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn handle_initialize(id: Option<Id>) -> Response {
    rpc_ok(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "openai-rate-limits",
                "version": env!("CARGO_PKG_VERSION"),
            }
        }),
    )
}

fn handle_tools_list(id: Option<Id>) -> Response {
    let tools = tool_descriptors(ping_enabled());
    rpc_ok(id, serde_json::json!({ "tools": tools }))
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn handle_tools_call(id: Option<Id>, params: Value) -> Response {
    let parsed: Result<ToolCallParams, _> = serde_json::from_value(params);
    let Ok(call) = parsed else {
        return rpc_error(id, -32602, "Invalid params", None);
    };
    match call.name.as_str() {
        "ping" if ping_enabled() => handle_ping(id, call.arguments),
        "list_rate_limits" => handle_list_rate_limits(id, call.arguments).await,
        "get_rate_limit" => handle_get_rate_limit(id, call.arguments).await,
        "update_rate_limit" => handle_update_rate_limit(id, call.arguments).await,
        "reset_rate_limit" => handle_reset_rate_limit(id, call.arguments).await,
        "import_rate_limit" => handle_import_rate_limit(id, call.arguments).await,
        _ => rpc_error(id, -32601, &format!("Tool not found: {}", call.name), None),
    }
}

fn handle_ping(id: Option<Id>, params: Value) -> Response {
    let input: PingInput =
        serde_json::from_value(params).unwrap_or(PingInput { message: None });
    let message = input.message.unwrap_or_else(|| "pong".to_string());
    tool_result(id, &PingOutput { message }, None, false)
}

fn parse_args<T: DeserializeOwned>(id: &Option<Id>, args: Value) -> Result<T, Response> {
    serde_json::from_value(args)
        .map_err(|e| rpc_error(id.clone(), -32602, &format!("Invalid params: {}", e), None))
}

fn build_service(id: &Option<Id>) -> Result<RateLimitService<HttpTransport>, Response> {
    let cfg = Config::from_env().map_err(|e| rpc_error(id.clone(), -32603, &e, None))?;
    RateLimitService::from_config(&cfg)
        .map_err(|e| rpc_error(id.clone(), -32603, &e.to_string(), None))
}

fn tool_result<T: Serialize>(
    id: Option<Id>,
    out: &T,
    text: Option<String>,
    is_error: bool,
) -> Response {
    match serde_json::to_value(out) {
        Ok(v) => rpc_ok(id, mcp_wrap(v, text, is_error)),
        Err(e) => rpc_error(id, -32603, &format!("Serialization error: {}", e), None),
    }
}

async fn handle_list_rate_limits(id: Option<Id>, args: Value) -> Response {
    let input: ListRateLimitsInput = match parse_args(&id, args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let svc = match build_service(&id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let out = match svc.list_page(&input.project_id).await {
        Ok(page) => ListRateLimitsOutput {
            meta: Some(Meta {
                has_more: page.has_more,
                first_id: page.first_id,
                last_id: page.last_id,
            }),
            items: Some(page.data),
            error: None,
        },
        Err(e) => {
            warn!("list_rate_limits failed: {}", e);
            ListRateLimitsOutput {
                items: None,
                meta: None,
                error: Some(ErrorShape::from(&e)),
            }
        }
    };
    let is_error = out.error.is_some();
    tool_result(id, &out, None, is_error)
}

async fn handle_get_rate_limit(id: Option<Id>, args: Value) -> Response {
    let input: RateLimitInput = match parse_args(&id, args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let svc = match build_service(&id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let out = RateLimitOutput::from(svc.get(&input.project_id, &input.identifier).await);
    let is_error = out.error.is_some();
    tool_result(id, &out, None, is_error)
}

async fn handle_update_rate_limit(id: Option<Id>, args: Value) -> Response {
    let input: UpdateRateLimitInput = match parse_args(&id, args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let svc = match build_service(&id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let res = svc
        .update(&input.project_id, &input.identifier, input.fields)
        .await;
    if let Err(e) = &res {
        warn!("update_rate_limit failed: {}", e);
    }
    let out = RateLimitOutput::from(res);
    let is_error = out.error.is_some();
    tool_result(id, &out, None, is_error)
}

async fn handle_reset_rate_limit(id: Option<Id>, args: Value) -> Response {
    let input: RateLimitInput = match parse_args(&id, args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let svc = match build_service(&id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let out = match svc
        .reset_to_default(&input.project_id, &input.identifier)
        .await
    {
        Ok(item) => ResetRateLimitOutput {
            ok: true,
            item: Some(item),
            error: None,
        },
        Err(e) => {
            warn!("reset_rate_limit failed: {}", e);
            ResetRateLimitOutput {
                ok: false,
                item: None,
                error: Some(ErrorShape::from(&e)),
            }
        }
    };
    let is_error = out.error.is_some();
    tool_result(id, &out, None, is_error)
}

async fn handle_import_rate_limit(id: Option<Id>, args: Value) -> Response {
    let input: ImportRateLimitInput = match parse_args(&id, args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let svc = match build_service(&id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let out = RateLimitOutput::from(svc.import(&input.import_id).await);
    let is_error = out.error.is_some();
    tool_result(id, &out, None, is_error)
}
