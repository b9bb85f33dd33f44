use serde_json::Value;

// Drop meta when it only says "no more pages"; keep it when has_more is true
// so callers notice records past the first page were not read.
fn prune_meta(structured: &mut Value) {
    let Some(obj) = structured.as_object_mut() else {
        return;
    };
    let has_more = obj
        .get("meta")
        .and_then(|m| m.get("has_more"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !has_more {
        obj.remove("meta");
    }
}

// Build an MCP-compliant result envelope for tools/call outputs.
// - content: always a single text block so clients can render something.
// - structuredContent: the tool's structured output.
// - isError: included only when true to keep payloads small.
pub fn mcp_wrap(mut structured: Value, text_opt: Option<String>, is_error: bool) -> Value {
    prune_meta(&mut structured);
    let text = match text_opt {
        Some(s) => s,
        None => serde_json::to_string(&structured).unwrap_or_else(|_| "{}".to_string()),
    };
    let mut obj = serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
    });
    if is_error {
        if let Some(map) = obj.as_object_mut() {
            map.insert("isError".to_string(), Value::Bool(true));
        }
    }
    obj
}
