#![allow(dead_code)]

use openai_rate_limits::http::{map_status_to_error, Transport, TransportError};
use openai_rate_limits::ratelimit::{RateLimit, RateLimitFields};
use reqwest::{Method, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
struct State {
    records: Vec<RateLimit>,
    calls: Vec<Call>,
    has_more: bool,
    delay: Option<Duration>,
    cancel_on_list: Option<CancellationToken>,
    drop_records_after_list: bool,
    stale_echo: bool,
}

/// In-memory stand-in for the admin API's rate-limit endpoints.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<State>>,
}

pub fn rl(id: &str, model: &str) -> RateLimit {
    RateLimit {
        id: id.into(),
        model: model.into(),
        ..Default::default()
    }
}

fn not_found(msg: &str) -> TransportError {
    TransportError::Status {
        status: 404,
        info: map_status_to_error(StatusCode::NOT_FOUND, msg.to_string()),
    }
}

impl FakePlatform {
    pub fn with_records(records: Vec<RateLimit>) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().records = records;
        fake
    }

    pub fn records(&self) -> Vec<RateLimit> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn record(&self, id: &str) -> Option<RateLimit> {
        self.records().into_iter().find(|r| r.id == id)
    }

    pub fn set_records(&self, records: Vec<RateLimit>) {
        self.state.lock().unwrap().records = records;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_has_more(&self, has_more: bool) {
        self.state.lock().unwrap().has_more = has_more;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Cancel `token` as soon as the catalog has been served.
    pub fn cancel_on_list(&self, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on_list = Some(token);
    }

    /// Simulate a concurrent external change landing between list and update.
    pub fn drop_records_after_list(&self) {
        self.state.lock().unwrap().drop_records_after_list = true;
    }

    /// Echo the record as it was before the update was applied.
    pub fn stale_echo(&self) {
        self.state.lock().unwrap().stale_echo = true;
    }

    fn handle(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut st = self.state.lock().unwrap();
        if *method == Method::GET && path.ends_with("/rate_limits") {
            let page = serde_json::json!({
                "object": "list",
                "data": st.records,
                "first_id": st.records.first().map(|r| r.id.clone()),
                "last_id": st.records.last().map(|r| r.id.clone()),
                "has_more": st.has_more,
            });
            if let Some(token) = &st.cancel_on_list {
                token.cancel();
            }
            if st.drop_records_after_list {
                st.records.clear();
            }
            return Ok(serde_json::to_vec(&page).unwrap());
        }
        if *method == Method::POST {
            let id = path.rsplit('/').next().unwrap_or_default().to_string();
            let stale_echo = st.stale_echo;
            let Some(record) = st.records.iter_mut().find(|r| r.id == id) else {
                return Err(not_found("No such rate limit"));
            };
            let before = record.clone();
            let fields: RateLimitFields =
                serde_json::from_value(body.cloned().unwrap_or_default()).unwrap();
            fields.apply_to(record);
            let echo = if stale_echo { before } else { record.clone() };
            return Ok(serde_json::to_vec(&echo).unwrap());
        }
        Err(not_found("No such route"))
    }
}

impl Transport for FakePlatform {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError> {
        let delay = {
            let mut st = self.state.lock().unwrap();
            st.calls.push(Call {
                method: method.clone(),
                path: path.to_string(),
                body: body.clone(),
            });
            st.delay
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.handle(&method, path, body.as_ref())
    }
}
