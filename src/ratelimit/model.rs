use serde::{Deserialize, Serialize};

/// One project's stored ceiling configuration for a single model.
///
/// Absent numeric fields mean "unlimited" or "not applicable to this model".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_audio_megabytes_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests_per_1_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_1_day_max_input_tokens: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitPage {
    #[serde(default)]
    pub data: Vec<RateLimit>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Sparse update set. `None` is "not provided"; `Some(0)` is an explicit zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_audio_megabytes_per_1_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests_per_1_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_1_day_max_input_tokens: Option<i64>,
}

impl RateLimitFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, record: &mut RateLimit) {
        if let Some(v) = self.max_requests_per_1_minute {
            record.max_requests_per_1_minute = Some(v);
        }
        if let Some(v) = self.max_tokens_per_1_minute {
            record.max_tokens_per_1_minute = Some(v);
        }
        if let Some(v) = self.max_images_per_1_minute {
            record.max_images_per_1_minute = Some(v);
        }
        if let Some(v) = self.max_audio_megabytes_per_1_minute {
            record.max_audio_megabytes_per_1_minute = Some(v);
        }
        if let Some(v) = self.max_requests_per_1_day {
            record.max_requests_per_1_day = Some(v);
        }
        if let Some(v) = self.batch_1_day_max_input_tokens {
            record.batch_1_day_max_input_tokens = Some(v);
        }
    }
}

/// Body of the per-record update call. The platform requires `name` on every update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateRateLimitRequest {
    pub name: String,
    #[serde(flatten)]
    pub fields: RateLimitFields,
}

impl UpdateRateLimitRequest {
    pub fn to_body(&self) -> serde_json::Value {
        let f = &self.fields;
        let mut body = serde_json::Map::new();
        body.insert("name".into(), self.name.clone().into());
        for (key, value) in [
            ("max_requests_per_1_minute", f.max_requests_per_1_minute),
            ("max_tokens_per_1_minute", f.max_tokens_per_1_minute),
            ("max_images_per_1_minute", f.max_images_per_1_minute),
            ("max_audio_megabytes_per_1_minute", f.max_audio_megabytes_per_1_minute),
            ("max_requests_per_1_day", f.max_requests_per_1_day),
            ("batch_1_day_max_input_tokens", f.batch_1_day_max_input_tokens),
        ] {
            if let Some(v) = value {
                body.insert(key.into(), v.into());
            }
        }
        serde_json::Value::Object(body)
    }
}
