//! Local query surface: `action=...` query strings in, `{success, data|error}`
//! envelopes out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, TrainerError};
use crate::model::{validate_age, validate_gender, PairConditions};
use crate::pairing::PairingService;

/// Number of pairs when a query does not say.
pub const DEFAULT_COUNT: usize = 5;

/// Largest count a single query may ask for.
pub const MAX_COUNT: usize = 100;

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    GeneratePairs { count: usize, conditions: PairConditions },
    GetRandomPairs { count: usize, conditions: PairConditions },
    GetPairById { id: String },
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failure envelope carrying the user-facing message for the error kind.
    pub fn from_error(err: &TrainerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.user_message()),
        }
    }
}

impl ApiRequest {
    /// Parse an `action=...&...` query string.
    pub fn parse(query: &str) -> Result<Self> {
        let query = query.trim_start_matches('?');
        let mut action = None;
        let mut count = None;
        let mut conditions = PairConditions::any();
        let mut id = None;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "action" => action = Some(value.into_owned()),
                "count" => count = Some(parse_count(&value)?),
                "age" if !value.is_empty() => conditions.age = Some(validate_age(parse_int("age", &value)?)?),
                "gender" if !value.is_empty() => conditions.gender = Some(validate_gender(&value)?),
                "id" if !value.is_empty() => id = Some(value.into_owned()),
                _ => {}
            }
        }

        let count = count.unwrap_or(DEFAULT_COUNT);
        match action.as_deref() {
            Some("generate_pairs") => Ok(ApiRequest::GeneratePairs { count, conditions }),
            Some("get_random_pairs") => Ok(ApiRequest::GetRandomPairs { count, conditions }),
            Some("get_pair_by_id") => id
                .map(|id| ApiRequest::GetPairById { id })
                .ok_or_else(|| TrainerError::InvalidParameter("id is required".into())),
            Some(other) => Err(TrainerError::InvalidParameter(format!("unknown action '{other}'"))),
            None => Err(TrainerError::InvalidParameter("action is required".into())),
        }
    }
}

fn parse_int(field: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| TrainerError::InvalidParameter(format!("{field} must be an integer, got '{raw}'")))
}

fn parse_count(raw: &str) -> Result<usize> {
    let n = parse_int("count", raw)?;
    let count = usize::try_from(n)
        .map_err(|_| TrainerError::InvalidParameter(format!("count must not be negative, got {n}")))?;
    if count > MAX_COUNT {
        return Err(TrainerError::InvalidParameter(format!(
            "count must be at most {MAX_COUNT}, got {count}"
        )));
    }
    Ok(count)
}

/// Execute a parsed request.
pub async fn execute(service: &PairingService, request: ApiRequest) -> Result<Value> {
    let data = match request {
        ApiRequest::GeneratePairs { count, conditions } => {
            serde_json::to_value(service.generate_multiple(count, conditions).await?)
        }
        ApiRequest::GetRandomPairs { count, conditions } => {
            serde_json::to_value(service.get_random_pairs(count, conditions).await?)
        }
        ApiRequest::GetPairById { id } => {
            let pair = service
                .get_pair_by_id(&id)?
                .ok_or_else(|| TrainerError::NotFound(id.clone()))?;
            serde_json::to_value(pair)
        }
    };
    data.map_err(|e| TrainerError::StorageReadError(format!("serializing response: {e}")))
}

/// Parse and execute a query string, folding any error into the envelope.
pub async fn dispatch(service: &PairingService, query: &str) -> ApiResponse {
    let outcome = match ApiRequest::parse(query) {
        Ok(request) => execute(service, request).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            warn!(kind = e.kind(), "query failed: {e}");
            ApiResponse::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Age, Gender};
    use crate::pairing::test_support::{fixture_with, stored_face};

    #[test]
    fn parse_generate_pairs() {
        let request = ApiRequest::parse("action=generate_pairs&count=3&age=40&gender=male").unwrap();
        assert_eq!(
            request,
            ApiRequest::GeneratePairs {
                count: 3,
                conditions: PairConditions {
                    age: Some(Age::new(40).unwrap()),
                    gender: Some(Gender::Male),
                },
            }
        );
    }

    #[test]
    fn count_defaults_to_five() {
        let request = ApiRequest::parse("?action=get_random_pairs&age=&gender=").unwrap();
        assert_eq!(
            request,
            ApiRequest::GetRandomPairs {
                count: DEFAULT_COUNT,
                conditions: PairConditions::any(),
            }
        );
    }

    #[test]
    fn parse_rejections() {
        for query in [
            "action=get_pair_by_id",
            "action=delete_everything",
            "count=3",
            "action=generate_pairs&age=35",
            "action=generate_pairs&gender=other",
            "action=generate_pairs&count=-1",
            "action=generate_pairs&count=many",
            "action=generate_pairs&count=101",
            "action=get_random_pairs&count=9000000000000000000",
        ] {
            assert!(
                matches!(ApiRequest::parse(query), Err(TrainerError::InvalidParameter(_))),
                "{query} should be rejected"
            );
        }
    }

    #[test]
    fn error_envelope_shape() {
        let response = ApiResponse::from_error(&TrainerError::NotFound("x".into()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"], TrainerError::NotFound("x".into()).user_message());
    }

    #[tokio::test]
    async fn dispatch_lookup() {
        let fx = fixture_with(vec![stored_face("img_known", 20, Gender::Male)]);

        let found = dispatch(&fx.service, "action=get_pair_by_id&id=img_known").await;
        assert!(found.success);
        assert_eq!(found.data.unwrap()["id"], "img_known");

        let missing = dispatch(&fx.service, "action=get_pair_by_id&id=img_nope").await;
        assert!(!missing.success);
        assert_eq!(missing.error.unwrap(), TrainerError::NotFound(String::new()).user_message());
    }

    #[tokio::test]
    async fn oversized_count_is_an_error_envelope() {
        let fx = fixture_with(Vec::new());
        let response = dispatch(&fx.service, "action=generate_pairs&count=9000000000000000000").await;
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("The request was not valid"));
        assert_eq!(fx.backend.calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let at_limit = ApiRequest::parse(&format!("action=get_random_pairs&count={MAX_COUNT}")).unwrap();
        assert!(matches!(at_limit, ApiRequest::GetRandomPairs { count: MAX_COUNT, .. }));
    }

    #[tokio::test]
    async fn dispatch_generate() {
        let fx = fixture_with(Vec::new());
        let response = dispatch(&fx.service, "action=generate_pairs&count=2&age=70&gender=female").await;
        assert!(response.success);
        let pairs = response.data.unwrap();
        let pairs = pairs.as_array().unwrap();
        assert_eq!(pairs.len(), 2);
        for pair in pairs {
            assert_eq!(pair["age"], 70);
            assert_eq!(pair["gender"], "female");
        }
    }
}
