//! Typed responses returned to callers

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::RawResponse;
use super::ApiError;

/// A successful response, decoded into the caller's payload type
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    /// Status of the network response; on a cache hit, the status that was
    /// cached with the payload
    pub status: StatusCode,
    /// Response headers (empty for cache hits)
    pub headers: HeaderMap,
    /// Whether the payload was served from the response cache
    pub from_cache: bool,
}

impl ApiResponse<Value> {
    /// Interprets a raw response: 2xx becomes a JSON payload, anything else an
    /// [`ApiError::Status`].
    ///
    /// A 2xx body that is not JSON is passed through as [`Value::String`];
    /// only [`decode`](Self::decode) into a typed payload rejects it.
    pub fn from_raw(raw: RawResponse) -> Result<Self, ApiError> {
        if !raw.status.is_success() {
            return Err(ApiError::from_status(raw.status, &raw.body));
        }
        Ok(Self {
            data: raw.json(),
            status: raw.status,
            headers: raw.headers,
            from_cache: false,
        })
    }

    /// Validates the JSON payload against `T`
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, ApiError> {
        Ok(ApiResponse {
            data: serde_json::from_value(self.data)?,
            status: self.status,
            headers: self.headers,
            from_cache: self.from_cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn raw(status: StatusCode, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Coupon {
        code: String,
        discount: u32,
    }

    #[test]
    fn test_from_raw_success_decodes() {
        let body = r#"{"code":"SPRING","discount":10}"#;
        let response = ApiResponse::from_raw(raw(StatusCode::CREATED, body))
            .unwrap()
            .decode::<Coupon>()
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert!(!response.from_cache);
        assert_eq!(
            response.data,
            Coupon {
                code: "SPRING".to_string(),
                discount: 10
            }
        );
    }

    #[test]
    fn test_from_raw_error_status() {
        let body = r#"{"message":"admins only"}"#;
        let err = ApiResponse::from_raw(raw(StatusCode::FORBIDDEN, body)).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(err.to_string().contains("admins only"));
    }

    #[test]
    fn test_decode_rejects_mismatched_payload() {
        let response = ApiResponse::from_raw(raw(StatusCode::OK, r#"{"code":42}"#)).unwrap();
        let decoded = response.decode::<Coupon>();
        assert!(matches!(decoded, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_non_json_success_body_is_kept_as_string() {
        let response = ApiResponse::from_raw(raw(StatusCode::OK, "<h1>Maintenance</h1>")).unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data, "<h1>Maintenance</h1>");
        let decoded = response.decode::<Coupon>();
        assert!(matches!(decoded, Err(ApiError::Decode(_))));
    }
}
