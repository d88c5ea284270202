//! Typed payloads for the marketplace resources
//!
//! The API wraps every payload as `{"status": "success", "data": ...}`; list
//! endpoints add a `results` count. Models keep unknown fields in `extra` so
//! newer server fields survive a round trip through the CLI.

pub mod marketplace;

pub use marketplace::{Marketplace, PropertyQuery};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// Standard response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// `success`, `fail` or `error`
    pub status: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    /// Item count on list endpoints
    #[serde(default)]
    pub results: Option<u64>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload of a `success` envelope
    pub fn into_data(self) -> Result<T, ApiError> {
        if self.status != "success" {
            let message = match self.message {
                Some(message) => message,
                None => format!("status {}", self.status),
            };
            return Err(ApiError::Rejected(message));
        }
        self.data
            .ok_or_else(|| ApiError::Rejected("response carried no data".to_string()))
    }
}

/// A property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub location: Option<String>,
    /// `sale` or `rent`
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A marketplace account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// `user` or `admin`
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A purchase or rental order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Property id, or the populated property document
    #[serde(default)]
    pub property: Value,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A property viewing appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub property: Value,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A request to book a viewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub property: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A discount coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    pub code: String,
    /// Percentage off
    pub discount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Body returned by the login endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
    #[serde(default)]
    pub data: Option<Value>,
}
