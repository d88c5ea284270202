//! Typed facade over the marketplace endpoints
//!
//! Reads go through the shared response cache. Mutations clear it on success
//! so the next listing reflects the change.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::{
    Appointment, AppointmentRequest, Coupon, Envelope, LoginResponse, Order, Property, User,
};
use crate::api::{
    create_custom_client, ApiClient, ApiError, CustomClient, CustomClientConfig, FilePart,
    RequestConfig,
};

/// Paging for property listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PropertyQuery {
    fn default() -> Self {
        Self { page: 1, limit: 12 }
    }
}

impl PropertyQuery {
    fn to_config(self) -> RequestConfig {
        RequestConfig::new()
            .param("page", self.page)
            .param("limit", self.limit)
    }
}

/// Marketplace operations on top of an [`ApiClient`]
#[derive(Debug, Clone)]
pub struct Marketplace {
    client: ApiClient,
}

impl Marketplace {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// One page of property listings
    pub async fn properties(&self, query: PropertyQuery) -> Result<Vec<Property>, ApiError> {
        self.read("/properties", query.to_config()).await
    }

    pub async fn property(&self, id: &str) -> Result<Property, ApiError> {
        let path = format!("/properties/{id}");
        self.read(&path, RequestConfig::new()).await
    }

    /// The signed-in user
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.read("/users/me", RequestConfig::new()).await
    }

    pub async fn favorites(&self) -> Result<Vec<Property>, ApiError> {
        self.read("/users/favorites", RequestConfig::new()).await
    }

    /// Adds or removes a property from the user's favorites; returns the
    /// updated list of favorite ids
    pub async fn toggle_favorite(&self, property_id: &str) -> Result<Vec<String>, ApiError> {
        self.write_post(&format!("/users/favorites/{property_id}"), None::<&Value>)
            .await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.read("/orders", RequestConfig::new()).await
    }

    pub async fn update_order_status(&self, id: &str, status: &str) -> Result<Order, ApiError> {
        let response = self
            .client
            .put::<Envelope<Order>, _>(
                &format!("/orders/{id}"),
                Some(&json!({ "status": status })),
                RequestConfig::new(),
            )
            .await?;
        self.client.clear_cache();
        response.data.into_data()
    }

    pub async fn appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.read("/appointments", RequestConfig::new()).await
    }

    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        self.write_post("/appointments", Some(request)).await
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<(), ApiError> {
        self.remove(&format!("/appointments/{id}")).await
    }

    pub async fn coupons(&self) -> Result<Vec<Coupon>, ApiError> {
        self.read("/coupons", RequestConfig::new()).await
    }

    pub async fn create_coupon(&self, coupon: &Coupon) -> Result<Coupon, ApiError> {
        self.write_post("/coupons", Some(coupon)).await
    }

    pub async fn update_coupon(&self, id: &str, coupon: &Coupon) -> Result<Coupon, ApiError> {
        let path = format!("/coupons/{id}");
        let response = self
            .client
            .put::<Envelope<Coupon>, _>(&path, Some(coupon), RequestConfig::new())
            .await?;
        self.client.clear_cache();
        response.data.into_data()
    }

    pub async fn delete_coupon(&self, id: &str) -> Result<(), ApiError> {
        self.remove(&format!("/coupons/{id}")).await
    }

    /// Exchanges credentials for a token and stores it.
    ///
    /// The cache is cleared so no response fetched under a previous identity
    /// is served afterwards.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .post::<LoginResponse, _>(
                "/users/login",
                Some(&json!({ "email": email, "password": password })),
                RequestConfig::new(),
            )
            .await?;
        let login = response.data;
        if login.status != "success" || login.token.is_empty() {
            return Err(ApiError::Rejected("login returned no token".to_string()));
        }

        self.client.tokens().store_token(&login.token)?;
        self.client.clear_cache();
        info!(email, "logged in");
        Ok(login)
    }

    /// Forgets the stored token and every cached response
    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.tokens().clear_token()?;
        self.client.clear_cache();
        Ok(())
    }

    /// Client for multipart uploads: same base URL, explicit bearer token,
    /// nothing else shared with the primary client
    pub fn media_client(&self) -> Result<CustomClient, ApiError> {
        let mut config = CustomClientConfig::new(self.client.base_url());
        if let Some(token) = self.client.tokens().token() {
            config = config.bearer_token(&token)?;
        }
        create_custom_client(config)
    }

    /// Uploads media attachments and returns the server's payload (typically
    /// the stored file URLs)
    pub async fn upload_media(&self, path: &str, files: Vec<FilePart>) -> Result<Value, ApiError> {
        let uploader = self.media_client()?;
        let response = uploader
            .upload::<Envelope<Value>>(path, files, RequestConfig::new())
            .await?;
        response.data.into_data()
    }

    async fn read<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        self.client
            .get::<Envelope<T>>(path, config, true)
            .await?
            .data
            .into_data()
    }

    async fn write_post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post::<Envelope<T>, B>(path, body, RequestConfig::new())
            .await?;
        self.client.clear_cache();
        response.data.into_data()
    }

    async fn remove(&self, path: &str) -> Result<(), ApiError> {
        self.client
            .delete::<Value>(path, RequestConfig::new())
            .await?;
        self.client.clear_cache();
        Ok(())
    }
}
