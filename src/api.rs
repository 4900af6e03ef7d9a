//! HTTP client for the guest-services backend.
//!
//! Every call goes through [`ApiClient`], which attaches the bearer token
//! when one is configured and turns non-2xx responses into
//! [`ConciergeError::Api`] carrying the server's `message`.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::hours::BusinessHours;
use crate::models::{
    ApiErrorBody, CategoryChip, CheckinData, CheckinsResponse, ChipsResponse, MenuResponse,
    RequestPatch, RequestPayload, RestaurantStatus, ServiceRequest, SubmissionResponse,
};
use crate::session::GuestSession;
use crate::{ConciergeError, Result};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Capability to submit a service request to the backend.
pub trait RequestSubmitter: Send + Sync {
    /// Submits `payload`, returning the backend's acknowledgement.
    fn submit(
        &self,
        payload: &RequestPayload,
    ) -> impl Future<Output = Result<SubmissionResponse>> + Send;
}

/// Backend API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `https://host/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<Zeroizing<String>>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `/reserva/checkins-activos/{document}` with the document as a single
    /// percent-encoded path segment.
    fn checkins_url(&self, document: &str) -> Result<reqwest::Url> {
        let invalid = || ConciergeError::Config(format!("invalid API URL {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.url("/reserva/checkins-activos"))
            .map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .push(document);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let response = self.authorize(self.http.get(self.url(path))).send().await?;
        decode(response, context).await
    }

    /// Fetches the public menu, grouped by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn fetch_menu(&self) -> Result<MenuResponse> {
        let menu: MenuResponse = self
            .get("/menu/publico", "Error al obtener el menú")
            .await?;
        debug!(sections = menu.sections.len(), "Fetched menu");
        Ok(menu)
    }

    /// Fetches category chips sorted by display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn fetch_menu_chips(&self) -> Result<Vec<CategoryChip>> {
        let response: ChipsResponse = self
            .get("/menu/chips", "Error al obtener las categorías")
            .await?;
        let mut chips = response.chips;
        chips.sort_by_key(|c| c.order);
        Ok(chips)
    }

    /// Creates a service request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn submit_request(&self, payload: &RequestPayload) -> Result<SubmissionResponse> {
        let response = self
            .authorize(self.http.post(self.url("/solicitudes")))
            .json(payload)
            .send()
            .await?;
        let ack: SubmissionResponse = decode(response, "Error al crear la solicitud").await?;
        info!(kind = ?payload.kind, items = payload.items.len(), "Submitted request");
        Ok(ack)
    }

    /// Lists every request visible to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn list_requests(&self) -> Result<Vec<ServiceRequest>> {
        self.get("/solicitudes", "Error al obtener las solicitudes")
            .await
    }

    /// Lists the requests made by the signed-in guest.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn list_requests_for(&self, session: &GuestSession) -> Result<Vec<ServiceRequest>> {
        let all = self.list_requests().await?;
        let total = all.len();
        let own: Vec<ServiceRequest> = all
            .into_iter()
            .filter(|r| session.owns(&r.guest_name, &r.property))
            .collect();
        debug!(total, own = own.len(), "Filtered requests for guest");
        Ok(own)
    }

    /// Applies a status change or rating to a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn update_request(&self, id: &str, patch: &RequestPatch) -> Result<SubmissionResponse> {
        let response = self
            .authorize(self.http.patch(self.url(&format!("/solicitudes/{id}"))))
            .json(patch)
            .send()
            .await?;
        decode(response, "Error al actualizar la solicitud").await
    }

    /// Transport slots already taken on `date` (`"09:00"`, `"16:30"`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn busy_transport_slots(&self, date: NaiveDate) -> Result<Vec<String>> {
        let response = self
            .authorize(self.http.get(self.url("/solicitudes/movilidad/ocupadas")))
            .query(&[("fecha", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;
        decode(response, "Error al obtener horarios ocupados").await
    }

    /// Looks up active stays for a guest document number.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] for a blank document, or
    /// an error if the request fails or the backend rejects it.
    pub async fn find_stays(&self, document: &str) -> Result<Vec<CheckinData>> {
        let document = document.trim();
        if document.is_empty() {
            return Err(ConciergeError::InvalidRequest(
                "Ingresa tu número de documento".to_string(),
            ));
        }
        let response = self
            .authorize(self.http.get(self.checkins_url(document)?))
            .send()
            .await?;
        let response: CheckinsResponse =
            decode(response, "Error al consultar check-ins activos").await?;
        Ok(response.stays().to_vec())
    }

    /// Asks the backend whether the restaurant is open, falling back to the
    /// local schedule when it cannot answer.
    pub async fn restaurant_is_open(&self, hours: &BusinessHours) -> bool {
        match self
            .get::<RestaurantStatus>("/restaurant/status", "Error al consultar el restaurante")
            .await
        {
            Ok(status) => status.is_open,
            Err(e) => {
                warn!(error = %e, "Restaurant status unavailable, using local hours");
                hours.is_open_now()
            }
        }
    }
}

impl RequestSubmitter for ApiClient {
    async fn submit(&self, payload: &RequestPayload) -> Result<SubmissionResponse> {
        self.submit_request(payload).await
    }
}

/// Decodes a JSON body, mapping error statuses to [`ConciergeError::Api`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| context.to_string());

    Err(ConciergeError::Api {
        status: Some(status.as_u16()),
        message,
    })
}
