//! Wire models for the guest-services backend.
//!
//! Field names follow the backend's JSON contract (`_id`, `priceBase`,
//! `solicitudes`...), renamed into snake_case Rust fields with serde.

pub mod menu;
pub mod request;
pub mod reservation;

pub use menu::{
    CategoryChip, CategoryEmbed, ChipsResponse, MenuResponse, MenuSection, Product, Topping,
    ToppingCatalog,
};
pub use request::{
    RequestKind, RequestPatch, RequestPayload, RequestStatus, ServiceRequest, SubmissionResponse,
};
pub use reservation::{CheckinData, CheckinsResponse, LookupStatus};

use serde::Deserialize;

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /restaurant/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantStatus {
    pub is_open: bool,
}
