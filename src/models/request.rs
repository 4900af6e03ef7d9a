//! Service request ("solicitud") models.
//!
//! A request is created by the guest with a kind tag and a list of
//! human-readable items, then moves through the staff-side statuses
//! `enviada` → `revisada` → `atendida` (or `cancelada`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::OrderMeta;

/// Kind of service request (wire name in parentheses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Room-service food order (`"RoomService"`).
    RoomService,
    /// Toiletries and linen (`"Amenidades"`).
    #[serde(rename = "Amenidades")]
    Amenities,
    /// Minibar restocking (`"Minibar"`).
    Minibar,
    /// Internal transport (`"Movilidad"`).
    #[serde(rename = "Movilidad")]
    Transport,
    /// Late checkout (`"LateCheckout"`).
    LateCheckout,
    /// Emergency (`"Emergencia"`).
    #[serde(rename = "Emergencia")]
    Emergency,
    /// Any kind this client does not know about.
    #[serde(other)]
    Other,
}

impl RequestKind {
    /// Guest-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::RoomService => "Room Service",
            Self::Amenities => "Amenidades",
            Self::Minibar => "Minibar",
            Self::Transport => "Movilidad",
            Self::LateCheckout => "Late Check-out",
            Self::Emergency => "Emergencia",
            Self::Other => "Otro",
        }
    }

    /// Predefined items the guest can pick for this kind.
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Self::Amenities => &["Shampoo", "Jabón", "Papel Higiénico", "Toallas"],
            Self::Minibar => &[
                "Barra de granola",
                "Agua (con gas / sin gas)",
                "Gaseosas (Coca Cola / Inka Cola)",
                "Barra de cereal",
                "Bebidas regionales",
                "Chocolate",
                "Vino",
            ],
            Self::Transport => &["Personalizado"],
            Self::LateCheckout => &["Late Checkout solicitado"],
            Self::Emergency => &[
                "Falla en servicios",
                "Riesgo de seguridad",
                "Emergencia de salud",
                "Riesgo por fauna",
                "Problema de acceso",
            ],
            Self::RoomService | Self::Other => &[],
        }
    }

    /// Kinds where exactly one item may be selected.
    pub fn is_single_choice(self) -> bool {
        matches!(self, Self::Transport | Self::LateCheckout)
    }
}

/// Processing status set by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "enviada")]
    Sent,
    #[serde(rename = "revisada")]
    Reviewed,
    #[serde(rename = "atendida")]
    Attended,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl RequestStatus {
    /// Guest-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sent => "Pendiente",
            Self::Reviewed => "Revisada",
            Self::Attended => "Atendida",
            Self::Cancelled => "Cancelada",
        }
    }

    /// The guest may still cancel a request in this status.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Sent | Self::Reviewed)
    }
}

/// A request as stored by the backend and pushed over the realtime feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "tipo")]
    pub kind: RequestKind,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(rename = "observaciones", default)]
    pub notes: String,
    #[serde(rename = "estado")]
    pub status: RequestStatus,
    #[serde(rename = "mensajeRevisado", default, skip_serializing_if = "Option::is_none")]
    pub reviewed_message: Option<String>,
    #[serde(rename = "mensajeAtendido", default, skip_serializing_if = "Option::is_none")]
    pub attended_message: Option<String>,
    #[serde(rename = "calificacion", default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub created_at: String,
    #[serde(rename = "propiedad")]
    pub property: String,
    #[serde(rename = "nombre")]
    pub guest_name: String,
    #[serde(rename = "calificacionIntentos", default)]
    pub rating_attempts: u32,
}

impl ServiceRequest {
    /// Returns `true` once the request needs no further guest attention:
    /// cancelled, or attended and already rated.
    pub fn is_settled(&self) -> bool {
        match self.status {
            RequestStatus::Cancelled => true,
            RequestStatus::Attended => self.rating.is_some(),
            RequestStatus::Sent | RequestStatus::Reviewed => false,
        }
    }
}

/// Body of `POST /solicitudes`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPayload {
    #[serde(rename = "nombre")]
    pub guest_name: String,
    #[serde(rename = "dni")]
    pub document: String,
    #[serde(rename = "propiedad")]
    pub property: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "tipo")]
    pub kind: RequestKind,
    pub items: Vec<String>,
    #[serde(rename = "observaciones", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "hora")]
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<OrderMeta>,
}

/// Response of `POST /solicitudes`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "solicitud", default)]
    pub request: Option<ServiceRequest>,
}

/// Body of `PATCH /solicitudes/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestPatch {
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(rename = "calificacion", skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl RequestPatch {
    /// Patch that cancels the request.
    pub fn cancel() -> Self {
        Self {
            status: Some(RequestStatus::Cancelled),
            rating: None,
        }
    }

    /// Patch that rates an attended request.
    pub fn rate(rating: u8) -> Self {
        Self {
            status: None,
            rating: Some(rating),
        }
    }
}
