//! Non-food service requests and the guest's request history.
//!
//! [`ServiceRequestDraft`] collects what the guest picked on a request
//! screen and turns it into a [`RequestPayload`]. [`RequestFeed`] holds the
//! guest's requests and folds in realtime events, de-duplicating by id.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::RequestSubmitter;
use crate::models::{RequestKind, RequestPayload, RequestStatus, ServiceRequest, SubmissionResponse};
use crate::realtime::RequestEvent;
use crate::session::GuestSession;
use crate::{ConciergeError, Result};

/// Largest party a single transport booking may carry.
pub const MAX_PASSENGERS: u32 = 4;

/// Highest rating a guest may give.
pub const MAX_RATING: u8 = 5;

/// Transport booking details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportDetails {
    /// Slot label, e.g. `"09:00"`.
    pub slot: String,
    pub pickup: String,
    pub passengers: u32,
}

/// A service request being filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequestDraft {
    pub kind: RequestKind,
    pub items: Vec<String>,
    pub notes: String,
    pub transport: Option<TransportDetails>,
}

impl ServiceRequestDraft {
    /// Empty draft for `kind`.
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            notes: String::new(),
            transport: None,
        }
    }

    /// Toggles an item. Single-choice kinds replace the current pick.
    pub fn toggle(&mut self, item: &str) {
        if let Some(pos) = self.items.iter().position(|i| i == item) {
            self.items.remove(pos);
        } else if self.kind.is_single_choice() {
            self.items = vec![item.to_string()];
        } else {
            self.items.push(item.to_string());
        }
    }

    /// Sets the transport booking.
    #[must_use]
    pub fn with_transport(mut self, slot: &str, pickup: &str, passengers: u32) -> Self {
        self.transport = Some(TransportDetails {
            slot: slot.trim().to_string(),
            pickup: pickup.trim().to_string(),
            passengers,
        });
        self
    }

    /// Sets free-text notes.
    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.trim().to_string();
        self
    }

    /// Checks the draft can be sent.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] with a guest-facing message.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ConciergeError::InvalidRequest(msg.to_string()));

        match self.kind {
            RequestKind::RoomService | RequestKind::Other => {
                return invalid("Tipo de solicitud no disponible");
            }
            RequestKind::Transport => {
                let Some(t) = &self.transport else {
                    return invalid("Completa los datos de movilidad");
                };
                if t.slot.is_empty() {
                    return invalid("Selecciona un horario");
                }
                if t.pickup.is_empty() {
                    return invalid("Indica el lugar de recojo");
                }
                if t.passengers == 0 || t.passengers > MAX_PASSENGERS {
                    return invalid("Número de pasajeros inválido");
                }
            }
            _ => {}
        }

        if self.items.is_empty() {
            return invalid("Selecciona al menos un ítem");
        }
        Ok(())
    }

    /// Builds the submission payload.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] if the draft is incomplete.
    pub fn build(&self, session: &GuestSession, now: DateTime<Utc>) -> Result<RequestPayload> {
        self.validate()?;

        let mut items = self.items.clone();
        if let Some(t) = &self.transport {
            items.push(format!("Horario: {}", t.slot));
            items.push(format!("Recojo en: {}", t.pickup));
            items.push(format!("Pasajeros: {}", t.passengers));
        }

        Ok(RequestPayload {
            guest_name: session.guest_name.clone(),
            document: session.document.clone(),
            property: session.property.clone(),
            phone: session.phone.clone(),
            kind: self.kind,
            items,
            notes: (!self.notes.is_empty()).then(|| self.notes.clone()),
            submitted_at: now,
            meta: None,
        })
    }

    /// Validates and submits the draft.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] if the draft is incomplete,
    /// otherwise whatever the submitter reports.
    pub async fn submit<S: RequestSubmitter>(
        &self,
        session: &GuestSession,
        submitter: &S,
    ) -> Result<SubmissionResponse> {
        let payload = self.build(session, Utc::now())?;
        let response = submitter.submit(&payload).await?;
        info!(kind = ?self.kind, items = payload.items.len(), "Service request sent");
        Ok(response)
    }
}

/// The guest's requests, newest first.
#[derive(Debug, Clone)]
pub struct RequestFeed {
    session: GuestSession,
    requests: Vec<ServiceRequest>,
}

impl RequestFeed {
    /// Empty feed for `session`.
    pub fn new(session: GuestSession) -> Self {
        Self {
            session,
            requests: Vec::new(),
        }
    }

    /// Replaces the feed with a fetched list, keeping only this guest's
    /// requests.
    pub fn load(&mut self, requests: Vec<ServiceRequest>) {
        self.requests = requests
            .into_iter()
            .filter(|r| self.session.owns(&r.guest_name, &r.property))
            .collect();
        debug!(requests = self.requests.len(), "Loaded request feed");
    }

    /// Folds a pushed event into the feed.
    ///
    /// Returns `true` if the feed changed. Events for other guests and
    /// repeated "created" events are ignored; an "updated" event for an
    /// unknown id is ignored too.
    pub fn apply(&mut self, event: RequestEvent) -> bool {
        let request = event.request();
        if !self.session.owns(&request.guest_name, &request.property) {
            return false;
        }

        match event {
            RequestEvent::Created(request) => {
                if self.requests.iter().any(|r| r.id == request.id) {
                    debug!(id = %request.id, "Duplicate request event ignored");
                    return false;
                }
                self.requests.insert(0, request);
                true
            }
            RequestEvent::Updated(request) => {
                match self.requests.iter_mut().find(|r| r.id == request.id) {
                    Some(slot) => {
                        *slot = request;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Requests to show; settled ones only when `show_settled`.
    pub fn visible(&self, show_settled: bool) -> Vec<&ServiceRequest> {
        self.requests
            .iter()
            .filter(|r| show_settled || !r.is_settled())
            .collect()
    }

    /// Looks up a request by id.
    pub fn get(&self, id: &str) -> Option<&ServiceRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Marks a request cancelled locally.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] if the request is unknown
    /// or can no longer be cancelled.
    pub fn cancel(&mut self, id: &str) -> Result<()> {
        let request = self.find_mut(id)?;
        if !request.status.is_cancellable() {
            return Err(ConciergeError::InvalidRequest(
                "La solicitud ya no se puede cancelar".to_string(),
            ));
        }
        request.status = RequestStatus::Cancelled;
        Ok(())
    }

    /// Records a rating locally.
    ///
    /// # Errors
    ///
    /// Returns [`ConciergeError::InvalidRequest`] if the request is unknown,
    /// not attended yet, or the rating is outside `1..=5`.
    pub fn rate(&mut self, id: &str, rating: u8) -> Result<()> {
        if !(1..=MAX_RATING).contains(&rating) {
            return Err(ConciergeError::InvalidRequest(
                "La calificación debe estar entre 1 y 5".to_string(),
            ));
        }
        let request = self.find_mut(id)?;
        if request.status != RequestStatus::Attended {
            return Err(ConciergeError::InvalidRequest(
                "Solo se pueden calificar solicitudes atendidas".to_string(),
            ));
        }
        request.rating = Some(rating);
        request.rating_attempts += 1;
        Ok(())
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut ServiceRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ConciergeError::InvalidRequest(format!("unknown request {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GuestSession {
        GuestSession {
            guest_name: "Ana".to_string(),
            property: "Casa YV 19".to_string(),
            document: "123".to_string(),
            ..GuestSession::default()
        }
    }

    #[test]
    fn single_choice_kinds_replace_selection() {
        let mut draft = ServiceRequestDraft::new(RequestKind::LateCheckout);
        draft.toggle("a");
        draft.toggle("b");
        assert_eq!(draft.items, vec!["b".to_string()]);

        let mut draft = ServiceRequestDraft::new(RequestKind::Amenities);
        draft.toggle("Shampoo");
        draft.toggle("Toallas");
        draft.toggle("Shampoo");
        assert_eq!(draft.items, vec!["Toallas".to_string()]);
    }

    #[test]
    fn empty_draft_is_rejected() {
        let draft = ServiceRequestDraft::new(RequestKind::Minibar);
        assert!(matches!(
            draft.build(&session(), Utc::now()),
            Err(ConciergeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn room_service_is_not_a_draft_kind() {
        let mut draft = ServiceRequestDraft::new(RequestKind::RoomService);
        draft.toggle("Lomo");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn transport_adds_booking_lines() {
        let mut draft = ServiceRequestDraft::new(RequestKind::Transport)
            .with_transport("09:00", " Recepción ", 3)
            .with_notes("  ");
        draft.toggle("Personalizado");
        let payload = draft.build(&session(), Utc::now()).unwrap();

        assert_eq!(
            payload.items,
            vec![
                "Personalizado".to_string(),
                "Horario: 09:00".to_string(),
                "Recojo en: Recepción".to_string(),
                "Pasajeros: 3".to_string(),
            ]
        );
        assert_eq!(payload.notes, None);
        assert!(payload.meta.is_none());
    }

    #[test]
    fn transport_requires_valid_party() {
        let mut draft =
            ServiceRequestDraft::new(RequestKind::Transport).with_transport("09:00", "Lobby", 0);
        draft.toggle("Personalizado");
        assert!(draft.validate().is_err());

        let draft = draft.with_transport("09:00", "Lobby", MAX_PASSENGERS + 1);
        assert!(draft.validate().is_err());
    }
}
