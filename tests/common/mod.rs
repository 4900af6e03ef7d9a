//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use concierge::api::RequestSubmitter;
use concierge::cart::OrderLine;
use concierge::models::{MenuResponse, Product, RequestPayload, SubmissionResponse};
use concierge::session::GuestSession;
use concierge::storage::CartPersistence;
use concierge::{ConciergeError, Result};

pub const MENU_JSON: &str = include_str!("../fixtures/menu.json");

/// Parsed menu fixture.
pub fn menu() -> MenuResponse {
    serde_json::from_str(MENU_JSON).expect("Failed to parse menu fixture")
}

/// Product from the menu fixture by id.
pub fn product(id: &str) -> Product {
    menu()
        .find_product(id)
        .cloned()
        .unwrap_or_else(|| panic!("no product {id} in fixture"))
}

/// Product with no topping catalog.
pub fn plain_product(id: &str, price: &str) -> Product {
    serde_json::from_value(serde_json::json!({
        "_id": id,
        "slug": id,
        "name": id,
        "priceBase": price,
    }))
    .expect("Failed to build product")
}

/// Signed-in guest matching the fixtures.
pub fn session() -> GuestSession {
    GuestSession {
        guest_name: "Ana Torres".to_string(),
        email: "ana@example.com".to_string(),
        phone: "+51 999 888 777".to_string(),
        property: "Casa YV 19".to_string(),
        check_in: "10/03/2025".to_string(),
        check_out: "12/03/2025".to_string(),
        document: "44556677".to_string(),
    }
}

/// Submitter that records payloads and succeeds or fails on demand.
#[derive(Default)]
pub struct FakeSubmitter {
    pub fail: bool,
    pub sent: Mutex<Vec<RequestPayload>>,
}

impl FakeSubmitter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<RequestPayload> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

impl RequestSubmitter for FakeSubmitter {
    async fn submit(&self, payload: &RequestPayload) -> Result<SubmissionResponse> {
        self.sent.lock().expect("lock poisoned").push(payload.clone());
        if self.fail {
            return Err(ConciergeError::Api {
                status: Some(500),
                message: "Error al crear la solicitud".to_string(),
            });
        }
        Ok(SubmissionResponse {
            message: Some("Solicitud creada".to_string()),
            request: None,
        })
    }
}

/// Cart persistence whose first `failures` saves fail. Clones share state.
#[derive(Clone, Default)]
pub struct FlakyCartStore {
    failures: usize,
    attempts: Arc<AtomicUsize>,
    saved: Arc<Mutex<Option<Vec<OrderLine>>>>,
}

impl FlakyCartStore {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<Vec<OrderLine>> {
        self.saved.lock().expect("lock poisoned").clone()
    }
}

impl CartPersistence for FlakyCartStore {
    async fn load(&self) -> Result<Option<Vec<OrderLine>>> {
        Ok(self.saved())
    }

    async fn save(&self, lines: &[OrderLine]) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(ConciergeError::Storage("disk full".to_string()));
        }
        *self.saved.lock().expect("lock poisoned") = Some(lines.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.saved.lock().expect("lock poisoned") = None;
        Ok(())
    }
}
