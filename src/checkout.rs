//! Turning the cart into a room-service order.
//!
//! Building the payload is a pure read of the cart. [`place_order`] submits
//! it and clears the cart only when the backend accepts the order; on
//! failure the cart is left exactly as it was so the guest can retry.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use crate::api::RequestSubmitter;
use crate::cart::{LineKey, OrderCart, OrderLine, ToppingSelection, round_cents};
use crate::models::{RequestKind, RequestPayload, SubmissionResponse};
use crate::session::GuestSession;
use crate::storage::CartPersistence;
use crate::Result;

/// Payment method tag: charged to the guest's room.
const ROOM_CHARGE: &str = "habitacion";

/// Formats an amount in soles: `S/13.00`.
pub fn format_price(amount: Decimal) -> String {
    format!("S/{:.2}", round_cents(amount))
}

/// Reason an order was rejected before it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    EmptyCart,
    BelowMinimum { subtotal: Decimal, minimum: Decimal },
    MissingGuest,
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "Tu carrito está vacío"),
            Self::BelowMinimum { minimum, .. } => {
                write!(f, "Pedido mínimo {}", format_price(*minimum))
            }
            Self::MissingGuest => write!(f, "Inicia sesión para hacer un pedido"),
        }
    }
}

impl std::error::Error for CheckoutError {}

/// Per-line entry of the structured breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownLine {
    pub key: LineKey,
    pub product_id: String,
    pub name: String,
    pub qty: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    pub selected_toppings: ToppingSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&OrderLine> for BreakdownLine {
    fn from(line: &OrderLine) -> Self {
        Self {
            key: line.key.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            qty: line.quantity,
            unit_price: line.unit_price,
            line_total: round_cents(line.line_total()),
            selected_toppings: line.selected_toppings.clone(),
            notes: line.notes.clone(),
        }
    }
}

/// `meta` block of a room-service request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMeta {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub payment: String,
    pub is_open_now: bool,
    pub room: String,
    pub items: Vec<BreakdownLine>,
}

/// Order-level choices made on the checkout screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// Free-text notes for the kitchen.
    pub notes: Option<String>,
    /// Room the order is charged to.
    pub room: String,
    /// Whether the restaurant is open; closed orders are scheduled for
    /// opening time.
    pub is_open: bool,
    /// Smallest subtotal accepted.
    pub minimum_order: Decimal,
}

impl CheckoutOptions {
    /// Options charging the guest's own unit.
    pub fn for_session(session: &GuestSession, is_open: bool, minimum_order: Decimal) -> Self {
        Self {
            notes: None,
            room: session.room_label(),
            is_open,
            minimum_order,
        }
    }

    /// Builder-style notes setter; blank notes are dropped.
    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        let notes = notes.trim();
        self.notes = (!notes.is_empty()).then(|| notes.to_string());
        self
    }
}

/// Human-readable description of each line:
/// `"2 x Helado (Sabores: vanilla (2)) — S/26.00"`.
pub fn line_descriptions(lines: &[OrderLine]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let summary = if line.selected_text.is_empty() {
                String::new()
            } else {
                format!(" ({})", line.selected_text)
            };
            format!(
                "{} x {}{} — {}",
                line.quantity,
                line.name,
                summary,
                format_price(line.line_total())
            )
        })
        .collect()
}

/// Structured breakdown of the lines and their totals.
pub fn order_meta(lines: &[OrderLine], options: &CheckoutOptions) -> OrderMeta {
    let subtotal = round_cents(lines.iter().map(OrderLine::line_total).sum());
    OrderMeta {
        subtotal,
        total: subtotal,
        payment: ROOM_CHARGE.to_string(),
        is_open_now: options.is_open,
        room: options.room.clone(),
        items: lines.iter().map(BreakdownLine::from).collect(),
    }
}

/// Builds the submission payload for the current lines.
///
/// Item strings are the line descriptions followed by the order notes, the
/// payment line and, when the restaurant is closed, a scheduling note.
pub fn build_order_payload(
    lines: &[OrderLine],
    session: &GuestSession,
    options: &CheckoutOptions,
    now: DateTime<Utc>,
) -> RequestPayload {
    let mut items = line_descriptions(lines);
    if let Some(notes) = &options.notes {
        items.push(format!("Notas: {notes}"));
    }
    items.push(format!("Pago: Cargo a habitación {}", options.room));
    if !options.is_open {
        items.push("Programado para apertura".to_string());
    }

    RequestPayload {
        guest_name: session.guest_name.clone(),
        document: session.document.clone(),
        property: session.property.clone(),
        phone: session.phone.clone(),
        kind: RequestKind::RoomService,
        items,
        notes: None,
        submitted_at: now,
        meta: Some(order_meta(lines, options)),
    }
}

/// Submits the cart as a room-service order.
///
/// The cart is cleared only after the submitter reports success.
///
/// # Errors
///
/// Returns [`ConciergeError::Checkout`](crate::ConciergeError::Checkout)
/// if the cart is empty, below the minimum order, or there is no guest;
/// otherwise whatever error the submitter reports. In every error case the
/// cart is unchanged.
pub async fn place_order<P, S>(
    cart: &mut OrderCart<P>,
    session: &GuestSession,
    submitter: &S,
    options: &CheckoutOptions,
) -> Result<SubmissionResponse>
where
    P: CartPersistence,
    S: RequestSubmitter,
{
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    if session.guest_name.is_empty() || session.property.is_empty() {
        return Err(CheckoutError::MissingGuest.into());
    }
    let subtotal = cart.subtotal();
    if subtotal < options.minimum_order {
        return Err(CheckoutError::BelowMinimum {
            subtotal,
            minimum: options.minimum_order,
        }
        .into());
    }

    let payload = build_order_payload(cart.lines(), session, options, Utc::now());

    match submitter.submit(&payload).await {
        Ok(response) => {
            info!(
                lines = cart.lines().len(),
                subtotal = %subtotal,
                room = %options.room,
                "Room-service order submitted"
            );
            cart.clear();
            Ok(response)
        }
        Err(e) => {
            error!(error = %e, "Order submission failed, cart kept");
            Err(e)
        }
    }
}
