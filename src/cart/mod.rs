//! Room-service shopping cart.
//!
//! [`OrderCart`] keeps one [`OrderLine`] per distinct product + topping
//! selection. Mutations apply to memory immediately and hand a full
//! snapshot to a background writer task, which persists snapshots one at a
//! time in the order they were produced. Storage failures are logged and
//! never undo the in-memory change.

pub mod limits;
pub mod pricing;
pub mod selection;

use std::fmt;
use std::sync::Arc;

use base64::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::models::Product;
use crate::storage::CartPersistence;
pub use limits::{SelectionError, check_selection};
pub use pricing::{compute_unit_price, round_cents};
pub use selection::{ToppingSelection, describe_selection};

/// Identity of an order line, derived from product id and selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    /// Derives the key for a product id and a pruned selection.
    ///
    /// The selection is hashed in its canonical (sorted) JSON form, so
    /// equivalent selections always map to the same key.
    pub fn derive(product_id: &str, selection: &ToppingSelection) -> Self {
        let digest = Sha256::digest(selection.canonical_json().as_bytes());
        Self(format!(
            "{product_id}__{}",
            BASE64_URL_SAFE_NO_PAD.encode(digest)
        ))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One product + selection in the cart.
///
/// Name, price and summary are captured when the line is first added; later
/// catalog changes do not touch lines already in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub key: LineKey,
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub selected_toppings: ToppingSelection,
    #[serde(default)]
    pub selected_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderLine {
    /// `unit_price × quantity`, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Work queued for the background writer.
enum WriteCommand {
    Save(Vec<OrderLine>),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// In-memory cart backed by a persistence collaborator.
pub struct OrderCart<P: CartPersistence> {
    lines: Vec<OrderLine>,
    store: Arc<P>,
    writer: mpsc::UnboundedSender<WriteCommand>,
}

impl<P: CartPersistence> OrderCart<P> {
    /// Creates an empty cart and spawns its snapshot writer.
    ///
    /// Must be called from within a Tokio runtime. The writer task ends
    /// once the cart is dropped and every queued snapshot is written.
    pub fn new(store: P) -> Self {
        let store = Arc::new(store);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&store), rx));
        Self {
            lines: Vec::new(),
            store,
            writer: tx,
        }
    }

    /// Creates a cart and immediately restores the persisted snapshot.
    pub async fn open(store: P) -> Self {
        let mut cart = Self::new(store);
        cart.restore().await;
        cart
    }

    /// Replaces the cart wholesale with the persisted snapshot.
    ///
    /// A missing snapshot leaves the cart as is; a failed load is logged
    /// and leaves the cart empty.
    pub async fn restore(&mut self) {
        match self.store.load().await {
            Ok(Some(lines)) => {
                info!(lines = lines.len(), "Restored cart");
                self.lines = lines;
            }
            Ok(None) => debug!("No saved cart"),
            Err(e) => {
                warn!(error = %e, "Failed to load cart, starting empty");
                self.lines.clear();
            }
        }
    }

    /// Adds one unit of `product` with `selection`.
    ///
    /// Non-positive quantities are pruned first. If a line with the same
    /// key exists its quantity goes up by one (its price and summary are
    /// kept); otherwise a new line with quantity 1 is appended.
    pub fn add_to_cart(&mut self, product: &Product, selection: &ToppingSelection) -> LineKey {
        let selection = selection.pruned();
        let product_id = product.line_id();
        let key = LineKey::derive(product_id, &selection);

        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            line.quantity = line.quantity.saturating_add(1);
            debug!(key = %key, quantity = line.quantity, "Incremented cart line");
        } else {
            let unit_price =
                compute_unit_price(product.price_base, &selection, product.toppings.as_ref());
            let selected_text = describe_selection(&selection);
            debug!(
                product = %product.name,
                base_price = %product.price_base,
                unit_price = %unit_price,
                summary = %selected_text,
                "Added cart line"
            );
            self.lines.push(OrderLine {
                key: key.clone(),
                product_id: product_id.to_string(),
                name: product.name.clone(),
                unit_price,
                quantity: 1,
                selected_toppings: selection,
                selected_text,
                notes: None,
            });
        }

        self.persist();
        key
    }

    /// Changes a line's quantity by `delta`, removing it at zero or below.
    /// Unknown keys are ignored.
    pub fn update_quantity(&mut self, key: &LineKey, delta: i64) {
        let Some(idx) = self.lines.iter().position(|l| &l.key == key) else {
            return;
        };

        let next = i64::from(self.lines[idx].quantity).saturating_add(delta);
        if next <= 0 {
            let removed = self.lines.remove(idx);
            debug!(key = %removed.key, "Removed cart line");
        } else {
            self.lines[idx].quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }

        self.persist();
    }

    /// Sets a line's kitchen notes; blank text clears them.
    /// Unknown keys are ignored.
    pub fn set_notes(&mut self, key: &LineKey, notes: &str) {
        let Some(line) = self.lines.iter_mut().find(|l| &l.key == key) else {
            return;
        };

        let notes = notes.trim();
        line.notes = (!notes.is_empty()).then(|| notes.to_string());
        debug!(key = %key, has_notes = line.notes.is_some(), "Updated cart line notes");

        self.persist();
    }

    /// Empties the cart and deletes the persisted snapshot.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.send(WriteCommand::Clear);
        info!("Cleared cart");
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Looks up a line by key.
    pub fn line(&self, key: &LineKey) -> Option<&OrderLine> {
        self.lines.iter().find(|l| &l.key == key)
    }

    /// Returns `true` if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of all line totals, rounded to cents.
    pub fn subtotal(&self) -> Decimal {
        round_cents(self.lines.iter().map(OrderLine::line_total).sum())
    }

    /// Waits until every snapshot queued so far has been written.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(WriteCommand::Flush(tx));
        let _ = rx.await;
    }

    fn persist(&self) {
        self.send(WriteCommand::Save(self.lines.clone()));
    }

    fn send(&self, command: WriteCommand) {
        if self.writer.send(command).is_err() {
            warn!("Cart writer stopped, change kept in memory only");
        }
    }
}

/// Applies queued snapshot writes in order until the cart is dropped.
async fn run_writer<P: CartPersistence>(
    store: Arc<P>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Save(lines) => {
                if let Err(e) = store.save(&lines).await {
                    warn!(error = %e, lines = lines.len(), "Failed to save cart");
                }
            }
            WriteCommand::Clear => {
                if let Err(e) = store.clear().await {
                    warn!(error = %e, "Failed to delete saved cart");
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Cart writer finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CartStore, MemoryStore};
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Decimal) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "slug": id,
            "name": id.to_uppercase(),
            "priceBase": price.to_string(),
        }))
        .unwrap()
    }

    #[test]
    fn key_is_order_independent() {
        let a = ToppingSelection::new()
            .with("cream", "vanilla", 1)
            .with("sauce", "bbq", 2);
        let b = ToppingSelection::new()
            .with("sauce", "bbq", 2)
            .with("cream", "vanilla", 1);
        assert_eq!(LineKey::derive("p1", &a), LineKey::derive("p1", &b));
    }

    #[test]
    fn key_differs_by_selection_and_product() {
        let a = ToppingSelection::new().with("sauce", "bbq", 1);
        let b = ToppingSelection::new().with("sauce", "bbq", 2);
        assert_ne!(LineKey::derive("p1", &a), LineKey::derive("p1", &b));
        assert_ne!(LineKey::derive("p1", &a), LineKey::derive("p2", &a));
        assert!(LineKey::derive("p1", &a).as_str().starts_with("p1__"));
    }

    #[tokio::test]
    async fn zero_entries_do_not_change_identity() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        let p = product("p1", dec!(5));
        let plain = cart.add_to_cart(&p, &ToppingSelection::new());
        let zeroed = cart.add_to_cart(&p, &ToppingSelection::new().with("sauce", "bbq", 0));
        assert_eq!(plain, zeroed);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn unknown_key_update_is_a_no_op() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        cart.add_to_cart(&product("p1", dec!(5)), &ToppingSelection::new());
        let missing = LineKey::derive("nope", &ToppingSelection::new());
        cart.update_quantity(&missing, -1);
        assert_eq!(cart.total_items(), 1);
    }

    #[tokio::test]
    async fn huge_delta_saturates_instead_of_overflowing() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        let key = cart.add_to_cart(&product("p1", dec!(5)), &ToppingSelection::new());

        cart.update_quantity(&key, i64::MAX);
        assert_eq!(cart.line(&key).map(|l| l.quantity), Some(u32::MAX));

        cart.update_quantity(&key, i64::MIN);
        assert!(cart.line(&key).is_none());
    }

    #[tokio::test]
    async fn notes_are_trimmed_and_blank_clears_them() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        let key = cart.add_to_cart(&product("p1", dec!(5)), &ToppingSelection::new());

        cart.set_notes(&key, "  sin cebolla ");
        assert_eq!(
            cart.line(&key).and_then(|l| l.notes.as_deref()),
            Some("sin cebolla")
        );

        cart.set_notes(&key, "   ");
        assert_eq!(cart.line(&key).and_then(|l| l.notes.clone()), None);

        let missing = LineKey::derive("nope", &ToppingSelection::new());
        cart.set_notes(&missing, "hola");
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn line_keeps_price_captured_at_add_time() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        let mut p = product("p1", dec!(5));
        cart.add_to_cart(&p, &ToppingSelection::new());
        p.price_base = dec!(9);
        cart.add_to_cart(&p, &ToppingSelection::new());
        assert_eq!(cart.lines()[0].unit_price, dec!(5));
        assert_eq!(cart.subtotal(), dec!(10));
    }

    #[tokio::test]
    async fn slug_is_used_when_id_is_missing() {
        let mut cart = OrderCart::new(CartStore::new(MemoryStore::new()));
        let mut p = product("p1", dec!(5));
        p.id.clear();
        p.slug = "lomo-saltado".to_string();
        cart.add_to_cart(&p, &ToppingSelection::new());
        assert_eq!(cart.lines()[0].product_id, "lomo-saltado");
    }

    #[test]
    fn order_line_uses_camel_case_fields() {
        let line = OrderLine {
            key: LineKey::derive("p1", &ToppingSelection::new()),
            product_id: "p1".to_string(),
            name: "Pisco Sour".to_string(),
            unit_price: dec!(18.50),
            quantity: 2,
            selected_toppings: ToppingSelection::new(),
            selected_text: String::new(),
            notes: None,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["productId"], "p1");
        assert_eq!(value["unitPrice"], "18.50");
        assert_eq!(value["quantity"], 2);
        assert!(value.get("notes").is_none());
        assert_eq!(line.line_total(), dec!(37.00));
    }
}
