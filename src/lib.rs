//! Guest-services client library.
//!
//! Room-service ordering is the core: a persistent shopping cart with
//! per-topping pricing ([`cart`]) and the checkout flow that turns it into a
//! backend request ([`checkout`]). Around it sit the backend API client,
//! other service requests, a realtime request feed, and the guest session.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod hours;
pub mod models;
pub mod realtime;
pub mod requests;
pub mod session;
pub mod storage;

pub use error::{ConciergeError, Result};
