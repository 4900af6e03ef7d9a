//! Unit price computation for products with toppings.

use rust_decimal::{Decimal, RoundingStrategy};

use super::selection::ToppingSelection;
use crate::models::ToppingCatalog;

/// Rounds a currency amount to cents, midpoint away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the price of one unit of a product with the given toppings.
///
/// Every selected topping found in `catalog` under its type adds
/// `price_delta × units`; ids missing from the catalog add nothing. The sum
/// is rounded once, at the end.
pub fn compute_unit_price(
    base_price: Decimal,
    selection: &ToppingSelection,
    catalog: Option<&ToppingCatalog>,
) -> Decimal {
    let Some(catalog) = catalog else {
        return round_cents(base_price);
    };

    let extras: Decimal = selection
        .entries()
        .filter_map(|(kind, id, qty)| {
            catalog
                .get(kind)?
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.price_delta * Decimal::from(qty))
        })
        .sum();

    round_cents(base_price + extras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Topping;
    use rust_decimal_macros::dec;

    fn topping(id: &str, delta: Decimal) -> Topping {
        Topping {
            id: id.to_string(),
            name: id.to_string(),
            price_delta: delta,
            available: true,
            max_quantity: None,
        }
    }

    fn catalog() -> ToppingCatalog {
        let mut catalog = ToppingCatalog::new();
        catalog.insert(
            "flavor".to_string(),
            vec![topping("vanilla", dec!(1.50)), topping("mango", dec!(0))],
        );
        catalog.insert("sauce".to_string(), vec![topping("bbq", dec!(0.335))]);
        catalog
    }

    #[test]
    fn adds_deltas_times_quantity() {
        let selection = ToppingSelection::new().with("flavor", "vanilla", 2);
        let price = compute_unit_price(dec!(10.00), &selection, Some(&catalog()));
        assert_eq!(price, dec!(13.00));
    }

    #[test]
    fn no_catalog_returns_rounded_base() {
        let selection = ToppingSelection::new().with("flavor", "vanilla", 2);
        assert_eq!(compute_unit_price(dec!(4.555), &selection, None), dec!(4.56));
    }

    #[test]
    fn zero_quantities_cost_nothing() {
        let selection = ToppingSelection::new()
            .with("flavor", "vanilla", 0)
            .with("sauce", "bbq", -2);
        assert_eq!(
            compute_unit_price(dec!(7.25), &selection, Some(&catalog())),
            dec!(7.25)
        );
    }

    #[test]
    fn unknown_topping_is_ignored() {
        let selection = ToppingSelection::new()
            .with("flavor", "pistachio", 3)
            .with("garnish", "vanilla", 1);
        assert_eq!(
            compute_unit_price(dec!(5.00), &selection, Some(&catalog())),
            dec!(5.00)
        );
    }

    #[test]
    fn rounds_once_at_the_end() {
        // 3 × 0.335 = 1.005; per-topping rounding would give 1.02 instead.
        let selection = ToppingSelection::new().with("sauce", "bbq", 3);
        assert_eq!(
            compute_unit_price(dec!(2.00), &selection, Some(&catalog())),
            dec!(3.01)
        );
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        assert_eq!(round_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(round_cents(dec!(2.675)), dec!(2.68));
        assert_eq!(round_cents(dec!(2.674)), dec!(2.67));
    }
}
