//! Topping selections and their human-readable summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Separator between type clauses in a selection summary.
const CLAUSE_SEPARATOR: &str = " • ";

/// Chosen toppings for one order line: topping type → topping id → units.
///
/// Both levels are sorted maps, so two selections holding the same entries
/// compare, serialize and describe identically no matter how they were
/// built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToppingSelection(BTreeMap<String, BTreeMap<String, i64>>);

impl ToppingSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the units of a topping, replacing any previous value.
    pub fn set(&mut self, kind: &str, id: &str, quantity: i64) {
        self.0
            .entry(kind.to_string())
            .or_default()
            .insert(id.to_string(), quantity);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: &str, id: &str, quantity: i64) -> Self {
        self.set(kind, id, quantity);
        self
    }

    /// Units selected for a topping (zero when absent).
    pub fn quantity(&self, kind: &str, id: &str) -> i64 {
        self.0
            .get(kind)
            .and_then(|ids| ids.get(id))
            .copied()
            .unwrap_or(0)
    }

    /// Drops entries with zero or negative units and types left empty.
    #[must_use]
    pub fn pruned(&self) -> Self {
        let kept = self
            .0
            .iter()
            .filter_map(|(kind, ids)| {
                let positive: BTreeMap<String, i64> = ids
                    .iter()
                    .filter(|(_, qty)| **qty > 0)
                    .map(|(id, qty)| (id.clone(), *qty))
                    .collect();
                (!positive.is_empty()).then(|| (kind.clone(), positive))
            })
            .collect();
        Self(kept)
    }

    /// Returns `true` when no topping has a positive quantity.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Iterates `(type, id, units)` over positive entries in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.0.iter().flat_map(|(kind, ids)| {
            ids.iter()
                .filter(|(_, qty)| **qty > 0)
                .map(move |(id, qty)| (kind.as_str(), id.as_str(), *qty))
        })
    }

    /// Total positive units selected for a topping type.
    pub fn units_of_type(&self, kind: &str) -> i64 {
        self.0
            .get(kind)
            .map(|ids| ids.values().filter(|q| **q > 0).sum())
            .unwrap_or(0)
    }

    /// Canonical JSON form, used to derive line identities.
    pub(crate) fn canonical_json(&self) -> String {
        // BTreeMap keys serialize in sorted order; plain maps cannot fail.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Guest-facing label of a topping type; unknown types label themselves.
pub fn type_label(kind: &str) -> &str {
    match kind {
        "cream" => "Cremas",
        "flavor" => "Sabores",
        "garnish" => "Con",
        "sauce" => "Salsas",
        other => other,
    }
}

/// Summarises a selection as `"Sabores: vanilla (2) • Salsas: bbq"`.
///
/// Types with no positive entries are skipped; an empty selection yields an
/// empty string.
pub fn describe_selection(selection: &ToppingSelection) -> String {
    let mut clauses: Vec<String> = Vec::new();

    for (kind, ids) in &selection.0 {
        let items: Vec<String> = ids
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(id, qty)| {
                if *qty == 1 {
                    id.clone()
                } else {
                    format!("{id} ({qty})")
                }
            })
            .collect();

        if !items.is_empty() {
            clauses.push(format!("{}: {}", type_label(kind), items.join(", ")));
        }
    }

    clauses.join(CLAUSE_SEPARATOR)
}
