//! Menu catalog models.
//!
//! Products are grouped into sections by category. A product may carry a
//! topping catalog keyed by topping type (`"cream"`, `"flavor"`, ...).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Topping catalog of a product: topping type → toppings of that type.
pub type ToppingCatalog = BTreeMap<String, Vec<Topping>>;

/// An optional add-on with its own price delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topping {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Added to the unit price once per selected unit (may be zero).
    pub price_delta: Decimal,
    #[serde(default = "default_true")]
    pub available: bool,
    /// Maximum units of this topping on a single line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_quantity: Option<u32>,
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEmbed {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub slug: String,
    pub name: String,
}

/// A menu item that can be added to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub price_base: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryEmbed>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub out_of_stock: bool,
    #[serde(default)]
    pub order_in_category: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toppings: Option<ToppingCatalog>,
    /// Maximum total units per topping type on a single line.
    #[serde(default)]
    pub max_toppings_per_type: BTreeMap<String, u32>,
}

impl Product {
    /// Identifier used for cart lines: the backend id, or the slug when the
    /// id is missing.
    pub fn line_id(&self) -> &str {
        if self.id.is_empty() {
            &self.slug
        } else {
            &self.id
        }
    }

    /// Looks up a topping by type and id in this product's catalog.
    pub fn topping(&self, kind: &str, id: &str) -> Option<&Topping> {
        self.toppings
            .as_ref()?
            .get(kind)?
            .iter()
            .find(|t| t.id == id)
    }

    /// Returns `true` if the product can currently be ordered.
    pub fn is_orderable(&self) -> bool {
        self.visible && !self.out_of_stock
    }
}

/// Category header of a menu section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionCategory {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

/// A category together with its items.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuSection {
    pub category: SectionCategory,
    #[serde(default)]
    pub items: Vec<Product>,
}

/// Response of `GET /menu/publico`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub sections: Vec<MenuSection>,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl MenuResponse {
    /// Iterates over every product in section order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Finds a product by its cart line id.
    pub fn find_product(&self, line_id: &str) -> Option<&Product> {
        self.products().find(|p| p.line_id() == line_id)
    }

    /// Keeps only products carrying at least one of `tags`, dropping
    /// sections left empty. An empty tag list keeps everything.
    pub fn filter_by_tags(&self, tags: &[String]) -> Vec<MenuSection> {
        if tags.is_empty() {
            return self.sections.clone();
        }
        self.sections
            .iter()
            .map(|s| MenuSection {
                category: s.category.clone(),
                items: s
                    .items
                    .iter()
                    .filter(|p| p.tags.iter().any(|t| tags.contains(t)))
                    .cloned()
                    .collect(),
            })
            .filter(|s| !s.items.is_empty())
            .collect()
    }
}

/// Category chip with an item count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryChip {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub count: u32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// Response of `GET /menu/chips`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipsResponse {
    pub chips: Vec<CategoryChip>,
    #[serde(default)]
    pub total_categories: usize,
}

fn default_true() -> bool {
    true
}
