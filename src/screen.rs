//! Per-screen filter records and list item types.
//!
//! Each list screen (product catalog, inventory-entry log, audit log) has a
//! closed field enum, its cascade rules, the API path it lists from and the
//! item record the API returns.

use crate::filter::{CascadeGraph, CascadeRule, FieldKind, FilterField};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Static description of one list screen.
pub trait Screen: Send + Sync + 'static {
    type Field: FilterField;
    type Item: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static;

    /// Short name used in logs and configuration.
    const NAME: &'static str;

    /// Path of the list endpoint, relative to the API base URL.
    const ENDPOINT: &'static str;

    /// Scroll offset past which the scroll-to-top affordance shows.
    const SCROLL_THRESHOLD_PX: f64;

    fn cascades() -> CascadeGraph<Self::Field>;
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductField {
    Category,
    SubcategoryId,
    LocationId,
    SourceType,
    FormulaId,
    ComponentId,
    PurchaseInfoId,
}

impl FilterField for ProductField {
    const ALL: &'static [Self] = &[
        ProductField::Category,
        ProductField::SubcategoryId,
        ProductField::LocationId,
        ProductField::SourceType,
        ProductField::FormulaId,
        ProductField::ComponentId,
        ProductField::PurchaseInfoId,
    ];

    fn name(&self) -> &'static str {
        match self {
            ProductField::Category => "category",
            ProductField::SubcategoryId => "subcategory_id",
            ProductField::LocationId => "location_id",
            ProductField::SourceType => "source_type",
            ProductField::FormulaId => "formula_id",
            ProductField::ComponentId => "component_id",
            ProductField::PurchaseInfoId => "purchase_info_id",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            ProductField::Category | ProductField::SourceType => FieldKind::Text,
            _ => FieldKind::Id,
        }
    }
}

/// Catalog entry as listed by `/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct ProductScreen;

impl Screen for ProductScreen {
    type Field = ProductField;
    type Item = Product;

    const NAME: &'static str = "products";
    const ENDPOINT: &'static str = "products";
    const SCROLL_THRESHOLD_PX: f64 = 300.0;

    fn cascades() -> CascadeGraph<ProductField> {
        CascadeGraph::new([
            CascadeRule::new(ProductField::Category, ProductField::SubcategoryId),
            CascadeRule::new(ProductField::FormulaId, ProductField::ComponentId),
        ])
    }
}

// ============================================================================
// Inventory entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InventoryField {
    EntryType,
    UserId,
    LocationId,
    ProductId,
    Category,
    SubcategoryId,
    ReferenceId,
    DateFrom,
    DateTo,
    Days,
}

impl FilterField for InventoryField {
    const ALL: &'static [Self] = &[
        InventoryField::EntryType,
        InventoryField::UserId,
        InventoryField::LocationId,
        InventoryField::ProductId,
        InventoryField::Category,
        InventoryField::SubcategoryId,
        InventoryField::ReferenceId,
        InventoryField::DateFrom,
        InventoryField::DateTo,
        InventoryField::Days,
    ];

    fn name(&self) -> &'static str {
        match self {
            InventoryField::EntryType => "entry_type",
            InventoryField::UserId => "user_id",
            InventoryField::LocationId => "location_id",
            InventoryField::ProductId => "product_id",
            InventoryField::Category => "category",
            InventoryField::SubcategoryId => "subcategory_id",
            InventoryField::ReferenceId => "reference_id",
            InventoryField::DateFrom => "date_from",
            InventoryField::DateTo => "date_to",
            InventoryField::Days => "days",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            InventoryField::EntryType | InventoryField::Category => FieldKind::Text,
            InventoryField::DateFrom | InventoryField::DateTo => FieldKind::Date,
            InventoryField::Days => FieldKind::Count,
            _ => FieldKind::Id,
        }
    }
}

/// One stock movement as listed by `/inventory/entries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: i64,
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct InventoryScreen;

impl Screen for InventoryScreen {
    type Field = InventoryField;
    type Item = InventoryEntry;

    const NAME: &'static str = "inventory";
    const ENDPOINT: &'static str = "inventory/entries";
    const SCROLL_THRESHOLD_PX: f64 = 200.0;

    fn cascades() -> CascadeGraph<InventoryField> {
        CascadeGraph::new([
            CascadeRule::new(InventoryField::Category, InventoryField::SubcategoryId),
            CascadeRule::new(InventoryField::SubcategoryId, InventoryField::ProductId),
        ])
    }
}

// ============================================================================
// Audit log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuditField {
    UserId,
    LocationId,
    Action,
    IsFlag,
    Category,
    SubcategoryId,
    ProductId,
    DateFrom,
    DateTo,
}

impl FilterField for AuditField {
    const ALL: &'static [Self] = &[
        AuditField::UserId,
        AuditField::LocationId,
        AuditField::Action,
        AuditField::IsFlag,
        AuditField::Category,
        AuditField::SubcategoryId,
        AuditField::ProductId,
        AuditField::DateFrom,
        AuditField::DateTo,
    ];

    fn name(&self) -> &'static str {
        match self {
            AuditField::UserId => "user_id",
            AuditField::LocationId => "location_id",
            AuditField::Action => "action",
            AuditField::IsFlag => "is_flag",
            AuditField::Category => "category",
            AuditField::SubcategoryId => "subcategory_id",
            AuditField::ProductId => "product_id",
            AuditField::DateFrom => "date_from",
            AuditField::DateTo => "date_to",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            AuditField::Action | AuditField::Category => FieldKind::Text,
            AuditField::IsFlag => FieldKind::Flag,
            AuditField::DateFrom | AuditField::DateTo => FieldKind::Date,
            _ => FieldKind::Id,
        }
    }
}

/// Audit record as listed by `/audit-logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub is_flag: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct AuditScreen;

impl Screen for AuditScreen {
    type Field = AuditField;
    type Item = AuditLogEntry;

    const NAME: &'static str = "audit";
    const ENDPOINT: &'static str = "audit-logs";
    const SCROLL_THRESHOLD_PX: f64 = 120.0;

    fn cascades() -> CascadeGraph<AuditField> {
        CascadeGraph::new([
            CascadeRule::new(AuditField::Category, AuditField::SubcategoryId),
            CascadeRule::new(AuditField::SubcategoryId, AuditField::ProductId),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_roundtrip<F: FilterField>() {
        for field in F::ALL {
            assert_eq!(F::from_name(field.name()), Some(*field));
        }
    }

    #[test]
    fn test_field_names_resolve() {
        names_roundtrip::<ProductField>();
        names_roundtrip::<InventoryField>();
        names_roundtrip::<AuditField>();
        assert_eq!(ProductField::from_name("page"), None);
    }

    #[test]
    fn test_all_is_in_declaration_order() {
        let mut sorted = InventoryField::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, InventoryField::ALL);
    }

    #[test]
    fn test_product_extra_fields_are_kept() {
        let json = r#"{"id": 7, "name": "Flour", "category": "raw", "sku": "FL-1"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.category.as_deref(), Some("raw"));
        assert_eq!(product.extra.get("sku"), Some(&Value::String("FL-1".into())));
    }

    fn children_are_ids<S: Screen>() {
        for rule in S::cascades().rules() {
            assert_eq!(rule.child.kind(), FieldKind::Id, "{:?}", rule.child);
            assert_ne!(rule.parent, rule.child);
        }
    }

    #[test]
    fn test_cascade_children_are_id_fields() {
        children_are_ids::<ProductScreen>();
        children_are_ids::<InventoryScreen>();
        children_are_ids::<AuditScreen>();
        assert_eq!(ProductScreen::cascades().rules().len(), 2);
    }

    #[test]
    fn test_audit_flag_kind() {
        assert_eq!(AuditField::IsFlag.kind(), FieldKind::Flag);
        assert_eq!(InventoryField::Days.kind(), FieldKind::Count);
    }
}
