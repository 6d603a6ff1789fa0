//! Property tests for filter merging, cascades and the page-1 reset rule.

mod common;

use chrono::NaiveDate;
use common::{coordinator, CatalogApi};
use proptest::prelude::*;
use stockroom::fetch::{CoordinatorEvent, Dispatch};
use stockroom::filter::{FilterPatch, FilterStore, FilterValue};
use stockroom::screen::{
    AuditField, AuditScreen, InventoryField, InventoryScreen, ProductField, ProductScreen, Screen,
};

fn arb_product_edit() -> impl Strategy<Value = (ProductField, FilterValue)> {
    prop_oneof![
        prop::sample::select(vec!["", "raw", "finished"])
            .prop_map(|c| (ProductField::Category, FilterValue::from(c))),
        (0_i64..4).prop_map(|id| (ProductField::SubcategoryId, FilterValue::from(id))),
        (0_i64..3).prop_map(|id| (ProductField::LocationId, FilterValue::from(id))),
    ]
}

fn arb_category() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// One non-empty value per independent audit field.
fn arb_audit_edit() -> impl Strategy<Value = (AuditField, FilterValue)> {
    prop_oneof![
        (1_i64..100).prop_map(|id| (AuditField::UserId, FilterValue::from(id))),
        (1_i64..100).prop_map(|id| (AuditField::LocationId, FilterValue::from(id))),
        "[a-z]{1,6}".prop_map(|a| (AuditField::Action, FilterValue::from(a))),
        any::<bool>().prop_map(|f| (AuditField::IsFlag, FilterValue::from(f))),
        (1_u32..28).prop_map(|day| {
            let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
            (AuditField::DateFrom, FilterValue::from(date))
        }),
    ]
}

proptest! {
    #[test]
    fn prop_every_filter_fetch_starts_at_page_one(
        patches in prop::collection::vec(prop::collection::vec(arb_product_edit(), 1..4), 1..6)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let api = CatalogApi::new();
            let mut list = coordinator(api.clone());
            list.refresh();
            list.next_event().await;
            list.load_more();
            list.next_event().await;
            prop_assert_eq!(list.page(), 2);

            for edits in patches {
                let patch: FilterPatch<ProductField> = edits.into_iter().collect();
                let dispatch = list.apply_filters(&patch).unwrap();
                if let Dispatch::Issued { page, .. } = dispatch {
                    prop_assert_eq!(page, 1);
                    let event = list.next_event().await;
                    let loaded_first_page =
                        matches!(event, CoordinatorEvent::PageLoaded { page: 1, appended: false, .. });
                    prop_assert!(loaded_first_page);
                    prop_assert_eq!(list.page(), 1);
                    prop_assert_eq!(api.last_call().page, 1);
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_category_edit_resets_descendants(
        first in arb_category(),
        second in arb_category(),
        subcategory in 1_i64..50,
        product in 1_i64..500,
    ) {
        let mut store = FilterStore::new(InventoryScreen::cascades());
        let setup = FilterPatch::new()
            .set(InventoryField::Category, first.as_str())
            .set(InventoryField::SubcategoryId, subcategory)
            .set(InventoryField::ProductId, product);
        store.apply(&setup).unwrap();
        prop_assert_eq!(store.filters().constrained_count(), 3);

        store
            .apply(&FilterPatch::new().set(InventoryField::Category, second.as_str()))
            .unwrap();
        prop_assert_eq!(store.filters().get(InventoryField::Category), &FilterValue::text(second));
        prop_assert!(!store.filters().is_constrained(InventoryField::SubcategoryId));
        prop_assert!(!store.filters().is_constrained(InventoryField::ProductId));
    }

    #[test]
    fn prop_each_independent_field_counts_once(
        edits in prop::collection::vec(arb_audit_edit(), 0..12),
        search in "[a-z ]{0,6}",
    ) {
        let mut store = FilterStore::new(AuditScreen::cascades());
        let mut seen = std::collections::BTreeSet::new();
        for (field, value) in edits {
            let before = store.active_count();
            let new_field = seen.insert(field);
            store.apply(&FilterPatch::new().set(field, value)).unwrap();
            let expected = if new_field { before + 1 } else { before };
            prop_assert_eq!(store.active_count(), expected);
        }

        store.set_search(search.clone());
        let search_counts = usize::from(!search.trim().is_empty());
        prop_assert_eq!(store.active_count(), seen.len() + search_counts);

        store.clear();
        prop_assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn prop_rejected_patch_changes_nothing(
        valid in prop::collection::vec(arb_product_edit(), 0..4),
        bad in "[a-z]{1,6}",
    ) {
        let mut store = FilterStore::new(ProductScreen::cascades());
        store.apply(&FilterPatch::new().set(ProductField::Category, "raw")).unwrap();
        let before = store.filters().clone();

        let mut patch: FilterPatch<ProductField> = valid.into_iter().collect();
        patch.push(ProductField::SubcategoryId, bad.as_str());
        prop_assert!(store.apply(&patch).is_err());
        prop_assert_eq!(store.filters(), &before);
    }
}
