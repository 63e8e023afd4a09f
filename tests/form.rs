//! Tests for the form state container: validation, change tracking, overrides and saving.
mod common;
use ahash::AHashMap;
use chrono::NaiveDate;
use common::*;
use santei::prelude::*;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_test::{assert_pending, block_on, task};

fn volume_form() -> MetadataForm {
    MetadataForm::new(volume_definitions(), box_baseline()).expect("valid form")
}

fn overridable_volume_form() -> MetadataForm {
    MetadataForm::new(overridable_volume_definitions(), box_baseline()).expect("valid form")
}

/// Resolves on the second poll, like a store waiting on a remote call.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

struct SlowStore {
    inner: InMemoryStore,
}

impl MetadataStore for SlowStore {
    async fn update_metadata(
        &self,
        identifier: &str,
        payload: &MetadataPayload,
    ) -> Result<(), StoreError> {
        YieldOnce { yielded: false }.await;
        self.inner.update_metadata(identifier, payload).await
    }
}

fn shipping_definitions() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("Reference", FieldType::String).required(),
        FieldDefinition::new("Pieces", FieldType::Integer),
        FieldDefinition::new("Weight", FieldType::Decimal),
        FieldDefinition::new("Shipped", FieldType::Date),
        FieldDefinition::new("Carrier", FieldType::String).read_only(),
    ]
}

#[test]
fn test_volume_scenario() {
    let mut form = volume_form();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(150.0)));
    assert!(form.is_valid());
    assert!(!form.has_changes());

    form.update_field_value("Length", 12).unwrap();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(180.0)));
    assert!(form.has_changes());

    form.update_field_value("Length", Value::Null).unwrap();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Null));
    assert!(form.is_valid());
}

#[test]
fn test_manual_override_scenario() {
    let mut form = overridable_volume_form();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(150.0)));

    assert!(form.on_field_focus("Volume"));
    form.update_field_value("Volume", 999).unwrap();

    for id in ["Length", "Width", "Height"] {
        assert_eq!(form.get_field_value(id), Some(&Value::Null), "{} should be cleared", id);
    }
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(999.0)));

    form.on_field_blur("Volume");
    assert_eq!(form.focused_field(), None);
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(999.0)));
}

#[test]
fn test_emptied_override_is_recomputed_on_blur() {
    let mut form = overridable_volume_form();
    form.on_field_focus("Volume");
    form.update_field_value("Volume", "").unwrap();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Null));

    // The dependencies were cleared by the edit, so nothing can be computed back.
    form.on_field_blur("Volume");
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Null));

    form.update_field_value("Length", 2).unwrap();
    form.update_field_value("Width", 2).unwrap();
    form.update_field_value("Height", 2).unwrap();
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(8.0)));
}

#[test]
fn test_focused_override_survives_unrelated_edits() {
    let mut definitions = overridable_volume_definitions();
    definitions.push(FieldDefinition::new("Note", FieldType::String));
    let mut form = MetadataForm::new(definitions, box_baseline()).unwrap();

    form.on_field_focus("Volume");
    form.update_field_value("Volume", 42).unwrap();
    form.update_field_value("Length", 1).unwrap();

    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(42.0)));
}

#[test]
fn test_edits_to_read_only_and_calculated_fields_are_rejected() {
    let mut form = volume_form();
    assert_eq!(
        form.update_field_value("Volume", 1),
        Err(FormError::ReadOnlyField("Volume".to_string()))
    );
    assert_eq!(
        form.update_field_value("Depth", 1),
        Err(FormError::UnknownField("Depth".to_string()))
    );

    let mut form = MetadataForm::new(shipping_definitions(), AHashMap::new()).unwrap();
    assert!(matches!(
        form.update_field_value("Carrier", "DHL"),
        Err(FormError::ReadOnlyField(_))
    ));
}

#[test]
fn test_required_field_drives_aggregate_validity() {
    let mut form = MetadataForm::new(shipping_definitions(), AHashMap::new()).unwrap();
    assert!(!form.is_valid());
    assert_eq!(form.invalid_fields(), ["Reference"]);
    let validation = form.get_field_validation("Reference").unwrap();
    assert_eq!(validation.error_message.as_deref(), Some("This field is required"));

    form.update_field_value("Reference", "PKG-001").unwrap();
    assert!(form.is_valid());

    form.update_field_value("Reference", "   ").unwrap();
    assert!(!form.is_valid());
}

#[test]
fn test_type_validation() {
    let mut form =
        MetadataForm::new(shipping_definitions(), baseline([("Reference", "PKG-001")])).unwrap();

    form.update_field_value("Pieces", "12").unwrap();
    assert_eq!(form.get_field_value("Pieces"), Some(&Value::Integer(12)));

    form.update_field_value("Pieces", 2.5).unwrap();
    let validation = form.get_field_validation("Pieces").unwrap();
    assert!(!validation.is_valid);
    assert_eq!(validation.error_message.as_deref(), Some("'2.5' is not a whole number"));
    assert!(!form.is_valid());

    form.update_field_value("Weight", "abc").unwrap();
    assert_eq!(form.get_field_value("Weight"), Some(&Value::Text("abc".to_string())));
    assert_eq!(
        form.get_field_validation("Weight").unwrap().error_message.as_deref(),
        Some("'abc' is not a valid number")
    );

    form.update_field_value("Weight", "12,5").unwrap();
    assert_eq!(form.get_field_value("Weight"), Some(&Value::Decimal(12.5)));

    form.update_field_value("Shipped", "2024-02-30").unwrap();
    assert!(!form.get_field_validation("Shipped").unwrap().is_valid);

    form.update_field_value("Shipped", "29.02.2024").unwrap();
    assert_eq!(
        form.get_field_value("Shipped"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
    );

    form.update_field_value("Pieces", 3).unwrap();
    assert!(form.is_valid());
}

#[test]
fn test_invalid_dependency_clears_dependents() {
    let mut form = volume_form();
    form.update_field_value("Width", "wide").unwrap();

    assert_eq!(form.get_field_value("Volume"), Some(&Value::Null));
    assert!(form.get_field_validation("Volume").unwrap().is_valid);
    assert!(!form.is_valid());
}

#[test]
fn test_rejected_integer_does_not_feed_calculations() {
    let definitions = vec![
        FieldDefinition::new("Count", FieldType::Integer),
        FieldDefinition::new("Double", FieldType::Decimal)
            .calculated(CalculatedSpec::new("Count * 2", ["Count"], 0)),
    ];
    let mut form = MetadataForm::new(definitions, baseline([("Count", 3)])).unwrap();
    assert_eq!(form.get_field_value("Double"), Some(&Value::Decimal(6.0)));

    form.update_field_value("Count", "3.5").unwrap();
    assert!(!form.get_field_validation("Count").unwrap().is_valid);
    assert_eq!(form.get_field_value("Double"), Some(&Value::Null));

    form.update_field_value("Count", "4").unwrap();
    assert_eq!(form.get_field_value("Double"), Some(&Value::Decimal(8.0)));
    assert!(form.is_valid());
}

#[test]
fn test_has_changes_ignores_equivalent_values() {
    let mut form = MetadataForm::new(
        shipping_definitions(),
        baseline([("Reference", "PKG-001"), ("Weight", "12")]),
    )
    .unwrap();
    assert!(!form.has_changes());

    form.update_field_value("Weight", 12).unwrap();
    assert!(!form.has_changes());

    form.update_field_value("Pieces", "").unwrap();
    assert!(!form.has_changes());

    form.update_field_value("Weight", 13).unwrap();
    assert!(form.has_changes());

    form.update_field_value("Weight", "12.0").unwrap();
    assert!(!form.has_changes());
}

#[test]
fn test_reset_restores_baseline() {
    let mut form = overridable_volume_form();
    form.on_field_focus("Volume");
    form.update_field_value("Volume", 999).unwrap();
    assert!(form.has_changes());

    form.reset_form();
    assert_eq!(form.get_field_value("Length"), Some(&Value::Decimal(10.0)));
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(150.0)));
    assert_eq!(form.focused_field(), None);
    assert!(!form.has_changes());
}

#[test]
fn test_legacy_definition_order_still_settles_chains() {
    let values = baseline([("Length", 2.0), ("Width", 3.0), ("Height", 4.0), ("Density", 0.5)]);
    let mut form = MetadataForm::builder(chained_definitions(), values)
        .with_recalc_order(RecalcOrder::DefinitionOrder)
        .build()
        .unwrap();
    assert_eq!(form.get_field_value("Weight"), Some(&Value::Decimal(12.0)));

    form.update_field_value("Length", 4.0).unwrap();
    assert_eq!(form.get_field_value("Weight"), Some(&Value::Decimal(24.0)));
}

#[test]
fn test_single_legacy_pass_leaves_chain_stale() {
    let values = baseline([("Length", 2.0), ("Width", 3.0), ("Height", 4.0), ("Density", 0.5)]);
    let form = MetadataForm::builder(chained_definitions(), values)
        .with_recalc_order(RecalcOrder::DefinitionOrder)
        .with_max_passes(1)
        .build()
        .unwrap();

    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(24.0)));
    assert_eq!(form.get_field_value("Weight"), Some(&Value::Null));
}

#[test]
fn test_save_sends_wire_payload_and_resets_changes() {
    let mut form = MetadataForm::new(
        shipping_definitions(),
        baseline([("Reference", "PKG-001"), ("Carrier", "DHL")]),
    )
    .unwrap();
    form.update_field_value("Pieces", 4).unwrap();
    form.update_field_value("Weight", "7.25").unwrap();
    form.update_field_value("Shipped", "2024-03-01").unwrap();
    assert!(form.has_changes());

    let store = InMemoryStore::new();
    let payload = block_on(form.save_metadata(&store, "PKG-001")).unwrap();

    assert_eq!(payload["Reference"], serde_json::json!("PKG-001"));
    assert_eq!(payload["Pieces"], serde_json::json!(4));
    assert_eq!(payload["Weight"], serde_json::json!(7.25));
    assert_eq!(payload["Shipped"], serde_json::json!("2024-03-01"));
    assert_eq!(payload["Carrier"], serde_json::json!("DHL"));
    assert_eq!(store.last_saved("PKG-001"), Some(payload));

    assert!(!form.has_changes());
    assert!(!form.is_loading());
}

#[test]
fn test_save_maps_empty_fields_to_null() {
    let mut form = volume_form();
    form.update_field_value("Height", "").unwrap();

    let store = InMemoryStore::new();
    let payload = block_on(form.save_metadata(&store, "box")).unwrap();

    assert_eq!(payload["Height"], serde_json::Value::Null);
    assert_eq!(payload["Volume"], serde_json::Value::Null);
    assert_eq!(payload["Length"], serde_json::json!(10.0));
}

#[test]
fn test_save_is_refused_for_invalid_form() {
    let mut form = MetadataForm::new(shipping_definitions(), AHashMap::new()).unwrap();
    let store = InMemoryStore::new();

    let result = block_on(form.save_metadata(&store, "PKG-001"));
    assert_eq!(
        result,
        Err(SaveError::InvalidForm {
            invalid_fields: vec!["Reference".to_string()]
        })
    );
    assert!(store.saved().is_empty());
}

#[test]
fn test_failed_save_keeps_edits() {
    let mut form = volume_form();
    form.update_field_value("Length", 20).unwrap();

    let store = InMemoryStore::new();
    store.reject_updates("service unavailable");
    let result = block_on(form.save_metadata(&store, "box"));

    assert!(matches!(result, Err(SaveError::Store(StoreError::Rejected { .. }))));
    assert!(form.has_changes());
    assert!(!form.is_loading());
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(300.0)));

    store.accept_updates();
    assert!(block_on(form.save_metadata(&store, "box")).is_ok());
    assert!(!form.has_changes());
}

#[test]
fn test_saved_values_become_the_new_baseline() {
    let mut form = volume_form();
    form.update_field_value("Length", 20).unwrap();
    block_on(form.save_metadata(&InMemoryStore::new(), "box")).unwrap();

    form.update_field_value("Length", 1).unwrap();
    form.reset_form();
    assert_eq!(form.get_field_value("Length"), Some(&Value::Decimal(20.0)));
    assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(300.0)));
}

#[test]
fn test_is_loading_while_store_call_is_pending() {
    let mut form = volume_form();
    form.update_field_value("Length", 20).unwrap();
    let store = SlowStore {
        inner: InMemoryStore::new(),
    };

    {
        let mut save = task::spawn(form.save_metadata(&store, "box"));
        assert_pending!(save.poll());
    }
    // The call was abandoned mid-flight, so the flag is still raised.
    assert!(form.is_loading());
    assert!(store.inner.saved().is_empty());
    assert!(form.has_changes());

    let payload = block_on(form.save_metadata(&store, "box")).unwrap();
    assert_eq!(payload["Volume"], serde_json::json!(300.0));
    assert_eq!(store.inner.saved().len(), 1);
    assert!(!form.is_loading());
    assert!(!form.has_changes());
}
