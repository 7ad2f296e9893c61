// EventService integration tests
//
// Join enrichment, degrade-on-failure behaviour and update routing through
// the service entry points, backed by the in-memory sheet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use eventsheet_core::memory::{InMemoryDirectory, StaticSystemConfig};
use eventsheet_core::{
    ConfigOption, EventPatch, EventQuery, EventType, FieldKey, ManualClock, NewEvent,
    SchemaRegistry, StoreConfig, StoreError, SystemConfigSource, EVENT_TYPE_CATEGORY,
};
use eventsheet_services::EventService;
use eventsheet_storage::{BackendOp, EventRepository, InMemorySheet};
use serde_json::json;

struct Harness {
    sheet: Arc<InMemorySheet>,
    clock: Arc<ManualClock>,
    directory: Arc<InMemoryDirectory>,
    service: EventService,
}

fn harness() -> Harness {
    let sheet = Arc::new(InMemorySheet::new());
    let registry = SchemaRegistry::new().unwrap();
    let config = StoreConfig::default();
    for event_type in EventType::ALL {
        sheet.create_table(
            config.table_name(event_type),
            &registry.schema(event_type).labels(),
        );
    }
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
    ));
    let repo = EventRepository::new(sheet.clone(), config)
        .unwrap()
        .with_clock(clock.clone());

    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_opportunity("OPP1", "Line retrofit");
    directory.add_company("CMP1", "Acme Foods");

    let service = EventService::new(Arc::new(repo))
        .with_opportunities(directory.clone())
        .with_companies(directory.clone());

    Harness {
        sheet,
        clock,
        directory,
        service,
    }
}

#[tokio::test]
async fn test_list_attaches_display_names() {
    let h = harness();
    h.service
        .create_event(
            &NewEvent::new(EventType::Iot)
                .with(FieldKey::OpportunityId, "OPP1")
                .with(FieldKey::CompanyId, "CMP1"),
            "ana",
        )
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(1));
    h.service
        .create_event(
            &NewEvent::new(EventType::General)
                .with(FieldKey::OpportunityId, "OPP-gone")
                .with(FieldKey::CompanyId, "CMP1"),
            "ana",
        )
        .await
        .unwrap();

    let views = h.service.list_for_company("CMP1").await;
    assert_eq!(views.len(), 2);

    // Newest first: the second event references an unknown opportunity
    assert_eq!(views[0].opportunity_name.as_deref(), Some("OPP-gone"));
    assert_eq!(views[1].opportunity_name.as_deref(), Some("Line retrofit"));
    assert!(views
        .iter()
        .all(|v| v.company_name.as_deref() == Some("Acme Foods")));
    assert_eq!(views[1].event_type_label, "IoT");
}

#[tokio::test]
async fn test_enrichment_never_reaches_the_cache() {
    let h = harness();
    let saved = h
        .service
        .create_event(
            &NewEvent::new(EventType::General).with(FieldKey::OpportunityId, "OPP1"),
            "ana",
        )
        .await
        .unwrap();

    let mut views = h.service.list_for_opportunity("OPP1").await;
    assert_eq!(views.len(), 1);
    views[0].event.opportunity_id = "tampered".into();

    let cached = h.service.repository().list_all().await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].opportunity_id, "OPP1");

    let view = h.service.get_event(&saved.event_id).await.unwrap();
    assert_eq!(view.event.opportunity_id, "OPP1");
    assert_eq!(view.opportunity_name.as_deref(), Some("Line retrofit"));
}

#[test_log::test(tokio::test)]
async fn test_join_failure_degrades() {
    let h = harness();
    let saved = h
        .service
        .create_event(
            &NewEvent::new(EventType::Dx).with(FieldKey::CompanyId, "CMP1"),
            "ana",
        )
        .await
        .unwrap();
    h.directory.set_failing(true);

    let view = h.service.get_event(&saved.event_id).await.unwrap();
    assert_eq!(view.event.event_id, saved.event_id);
    assert_eq!(view.company_name, None);
    assert_eq!(view.opportunity_name, None);
    assert_eq!(view.event_type_label, "DX");

    assert!(h.service.list_events(&EventQuery::all()).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_store_failure_on_read_is_absorbed() {
    let h = harness();
    h.sheet.fail_next(BackendOp::Get);
    assert!(h.service.list_events(&EventQuery::all()).await.is_empty());
    assert!(h.service.get_event("EVT1").await.is_none());
}

#[tokio::test]
async fn test_update_rejects_bad_row_index_without_writing() {
    let h = harness();
    let saved = h
        .service
        .create_event(&NewEvent::new(EventType::General), "ana")
        .await
        .unwrap();
    let writes = h.sheet.write_count();
    let patch = EventPatch::for_event(&saved.event_id).with(FieldKey::Notes, "x");

    for bad in ["abc", "1", "0", ""] {
        let err = h.service.update_event(bad, &patch, "bo").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)), "{bad:?}");
    }
    assert_eq!(h.sheet.write_count(), writes);
}

#[tokio::test]
async fn test_type_change_through_service() {
    let h = harness();
    let saved = h
        .service
        .create_event_json(
            &json!({
                "eventType": "general",
                "eventName": "Site walk",
                "companyId": "CMP1",
            }),
            "ana",
        )
        .await
        .unwrap();

    let moved = h
        .service
        .update_event_json(
            &saved.row_index.to_string(),
            &json!({
                "eventId": saved.event_id.clone(),
                "rowIndex": saved.row_index,
                "eventType": "dt",
                "dtIndustry": "Beverages",
                "notes": null,
            }),
            "bo",
        )
        .await
        .unwrap();
    assert_eq!(moved.event_type, EventType::Dt);

    let view = h.service.get_event(&saved.event_id).await.unwrap();
    assert_eq!(view.event.event_type(), EventType::Dt);
    assert_eq!(view.event.row_index, moved.row_index);
    assert_eq!(view.event.event_name, "Site walk");
    assert_eq!(view.event.revision, 2);
    assert_eq!(view.event.value(FieldKey::DtIndustry).as_deref(), Some("Beverages"));
    assert!(h
        .service
        .list_events(&EventQuery::of_type(EventType::General))
        .await
        .is_empty());
}

#[tokio::test]
async fn test_delete_missing_row_is_ok() {
    let h = harness();
    h.service.delete_event(9, EventType::Iot).await.unwrap();
}

#[tokio::test]
async fn test_event_type_options_use_configured_labels() {
    let h = harness();
    let defaults = h.service.event_type_options().await;
    assert_eq!(defaults.len(), 4);
    assert_eq!(defaults[1], ConfigOption::new("iot", "IoT"));

    let config = StaticSystemConfig::new().with_options(
        EVENT_TYPE_CATEGORY,
        vec![
            ConfigOption::new("iot", "IoT Visit"),
            ConfigOption::new("webinar", "Webinar"),
        ],
    );
    let service = h.service.with_system_config(Arc::new(config));
    let options = service.event_type_options().await;
    assert_eq!(options[1].label, "IoT Visit");
    assert_eq!(options[2].label, "DT");
}

struct BrokenConfig;

#[async_trait]
impl SystemConfigSource for BrokenConfig {
    async fn options(&self, _category: &str) -> anyhow::Result<Vec<ConfigOption>> {
        anyhow::bail!("config service down")
    }
}

#[tokio::test]
async fn test_broken_system_config_falls_back_to_builtin_labels() {
    let h = harness();
    h.service
        .create_event(&NewEvent::new(EventType::Dx), "ana")
        .await
        .unwrap();
    let service = h.service.with_system_config(Arc::new(BrokenConfig));

    let views = service.list_events(&EventQuery::all()).await;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].event_type_label, "DX");
}
