// In-memory demo
//
// Walks an event through create, update, type change and delete against the
// in-memory sheet, printing the joined views along the way.
//
// Run with: cargo run -p eventsheet-services --example in_memory_demo
// Settings are read from EVENTSHEET_* variables (a .env file is honoured).

use std::sync::Arc;

use anyhow::{Context, Result};
use eventsheet_core::memory::{InMemoryDirectory, RecordingCalendar};
use eventsheet_core::telemetry::{init_tracing, TelemetryConfig};
use eventsheet_core::{EventPatch, EventQuery, EventType, FieldKey, NewEvent, StoreConfig};
use eventsheet_services::EventService;
use eventsheet_storage::{EventRepository, InMemorySheet};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(TelemetryConfig::from_env());

    let config = StoreConfig::from_env();
    let sheet = Arc::new(InMemorySheet::new());
    for event_type in EventType::ALL {
        sheet.create_table(config.table_name(event_type), &[]);
    }

    let calendar = Arc::new(RecordingCalendar::new());
    let repo = EventRepository::new(sheet.clone(), config)?.with_calendar(calendar.clone());
    let written = repo.ensure_headers().await?;
    tracing::info!(tables = written, "initialised table headers");

    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_opportunity("OPP-001", "Packaging line retrofit");
    directory.add_company("CMP-001", "Northwind Foods");

    let service = EventService::new(Arc::new(repo))
        .with_opportunities(directory.clone())
        .with_companies(directory);

    let created = service
        .create_event(
            &NewEvent::new(EventType::General)
                .with(FieldKey::EventName, "Plant walkthrough")
                .with(FieldKey::OpportunityId, "OPP-001")
                .with(FieldKey::CompanyId, "CMP-001")
                .with(FieldKey::OurParticipants, "Ana, Bo")
                .with_calendar_sync(),
            "ana",
        )
        .await?;
    println!("created {} at row {}", created.event_id, created.row_index);
    println!("calendar entries: {}", calendar.events().len());

    let updated = service
        .update_event(
            &created.row_index.to_string(),
            &EventPatch::for_event(&created.event_id).with(FieldKey::Notes, "Bring safety shoes"),
            "bo",
        )
        .await?;
    println!("updated to revision {}", updated.revision);

    let moved = service
        .update_event(
            &updated.row_index.to_string(),
            &EventPatch::for_event(&created.event_id)
                .with_event_type(EventType::Iot)
                .with(FieldKey::IotDeviceScale, "12 lines"),
            "bo",
        )
        .await?;
    println!(
        "moved to {} at row {} (revision {})",
        moved.event_type, moved.row_index, moved.revision
    );

    let view = service
        .get_event(&created.event_id)
        .await
        .context("moved event should be readable")?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    for view in service.list_events(&EventQuery::all()).await {
        println!(
            "{} [{}] {} / {}",
            view.event.event_id,
            view.event_type_label,
            view.opportunity_name.unwrap_or_default(),
            view.company_name.unwrap_or_default()
        );
    }

    service.delete_event(moved.row_index, moved.event_type).await?;
    println!(
        "remaining events: {}",
        service.list_events(&EventQuery::all()).await.len()
    );
    Ok(())
}
