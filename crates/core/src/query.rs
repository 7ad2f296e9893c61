// Listing filters and default ordering
//
// Filtering is a linear scan over already loaded records; there is no index.

use std::cmp::Ordering;

use crate::event::EventRecord;
use crate::event_type::EventType;

/// Filter for listing events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub event_type: Option<EventType>,
    pub opportunity_id: Option<String>,
    pub company_id: Option<String>,
    /// Include records whose status is the archived sentinel
    pub include_archived: bool,
}

impl EventQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_type(event_type: EventType) -> Self {
        Self {
            event_type: Some(event_type),
            ..Default::default()
        }
    }

    pub fn for_opportunity(opportunity_id: impl Into<String>) -> Self {
        Self {
            opportunity_id: Some(opportunity_id.into()),
            ..Default::default()
        }
    }

    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id.into()),
            ..Default::default()
        }
    }

    pub fn including_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    pub fn matches(&self, record: &EventRecord, archived_status: &str) -> bool {
        if !self.include_archived && record.is_archived(archived_status) {
            return false;
        }
        if let Some(event_type) = self.event_type {
            if record.event_type() != event_type {
                return false;
            }
        }
        if let Some(opportunity_id) = &self.opportunity_id {
            if record.opportunity_id != *opportunity_id {
                return false;
            }
        }
        if let Some(company_id) = &self.company_id {
            if record.company_id != *company_id {
                return false;
            }
        }
        true
    }

    /// Filter and sort a record set, cloning the survivors
    pub fn apply<'a>(
        &self,
        records: impl IntoIterator<Item = &'a EventRecord>,
        archived_status: &str,
    ) -> Vec<EventRecord> {
        let mut result: Vec<EventRecord> = records
            .into_iter()
            .filter(|r| self.matches(r, archived_status))
            .cloned()
            .collect();
        sort_newest_first(&mut result);
        result
    }
}

/// Sort by last-modified (or created) time, newest first; undated records last
pub fn sort_newest_first(records: &mut [EventRecord]) {
    records.sort_by(|a, b| match (a.sort_time(), b.sort_time()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, modified: &str, created: &str, status: &str) -> EventRecord {
        let mut r = EventRecord::new(EventType::General);
        r.event_id = id.into();
        r.last_modified_time = modified.into();
        r.created_time = created.into();
        r.status = status.into();
        r
    }

    #[test]
    fn test_default_query_excludes_archived_and_sorts_desc() {
        let records = vec![
            record("old", "2026-01-01T00:00:00.000Z", "", ""),
            record("gone", "2026-06-01T00:00:00.000Z", "", "Archived"),
            record("created-only", "", "2026-03-01T00:00:00.000Z", ""),
            record("new", "2026-05-01T00:00:00.000Z", "", "Open"),
            record("undated", "", "", ""),
        ];

        let result = EventQuery::all().apply(&records, "Archived");
        let ids: Vec<_> = result.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "created-only", "old", "undated"]);
    }

    #[test]
    fn test_including_archived() {
        let records = vec![record("gone", "", "", "Archived")];
        assert!(EventQuery::all().apply(&records, "Archived").is_empty());
        assert_eq!(
            EventQuery::all()
                .including_archived()
                .apply(&records, "Archived")
                .len(),
            1
        );
    }

    #[test]
    fn test_filters_by_foreign_keys_and_type() {
        let mut a = record("a", "", "", "");
        a.opportunity_id = "OPP1".into();
        a.company_id = "CMP1".into();
        let mut b = EventRecord::new(EventType::Dt);
        b.event_id = "b".into();
        b.opportunity_id = "OPP2".into();
        let records = vec![a, b];

        let by_opp = EventQuery::for_opportunity("OPP1").apply(&records, "Archived");
        assert_eq!(by_opp.len(), 1);
        assert_eq!(by_opp[0].event_id, "a");

        let by_company = EventQuery::for_company("CMP1").apply(&records, "Archived");
        assert_eq!(by_company.len(), 1);

        let dt = EventQuery::of_type(EventType::Dt).apply(&records, "Archived");
        assert_eq!(dt[0].event_id, "b");
    }
}
