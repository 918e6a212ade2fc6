use std::collections::HashSet;

use chrono::NaiveDateTime;
use db::{
    models::{
        master_mapping::MasterMapping,
        uploaded_ticket::{CreateUploadedTicket, UploadedTicket},
    },
    DBService,
};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const TICKET_DATE_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Database(#[from] db::DbErr),
    #[error("Ticket source not found")]
    SourceNotFound,
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),
}

/// One rejected row. `row` is 1-based over data rows (the header is row 0).
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
    pub errors: Vec<RowError>,
}

/// CSV ticket importer. Rows are independent: a bad row is recorded and the
/// batch continues, so `inserted + rejected` always equals the number of
/// data rows.
#[derive(Clone)]
pub struct TicketIngest {
    db: DBService,
    incident_id_pattern: Regex,
}

impl TicketIngest {
    pub fn new(db: DBService) -> Self {
        Self {
            db,
            incident_id_pattern: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$")
                .expect("static pattern"),
        }
    }

    pub async fn import_csv(
        &self,
        source_id: Uuid,
        csv_text: &str,
    ) -> Result<ImportSummary, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| IngestError::MalformedCsv(e.to_string()))?
            .clone();

        let mut inserted = 0;
        let mut errors = Vec::new();
        let mut seen_incident_ids: HashSet<String> = HashSet::new();

        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    errors.push(RowError {
                        row,
                        message: format!("unreadable row: {err}"),
                    });
                    continue;
                }
            };

            let field = |name: &str| -> Option<String> {
                headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(name))
                    .and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            let Some(incident_id) = field("incident_id") else {
                errors.push(RowError {
                    row,
                    message: "missing required field incident_id".to_string(),
                });
                continue;
            };
            if !self.incident_id_pattern.is_match(&incident_id) {
                errors.push(RowError {
                    row,
                    message: format!("malformed incident_id {incident_id:?}"),
                });
                continue;
            }
            if !seen_incident_ids.insert(incident_id.clone()) {
                errors.push(RowError {
                    row,
                    message: format!("duplicate incident_id {incident_id:?} in batch"),
                });
                continue;
            }
            if UploadedTicket::exists_for_source(&self.db.conn, source_id, &incident_id).await? {
                errors.push(RowError {
                    row,
                    message: format!("incident_id {incident_id:?} already imported"),
                });
                continue;
            }

            let assigned_to = field("assigned_to");
            let mapped_user_email = match &assigned_to {
                Some(identity) => {
                    MasterMapping::lookup(&self.db.conn, source_id, identity).await?
                }
                None => None,
            };

            let data = CreateUploadedTicket {
                incident_id,
                priority: field("priority"),
                region: field("region"),
                assigned_to,
                mapped_user_email,
                status: field("status"),
                opened_at: field("opened_at").as_deref().and_then(parse_ticket_date),
                resolved_at: field("resolved_at").as_deref().and_then(parse_ticket_date),
                closed_at: field("closed_at").as_deref().and_then(parse_ticket_date),
                reassignment_count: field("reassignment_count")
                    .as_deref()
                    .and_then(parse_count),
                reopen_count: field("reopen_count").as_deref().and_then(parse_count),
            };

            match UploadedTicket::create(&self.db.conn, source_id, &data).await {
                Ok(_) => inserted += 1,
                Err(db::models::uploaded_ticket::UploadedTicketError::SourceNotFound) => {
                    return Err(IngestError::SourceNotFound);
                }
                // One row's insert failure does not abort the batch.
                Err(db::models::uploaded_ticket::UploadedTicketError::Database(err)) => {
                    tracing::warn!(row, "failed to insert ticket: {err}");
                    errors.push(RowError {
                        row,
                        message: format!("insert failed: {err}"),
                    });
                }
            }
        }

        let summary = ImportSummary {
            inserted,
            rejected: errors.len(),
            errors,
        };
        tracing::info!(
            inserted = summary.inserted,
            rejected = summary.rejected,
            %source_id,
            "ticket import finished"
        );
        Ok(summary)
    }
}

/// Export timestamps look like `08/18/2025, 07:06:29 PM` and carry no
/// offset. Anything else becomes None rather than a row error.
pub fn parse_ticket_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TICKET_DATE_FORMAT).ok()
}

fn parse_count(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};
    use db::{
        models::{
            master_mapping::CreateMasterMapping,
            ticket_source::{CreateTicketSource, TicketSource},
        },
        ConnectionTrait,
    };
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup() -> (DBService, Uuid) {
        let db = DBService::new_with_url("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db.conn, None).await.unwrap();
        let source = TicketSource::create(
            &db.conn,
            &CreateTicketSource {
                name: "remedy".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        (db, source.id)
    }

    #[test]
    fn parses_export_dates_and_rejects_garbage() {
        let parsed = parse_ticket_date("08/18/2025, 07:06:29 PM").unwrap();
        assert_eq!(
            parsed.date(),
            NaiveDate::from_ymd_opt(2025, 8, 18).unwrap()
        );
        assert_eq!(parsed.hour(), 19);
        assert_eq!(parsed.second(), 29);

        assert!(parse_ticket_date("2025-08-18").is_none());
        assert!(parse_ticket_date("not a date").is_none());
        assert!(parse_ticket_date("").is_none());
    }

    #[tokio::test]
    async fn missing_incident_id_rejects_only_that_row() {
        let (db, source_id) = setup().await;
        let ingest = TicketIngest::new(db.clone());

        let csv = "incident_id,priority,status\n\
                   INC001,P1,Open\n\
                   ,P2,Open\n\
                   INC003,P3,Closed\n";
        let summary = ingest.import_csv(source_id, csv).await.unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 2);
        assert!(summary.errors[0].message.contains("incident_id"));
    }

    #[tokio::test]
    async fn duplicate_incident_ids_within_batch_are_rejected() {
        let (db, source_id) = setup().await;
        let ingest = TicketIngest::new(db.clone());

        let csv = "incident_id\nINC001\nINC001\n";
        let summary = ingest.import_csv(source_id, csv).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 1);
        assert!(summary.errors[0].message.contains("duplicate"));

        // A re-import of the same incident is also rejected.
        let summary = ingest.import_csv(source_id, "incident_id\nINC001\n").await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.rejected, 1);
    }

    #[tokio::test]
    async fn assignee_mapping_and_field_cleaning() {
        let (db, source_id) = setup().await;
        MasterMapping::create(
            &db.conn,
            &CreateMasterMapping {
                source_id,
                external_identity_value: "jdoe".to_string(),
                internal_user_email: "jdoe@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        let ingest = TicketIngest::new(db.clone());

        let csv = "incident_id,assigned_to,opened_at,reassignment_count\n\
                   INC001,jdoe,\"08/18/2025, 07:06:29 PM\",3\n\
                   INC002,unknown,garbage,many\n";
        let summary = ingest.import_csv(source_id, csv).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, 0);

        let tickets = UploadedTicket::find_by_source_id(&db.conn, source_id)
            .await
            .unwrap();
        let first = tickets.iter().find(|t| t.incident_id == "INC001").unwrap();
        assert_eq!(
            first.mapped_user_email.as_deref(),
            Some("jdoe@example.com")
        );
        assert!(first.opened_at.is_some());
        assert_eq!(first.reassignment_count, Some(3));

        let second = tickets.iter().find(|t| t.incident_id == "INC002").unwrap();
        assert_eq!(second.mapped_user_email, None);
        assert_eq!(second.opened_at, None);
        assert_eq!(second.reassignment_count, None);
    }

    #[tokio::test]
    async fn insert_failure_rejects_only_that_row() {
        let (db, source_id) = setup().await;
        // A trigger that aborts one specific insert stands in for a per-row
        // database failure.
        db.conn
            .execute_unprepared(
                "CREATE TRIGGER block_inc002 BEFORE INSERT ON uploaded_tickets \
                 WHEN NEW.incident_id = 'INC002' \
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .await
            .unwrap();
        let ingest = TicketIngest::new(db.clone());

        let csv = "incident_id\nINC001\nINC002\nINC003\n";
        let summary = ingest.import_csv(source_id, csv).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errors[0].row, 2);
        assert!(summary.errors[0].message.contains("insert failed"));
    }

    #[tokio::test]
    async fn malformed_incident_id_is_rejected() {
        let (db, source_id) = setup().await;
        let ingest = TicketIngest::new(db);

        let csv = "incident_id\n-INC001\nINC 002\nINC003\n";
        let summary = ingest.import_csv(source_id, csv).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 2);
    }
}
