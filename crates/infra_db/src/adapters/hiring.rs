//! PostgreSQL Hiring Adapter
//!
//! Implements `HiringRepository` over the `hirings`, `quotations` and
//! `quotation_deliverables` tables. A save writes the hiring row with a
//! version check and upserts the quotation history in the same
//! transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DeliverableId, DomainPort, HealthCheckResult, HealthCheckable, HiringId, Money, PortError,
    QuotationId, ServiceId, UserId,
};
use domain_hiring::{Deliverable, Hiring, HiringRepository, Quotation};

use crate::error::DatabaseError;
use crate::repositories::hirings::{DeliverableRow, HiringRow, HiringsRepository, QuotationRow};
use crate::repositories::{parse_column, unsigned};

#[derive(Debug, Clone)]
pub struct PostgresHiringAdapter {
    repository: HiringsRepository,
}

impl PostgresHiringAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: HiringsRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &HiringsRepository {
        &self.repository
    }

    async fn load(&self, row: HiringRow) -> Result<Hiring, DatabaseError> {
        let quotations = self.repository.quotations(row.hiring_id).await?;
        let deliverables = self.repository.deliverables(row.hiring_id).await?;
        row_to_hiring(row, quotations, deliverables)
    }

    async fn write_history(
        conn: &mut sqlx::PgConnection,
        hiring: &Hiring,
    ) -> Result<(), DatabaseError> {
        for (sequence, quotation) in hiring.quotations.iter().enumerate() {
            let row = quotation_row(hiring.id, sequence, quotation);
            HiringsRepository::upsert_quotation(&mut *conn, &row).await?;
            for (position, deliverable) in quotation.deliverables.iter().enumerate() {
                let row = deliverable_row(quotation.id, position, deliverable);
                HiringsRepository::insert_deliverable(&mut *conn, &row).await?;
            }
        }
        Ok(())
    }
}

impl DomainPort for PostgresHiringAdapter {}

#[async_trait]
impl HealthCheckable for PostgresHiringAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), "postgres-hiring-adapter").await
    }
}

#[async_trait]
impl HiringRepository for PostgresHiringAdapter {
    #[instrument(skip(self), fields(hiring_id = %id))]
    async fn get(&self, id: HiringId) -> Result<Hiring, PortError> {
        let row = self
            .repository
            .find(*id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("Hiring", id))?;
        Ok(self.load(row).await?)
    }

    async fn find_by_preference(&self, preference_id: &str) -> Result<Option<Hiring>, PortError> {
        debug!(preference_id, "looking up hiring by preference");
        match self.repository.find_by_preference(preference_id).await? {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_active_for(
        &self,
        client_id: UserId,
        provider_id: UserId,
        service_id: ServiceId,
    ) -> Result<Option<Hiring>, PortError> {
        let row = self
            .repository
            .find_active_for(*client_id.as_uuid(), *provider_id.as_uuid(), *service_id.as_uuid())
            .await?;
        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, hiring), fields(hiring_id = %hiring.id))]
    async fn insert(&self, hiring: &Hiring) -> Result<(), PortError> {
        let mut tx = self.repository.pool().begin().await.map_err(DatabaseError::from)?;
        HiringsRepository::insert(&mut *tx, &hiring_row(hiring)?).await?;
        Self::write_history(&mut *tx, hiring).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self, hiring), fields(hiring_id = %hiring.id, version = hiring.version))]
    async fn save(&self, hiring: &mut Hiring) -> Result<(), PortError> {
        let mut tx = self.repository.pool().begin().await.map_err(DatabaseError::from)?;
        let updated = HiringsRepository::update(&mut *tx, &hiring_row(hiring)?).await?;
        if updated == 0 {
            tx.rollback().await.map_err(DatabaseError::from)?;
            return Err(if self.repository.exists(*hiring.id.as_uuid()).await? {
                DatabaseError::stale("Hiring", hiring.id, hiring.version)
            } else {
                DatabaseError::not_found("Hiring", hiring.id)
            }
            .into());
        }
        Self::write_history(&mut *tx, hiring).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        hiring.version += 1;
        Ok(())
    }
}

fn hiring_row(hiring: &Hiring) -> Result<HiringRow, DatabaseError> {
    let payment_history = serde_json::to_value(&hiring.payment_history)
        .map_err(|e| DatabaseError::corrupt(format!("hiring {}: {e}", hiring.id)))?;
    Ok(HiringRow {
        hiring_id: *hiring.id.as_uuid(),
        client_id: *hiring.client_id.as_uuid(),
        provider_id: *hiring.provider_id.as_uuid(),
        service_id: *hiring.service_id.as_uuid(),
        status: hiring.status.as_str().to_string(),
        preference_id: hiring.preference_id.clone(),
        payment_id: hiring.payment_id.clone(),
        payment_status: hiring.payment_status.map(|s| s.as_str().to_string()),
        paid_at: hiring.paid_at,
        payment_history,
        retry_count: hiring.retry_count as i32,
        pre_dispute_status: hiring.pre_dispute_status.map(|s| s.as_str().to_string()),
        dispute_claim_id: hiring.dispute_claim_id.map(|id| *id.as_uuid()),
        current_quotation_id: hiring.current_quotation_id.map(|id| *id.as_uuid()),
        version: hiring.version as i32,
        created_at: hiring.created_at,
        updated_at: hiring.updated_at,
    })
}

fn quotation_row(hiring_id: HiringId, sequence: usize, quotation: &Quotation) -> QuotationRow {
    QuotationRow {
        quotation_id: *quotation.id.as_uuid(),
        hiring_id: *hiring_id.as_uuid(),
        sequence: sequence as i32 + 1,
        quoted_price: quotation.quoted_price.amount(),
        currency: quotation.quoted_price.currency().code().to_string(),
        estimated_hours: quotation.estimated_hours,
        estimated_time_unit: quotation.estimated_time_unit.as_str().to_string(),
        notes: quotation.notes.clone(),
        validity_days: quotation.validity_days as i32,
        quoted_at: quotation.quoted_at,
        expires_at: quotation.expires_at,
        status: quotation.status.as_str().to_string(),
    }
}

fn deliverable_row(quotation_id: QuotationId, position: usize, deliverable: &Deliverable) -> DeliverableRow {
    DeliverableRow {
        deliverable_id: *deliverable.id.as_uuid(),
        quotation_id: *quotation_id.as_uuid(),
        position: position as i32 + 1,
        title: deliverable.title.clone(),
        description: deliverable.description.clone(),
        price: deliverable.price.amount(),
        currency: deliverable.price.currency().code().to_string(),
        estimated_date: deliverable.estimated_date,
    }
}

fn row_to_hiring(
    row: HiringRow,
    quotations: Vec<QuotationRow>,
    deliverables: Vec<DeliverableRow>,
) -> Result<Hiring, DatabaseError> {
    let mut hiring = Hiring::new(
        UserId::from_uuid(row.client_id),
        UserId::from_uuid(row.provider_id),
        ServiceId::from_uuid(row.service_id),
        row.created_at,
    )
    .map_err(|e| DatabaseError::corrupt(format!("hiring {}: {e}", row.hiring_id)))?;
    hiring.take_events();

    hiring.id = HiringId::from_uuid(row.hiring_id);
    hiring.status = parse_column("hirings.status", &row.status)?;
    hiring.preference_id = row.preference_id;
    hiring.payment_id = row.payment_id;
    hiring.payment_status = row
        .payment_status
        .as_deref()
        .map(|s| parse_column("hirings.payment_status", s))
        .transpose()?;
    hiring.paid_at = row.paid_at;
    hiring.payment_history = serde_json::from_value(row.payment_history)
        .map_err(|e| DatabaseError::corrupt(format!("hirings.payment_history of {}: {e}", row.hiring_id)))?;
    hiring.retry_count = unsigned("hirings.retry_count", row.retry_count)?;
    hiring.pre_dispute_status = row
        .pre_dispute_status
        .as_deref()
        .map(|s| parse_column("hirings.pre_dispute_status", s))
        .transpose()?;
    hiring.dispute_claim_id = row.dispute_claim_id.map(Into::into);
    hiring.current_quotation_id = row.current_quotation_id.map(QuotationId::from_uuid);
    hiring.version = unsigned("hirings.version", row.version)?;
    hiring.updated_at = row.updated_at;
    hiring.quotations = quotations
        .into_iter()
        .map(|q| {
            let items: Vec<&DeliverableRow> =
                deliverables.iter().filter(|d| d.quotation_id == q.quotation_id).collect();
            row_to_quotation(q, &items)
        })
        .collect::<Result<_, _>>()?;
    Ok(hiring)
}

fn money(amount: rust_decimal::Decimal, currency: &str) -> Result<Money, DatabaseError> {
    Ok(Money::new(amount, parse_column("currency", currency)?))
}

fn row_to_quotation(row: QuotationRow, deliverables: &[&DeliverableRow]) -> Result<Quotation, DatabaseError> {
    Ok(Quotation {
        id: QuotationId::from_uuid(row.quotation_id),
        quoted_price: money(row.quoted_price, &row.currency)?,
        estimated_hours: row.estimated_hours,
        estimated_time_unit: parse_column("quotations.estimated_time_unit", &row.estimated_time_unit)?,
        notes: row.notes,
        validity_days: unsigned("quotations.validity_days", row.validity_days)?,
        quoted_at: row.quoted_at,
        expires_at: row.expires_at,
        status: parse_column("quotations.status", &row.status)?,
        deliverables: deliverables
            .iter()
            .map(|d| {
                Ok(Deliverable {
                    id: DeliverableId::from_uuid(d.deliverable_id),
                    title: d.title.clone(),
                    description: d.description.clone(),
                    price: money(d.price, &d.currency)?,
                    estimated_date: d.estimated_date,
                })
            })
            .collect::<Result<_, DatabaseError>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::Currency;
    use domain_hiring::{HiringStatus, QuoteTerms, TimeUnit};
    use rust_decimal_macros::dec;

    #[test]
    fn test_rows_rebuild_the_same_hiring() {
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).unwrap();
        let mut hiring = Hiring::new(UserId::new(), UserId::new(), ServiceId::new(), now).unwrap();
        let quotation = Quotation::issue(
            QuoteTerms {
                price: Money::new(dec!(250), Currency::BRL),
                estimated_hours: dec!(3),
                estimated_time_unit: TimeUnit::Days,
                notes: Some("two rounds of revisions".into()),
                validity_days: Some(4),
                deliverables: Vec::new(),
            },
            now,
            7,
        )
        .unwrap();
        hiring.attach_quotation(quotation, now).unwrap();
        hiring.start_checkout("pref-1", now).unwrap();
        hiring.reject_payment("pay-1", now).unwrap();
        hiring.version = 3;

        let quotations = vec![quotation_row(hiring.id, 0, &hiring.quotations[0])];
        let rebuilt = row_to_hiring(hiring_row(&hiring).unwrap(), quotations, Vec::new()).unwrap();

        assert_eq!(rebuilt.id, hiring.id);
        assert_eq!(rebuilt.status, HiringStatus::PaymentRejected);
        assert_eq!(rebuilt.payment_history, hiring.payment_history);
        assert_eq!(rebuilt.version, 3);
        assert_eq!(rebuilt.quotations, hiring.quotations);
        assert_eq!(rebuilt.current_quotation_id, hiring.current_quotation_id);
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let now = Utc::now();
        let hiring = Hiring::new(UserId::new(), UserId::new(), ServiceId::new(), now).unwrap();
        let mut row = hiring_row(&hiring).unwrap();
        row.status = "archived".into();
        assert!(matches!(
            row_to_hiring(row, Vec::new(), Vec::new()),
            Err(DatabaseError::CorruptRow(_))
        ));
    }
}
