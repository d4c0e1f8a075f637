use crate::{
    db::DbPool,
    entities::billing::{self, ActiveModel as BillingActiveModel, Entity as BillingEntity},
    entities::customer::Entity as CustomerEntity,
    entities::product::Entity as ProductEntity,
    entities::sales_order::SalesOrderStatus,
    entities::sales_order_item::{self, Entity as SalesOrderItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::Lifecycle,
    repositories::sales_order_repository,
    services::invoice::{self, InvoiceLine},
    services::mailer::{InvoiceEmail, InvoiceMailer},
};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

const MAX_INVOICE_NUMBER_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateBillingRequest {
    pub sales_order_id: i32,
}

/// Result of a billing request: the record and whether this call created it.
#[derive(Debug, Clone)]
pub struct BillingOutcome {
    pub billing: billing::Model,
    pub created: bool,
}

/// `INV-{YYYY}-{NNNN}` with a random four digit suffix.
pub fn generate_invoice_number<R: Rng + ?Sized>(billed_at: DateTime<Utc>, rng: &mut R) -> String {
    format!("INV-{}-{:04}", billed_at.year(), rng.gen_range(0..10_000))
}

/// Draws candidates from `next_candidate` until one is not used by any
/// billing, giving up after a bounded number of collisions.
pub async fn unique_invoice_number<C, F>(
    conn: &C,
    mut next_candidate: F,
) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
    F: FnMut() -> String,
{
    for attempt in 1..=MAX_INVOICE_NUMBER_ATTEMPTS {
        let candidate = next_candidate();
        let taken = BillingEntity::find()
            .filter(billing::Column::InvoiceNumber.eq(candidate.as_str()))
            .count(conn)
            .await
            .map_err(|e| ServiceError::db("Failed to check invoice number", e))?;
        if taken == 0 {
            return Ok(candidate);
        }
        warn!(attempt, invoice_number = %candidate, "Invoice number collision");
    }
    Err(ServiceError::InternalError(format!(
        "Could not allocate a unique invoice number after {} attempts",
        MAX_INVOICE_NUMBER_ATTEMPTS
    )))
}

/// A unique index rejected the insert: another request billed first.
fn billing_insert_error(sales_order_id: i32, err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!(sales_order_id, %detail, "Billing insert lost a race");
            ServiceError::ConcurrentModification(format!(
                "Sales order {} was billed concurrently",
                sales_order_id
            ))
        }
        _ => ServiceError::db("Failed to insert billing", err),
    }
}

#[derive(Clone)]
pub struct BillingService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    mailer: Option<Arc<dyn InvoiceMailer>>,
    /// Serializes billing generation within this process.
    generation_lock: Arc<Mutex<()>>,
}

impl BillingService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        mailer: Option<Arc<dyn InvoiceMailer>>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            mailer,
            generation_lock: Arc::new(Mutex::new(())),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_billings(&self) -> Result<Vec<billing::Model>, ServiceError> {
        BillingEntity::find()
            .order_by_desc(billing::Column::BilledDate)
            .order_by_desc(billing::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to list billings", e))
    }

    #[instrument(skip(self), fields(billing_id = id))]
    pub async fn get_billing(&self, id: i32) -> Result<billing::Model, ServiceError> {
        BillingEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch billing", e))?
            .ok_or_else(|| ServiceError::not_found("Billing", id))
    }

    #[instrument(skip(self))]
    pub async fn get_billing_for_order(
        &self,
        sales_order_id: i32,
    ) -> Result<billing::Model, ServiceError> {
        Self::find_for_order(&*self.db_pool, sales_order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No billing exists for sales order {}",
                    sales_order_id
                ))
            })
    }

    async fn find_for_order<C: ConnectionTrait>(
        conn: &C,
        sales_order_id: i32,
    ) -> Result<Option<billing::Model>, ServiceError> {
        BillingEntity::find()
            .filter(billing::Column::SalesOrderId.eq(sales_order_id))
            .one(conn)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch billing for order", e))
    }

    /// Bills a delivered order. Repeating the call returns the existing
    /// record; a request that loses a race to another biller gets that
    /// billing too, or `ConcurrentModification` when none is visible yet.
    #[instrument(skip(self))]
    pub async fn generate_billing_for_order(
        &self,
        sales_order_id: i32,
    ) -> Result<BillingOutcome, ServiceError> {
        let _guard = self.generation_lock.lock().await;

        match self.create_billing(sales_order_id).await {
            Err(ServiceError::ConcurrentModification(reason)) => {
                match Self::find_for_order(&*self.db_pool, sales_order_id).await? {
                    Some(existing) => {
                        info!(
                            billing_id = existing.id,
                            sales_order_id, "Billing created concurrently; returning it"
                        );
                        Ok(BillingOutcome {
                            billing: existing,
                            created: false,
                        })
                    }
                    None => Err(ServiceError::ConcurrentModification(reason)),
                }
            }
            other => other,
        }
    }

    async fn create_billing(&self, sales_order_id: i32) -> Result<BillingOutcome, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(|e| ServiceError::db("Failed to begin billing transaction", e))?;

        let order = sales_order_repository::find_or_404(&txn, sales_order_id).await?;
        if let Some(existing) = Self::find_for_order(&txn, sales_order_id).await? {
            info!(
                billing_id = existing.id,
                sales_order_id, "Billing already exists; returning it"
            );
            return Ok(BillingOutcome {
                billing: existing,
                created: false,
            });
        }
        order.status.ensure_transition(SalesOrderStatus::Billed)?;

        // Claim the order first so a concurrent biller fails the status check.
        sales_order_repository::transition_status(
            &txn,
            sales_order_id,
            order.status,
            SalesOrderStatus::Billed,
        )
        .await?;

        let billed_at = Utc::now();
        let invoice_number = unique_invoice_number(&txn, || {
            generate_invoice_number(billed_at, &mut rand::thread_rng())
        })
        .await?;

        let created = BillingActiveModel {
            sales_order_id: Set(sales_order_id),
            invoice_number: Set(invoice_number),
            amount: Set(order.total_amount),
            billed_date: Set(billed_at),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| billing_insert_error(sales_order_id, e))?;

        txn.commit()
            .await
            .map_err(|e| ServiceError::db("Failed to commit billing", e))?;

        info!(
            billing_id = created.id,
            invoice_number = %created.invoice_number,
            sales_order_id,
            "Generated invoice"
        );
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::BillingGenerated {
                billing_id: created.id,
                sales_order_id,
                invoice_number: created.invoice_number.clone(),
            });
            sender.send_or_log(Event::OrderStatusChanged {
                order_id: sales_order_id,
                from: order.status,
                to: SalesOrderStatus::Billed,
            });
        }

        Ok(BillingOutcome {
            billing: created,
            created: true,
        })
    }

    /// Bills the order (or reuses its billing) and emails the invoice to the
    /// customer. The billing stays committed when delivery fails.
    #[instrument(skip(self))]
    pub async fn generate_billing_and_send_invoice(
        &self,
        sales_order_id: i32,
    ) -> Result<BillingOutcome, ServiceError> {
        let outcome = self.generate_billing_for_order(sales_order_id).await?;

        let mailer = self.mailer.as_ref().ok_or_else(|| {
            ServiceError::EmailDelivery("Invoice mailer is not configured".into())
        })?;

        let db = &*self.db_pool;
        let order = sales_order_repository::find_or_404(db, sales_order_id).await?;
        let customer = CustomerEntity::find_by_id(order.customer_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch customer", e))?
            .ok_or_else(|| ServiceError::not_found("Customer", order.customer_id))?;
        if customer.email.trim().is_empty() {
            return Err(ServiceError::EmailDelivery(
                "Customer email address is missing".into(),
            ));
        }

        let lines: Vec<InvoiceLine> = SalesOrderItemEntity::find()
            .find_also_related(ProductEntity)
            .filter(sales_order_item::Column::SalesOrderId.eq(sales_order_id))
            .order_by_asc(sales_order_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("Failed to fetch invoice lines", e))?
            .into_iter()
            .map(|(item, product)| InvoiceLine {
                name: product
                    .map(|p| p.name)
                    .unwrap_or_else(|| format!("Product #{}", item.product_id)),
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect();

        let billing = &outcome.billing;
        let email = InvoiceEmail {
            to: customer.email.clone(),
            subject: format!(
                "Invoice {} for Sales Order #{}",
                billing.invoice_number, order.id
            ),
            html: invoice::render_invoice_email_body(billing, &customer),
            attachment_filename: format!("{}.pdf", billing.invoice_number),
            attachment_content_type: invoice::PDF_CONTENT_TYPE.to_string(),
            attachment: invoice::render_invoice_pdf(billing, &customer, &lines)?,
        };
        mailer.send_invoice(email).await?;

        info!(
            billing_id = billing.id,
            recipient = %customer.email,
            "Invoice email sent"
        );
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::InvoiceSent {
                billing_id: billing.id,
                recipient: customer.email,
            });
        }
        Ok(outcome)
    }
}
