use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::{DeliveryStatus, ProductionOrderStatus, SalesOrderStatus};

/// Domain events emitted after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i32,
        customer_id: i32,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: i32,
        from: SalesOrderStatus,
        to: SalesOrderStatus,
    },
    OrderDeleted(i32),
    ProductionStarted {
        production_order_id: i32,
        sales_order_id: i32,
        work_center_id: Option<i32>,
    },
    ProductionStatusChanged {
        production_order_id: i32,
        sales_order_id: i32,
        from: ProductionOrderStatus,
        to: ProductionOrderStatus,
    },
    DeliveryScheduled {
        delivery_id: i32,
        sales_order_id: i32,
    },
    DeliveryStatusChanged {
        delivery_id: i32,
        sales_order_id: i32,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },
    BillingGenerated {
        billing_id: i32,
        sales_order_id: i32,
        invoice_number: String,
    },
    InvoiceSent {
        billing_id: i32,
        recipient: String,
    },
    ProductRestocked {
        product_id: i32,
        quantity: i32,
        stock_qty: i32,
    },
}

impl Event {
    fn kind(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::OrderDeleted(_) => "order_deleted",
            Event::ProductionStarted { .. } => "production_started",
            Event::ProductionStatusChanged { .. } => "production_status_changed",
            Event::DeliveryScheduled { .. } => "delivery_scheduled",
            Event::DeliveryStatusChanged { .. } => "delivery_status_changed",
            Event::BillingGenerated { .. } => "billing_generated",
            Event::InvoiceSent { .. } => "invoice_sent",
            Event::ProductRestocked { .. } => "product_restocked",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Queues an event without waiting. Fails when the channel is full or closed.
    pub fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .try_send(event)
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Queues an event, logging instead of failing. The request that produced
    /// the event has already committed.
    pub fn send_or_log(&self, event: Event) {
        let kind = event.kind();
        if let Err(e) = self.send(event) {
            counter!("mto_events.dropped", 1);
            warn!(event = kind, error = %e, "Dropping domain event");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("mto_events.processed", 1, "kind" => event.kind());
        match &event {
            Event::OrderStatusChanged { order_id, from, to } => {
                info!(order_id, %from, %to, "Sales order status changed");
            }
            Event::ProductionStatusChanged {
                production_order_id,
                sales_order_id,
                from,
                to,
            } => {
                info!(
                    production_order_id,
                    sales_order_id,
                    %from,
                    %to,
                    "Production order status changed"
                );
            }
            Event::DeliveryStatusChanged {
                delivery_id,
                sales_order_id,
                from,
                to,
            } => {
                info!(delivery_id, sales_order_id, %from, %to, "Delivery status changed");
            }
            Event::BillingGenerated {
                billing_id,
                sales_order_id,
                invoice_number,
            } => {
                info!(billing_id, sales_order_id, %invoice_number, "Invoice issued");
            }
            other => info!(event = ?other, "Domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_when_channel_is_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);

        sender.send(Event::OrderDeleted(1)).unwrap();
        assert!(sender.send(Event::OrderDeleted(2)).is_err());

        // send_or_log never fails the caller
        sender.send_or_log(Event::OrderDeleted(3));

        match rx.recv().await {
            Some(Event::OrderDeleted(id)) => assert_eq!(id, 1),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::OrderDeleted(1)).is_err());
    }
}
