pub mod billings;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod deliveries;
pub mod orders;
pub mod production_orders;
pub mod products;
pub mod work_centers;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    billing::BillingService, customers::CustomerService, dashboard::DashboardService,
    deliveries::DeliveryService, mailer::InvoiceMailer, orders::OrderService,
    production::ProductionService, products::ProductService, work_centers::WorkCenterService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderService>,
    pub production: Arc<ProductionService>,
    pub deliveries: Arc<DeliveryService>,
    pub billing: Arc<BillingService>,
    pub dashboard: Arc<DashboardService>,
    pub work_centers: Arc<WorkCenterService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        mailer: Option<Arc<dyn InvoiceMailer>>,
    ) -> Self {
        let events = Some(event_sender);
        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), events.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone(), events.clone())),
            production: Arc::new(ProductionService::new(db_pool.clone(), events.clone())),
            deliveries: Arc::new(DeliveryService::new(db_pool.clone(), events.clone())),
            billing: Arc::new(BillingService::new(db_pool.clone(), events, mailer)),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            work_centers: Arc::new(WorkCenterService::new(db_pool)),
        }
    }
}
