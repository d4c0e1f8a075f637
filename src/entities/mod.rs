//! Database entities for the make-to-order workflow.
//!
//! Status columns are stored as short strings and surfaced as enums through
//! `DeriveActiveEnum`, so filters and transitions stay typed end to end.

pub mod billing;
pub mod customer;
pub mod delivery;
pub mod product;
pub mod production_order;
pub mod sales_order;
pub mod sales_order_item;
pub mod work_center;

pub use billing::Entity as Billing;
pub use customer::Entity as Customer;
pub use delivery::{DeliveryStatus, Entity as Delivery};
pub use product::Entity as Product;
pub use production_order::{Entity as ProductionOrder, ProductionOrderStatus};
pub use sales_order::{Entity as SalesOrder, SalesOrderStatus};
pub use sales_order_item::Entity as SalesOrderItem;
pub use work_center::Entity as WorkCenter;
