use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MTO Backend API",
        version = "1.0.0",
        description = r#"
# Make-to-Order Backend

Sales orders for bookstore merchandise move through production, delivery and
billing:

```
created -> in_production -> ready_for_delivery -> delivered -> billed
```

Any non-terminal order can be cancelled. Status changes are compare-and-set:
if another request changed the record first, the call fails with `409`.

## Responses

Successful calls return an envelope:

```json
{ "success": true, "data": { }, "message": "optional" }
```

Failures return:

```json
{
  "success": false,
  "error": "Bad Request",
  "detail": "Invalid sales order transition from 'created' to 'billed'",
  "request_id": "8f0c3a54-8d4b-4d8e-9a53-2f6f0d7a1c11",
  "timestamp": "2025-06-01T10:30:00+00:00"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "products", description = "Catalog maintenance"),
        (name = "customers", description = "Customer records"),
        (name = "orders", description = "Sales orders"),
        (name = "production", description = "Production orders"),
        (name = "deliveries", description = "Deliveries"),
        (name = "billings", description = "Billing and invoices"),
        (name = "dashboard", description = "Admin KPIs"),
        (name = "work-centers", description = "Manufacturing locations")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::restock_product,
        crate::handlers::products::delete_product,

        crate::handlers::customers::list_customers,
        crate::handlers::customers::list_customers_paginated,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        crate::handlers::production_orders::list_production_orders,
        crate::handlers::production_orders::get_production_order,
        crate::handlers::production_orders::start_production,
        crate::handlers::production_orders::mark_in_progress,
        crate::handlers::production_orders::mark_complete,
        crate::handlers::production_orders::cancel_production,

        crate::handlers::deliveries::list_deliveries,
        crate::handlers::deliveries::get_delivery,
        crate::handlers::deliveries::create_delivery,
        crate::handlers::deliveries::mark_delivered,
        crate::handlers::deliveries::cancel_delivery,

        crate::handlers::billings::list_billings,
        crate::handlers::billings::get_billing,
        crate::handlers::billings::get_billing_for_order,
        crate::handlers::billings::generate_billing,
        crate::handlers::billings::send_invoice,

        crate::handlers::dashboard::summary,
        crate::handlers::dashboard::production_status,
        crate::handlers::dashboard::customer_orders_summary,

        crate::handlers::work_centers::list_work_centers,
        crate::handlers::work_centers::get_work_center,
        crate::handlers::work_centers::create_work_center,
        crate::handlers::work_centers::update_work_center,
        crate::handlers::work_centers::delete_work_center,
    ),
    components(
        schemas(
            crate::entities::product::Model,
            crate::entities::customer::Model,
            crate::entities::customer::CustomerRole,
            crate::entities::sales_order::Model,
            crate::entities::SalesOrderStatus,
            crate::entities::production_order::Model,
            crate::entities::ProductionOrderStatus,
            crate::entities::delivery::Model,
            crate::entities::DeliveryStatus,
            crate::entities::billing::Model,
            crate::entities::work_center::Model,

            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::RestockRequest,
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::CustomerPage,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderItemRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderSummary,
            crate::services::orders::OrderDetails,
            crate::services::production::StartProductionRequest,
            crate::services::deliveries::CreateDeliveryRequest,
            crate::services::billing::GenerateBillingRequest,
            crate::services::dashboard::DashboardSummary,
            crate::services::dashboard::ProductionStatusSummary,
            crate::services::dashboard::CustomerOrderSummary,
            crate::services::work_centers::CreateWorkCenterRequest,
            crate::services::work_centers::UpdateWorkCenterRequest,
            crate::services::work_centers::WorkCenterPage,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("MTO Backend API"));
        for path in [
            "/api/products/{id}/restock",
            "/api/v1/customers",
            "/api/orders/{id}/status",
            "/api/production-orders/{id}/complete",
            "/api/deliveries/{id}/cancel",
            "/api/billings/send-invoice",
            "/api/billings/by-order/{sales_order_id}",
            "/api/dashboard/summary",
            "/api/dashboard/production-status",
            "/api/dashboard/customers/{customer_id}/orders-summary",
            "/api/v1/work-centers/{id}",
        ] {
            assert!(json.contains(path), "missing {}", path);
        }
    }
}
