//! Seed data script - populates the database with demo catalog data
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://mto.db?mode=rwc
//!
//! This creates:
//! - bookstore merchandise products
//! - customers covering every role
//! - work centers
//! - optionally, a handful of sales orders in the `created` state

use clap::Parser;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use mto_backend::{
    db::{self, DbConfig},
    entities::customer::CustomerRole,
    services::{
        customers::{CreateCustomerRequest, CustomerService},
        orders::{CreateOrderRequest, OrderItemRequest, OrderService},
        products::{CreateProductRequest, ProductService},
        work_centers::{CreateWorkCenterRequest, WorkCenterService},
    },
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the MTO database with demo data")]
struct Args {
    /// Database to seed; defaults to the configured `database_url`
    #[arg(long)]
    database_url: Option<String>,

    /// Seed an already migrated schema without running migrations
    #[arg(long)]
    skip_migrations: bool,

    /// Number of sample sales orders to create
    #[arg(long, default_value_t = 3)]
    orders: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = match args.database_url {
        Some(url) => url,
        None => mto_backend::config::load_config()?.database_url,
    };

    info!("Connecting to database: {}", database_url);
    let pool = db::establish_connection_with_config(&DbConfig {
        url: database_url,
        ..DbConfig::default()
    })
    .await?;
    if !args.skip_migrations {
        db::run_migrations(&pool).await?;
    }
    let pool = Arc::new(pool);

    let products = ProductService::new(pool.clone(), None);
    let customers = CustomerService::new(pool.clone());
    let work_centers = WorkCenterService::new(pool.clone());
    let orders = OrderService::new(pool.clone(), None);

    let mut product_ids = Vec::new();
    for (name, description, price, stock) in [
        ("University Hoodie", "Heavyweight fleece hoodie with embroidered crest", dec!(45.00), 40),
        ("Lab Coat", "Knee-length cotton lab coat", dec!(32.50), 25),
        ("Department Tote Bag", "Canvas tote with screen-printed logo", dec!(12.00), 120),
        ("Graduation Stole", "Satin stole, custom embroidery", dec!(28.00), 0),
        ("Engraved Tumbler", "Stainless steel tumbler, laser engraved", dec!(18.75), 60),
    ] {
        let product = products
            .create_product(CreateProductRequest {
                name: name.to_string(),
                description: description.to_string(),
                price,
                image_url: None,
                stock_qty: Some(stock),
            })
            .await?;
        product_ids.push(product.id);
    }
    info!("  Created {} products", product_ids.len());

    let mut customer_ids = Vec::new();
    for (name, email, role) in [
        ("Ana Reyes", "ana.reyes@example.edu", CustomerRole::Student),
        ("Dr. Miguel Santos", "msantos@example.edu", CustomerRole::Faculty),
        ("Physics Department", "physics@example.edu", CustomerRole::Department),
        ("Northwind Events", "orders@northwind.example.com", CustomerRole::External),
    ] {
        let customer = customers
            .create_customer(CreateCustomerRequest {
                name: name.to_string(),
                email: email.to_string(),
                role,
                phone: None,
            })
            .await?;
        customer_ids.push(customer.id);
    }
    info!("  Created {} customers", customer_ids.len());

    for (name, address) in [
        ("Print Shop", "Building C, Ground Floor"),
        ("Embroidery Room", "Building C, Room 204"),
        ("Engraving Lab", "Makerspace, Annex 2"),
    ] {
        work_centers
            .create_work_center(CreateWorkCenterRequest {
                name: name.to_string(),
                description: None,
                address: Some(address.to_string()),
            })
            .await?;
    }
    info!("  Created 3 work centers");

    for n in 0..args.orders {
        let customer_id = customer_ids[n % customer_ids.len()];
        let items = vec![
            OrderItemRequest {
                product_id: product_ids[n % product_ids.len()],
                quantity: (n as i32 % 4) + 1,
            },
            OrderItemRequest {
                product_id: product_ids[(n + 2) % product_ids.len()],
                quantity: 2,
            },
        ];
        let order = orders
            .create_order(CreateOrderRequest { customer_id, items })
            .await?;
        info!(order_id = order.id, total = %order.total_amount, "  Created sales order");
    }

    info!("Seed data complete. Explore at http://localhost:8080/swagger-ui");
    Ok(())
}
