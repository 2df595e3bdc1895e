use anyhow::{bail, Context, Result};
use ecommerce_admin::client::ApiClient;
use ecommerce_admin::logic::RowStatus;
use ecommerce_admin::model::{Brand, Category, Customer, Entity, Order, OrderItem, Product, User};
use std::time::Duration;

const USAGE: &str = "usage: csv-transfer <import|export> <entity> <file>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Import,
    Export,
}

/// Import a CSV file into one table of a running server, or export a table
/// to a file.
async fn transfer<E: Entity>(client: &ApiClient, direction: Direction, path: &str) -> Result<()> {
    match direction {
        Direction::Export => {
            let csv = client.export_csv::<E>().await?;
            std::fs::write(path, csv).with_context(|| format!("Failed to write {}", path))?;
            println!("Exported {} to {}", E::RESOURCE, path);
        }
        Direction::Import => {
            let csv =
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            let report = client.import_csv::<E>(csv).await?;

            for outcome in &report.rows {
                match &outcome.result {
                    RowStatus::Created { id } => println!("row {}: created id {}", outcome.row, id),
                    RowStatus::Skipped { reason } => {
                        println!("row {}: skipped ({})", outcome.row, reason)
                    }
                    RowStatus::Failed { reason } => {
                        println!("row {}: failed ({})", outcome.row, reason)
                    }
                }
            }
            println!("{}", report.summary());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [direction, entity, path] = args.as_slice() else {
        bail!(USAGE);
    };

    let direction = match direction.as_str() {
        "import" => Direction::Import,
        "export" => Direction::Export,
        other => bail!("unknown direction '{}'\n{}", other, USAGE),
    };

    let base_url =
        std::env::var("ADMIN_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let timeout = match std::env::var("ADMIN_API_TIMEOUT_SECS") {
        Ok(secs) => Duration::from_secs(secs.parse().context("ADMIN_API_TIMEOUT_SECS must be a number")?),
        Err(_) => ecommerce_admin::client::http::DEFAULT_TIMEOUT,
    };
    let client = ApiClient::with_timeout(&base_url, timeout)?;

    println!("Using API at {}", base_url);

    match entity.as_str() {
        "users" => transfer::<User>(&client, direction, path).await,
        "brands" => transfer::<Brand>(&client, direction, path).await,
        "categories" => transfer::<Category>(&client, direction, path).await,
        "customers" => transfer::<Customer>(&client, direction, path).await,
        "products" => transfer::<Product>(&client, direction, path).await,
        "orders" => transfer::<Order>(&client, direction, path).await,
        "order_items" | "orderitems" => transfer::<OrderItem>(&client, direction, path).await,
        other => bail!("unknown entity '{}'", other),
    }
}
