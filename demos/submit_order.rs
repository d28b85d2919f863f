//! Submit a pizza order to httpbin.org and print the echoed response.
//!
//! ```sh
//! cargo run --example submit_order              # built-in sample order
//! cargo run --example submit_order -- order.json
//! ```

use pizza_order::{submit_order, OrderRequest, PizzaSize, Topping};
use tracing_subscriber::EnvFilter;

fn sample_order() -> OrderRequest {
    OrderRequest::new(
        "Agent Browser",
        "555-0100",
        "agent@example.com",
        PizzaSize::Large,
        "19:30",
    )
    .with_topping(Topping::Mushroom)
    .with_topping(Topping::Onion)
    .with_comments("Ring twice")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let request = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => sample_order(),
    };

    let response = submit_order(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    let unechoed = response.unechoed_fields(&request);
    if !unechoed.is_empty() {
        eprintln!("Fields not echoed back: {}", unechoed.join(", "));
    }

    Ok(())
}
