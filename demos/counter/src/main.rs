//! Counter example binary
//!
//! Demonstrates modelstore with a counter model and a small plugin.

use counter::{counter_store, COUNT};
use modelstore_core::Dispatched;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,modelstore_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Example: modelstore ===\n");

    let store = counter_store()?;
    let _subscription = store.subscribe(|| println!("  (listener) state committed"));

    println!("Initial count: {}", store.get_state()[COUNT]);

    println!("\n>>> Dispatching: count/increment");
    store.dispatch_to(COUNT, "increment", None)?;

    println!("\n>>> Dispatching: count/increment with payload 5");
    store.dispatch_to(COUNT, "increment", Some(json!(5)))?;

    println!("\n>>> Dispatching: count/decrement");
    store.dispatch_to(COUNT, "decrement", None)?;

    println!("\n>>> Dispatching: count/incrementTwice with payload 2");
    if let Dispatched::Ready(doubled) = store.dispatch_to(COUNT, "incrementTwice", Some(json!(2)))? {
        println!("Effect returned: {doubled}");
    }

    println!("\n>>> Dispatching: count/fetchStep with payload 3");
    let step = store
        .dispatch_to(COUNT, "fetchStep", Some(json!(3)))?
        .resolve()
        .await?;
    println!("Fetched step: {step}");
    store.dispatch_to(COUNT, "increment", Some(step))?;

    println!("\nExposed version: {}", store.exposed_value("version")?);
    println!("Exposed doubled(): {}", store.call("doubled", vec![])?);

    println!("\n>>> Dispatching: count/reset");
    store.dispatch_to(COUNT, "reset", None)?;
    println!("Count after reset: {}", store.get_state()[COUNT]);

    println!("\n=== Demonstration Complete ===");
    println!("\nKey concepts demonstrated:");
    println!("  • Model: named state slice with reducers and effects");
    println!("  • Reducer: pure function (slice, payload) → next slice");
    println!("  • Effect: runs after its reducer, its result is dispatch's result");
    println!("  • Plugin: middleware plus exposed values and functions");
    Ok(())
}
