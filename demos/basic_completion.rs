//! Caching demonstration against a simulated LLM client.
//!
//! The client's `generate` sleeps to imitate network latency and model
//! inference time; the memoizer makes the second identical call return
//! immediately. Run with `cargo run --example basic_completion`.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use memo_cache::{AsyncMemoizer, MemoOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A stand-in for a real LLM API client.
#[derive(Clone)]
struct SimulatedClient {
    model: String,
}

impl SimulatedClient {
    fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }

    /// Simulates an expensive completion call: two seconds of latency.
    async fn generate(&self, prompt: &str) -> Result<String, Infallible> {
        println!(">> simulating an expensive API call for prompt: '{prompt}'");
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(format!(
            "This is a simulated response for the prompt: '{prompt}' using model {}.",
            self.model
        ))
    }
}

/// Calls `generate` through the memoizer and reports elapsed time.
async fn measure(
    memo: &AsyncMemoizer<String, Infallible>,
    client: &SimulatedClient,
    prompt: &str,
) -> anyhow::Result<Duration> {
    let key = memo
        .key_for("generate")
        .receiver(&client.model)?
        .arg(&prompt)?
        .build()?;

    let start = Instant::now();
    let client = client.clone();
    let prompt_owned = prompt.to_string();
    let response = memo
        .get_or_compute(&key, move || async move {
            client.generate(&prompt_owned).await
        })
        .await?;
    let elapsed = start.elapsed();

    println!("response: '{response}'");
    println!("time taken: {:.2?}\n", elapsed);
    Ok(elapsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("--- Caching demonstration against a simulated LLM client ---\n");

    let memo: AsyncMemoizer<String, Infallible> =
        AsyncMemoizer::new(MemoOptions::new().with_ttl(Duration::from_secs(60)))?;
    let client = SimulatedClient::new("sim-large-v1");
    let prompt = "What is the speed of light?";

    println!("--- first call (expected MISS, slow) ---");
    let first = measure(&memo, &client, prompt).await?;

    println!("--- second call, same prompt (expected HIT, instant) ---");
    let second = measure(&memo, &client, prompt).await?;

    if second < first {
        let improvement = (first - second).as_secs_f64() / first.as_secs_f64() * 100.0;
        println!("the cached call was ~{improvement:.0}% faster\n");
    }

    println!("--- third call, new prompt (expected MISS) ---");
    measure(&memo, &client, "What is the capital of France?").await?;

    println!("--- clearing the cache ---");
    memo.clear_all().await;

    println!("--- fourth call, original prompt after clear (expected MISS) ---");
    measure(&memo, &client, prompt).await?;

    let stats = memo.stats();
    println!(
        "stats: {} hits, {} misses, hit rate {:.0}%",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    Ok(())
}
