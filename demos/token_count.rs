//! Token-counting demonstration for the blocking memoizer.
//!
//! Counts tokens with a word/punctuation heuristic (not a real tokenizer)
//! and compares repeated cached calls against uncached ones. Run with
//! `cargo run --example token_count`.

use std::convert::Infallible;
use std::time::Instant;

use memo_cache::Memoizer;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ITERATIONS: usize = 1000;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("--- Token counter benchmark ---\n");

    let memo: Memoizer<usize> = Memoizer::with_defaults();
    let pattern = Regex::new(r"[\w']+|[.,!?;]")?;

    let count_tokens = {
        let pattern = pattern.clone();
        memo.wrap("count_tokens", move |text: &String| -> Result<usize, Infallible> {
            Ok(pattern.find_iter(text).count())
        })
    };

    let text = "Generative AI is transforming the way we build software. ".repeat(10);
    println!(
        "counting tokens for a string of {} characters, {ITERATIONS} times",
        text.len()
    );

    // cached: one miss, then hits
    let start = Instant::now();
    let mut count = 0;
    for _ in 0..ITERATIONS {
        count = count_tokens(&text)?;
    }
    let cached = start.elapsed();
    println!("{count} tokens, with caching:    {cached:.2?}");

    // uncached: clear before every call
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        memo.clear_callable("count_tokens");
        count_tokens(&text)?;
    }
    let uncached = start.elapsed();
    println!("{count} tokens, without caching: {uncached:.2?}");

    let speedup = uncached.as_secs_f64() / cached.as_secs_f64();
    println!("\nspeedup: {speedup:.2}x");

    Ok(())
}
