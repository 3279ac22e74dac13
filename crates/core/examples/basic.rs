//! Basic circuit breaker and retry usage

use registrar_breaker::{
    CallContext, CanonicalError, CircuitBreaker, DownstreamFailure, FaultTranslator,
    RetryExecutor, RetryPolicy, TransportErrorKind,
};
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("=== Circuit Breaker Basic Example ===\n");

    let circuit = CircuitBreaker::builder("Courses Service")
        .failure_threshold(3)
        .reset_timeout(Duration::from_secs(5))
        .success_threshold(2)
        .on_open(|name| println!("Circuit '{name}' opened"))
        .on_close(|name| println!("Circuit '{name}' closed"))
        .on_half_open(|name| println!("Circuit '{name}' half-open, testing..."))
        .build();
    let translator = FaultTranslator::new("Courses Service");
    let executor = RetryExecutor::new(RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(50),
        per_call_timeout: Some(Duration::from_secs(1)),
    });
    let ctx = CallContext::traced("demo-trace");

    println!("Initial state: {}\n", circuit.state());

    println!("--- Successful call ---");
    let result = executor
        .execute(&circuit, &ctx, |attempt| async move {
            Ok::<_, CanonicalError>(format!("course INF-101 (attempt {})", attempt.index + 1))
        })
        .await;
    report(result);

    println!("\n--- Dependency down ---");
    for _ in 0..2 {
        let result: Result<String, _> = executor
            .execute(&circuit, &ctx, |attempt| {
                let translator = translator.clone();
                async move {
                    Err(translator.translate(
                        DownstreamFailure::Transport {
                            kind: TransportErrorKind::ConnectionRefused,
                            message: "connection refused".to_string(),
                        },
                        attempt.trace_id.as_ref(),
                    ))
                }
            })
            .await;
        report(result);
    }
    println!("State: {}\n", circuit.state());

    println!("--- Attempting call while open ---");
    let result = executor
        .execute(&circuit, &ctx, |_| async { Ok::<_, CanonicalError>("rejected".to_string()) })
        .await;
    report(result);

    println!("\n--- Resetting circuit ---");
    circuit.reset();
    println!("State after reset: {}", circuit.state());
}

fn report(result: Result<String, CanonicalError>) {
    match result {
        Ok(value) => println!("ok: {value}"),
        Err(error) => println!(
            "error: {error} ({})",
            serde_json::to_string(&error).unwrap_or_default()
        ),
    }
}
