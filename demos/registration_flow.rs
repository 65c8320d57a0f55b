//! Walks through a registration flow: issue a code over email and SMS,
//! submit a wrong code, then the right one, and watch the throttle.
//!
//! Run with: cargo run --example registration_flow

use otp_store::{
    Channel, IssueOutcome, OtpStore, ResendOutcome, TracingDispatcher, generate_code, issue_code,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Debug level so the development dispatcher's messages are visible
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🔐 Verification Code Registration Flow");
    println!("======================================\n");

    // Remember the last code so the demo can play the user's part
    let last_code = Arc::new(Mutex::new(String::new()));
    let store = Arc::new(
        OtpStore::builder()
            .with_sweep_interval(Duration::from_secs(30))
            .with_code_generator({
                let last_code = Arc::clone(&last_code);
                move || {
                    let code = generate_code()?;
                    if let Ok(mut slot) = last_code.lock() {
                        slot.clone_from(&code);
                    }
                    Ok(code)
                }
            })
            .build_and_init()
            .await?,
    );
    println!("{}\n", store.config().summary());

    let sweeper = store.spawn_sweeper();
    let dispatcher = TracingDispatcher::new(store.config().code_ttl);

    for (identifier, channel) in [("ada@example.com", Channel::Email), ("5550100", Channel::Sms)] {
        println!("📨 Issuing a code to {identifier} over {channel}");
        match issue_code(&*store, &dispatcher, identifier, channel).await? {
            IssueOutcome::Sent(_) => println!("✅ Code sent"),
            IssueOutcome::Throttled { wait_secs } => println!("⏳ Wait {wait_secs}s"),
            IssueOutcome::DeliveryFailed { reason } => println!("❌ Delivery failed: {reason}"),
        }
        let code = last_code.lock().map(|c| c.clone()).unwrap_or_default();

        let wrong = if code == "000000" { "000001" } else { "000000" };
        let outcome = store.verify(identifier, wrong, channel).await?;
        println!("❌ Wrong code: {}", outcome.message());

        if let ResendOutcome::Throttled { wait_secs } =
            store.resend_check(identifier, channel).await?
        {
            println!("⏳ Resend refused, try again in {wait_secs}s");
        }

        let outcome = store.verify(identifier, &code, channel).await?;
        println!("✅ Right code: {}", outcome.message());

        let outcome = store.verify(identifier, &code, channel).await?;
        println!("🔁 Replayed code: {}\n", outcome.message());
    }

    println!("📊 Outstanding codes: {:?}", store.stats().await?);

    sweeper.shutdown().await;
    println!("👋 Sweeper stopped");
    Ok(())
}
