//! Deterministic traffic producer for the telemetry gateway
//!
//! Scripts a message sequence per channel (launch first, then random
//! speed/mission/explosion traffic), optionally shuffles it and injects
//! duplicates to exercise the ordering engine, then POSTs everything and
//! reports what the gateway accepted.

use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinSet;

use types::envelope::{Envelope, Metadata, MessageKind};

#[derive(Debug, Parser)]
#[command(name = "loadgen", about = "Rocket telemetry traffic generator")]
struct Args {
    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:8088")]
    endpoint: String,

    /// Number of channels (rockets) to simulate
    #[arg(long, default_value_t = 10)]
    channels: usize,

    /// Messages per channel
    #[arg(long, default_value_t = 100)]
    messages: u64,

    /// Shuffle each channel's messages before sending
    #[arg(long)]
    shuffle: bool,

    /// Probability of re-sending any given message as a duplicate
    #[arg(long, default_value_t = 0.0)]
    duplicate_rate: f64,

    /// RNG seed; same seed, same traffic
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Channels posted concurrently
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    processed: bool,
}

#[derive(Debug, Default)]
struct Totals {
    sent: u64,
    accepted: u64,
    rejected: u64,
    failed: u64,
}

/// Script one channel's message sequence.
fn build_script(
    channel: &str,
    count: u64,
    base: chrono::DateTime<Utc>,
    rng: &mut ChaCha8Rng,
) -> Vec<Envelope> {
    let mut script = Vec::with_capacity(count as usize);

    for number in 1..=count {
        // First message launches; later launches are occasional relaunches.
        let kind = if number == 1 {
            MessageKind::RocketLaunched
        } else {
            match rng.gen_range(0..100) {
                0..=39 => MessageKind::RocketSpeedIncreased,
                40..=69 => MessageKind::RocketSpeedDecreased,
                70..=89 => MessageKind::RocketMissionChanged,
                90..=94 => MessageKind::RocketExploded,
                _ => MessageKind::RocketLaunched,
            }
        };

        let message = match kind {
            MessageKind::RocketLaunched => json!({
                "type": "Falcon-9",
                "launchSpeed": rng.gen_range(0..1000u64),
                "mission": format!("MISSION-{}", rng.gen_range(1..100u32)),
            }),
            MessageKind::RocketSpeedIncreased => json!({ "by": rng.gen_range(1..500u64) }),
            MessageKind::RocketSpeedDecreased => json!({ "by": rng.gen_range(1..500u64) }),
            MessageKind::RocketExploded => json!({ "reason": "engine anomaly" }),
            MessageKind::RocketMissionChanged => {
                json!({ "newMission": format!("MISSION-{}", rng.gen_range(1..100u32)) })
            }
        };

        script.push(Envelope {
            metadata: Metadata {
                channel: channel.to_string(),
                message_number: number,
                message_time: base + ChronoDuration::milliseconds(number as i64),
                message_type: kind,
            },
            message,
        });
    }

    script
}

/// Shuffle and duplicate a script according to the flags.
fn distort(script: Vec<Envelope>, args: &Args, rng: &mut ChaCha8Rng) -> Vec<Envelope> {
    let mut wire: Vec<Envelope> = Vec::with_capacity(script.len() * 2);
    for envelope in script {
        if args.duplicate_rate > 0.0 && rng.gen_bool(args.duplicate_rate.min(1.0)) {
            wire.push(envelope.clone());
        }
        wire.push(envelope);
    }
    if args.shuffle {
        wire.shuffle(rng);
    }
    wire
}

async fn post_channel(
    client: reqwest::Client,
    endpoint: String,
    wire: Vec<Envelope>,
) -> Totals {
    let url = format!("{endpoint}/messages");
    let mut totals = Totals::default();

    for envelope in wire {
        totals.sent += 1;
        let response = client.post(&url).json(&envelope).send().await;
        match response {
            Ok(res) if res.status().is_success() => {
                match res.json::<SubmitResponse>().await {
                    Ok(body) if body.processed => totals.accepted += 1,
                    Ok(_) => totals.rejected += 1,
                    Err(err) => {
                        tracing::warn!(error = %err, "unreadable gateway response");
                        totals.failed += 1;
                    }
                }
            }
            Ok(res) => {
                tracing::warn!(status = %res.status(), "gateway refused message");
                totals.failed += 1;
            }
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                totals.failed += 1;
            }
        }
    }

    totals
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    tracing::info!(
        endpoint = %args.endpoint,
        channels = args.channels,
        messages = args.messages,
        shuffle = args.shuffle,
        duplicate_rate = args.duplicate_rate,
        seed = args.seed,
        "generating traffic"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let client = reqwest::Client::new();
    let base = Utc::now();

    let mut tasks = JoinSet::new();
    let mut totals = Totals::default();

    for c in 0..args.channels {
        let channel = format!("rocket-{c}");
        let script = build_script(&channel, args.messages, base, &mut rng);
        let wire = distort(script, &args, &mut rng);

        while tasks.len() >= args.concurrency.max(1) {
            if let Some(done) = tasks.join_next().await {
                let t: Totals = done?;
                totals.sent += t.sent;
                totals.accepted += t.accepted;
                totals.rejected += t.rejected;
                totals.failed += t.failed;
            }
        }

        tasks.spawn(post_channel(client.clone(), args.endpoint.clone(), wire));
    }

    while let Some(done) = tasks.join_next().await {
        let t: Totals = done?;
        totals.sent += t.sent;
        totals.accepted += t.accepted;
        totals.rejected += t.rejected;
        totals.failed += t.failed;
    }

    tracing::info!(
        sent = totals.sent,
        accepted = totals.accepted,
        rejected = totals.rejected,
        failed = totals.failed,
        "traffic complete"
    );

    if totals.failed > 0 {
        anyhow::bail!("{} requests failed", totals.failed);
    }
    Ok(())
}
