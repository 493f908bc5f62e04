//! Scripted presenter: claims the presenter role and streams a synthetic
//! accelerometer signal, clearing the chart every few seconds.
//!
//! ```text
//! presenter-sim [ws://127.0.0.1:3000] [rate_hz] [clear_every_secs]
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use sensorcast_protocol::{ClientEvent, Codec, JsonCodec, Role, Sample, ServerEvent};
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

struct Settings {
    url: String,
    rate_hz: u32,
    clear_every: Duration,
}

impl Settings {
    fn from_args() -> Result<Self, Box<dyn std::error::Error>> {
        let mut args = std::env::args().skip(1);
        let url = args.next().unwrap_or_else(|| "ws://127.0.0.1:3000".into());
        let rate_hz = match args.next() {
            Some(raw) => raw.parse()?,
            None => 30,
        };
        let clear_every = match args.next() {
            Some(raw) => Duration::from_secs(raw.parse()?),
            None => Duration::from_secs(10),
        };
        if rate_hz == 0 {
            return Err("rate_hz must be at least 1".into());
        }
        Ok(Self {
            url,
            rate_hz,
            clear_every,
        })
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A phone lying on a table and being rocked gently: gravity on z,
/// slow sway on x and y, plus sensor noise.
fn reading(t: f64, rng: &mut impl Rng) -> Sample {
    Sample {
        x: (t * 1.3).sin() * 2.0 + rng.random_range(-0.05..0.05_f64),
        y: (t * 0.7).cos() * 1.5 + rng.random_range(-0.05..0.05_f64),
        z: 9.81 + (t * 3.1).sin() * 0.2 + rng.random_range(-0.05..0.05_f64),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_args()?;
    let codec = JsonCodec;

    let (ws, _) = tokio_tungstenite::connect_async(settings.url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();
    tracing::info!(url = %settings.url, "connected");

    let request = codec.encode(&ClientEvent::SelectRole(Role::Presenter))?;
    sink.send(Message::Text(String::from_utf8(request)?.into())).await?;

    let reply = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => break codec.decode::<ServerEvent>(text.as_bytes())?,
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err("server closed the connection".into()),
        }
    };
    match reply {
        ServerEvent::RoleAssigned(Role::Presenter) => tracing::info!("presenter role granted"),
        ServerEvent::RoleAssignFailure(reason) => return Err(reason.into()),
        other => return Err(format!("unexpected reply: {other:?}").into()),
    }

    // Viewers' events never come back to us; keep reading so close frames
    // and pings are handled.
    tokio::spawn(async move { while let Some(Ok(_)) = stream.next().await {} });

    let period = Duration::from_secs_f64(1.0 / f64::from(settings.rate_hz));
    let mut ticker = tokio::time::interval(period);
    let mut clear_timer = tokio::time::interval(settings.clear_every);
    clear_timer.tick().await;
    let mut rng = rand::rng();
    let started = tokio::time::Instant::now();
    let mut sent: u64 = 0;

    loop {
        let event = tokio::select! {
            _ = ticker.tick() => {
                ClientEvent::SensorData(reading(started.elapsed().as_secs_f64(), &mut rng))
            }
            _ = clear_timer.tick() => {
                tracing::info!(sent, "clearing chart");
                ClientEvent::ClearChart
            }
            _ = tokio::signal::ctrl_c() => break,
        };
        let bytes = codec.encode(&event)?;
        sink.send(Message::Text(String::from_utf8(bytes)?.into())).await?;
        sent += 1;
    }

    tracing::info!(sent, "stopping");
    sink.close().await?;
    Ok(())
}
