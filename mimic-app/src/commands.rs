use anyhow::Result;
use mimic_behavior::path::{Point, generate_path};
use mimic_behavior::random::{self, RandomSource};
use mimic_behavior::timing::TimingController;
use mimic_behavior::{Action, BehaviorError, Pacer, RateGovernor, StealthSession};
use mimic_config::MimicConfig;
use mimic_drivers::browser::driver::MimicDriver;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Print the validated configuration.
pub fn check(cfg: &MimicConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(cfg)?);
    Ok(())
}

/// Print a generated pointer path.
pub fn path(from: (f64, f64), to: (f64, f64), seed: Option<u64>) -> Result<()> {
    println!("{}", path_json(from, to, seed)?);
    Ok(())
}

fn path_json(from: (f64, f64), to: (f64, f64), seed: Option<u64>) -> Result<String> {
    let mut rng: Box<dyn RandomSource> = match seed {
        Some(seed) => random::seeded(seed),
        None => random::entropy(),
    };
    let points = generate_path(
        Point::new(from.0, from.1),
        Point::new(to.0, to.1),
        rng.as_mut(),
    );
    Ok(serde_json::to_string_pretty(&points)?)
}

/// Open `url`, read through it, and print the governor's counters.
///
/// Ctrl-C cancels whatever wait or gesture is in flight; the browser session
/// is closed either way.
pub async fn browse(cfg: &MimicConfig, url: &str) -> Result<()> {
    let pacer = Pacer::system();
    cancel_on_ctrl_c(pacer.cancellation());

    let mut governor = RateGovernor::new(&cfg.rate_limits, pacer.clone())?;

    let mut gate = TimingController::new(&cfg.stealth, pacer.clone(), random::entropy())?;
    let outcome = match gate.await_business_hours().await {
        Ok(_) => visit(cfg, url, pacer, &mut governor).await,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Err(e) if matches!(e.downcast_ref::<BehaviorError>(), Some(BehaviorError::Cancelled)) => {
            info!(target: "app.browse", "interrupted");
        }
        other => other?,
    }
    println!("{}", serde_json::to_string_pretty(&governor.stats())?);
    Ok(())
}

async fn visit(
    cfg: &MimicConfig,
    url: &str,
    pacer: Pacer,
    governor: &mut RateGovernor,
) -> Result<()> {
    let mut driver = MimicDriver::connect(&cfg.browser).await?;
    let result = async {
        let page = Arc::new(driver.goto(url).await?);
        governor.record(Action::Search);

        let mut session = StealthSession::new(page.clone(), &cfg.stealth, pacer.clone())?;
        if cfg.stealth.enable_mouse_movement {
            session.pointer().wander().await?;
        }
        session.browse().await?;
        let text_len = page.text_length().await?;
        let read = session.timing().reading_delay(text_len).await?;
        info!(target: "app.browse", %url, text_len, read_ms = read.as_millis() as u64, "page read");
        anyhow::Ok(())
    }
    .await;

    prefer_visit_error(result, driver.close().await)
}

/// The visit's own error wins over a failure to close the browser.
fn prefer_visit_error(visit: Result<()>, closed: Result<()>) -> Result<()> {
    if let Err(e) = closed {
        warn!(target: "app.browse", error = %e, "failed to close browser session");
    }
    visit
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}
