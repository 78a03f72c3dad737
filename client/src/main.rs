//! `SignDeck` Capture Client - Console Entry Point
//!
//! Runs the capture pipeline and reads actions from stdin, one per line.

use anyhow::Result;
use sd_client::commands;
use sd_client::config::Config;
use sd_client::detection::DetectionEvent;
use sd_client::session::{NoticeKind, SessionState};
use sd_client::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const HELP: &str = "\
commands:
  camera start|stop        start or stop the camera
  cameras                  list capture devices
  hands <n>                report <n> hands in view
  label <l>                select a label
  category <name>          vowels | alphabet | numbers | operations
  capture                  capture one sample
  record start [ms]        start recording (500-5000 ms)
  record stop              stop recording
  predict                  classify the current frame
  model <name>             select the model used for prediction
  train <name>             train a model on stored samples
  models                   list trained models
  delete-model <name>      delete a model
  samples                  show per-class sample counts
  clear-samples            delete all stored samples
  status                   show the session state
  quit                     exit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let _sentry_guard = std::env::var("SENTRY_DSN_CLIENT")
        .ok()
        .filter(|dsn| !dsn.is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    environment: Some(
                        std::env::var("APP_ENV")
                            .unwrap_or_else(|_| "development".to_string())
                            .into(),
                    ),
                    sample_rate: 1.0,
                    send_default_pii: false,
                    ..Default::default()
                },
            ))
        });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sd_client=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api_base_url,
        "Starting SignDeck capture client"
    );

    let state = AppState::start(config)?;
    let printer = spawn_notice_printer(state.session.clone());

    if let Err(e) = commands::start_camera(&state, None).await {
        warn!(error = %e, "Camera unavailable at startup");
    }
    let _ = commands::fetch_models(&state).await;

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !run_command(&state, line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    state.shutdown().await;
    printer.abort();
    Ok(())
}

/// Print every new notice as it lands in the session.
fn spawn_notice_printer(session: SessionState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut rx = session.subscribe();
        let mut last = None;
        while rx.changed().await.is_ok() {
            let notice = rx.borrow_and_update().notice.clone();
            let Some(notice) = notice else { continue };
            if last.as_ref() == Some(&notice.at) {
                continue;
            }
            last = Some(notice.at);
            let tag = match notice.kind {
                NoticeKind::Success => "ok",
                NoticeKind::Warning => "warn",
                NoticeKind::Error => "error",
            };
            println!("[{tag}] {}", notice.message);
        }
    })
}

/// Run one console line. Returns `false` to exit.
async fn run_command(state: &AppState, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return true;
    };
    let rest: Vec<&str> = parts.collect();
    let arg = rest.join(" ");

    // Failures are already surfaced as notices; results worth printing are.
    match (cmd, rest.as_slice()) {
        ("quit" | "exit", _) => return false,
        ("help", _) => println!("{HELP}"),
        ("camera", ["start"]) => {
            let _ = commands::start_camera(state, None).await;
        }
        ("camera", ["stop"]) => commands::stop_camera(state).await,
        ("cameras", _) => match commands::enumerate_cameras().await {
            Ok(devices) if devices.is_empty() => println!("no cameras found"),
            Ok(devices) => {
                for d in devices {
                    println!("  {}: {} ({})", d.index, d.name, d.description);
                }
            }
            Err(e) => println!("[error] {e}"),
        },
        ("hands", [n]) => match n.parse::<usize>() {
            Ok(n) => {
                state.detection.sender().send(DetectionEvent::with_hands(n));
            }
            Err(_) => println!("usage: hands <n>"),
        },
        ("label", [_, ..]) => {
            let _ = commands::set_label(state, &arg);
        }
        ("category", [name]) => {
            if let Ok(label) = commands::select_category(state, name) {
                println!("selected label: {label}");
            }
        }
        ("capture", _) => {
            let _ = commands::capture_once(state).await;
        }
        ("record", ["start"]) => {
            let interval = state.session.recording().interval_ms;
            let _ = commands::start_recording(state, interval).await;
        }
        ("record", ["start", ms]) => match ms.parse::<u64>() {
            Ok(ms) => {
                let _ = commands::start_recording(state, ms).await;
            }
            Err(_) => println!("usage: record start [ms]"),
        },
        ("record", ["stop"]) => {
            if commands::stop_recording(state).await.is_none() {
                println!("not recording");
            }
        }
        ("predict", _) => {
            if let Ok(prediction) = commands::predict_once(state).await {
                for score in prediction.all_predictions.iter().take(5) {
                    println!("  {:<4} {:>6.1}%", score.class, score.confidence * 100.0);
                }
            }
        }
        ("model", [_, ..]) => {
            let _ = commands::select_model(state, &arg);
        }
        ("train", [_, ..]) => {
            let _ = commands::train_model(state, &arg).await;
        }
        ("models", _) => {
            if let Ok(models) = commands::fetch_models(state).await {
                let selected = state.session.model_name();
                for m in models {
                    let mark = if m.name == selected { "*" } else { " " };
                    println!(
                        "{mark} {} - {:.2}% ({} samples, {} classes)",
                        m.name,
                        m.accuracy_percent(),
                        m.sample_count,
                        m.classes.len()
                    );
                }
            }
        }
        ("delete-model", [_, ..]) => {
            let _ = commands::delete_model(state, &arg).await;
        }
        ("samples", _) => {
            if let Ok(inventory) = commands::fetch_samples(state).await {
                println!("total: {}", inventory.total_samples);
                for (label, count) in &inventory.samples_per_class {
                    println!("  {label}: {count}");
                }
            }
        }
        ("clear-samples", _) => {
            let _ = commands::clear_samples(state).await;
        }
        ("status", _) => print_status(state).await,
        _ => println!("unknown command '{line}', try 'help'"),
    }
    true
}

async fn print_status(state: &AppState) {
    let view = state.session.snapshot();
    let detection = state.detection.current_state();
    println!("camera:    {}", if state.camera.is_running().await { "on" } else { "off" });
    println!("hands:     {}", detection.hands_present);
    println!(
        "label:     {} ({})",
        view.selected_label,
        view.category.display_name()
    );
    if view.recording.armed {
        println!(
            "recording: {} every {} ms",
            view.recording.label, view.recording.interval_ms
        );
    } else {
        println!("recording: off");
    }
    println!("queued:    {}", view.recording.queued_count);
    println!(
        "uploads:   {} ok, {} failed",
        view.uploads_succeeded, view.uploads_failed
    );
    println!("samples:   {}", view.inventory.total_samples);
    println!("model:     {}", view.model_name);
}
