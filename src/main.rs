use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sv7200_dashboard::config;
use sv7200_dashboard::export::ExportOptions;
use sv7200_dashboard::kernel::event::{Channel, Event};
use sv7200_dashboard::kernel::state::{DashboardView, Level};
use sv7200_dashboard::kernel::time;
use sv7200_dashboard::prefs::{JsonFileStore, Language, Preferences};
use sv7200_dashboard::runtime::{Runtime, RuntimeHandle};

struct Labels {
    pressure: &'static str,
    temperature: &'static str,
    flow: &'static str,
    motor: &'static str,
    mode: &'static str,
    firmware: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::En => Labels {
            pressure: "Pressure",
            temperature: "Temperature",
            flow: "Flow",
            motor: "Motor",
            mode: "Mode",
            firmware: "Firmware",
        },
        Language::Pt => Labels {
            pressure: "Pressão",
            temperature: "Temperatura",
            flow: "Caudal",
            motor: "Motor",
            mode: "Modo",
            firmware: "Firmware",
        },
    }
}

fn paint(text: &str, level: Level, dark: bool) -> String {
    let code = match (level, dark) {
        (Level::Normal, _) => return text.to_string(),
        (Level::Warning, false) => "33",
        (Level::Warning, true) => "93",
        (Level::Danger, false) => "31",
        (Level::Danger, true) => "91",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn render(view: &DashboardView, prefs: &Preferences) {
    let l = labels(prefs.language);
    println!(
        "{} [{}] {}: {} bar ({:.0}%) | {}: {} °C | {}: {} L/min | {}: {} | {}: {} | {}: {}",
        time::clock_label(&time::now()),
        view.connection,
        l.pressure,
        paint(&view.pressure, view.indicators.pressure_level, prefs.dark_mode),
        view.indicators.pressure_fill,
        l.temperature,
        paint(&view.temperature, view.indicators.temperature_level, prefs.dark_mode),
        l.flow,
        view.flow,
        l.motor,
        view.motor,
        l.mode,
        view.mode,
        l.firmware,
        view.firmware,
    );
}

async fn export(handle: &RuntimeHandle, args: &[&str], options: ExportOptions) -> anyhow::Result<()> {
    let channels = args
        .iter()
        .map(|a| a.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()?;
    let channels = if channels.is_empty() {
        vec![Channel::Temperature, Channel::Flow]
    } else {
        channels
    };

    let artifact = handle
        .export(channels, options)
        .await
        .context("runtime stopped")??;
    tokio::fs::write(&artifact.filename, &artifact.content)
        .await
        .with_context(|| format!("writing {}", artifact.filename))?;
    println!("Exported {}", artifact.filename);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::default_path);
    let config = config::load(&config_path)?;
    tracing::info!("Starting SV7200 dashboard ({})", config.device.base_url);

    let mut store = JsonFileStore::open(config::config_dir().join("preferences.json"));
    let mut prefs = Preferences::load(&store);
    let export_options = ExportOptions {
        include_statistics: config.export.include_statistics,
        prefix: config.export.prefix.clone(),
    };

    let (runtime, handle) = Runtime::new(&config)?;
    let runtime_task = tokio::spawn(runtime.run());

    let mut view_rx = handle.view();
    let (prefs_tx, mut prefs_rx) = tokio::sync::watch::channel(prefs);
    tokio::spawn(async move {
        while view_rx.changed().await.is_ok() {
            let view = view_rx.borrow_and_update().clone();
            let current = *prefs_rx.borrow_and_update();
            render(&view, &current);
        }
    });

    println!("Commands: toggle | override | connect | export [channels...] | stats | diag | dark | lang en|pt | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = words.split_first() else { continue };

        match cmd {
            "quit" | "exit" => break,
            "connect" => {
                handle.send(Event::Connect).await;
            }
            "export" => {
                if let Err(e) = export(&handle, args, export_options.clone()).await {
                    tracing::error!("Export failed: {:#}", e);
                }
            }
            "stats" => {
                for s in handle.summaries().await.unwrap_or_default() {
                    println!(
                        "{:<12} n={:<6} latest={:<8} all-time mean={:<10} window {}/{} mean={}",
                        s.channel,
                        s.count,
                        s.latest.map(|v| format!("{v:.2}")).unwrap_or_else(|| "--".into()),
                        s.all_time_mean.map(|v| format!("{v:.3}")).unwrap_or_else(|| "--".into()),
                        s.window_len,
                        config.stream.window_capacity,
                        s.windowed_mean.map(|v| format!("{v:.3}")).unwrap_or_else(|| "--".into()),
                    );
                }
            }
            "diag" => {
                if let Some(snap) = handle.diagnostics().await {
                    println!("{}", serde_json::to_string_pretty(&snap)?);
                }
            }
            "dark" => match prefs.toggle_dark_mode(&mut store) {
                Ok(dark) => {
                    prefs_tx.send_replace(prefs);
                    println!("Dark mode {}", if dark { "on" } else { "off" });
                }
                Err(e) => tracing::error!("Cannot save preference: {}", e),
            },
            "lang" => match args.first().map(|a| a.parse::<Language>()) {
                Some(Ok(lang)) => match prefs.set_language(&mut store, lang) {
                    Ok(()) => {
                        prefs_tx.send_replace(prefs);
                    }
                    Err(e) => tracing::error!("Cannot save preference: {}", e),
                },
                Some(Err(e)) => tracing::error!("{}", e),
                None => println!("Language: {}", prefs.language),
            },
            other => {
                handle.send(Event::Command { name: other.to_string() }).await;
            }
        }
    }

    handle.shutdown();
    runtime_task.await.context("runtime task panicked")?;
    Ok(())
}
