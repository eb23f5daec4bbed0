use chrono::Local;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use gremlin_tempo::replay::{self, ReplayScript};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Replays a scripted press/release timeline against a Tempo action
#[derive(Parser, Debug)]
#[command(name = "tempo-replay", version, about)]
struct Args {
    /// TOML replay script
    script: PathBuf,

    /// Write the script's Tempo action to this .xml or .toml file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log dispatcher internals
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup(args.verbose)?;

    let script = ReplayScript::load(&args.script)
        .await
        .map_err(|e| eyre!("Failed to load {:?}: {}", args.script, e))?;

    if let Some(path) = &args.save {
        let model = script
            .tempo
            .clone()
            .into_model(gremlin_tempo::input::InputType::JoystickButton)?;
        model.save(path).await?;
        info!("Saved tempo action to {:?}", path);
    }

    info!(
        "Replay started at {}",
        Local::now().format("%H:%M:%S.%3f")
    );
    let report = replay::run(&script).await?;

    println!(
        "steps: {} handled, {} rejected, {} failed",
        report.handled, report.rejected, report.failed
    );
    for (name, invocations) in [("short", &report.short), ("long", &report.long)] {
        println!("{name} branch: {} invocation(s)", invocations.len());
        for invocation in invocations {
            println!(
                "  +{:>6}ms  {:?}",
                report.offset_ms(invocation),
                invocation.value.current
            );
        }
    }
    if report.failed > 0 {
        warn!("{} step(s) failed", report.failed);
    }
    Ok(())
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging(if verbose { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
