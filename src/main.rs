use anyhow::{Context, Result};
use arche_intro::controller::{Event, MediaErrorCode, MediaFault, PlayRejection};
use arche_intro::platform::{DeviceMetrics, SimulatedMedia, StaticEnvironment};
use arche_intro::runtime::IntroSession;
use arche_intro::{detect, style, IntroConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::cell::Cell;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SOURCE: &str = "https://cdn.archeforge.com/intro/forge-intro.mp4";

#[derive(Parser)]
#[command(name = "arche-intro", version, about = "Inspect and simulate the Arche Forge intro video controller")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON file describing the browser environment
    #[arg(long, global = true)]
    env: Option<PathBuf>,

    /// Override the user agent string
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Override the page location
    #[arg(long, global = true)]
    location: Option<String>,

    /// Use phone viewport metrics
    #[arg(long, global = true)]
    phone: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the capability snapshot as JSON
    Detect,
    /// Print the style maps the overlay would use
    Styles {
        /// Dissolve length in milliseconds
        #[arg(long, default_value_t = 500)]
        dissolve_ms: u64,
    },
    /// Drive a scripted playback session and print the lifecycle history
    Simulate {
        #[arg(long, value_enum, default_value_t = Scenario::Autoplay)]
        scenario: Scenario,
        /// JSON file with the intro configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        dissolve_ms: Option<u64>,
        /// Give up if the session has not settled by then
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Autoplay is allowed and the video plays to the end
    Autoplay,
    /// Autoplay is rejected; a tap starts playback
    Blocked,
    /// The asset fails to decode right after becoming playable
    Broken,
    /// The element never reports a usable duration
    NoDuration,
}

fn load_environment(cli: &Cli) -> Result<StaticEnvironment> {
    let mut env = match &cli.env {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading environment {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => StaticEnvironment::default(),
    };
    if let Some(ua) = &cli.user_agent {
        env = env.with_user_agent(ua);
    }
    if let Some(location) = &cli.location {
        env = env.with_location(location);
    }
    if cli.phone {
        env = env.with_metrics(DeviceMetrics::phone());
    }
    Ok(env)
}

fn load_config(path: Option<&PathBuf>) -> Result<IntroConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            IntroConfig::from_json_str(&raw)?
        }
        None => IntroConfig::default(),
    };
    if config.source_url.is_empty() {
        config.source_url = DEFAULT_SOURCE.to_string();
    }
    Ok(config)
}

/// Taps the scripted user makes once the video is playable. The blocked
/// scenario rejects the first play request, whoever issued it.
fn taps_needed(scenario: Scenario, gesture_first: bool) -> u32 {
    let gesture = u32::from(gesture_first);
    match scenario {
        Scenario::Autoplay | Scenario::NoDuration => gesture,
        Scenario::Blocked => 1 + gesture,
        Scenario::Broken => 0,
    }
}

async fn simulate(
    env: StaticEnvironment,
    scenario: Scenario,
    mut config: IntroConfig,
    timeout: Duration,
) -> Result<serde_json::Value> {
    use arche_intro::platform::Environment;

    config.reduced_motion |= env.prefers_reduced_motion();
    if matches!(scenario, Scenario::NoDuration) {
        config.duration_fallback_ms = config.duration_fallback_ms.min(300);
    }
    let snapshot = detect(&env);
    let taps = taps_needed(
        scenario,
        snapshot.needs_user_gesture_for_autoplay || !config.attempt_autoplay,
    );

    let duration = match scenario {
        Scenario::NoDuration => f64::NAN,
        _ => 3.0,
    };
    let media = SimulatedMedia::new().with_duration(duration);
    let mut session = IntroSession::new(config, snapshot, Box::new(media.clone()));
    let tx = session.sender();

    // The simulated browser settles each play request immediately.
    let attempts = Cell::new(0u32);
    let play_tx = tx.clone();
    media.on_play(move || {
        attempts.set(attempts.get() + 1);
        let outcome = match scenario {
            Scenario::Blocked if attempts.get() == 1 => Err(PlayRejection::not_allowed()),
            _ => Ok(()),
        };
        let _ = play_tx.send(Event::PlayResolved(outcome));
    });

    let controller = session.controller_mut();
    controller.on_video_loaded(|| log::info!("video loaded"));
    controller.on_video_error(|msg| log::warn!("video error: {}", msg));
    controller.on_transition_complete(|| log::info!("transition complete"));
    session.mount()?;

    let script_tx = tx.clone();
    tokio::spawn(async move {
        let pause = |ms| tokio::time::sleep(Duration::from_millis(ms));
        for fraction in [0.25, 0.6, 0.9] {
            let _ = script_tx.send(Event::Progress(fraction));
        }
        let _ = script_tx.send(Event::CanPlay);
        if let Scenario::Broken = scenario {
            let fault = MediaFault::new(MediaErrorCode::Decode, "PIPELINE_ERROR_DECODE");
            let _ = script_tx.send(Event::Error(fault));
            return;
        }
        for _ in 0..taps {
            pause(100).await;
            let _ = script_tx.send(Event::UserPlay);
        }
        // without a usable duration the fallback timer ends playback
        if !matches!(scenario, Scenario::NoDuration) {
            pause(200).await;
            let _ = script_tx.send(Event::Ended);
        }
    });

    let settled = session.run(timeout).await?;
    let controller = session.controller();
    Ok(serde_json::json!({
        "scenario": format!("{:?}", scenario),
        "settled": settled,
        "history": controller.history(),
        "state": controller.state(),
        "play_calls": media.play_calls(),
        "frame": controller.render(),
    }))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .init();

    let env = load_environment(&cli)?;
    let output = match &cli.command {
        Command::Detect => serde_json::to_value(detect(&env))?,
        Command::Styles { dissolve_ms } => {
            use arche_intro::platform::Environment;
            let snapshot = detect(&env);
            serde_json::json!({
                "hardware_acceleration": style::hardware_acceleration(&snapshot),
                "responsive_video": style::responsive_video(&snapshot),
                "safe_area_padding": style::safe_area_padding(snapshot.supports_safe_area_insets),
                "dissolve": style::dissolve(*dissolve_ms, env.prefers_reduced_motion(), true),
            })
        }
        Command::Simulate {
            scenario,
            config,
            dissolve_ms,
            timeout_ms,
        } => {
            let mut intro = load_config(config.as_ref())?;
            if let Some(ms) = dissolve_ms {
                intro.dissolve_ms = *ms;
            }
            simulate(env, *scenario, intro, Duration::from_millis(*timeout_ms)).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
