use aberration::{
    Demo, DemoEvent, RenderContext, SessionState, SourceMode,
    config::Config,
    source::StaticSource,
    target::{self, PngTarget},
};
use anyhow::{Context, Result, bail};
use camera::{CaptureBackend, FacingMode, SyntheticBackend, SyntheticConfig};
use clap::{Parser, Subcommand};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

const LIVE_DURATION_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Chromatic aberration over a still image or a live camera feed"
)]
struct Args {
    /// Config file, defaults to the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channel shift in pixels
    #[arg(short, long, allow_negative_numbers = true)]
    intensity: Option<i32>,

    /// Shifted byte lane: 0 red, 1 green, 2 blue, 3 alpha
    #[arg(short, long, allow_negative_numbers = true)]
    phase: Option<i32>,

    /// Still image used in static mode
    #[arg(long)]
    asset: Option<PathBuf>,

    /// PNG file every presented frame is written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Camera to use: user (front) or environment (back)
    #[arg(long)]
    facing: Option<FacingMode>,

    /// Use the generated test pattern instead of a real camera
    #[arg(long)]
    synthetic: bool,

    /// Defaults to the `[source].mode` of the config file
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the still image once
    Render,

    /// Run the live camera feed, then return to the still image
    Live {
        /// Seconds to stay live, Ctrl-C stops earlier
        #[arg(long, default_value_t = LIVE_DURATION_SECS)]
        duration: u64,

        /// Switch to this camera halfway through
        #[arg(long)]
        switch_to: Option<FacingMode>,
    },

    /// List the cameras the capture backend can open
    Cameras,
}

fn main() -> Result<()> {
    aberration::init_logger();

    let args = Args::parse();
    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);

    let backend = capture_backend(&config, args.synthetic);

    let command = args.command.unwrap_or(match config.source.mode {
        SourceMode::Static => Command::Render,
        SourceMode::Live => Command::Live {
            duration: LIVE_DURATION_SECS,
            switch_to: None,
        },
    });

    match command {
        Command::Cameras => {
            let cameras = backend.devices();
            println!("{} camera(s) on the {} backend", cameras.len(), backend.name());
            for cam in cameras {
                println!("  [{}] {} - {}", cam.index, cam.name, cam.description);
            }
            Ok(())
        }
        Command::Render => {
            config.source.mode = SourceMode::Static;
            let (mut demo, events) = build_demo(&config, backend);
            let logger = spawn_event_logger(events);

            demo.start().with_context(|| "render static image failed")?;
            log::info!("wrote {}", config.output.path.display());

            drop(demo);
            _ = logger.join();
            Ok(())
        }
        Command::Live {
            duration,
            switch_to,
        } => {
            config.source.mode = SourceMode::Live;
            run_live(&config, backend, Duration::from_secs(duration), switch_to)
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let config = Config::load(&path)?;
    if config.is_first_run {
        log::info!("wrote default config to {}", path.display());
    }

    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(intensity) = args.intensity {
        config.effect.intensity = intensity;
    }

    if let Some(phase) = args.phase {
        config.effect.phase = phase;
    }

    if let Some(asset) = &args.asset {
        config.source.asset = asset.clone();
    }

    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }

    if let Some(facing) = args.facing {
        config.source.facing = facing;
    }
}

#[cfg(feature = "native")]
fn capture_backend(config: &Config, synthetic: bool) -> Arc<dyn CaptureBackend> {
    use camera::{CameraConfig, NativeBackend};

    if synthetic {
        return synthetic_backend(config);
    }

    Arc::new(NativeBackend::new(
        CameraConfig::default()
            .with_fps(config.live.fps)
            .with_width(config.live.width)
            .with_height(config.live.height),
    ))
}

#[cfg(not(feature = "native"))]
fn capture_backend(config: &Config, synthetic: bool) -> Arc<dyn CaptureBackend> {
    if !synthetic {
        log::info!("built without the `native` feature, using the synthetic camera");
    }

    synthetic_backend(config)
}

fn synthetic_backend(config: &Config) -> Arc<dyn CaptureBackend> {
    Arc::new(SyntheticBackend::new(
        SyntheticConfig::default()
            .with_width(config.live.width)
            .with_height(config.live.height),
    ))
}

fn build_demo(
    config: &Config,
    backend: Arc<dyn CaptureBackend>,
) -> (Demo, crossbeam::channel::Receiver<DemoEvent>) {
    let context = RenderContext::new(config.params(), config.source.mode, config.source.facing);

    Demo::new(
        context,
        backend,
        StaticSource::new(&config.source.asset),
        target::shared(PngTarget::new(&config.output.path)),
        config.demo_options(),
    )
}

// Frame events are frequent in live mode, so only the rest is logged at info.
fn spawn_event_logger(events: crossbeam::channel::Receiver<DemoEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut live_frames = 0u64;

        for event in events {
            match event {
                DemoEvent::FramePresented {
                    mode: SourceMode::Live,
                    ..
                } => live_frames += 1,
                DemoEvent::FramePresented { width, height, .. } => {
                    log::info!("static frame {width}x{height} presented")
                }
                DemoEvent::StateChanged(state) => log::debug!("state changed: {state:?}"),
                DemoEvent::Notice(msg) => log::warn!("{msg}"),
            }
        }

        log::info!("{live_frames} live frame(s) presented");
    })
}

fn run_live(
    config: &Config,
    backend: Arc<dyn CaptureBackend>,
    duration: Duration,
    switch_to: Option<FacingMode>,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .with_context(|| "set Ctrl-C handler failed")?;
    }

    let (mut demo, events) = build_demo(config, backend.clone());
    let logger = spawn_event_logger(events);

    if demo.start()? != SessionState::Streaming {
        drop(demo);
        _ = logger.join();
        bail!("live mode is not available");
    }

    let started = Instant::now();
    let mut switch_to = switch_to;

    while !stop.load(Ordering::Relaxed) && started.elapsed() < duration {
        if started.elapsed() >= duration / 2
            && let Some(facing) = switch_to.take()
            && demo.switch_device(facing)? != SessionState::Streaming
        {
            log::warn!("switch to {facing} camera failed, staying on the still image");
            break;
        }

        thread::sleep(Duration::from_millis(20));
    }

    if let Err(e) = demo.select_static() {
        log::warn!("{e}");
    }

    log::info!(
        "live mode finished, {} active track(s) left",
        backend.active_tracks().len()
    );

    drop(demo);
    _ = logger.join();
    Ok(())
}
