use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use zap_runner::{builtins, GameRunner};
use zap_runtime::{AssetPaths, EngineResult, GameConfig};

#[derive(Parser)]
#[command(
    name = "zap-runner",
    about = "Run a zap-runtime game from its resource directory",
    version
)]
struct Args {
    /// Project resource directory (holds game.config)
    #[arg(long, default_value = "resources")]
    resources: PathBuf,

    /// Engine builtin resource directory, searched after the project
    #[arg(long, default_value = "core")]
    builtin: PathBuf,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> EngineResult<()> {
    let config = GameConfig::load(&args.resources)?;
    let frame = Duration::from_secs_f32(config.frame_dt());
    let paths = AssetPaths::new(args.resources.clone(), args.builtin.clone());

    let mut runner = GameRunner::new(config, paths, Box::new(builtins::runtime()));
    runner.init()?;

    let mut last = Instant::now();
    while runner.is_running() {
        if args.frames.is_some_and(|limit| runner.frame() >= limit) {
            break;
        }
        let now = Instant::now();
        runner.tick((now - last).as_secs_f32())?;
        last = now;

        // Pace to the configured frame rate.
        let spent = now.elapsed();
        if spent < frame {
            thread::sleep(frame - spent);
        }
    }

    log::info!("stopped after {} frames", runner.frame());
    Ok(())
}
