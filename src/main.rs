use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tickwatch::{Config, Event, Mode, Stopwatch, TimeUpdate};

/// Terminal countdown timer and stopwatch.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Count down from this many seconds. Runs as a stopwatch when omitted.
    #[arg(short, long, conflicts_with = "ms")]
    seconds: Option<u64>,

    /// Count down from this many milliseconds.
    #[arg(long)]
    ms: Option<u64>,

    /// How often to refresh the display, in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Remaining time that triggers the "almost done" notice, in milliseconds.
    #[arg(long)]
    almost_done_ms: Option<u64>,

    /// TOML file with default settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Unable to load config: {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(seconds) = self.seconds {
            config.target_ms = Some(seconds.saturating_mul(1000));
        }
        if let Some(ms) = self.ms {
            config.target_ms = Some(ms);
        }
        if let Some(tick_ms) = self.tick_ms {
            config.options.tick_interval_ms = tick_ms;
        }
        if let Some(almost_done_ms) = self.almost_done_ms {
            config.options.almost_done_threshold_ms = almost_done_ms;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config()?;
    let stopwatch =
        Stopwatch::new(config.target_ms, config.options).context("Unable to create timer")?;
    let mut events = Box::pin(stopwatch.events());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    match stopwatch.mode() {
        Mode::Countdown => tracing::info!("counting down from {}ms", stopwatch.target_ms()),
        Mode::CountUp => tracing::info!("stopwatch running, press Ctrl-C to stop"),
    }
    stopwatch.start();

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Event::Time(update)) => {
                    write!(stdout, "\r{update}")?;
                    stdout.flush()?;
                }
                Some(Event::AlmostDone) => tracing::info!("almost done"),
                Some(Event::Stop) => {}
                Some(Event::Done) => {
                    writeln!(stdout)?;
                    tracing::info!("done");
                    break;
                }
                None => break,
            },
            result = &mut ctrl_c => {
                result.context("Unable to listen for Ctrl-C")?;
                stopwatch.stop();
                writeln!(stdout)?;
                break;
            }
        }
    }

    let elapsed = TimeUpdate::from_ms(stopwatch.elapsed_ms());
    println!("elapsed {elapsed} ({}ms)", elapsed.ms);
    Ok(())
}
