//! Scopeview - live screen capture from an Instek GDS-820C oscilloscope.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scopeview as app;
use tokio::sync::mpsc;

use app::config::{AppConfig, ConfigError, ConfigLoadResult};
use app::export;
use app::poller::{PollEvent, ScopePoller};
use app::raster::{Raster, Theme, decode};
use app::scope::SerialPort;

/// Capture and decode GDS-820C screen dumps over serial.
#[derive(Parser)]
#[command(name = "scopeview", version)]
struct Cli {
    /// Config file (default: scopeview.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a single screen and save it as PNG
    Capture {
        /// Serial device (overrides config)
        #[arg(short, long)]
        device: Option<String>,
        /// Palette (overrides config)
        #[arg(short, long, value_enum)]
        theme: Option<Theme>,
        /// Output image path (default: timestamped file in output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also save the undecoded dump to this path
        #[arg(long)]
        raw: Option<PathBuf>,
    },
    /// Poll the scope continuously, keeping `latest.png` up to date.
    /// Press Enter to cycle the palette, Ctrl-C to stop.
    Watch {
        #[arg(short, long)]
        device: Option<String>,
        #[arg(short, long, value_enum)]
        theme: Option<Theme>,
        /// Poll interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Directory for `latest.png` (overrides config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Decode a saved raw dump into a PNG
    Decode {
        /// Raw dump written by `capture --raw`
        input: PathBuf,
        #[arg(short, long, value_enum)]
        theme: Option<Theme>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    tracing::debug!("Config path: {:?}", config_path);

    if let Command::InitConfig { force } = cli.command {
        return init_config(&config_path, force);
    }

    let mut config = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded from {}", config_path.display());
            config
        }
        ConfigLoadResult::Missing => {
            tracing::debug!("No config file, using defaults");
            AppConfig::default()
        }
        ConfigLoadResult::Invalid(e) => {
            return Err(e).with_context(|| format!("invalid config {}", config_path.display()));
        }
    };

    match cli.command {
        Command::Capture {
            device,
            theme,
            output,
            raw,
        } => {
            apply_overrides(&mut config, device, theme)?;
            capture(&config, output, raw).await
        }
        Command::Watch {
            device,
            theme,
            interval_ms,
            output_dir,
        } => {
            apply_overrides(&mut config, device, theme)?;
            if let Some(ms) = interval_ms {
                config.capture.poll_interval_ms = ms;
            }
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            config.validate()?;
            watch(&config).await
        }
        Command::Decode { input, theme, output } => {
            apply_overrides(&mut config, None, theme)?;
            decode_dump(&config, &input, output)
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

/// Apply command-line overrides and re-check the result.
fn apply_overrides(config: &mut AppConfig, device: Option<String>, theme: Option<Theme>) -> Result<(), ConfigError> {
    if let Some(device) = device {
        config.serial.device = device;
    }
    if let Some(theme) = theme {
        config.display.theme = theme;
    }
    config.validate()
}

/// Call `on_line` for every line read from `reader`, on a plain OS thread.
///
/// The thread is detached: a blocked read never holds up runtime shutdown.
fn spawn_key_listener<R, F>(reader: R, mut on_line: F) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
    F: FnMut() + Send + 'static,
{
    std::thread::spawn(move || {
        for line in reader.lines() {
            if line.is_err() {
                break;
            }
            on_line();
        }
    })
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn open_poller(config: &AppConfig) -> anyhow::Result<ScopePoller<SerialPort>> {
    let port = SerialPort::open(&config.serial.device, config.serial.baud)?;
    Ok(ScopePoller::new(
        port,
        config.capture.acquirer(),
        config.capture.poll_interval(),
        config.display.theme,
        config.display.background,
    ))
}

async fn capture(config: &AppConfig, output: Option<PathBuf>, raw: Option<PathBuf>) -> anyhow::Result<()> {
    let mut poller = open_poller(config)?;
    let frame = poller.capture_once().await?;

    let output = output.unwrap_or_else(|| export::snapshot_path(&config.output.directory, "png"));
    export::save_png(&frame.raster, &output)?;
    println!("Saved {} ({} palette)", output.display(), frame.theme);

    let raw = raw.or_else(|| config.output.keep_raw.then(|| output.with_extension("bin")));
    if let Some(raw) = raw {
        export::save_raw(&frame.raw, &raw)?;
        println!("Saved raw dump {}", raw.display());
    }
    Ok(())
}

async fn watch(config: &AppConfig) -> anyhow::Result<()> {
    let poller = open_poller(config)?;
    let themes = poller.theme_control();
    let latest = config.output.directory.join("latest.png");
    let staging = config.output.directory.join("latest.tmp.png");

    // Enter on stdin cycles the palette.
    spawn_key_listener(std::io::BufReader::new(std::io::stdin()), move || {
        let theme = themes.cycle();
        tracing::info!("Palette: {theme}");
    });

    let (tx, mut rx) = mpsc::channel(2);
    let poll_task = tokio::spawn(poller.run(tx));
    println!("Watching {} -> {} (Enter: next palette, Ctrl-C: quit)", config.serial.device, latest.display());

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(PollEvent::Frame(frame)) => {
                    export::save_png(&frame.raster, &staging)?;
                    std::fs::rename(&staging, &latest)?;
                    if config.output.keep_raw {
                        let path = export::snapshot_path(&config.output.directory, "bin");
                        export::save_raw(&frame.raw, &path)?;
                    }
                }
                Some(PollEvent::Missed { .. }) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    drop(rx);
    let stats = poll_task.await??;
    println!("{}", stats.summary());
    Ok(())
}

fn decode_dump(config: &AppConfig, input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let frame = export::load_raw(input).with_context(|| format!("reading {}", input.display()))?;
    let mut raster = Raster::filled(config.display.background);
    decode(&frame, config.display.theme.palette(), &mut raster);

    let output = output.unwrap_or_else(|| input.with_extension("png"));
    export::save_png(&raster, &output)?;
    println!("Saved {} ({} palette)", output.display(), config.display.theme);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc as std_mpsc;
    use std::time::{Duration, Instant};

    /// Reader that blocks until its sender is dropped, like an idle terminal.
    struct IdleTerminal(std_mpsc::Receiver<()>);

    impl Read for IdleTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_key_listener_fires_per_line() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handle = spawn_key_listener(Cursor::new(b"\n\n".to_vec()), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        handle.join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blocked_stdin_does_not_hold_runtime_shutdown() {
        let (keep_blocked, rx) = std_mpsc::channel::<()>();
        let runtime = tokio::runtime::Runtime::new().unwrap();

        runtime.block_on(async move {
            spawn_key_listener(std::io::BufReader::new(IdleTerminal(rx)), || {});
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        let started = Instant::now();
        drop(runtime);
        assert!(started.elapsed() < Duration::from_secs(1));
        drop(keep_blocked);
    }

    #[test]
    fn test_capture_override_is_validated() {
        let mut config = AppConfig::default();
        let result = apply_overrides(&mut config, Some(String::new()), None);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, Some("/dev/ttyS1".to_string()), Some(Theme::Mono)).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyS1");
        assert_eq!(config.display.theme, Theme::Mono);
    }
}
