//! Multi-mouse pointer switcher entry point.
//!
//! Wires the infrastructure adapters into the use cases and runs one of the
//! CLI commands.  Everything runs on the main thread: the raw-input message
//! loop calls straight into the switching engine.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse()
//!  └─ TomlProfileStore::open()   -- loads config.toml, picks the log level
//!  └─ command
//!       ├─ run        SettingsApplier + SwitchingEngine + EventDispatcher
//!       ├─ identify   DeviceDiscovery over the raw-input loop
//!       ├─ list       ProfileRow per profile
//!       ├─ add        ProfileManager (+ CaptureSession when --path is omitted)
//!       └─ set-speed  SwitchingEngine::on_manual_speed_change
//! ```

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pointer_core::{DevicePath, PointerSettings, ProfileRegistry};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pointer_switcher::application::apply_settings::SettingsApplier;
use pointer_switcher::application::dispatch::EventDispatcher;
use pointer_switcher::application::manage_profiles::{
    CaptureSession, DeviceDiscovery, ProfileManager,
};
use pointer_switcher::application::profile_store::ProfileStore;
use pointer_switcher::application::resolve_device::DeviceIdentityResolver;
use pointer_switcher::application::switch_engine::{
    SwitchOutcome, SwitchPolicy, SwitchingEngine, SystemClock,
};
use pointer_switcher::infrastructure::pointer_settings::platform_backend;
use pointer_switcher::infrastructure::raw_input::{open_platform_input, SourceEvent};
use pointer_switcher::infrastructure::storage::config::{config_file_path, TomlProfileStore};
use pointer_switcher::infrastructure::ui_bridge::{LoggingListener, ProfileRow, TrayStatusCell};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Switches pointer settings to match whichever mouse is being moved.
#[derive(Debug, Parser)]
#[command(name = "pointer-switcher", version)]
struct Cli {
    /// Path of the configuration file.
    ///
    /// Defaults to `config.toml` in the platform configuration directory.
    #[arg(long, global = true, env = "POINTER_SWITCHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch mouse motion and switch settings (the default).
    Run,
    /// Print the device path of each mouse the first time it moves.
    Identify,
    /// Print the configured profiles.
    List {
        /// Print TOML instead of one line per profile.
        #[arg(long)]
        toml: bool,
    },
    /// Create a profile.
    Add(AddArgs),
    /// Change the stored speed of a profile.
    SetSpeed {
        /// Profile name (case-insensitive) or device path.
        profile: String,
        /// New speed, 1 to 20.  Out-of-range values keep the current speed.
        speed: i64,
        /// Push the updated profile to the OS immediately.
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// Device path.  When omitted, the next mouse that moves is used.
    #[arg(long)]
    path: Option<String>,
    #[arg(long)]
    speed: Option<u32>,
    #[arg(long)]
    enhance_pointer_precision: Option<bool>,
    /// Wheel lines per notch; 0 scrolls one screen.
    #[arg(long)]
    scroll_lines: Option<u32>,
    #[arg(long)]
    scroll_chars: Option<u32>,
    #[arg(long)]
    swap_buttons: Option<bool>,
    #[arg(long)]
    double_click_ms: Option<u32>,
    /// Do not switch automatically when this device moves.
    #[arg(long)]
    manual: bool,
    /// Apply this profile when the switcher starts.
    #[arg(long)]
    startup: bool,
}

impl AddArgs {
    /// Overlays the given options on `base`.
    fn settings(&self, base: PointerSettings) -> PointerSettings {
        PointerSettings {
            speed: self.speed.unwrap_or(base.speed),
            enhance_pointer_precision: self
                .enhance_pointer_precision
                .unwrap_or(base.enhance_pointer_precision),
            scroll_lines: self.scroll_lines.unwrap_or(base.scroll_lines),
            scroll_chars: self.scroll_chars.unwrap_or(base.scroll_chars),
            swap_buttons: self.swap_buttons.unwrap_or(base.swap_buttons),
            double_click_time_ms: self.double_click_ms.unwrap_or(base.double_click_time_ms),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => config_file_path().context("cannot locate the configuration directory")?,
    };
    let store = Rc::new(
        TomlProfileStore::open(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
    );
    let general = store.general();
    init_logging(&general.log_level);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(store, general.switch_policy()),
        Command::Identify => identify(),
        Command::List { toml } => list(&store, toml),
        Command::Add(args) => add(store, &args),
        Command::SetSpeed {
            profile,
            speed,
            apply,
        } => set_speed(store, general.switch_policy(), &profile, speed, apply),
    }
}

/// `RUST_LOG` wins, then the config file's level, then `info`.
fn init_logging(config_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn applier() -> SettingsApplier {
    let applier = SettingsApplier::new(platform_backend());
    let defaults = applier.read_current_defaults();
    applier.with_fallback(defaults)
}

fn engine(store: Rc<TomlProfileStore>, policy: SwitchPolicy) -> SwitchingEngine {
    SwitchingEngine::new(store, applier(), Rc::new(SystemClock::new()), policy)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run(store: Rc<TomlProfileStore>, policy: SwitchPolicy) -> anyhow::Result<()> {
    info!(config = %store.path().display(), "pointer switcher starting");

    let mut engine = engine(store.clone(), policy);
    let tray = Rc::new(TrayStatusCell::new());
    engine.subscribe(Rc::new(LoggingListener));
    engine.subscribe(tray.clone());
    engine.on_startup();

    let first_run_settings = *engine.applier().fallback();
    let input = open_platform_input().context("failed to open raw mouse input")?;
    let mut dispatcher = EventDispatcher::new(DeviceIdentityResolver::new(input.paths), engine)
        .with_first_run(ProfileManager::new(store), first_run_settings);

    let mut source = input.source;
    dispatcher
        .run(source.as_mut())
        .context("raw-input loop failed")?;

    if let Some(status) = tray.latest() {
        info!(last = %status.tooltip, "pointer switcher stopped");
    }
    Ok(())
}

fn identify() -> anyhow::Result<()> {
    let input = open_platform_input().context("failed to open raw mouse input")?;
    let resolver = DeviceIdentityResolver::new(input.paths);
    let mut discovery = DeviceDiscovery::new();
    let mut source = input.source;

    println!("Move each mouse to see its device path.");
    source
        .run(&mut |event| {
            match event {
                SourceEvent::Motion(motion) => {
                    if let Some(path) = resolver.resolve(&motion) {
                        if discovery.observe(&path) {
                            println!("{path}");
                        }
                    }
                }
                SourceEvent::DeviceRemoved(device) => resolver.device_removed(device),
            }
            ControlFlow::Continue(())
        })
        .context("raw-input loop failed")?;
    Ok(())
}

#[derive(Serialize)]
struct ProfileListing {
    profiles: Vec<ProfileRow>,
}

fn list(store: &TomlProfileStore, as_toml: bool) -> anyhow::Result<()> {
    let rows: Vec<ProfileRow> = store.all().iter().map(ProfileRow::from).collect();
    if as_toml {
        let text = toml::to_string_pretty(&ProfileListing { profiles: rows })
            .context("failed to render profiles")?;
        print!("{text}");
        return Ok(());
    }
    if rows.is_empty() {
        println!("No profiles configured in {}.", store.path().display());
    }
    for row in &rows {
        println!("{}", row.to_line());
    }
    Ok(())
}

fn add(store: Rc<TomlProfileStore>, args: &AddArgs) -> anyhow::Result<()> {
    let applier = applier();
    let settings = applier.clamp(&args.settings(*applier.fallback()));

    let path = match &args.path {
        Some(path) => path.clone(),
        None => capture_device_path()?.as_str().to_owned(),
    };

    let manager = ProfileManager::new(store.clone());
    let mut profile = manager.draft(&args.name, &path, settings)?;
    profile.auto_apply = !args.manual;
    profile.apply_on_startup = args.startup;
    manager.add(profile.clone())?;

    println!("Added {}", ProfileRow::from(&profile).to_line());
    Ok(())
}

/// Blocks until a mouse moves and returns its path.
fn capture_device_path() -> anyhow::Result<DevicePath> {
    let input = open_platform_input().context("failed to open raw mouse input")?;
    let resolver = DeviceIdentityResolver::new(input.paths);
    let mut session = CaptureSession::new();
    let mut source = input.source;

    println!("Move the mouse you want to add.");
    source
        .run(&mut |event| {
            if let SourceEvent::Motion(motion) = event {
                if let Some(path) = resolver.resolve(&motion) {
                    if session.offer(path) {
                        return ControlFlow::Break(());
                    }
                }
            }
            ControlFlow::Continue(())
        })
        .context("raw-input loop failed")?;

    session
        .into_captured()
        .context("no mouse moved before the input loop ended")
}

fn set_speed(
    store: Rc<TomlProfileStore>,
    policy: SwitchPolicy,
    key: &str,
    speed: i64,
    apply: bool,
) -> anyhow::Result<()> {
    let path = ProfileRegistry::new(store.all())
        .find_by_name_or_path(key)
        .map(|p| p.device_path.clone())
        .with_context(|| format!("no profile named or at '{key}'"))?;

    let mut engine = engine(store.clone(), policy);
    let outcome = engine
        .try_manual_speed_change(&path, speed)
        .with_context(|| format!("failed to save speed for '{key}'"))?;

    let updated = store
        .find_by_device_path(&path)
        .with_context(|| format!("profile '{key}' disappeared while saving"))?;
    // A fresh engine has no active device, so the change is only stored.
    if apply && outcome != SwitchOutcome::Applied {
        engine.apply_preview(&updated);
    }
    println!("{}", ProfileRow::from(&updated).to_line());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_subcommand_defaults_to_run() {
        // Arrange / Act
        let cli = Cli::parse_from(["pointer-switcher"]);

        // Assert
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parses_set_speed_with_apply() {
        let cli = Cli::parse_from([
            "pointer-switcher",
            "--config",
            "custom.toml",
            "set-speed",
            "Trackball",
            "4",
            "--apply",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Some(Command::SetSpeed {
                profile,
                speed,
                apply,
            }) => {
                assert_eq!(profile, "Trackball");
                assert_eq!(speed, 4);
                assert!(apply);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_args_overlay_only_given_settings() {
        // Arrange
        let cli = Cli::parse_from([
            "pointer-switcher",
            "add",
            "--name",
            "Trackball",
            "--speed",
            "4",
            "--swap-buttons",
            "true",
        ]);
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add");
        };

        // Act
        let settings = args.settings(PointerSettings::default());

        // Assert
        assert_eq!(settings.speed, 4);
        assert!(settings.swap_buttons);
        assert_eq!(settings.scroll_lines, PointerSettings::default().scroll_lines);
        assert!(args.path.is_none());
    }

    #[test]
    fn test_set_speed_fails_when_config_cannot_be_written() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("pointer_switcher_cli_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("config.toml");
        std::fs::write(
            &file,
            "[[devices]]\nname = \"Trackball\"\ndevice_path = \"trackball\"\nspeed = 10\n",
        )
        .unwrap();
        let store = Rc::new(TomlProfileStore::open(&file).unwrap());
        std::fs::remove_file(&file).unwrap();
        std::fs::create_dir(&file).unwrap();

        // Act
        let result = set_speed(store.clone(), SwitchPolicy::default(), "Trackball", 4, false);

        // Assert
        assert!(result.is_err());
        assert_eq!(store.all()[0].settings.speed, 10);
        std::fs::remove_dir_all(&dir).ok();
    }
}
