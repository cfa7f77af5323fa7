use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser};

use blackshot::capture::{CaptureDependencies, CaptureManager, CaptureOutcome, CaptureTrigger};
use blackshot::capture::file::default_inverted_output;
use blackshot::config::Config;
use blackshot::daemon::Daemon;
use blackshot::feedback::DesktopFeedback;
use blackshot::i18n::{Language, LanguageSetting};
use blackshot::invert;
use blackshot::permissions::PermissionState;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BLACKSHOT_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "blackshot")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Capture a screen region, invert its colors, and copy it to the clipboard"
)]
struct Cli {
    /// Run as menu bar daemon (capture with Cmd+Shift+6, the menu, or SIGUSR1)
    #[arg(long, short = 'd', action = ArgAction::SetTrue)]
    daemon: bool,

    /// Capture one region now and exit
    #[arg(long, short = 'c', action = ArgAction::SetTrue, conflicts_with = "daemon")]
    capture: bool,

    /// Invert an image file instead of capturing
    #[arg(long, value_name = "INPUT", conflicts_with_all = ["daemon", "capture"])]
    invert: Option<PathBuf>,

    /// Output path for --invert, .png or .tiff (default: inverted_<timestamp>.png next to the input)
    #[arg(long, short = 'o', value_name = "OUTPUT", requires = "invert")]
    output: Option<PathBuf>,

    /// Print Accessibility and Screen Recording permission state
    #[arg(long, action = ArgAction::SetTrue)]
    check_permissions: bool,

    /// Persist the interface language (en or zh-Hans)
    #[arg(long, value_name = "LANG")]
    language: Option<Language>,

    /// Write the documented example config to the config directory
    #[arg(long, action = ArgAction::SetTrue)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.init_config {
        let path = Config::create_default_file()?;
        println!("Wrote example config to {}", path.display());
        return Ok(());
    }

    if let Some(language) = cli.language {
        let config_path = Config::get_config_path()?;
        let mut config = Config::load_from(&config_path)?;
        config.ui.language = language;
        config.save_to(&config_path)?;
        println!("Language set to {} ({})", language.native_name(), language.code());
        if !(cli.daemon || cli.capture) {
            return Ok(());
        }
    }

    if cli.check_permissions {
        let state = PermissionState::current();
        println!("Accessibility:    {}", granted_label(state.accessibility));
        println!("Screen Recording: {}", granted_label(state.screen_recording));
        return Ok(());
    }

    if let Some(input) = cli.invert {
        let output = cli.output.unwrap_or_else(|| default_inverted_output(&input));
        let inverted = invert::load_and_invert(&input)?;
        inverted.save(&output)?;
        println!(
            "Inverted {}x{} image written to {}",
            inverted.width(),
            inverted.height(),
            output.display()
        );
        return Ok(());
    }

    if cli.daemon {
        log::info!("Starting in daemon mode");
        let config_path = Config::get_config_path().ok();
        let config = match &config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::default(),
        };
        let daemon = Daemon::new(config, config_path)?;
        daemon.run()?;
    } else if cli.capture {
        run_single_capture(Config::load()?)?;
    } else {
        println!("blackshot: Capture a screen region, invert its colors, and copy it to the clipboard");
        println!();
        println!("Usage:");
        println!("  blackshot --daemon              Run the menu bar agent (Cmd+Shift+6 to capture)");
        println!("  blackshot --capture             Capture one region now and exit");
        println!("  blackshot --invert IN [-o OUT]  Invert an image file");
        println!("  blackshot --check-permissions   Show permission state");
        println!("  blackshot --language zh-Hans    Set the interface language");
        println!("  blackshot --init-config         Write the example config");
        println!("  blackshot --help                Show help");
        println!();
        println!("Linux (Hyprland, Sway):");
        println!("  exec-once = blackshot --daemon");
        println!("  bind = SUPER SHIFT, 6, exec, pkill -SIGUSR1 blackshot");
    }

    Ok(())
}

fn granted_label(granted: bool) -> &'static str {
    if granted { "granted" } else { "missing" }
}

/// One capture in the foreground. Cancelling the selection is not an error.
fn run_single_capture(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let language = LanguageSetting::new(config.ui.language);
    let feedback = DesktopFeedback::new(
        runtime.handle().clone(),
        language,
        config.ui.notify_on_success,
    );
    let dependencies = CaptureDependencies::with_command(config.capture.command.clone())
        .with_feedback(Arc::new(feedback));
    let manager = CaptureManager::from_config(runtime.handle(), &config, dependencies);

    let outcome = runtime.block_on(async {
        let outcome = manager.capture_and_wait(CaptureTrigger::CommandLine).await;
        manager.flush_cleanup().await;
        outcome
    })?;

    match outcome {
        CaptureOutcome::Success(result) => {
            println!(
                "Copied inverted {}x{} capture to the clipboard",
                result.width, result.height
            );
            Ok(())
        }
        CaptureOutcome::Cancelled(reason) => {
            println!("Capture cancelled: {}", reason);
            Ok(())
        }
        CaptureOutcome::Failed(message) => Err(anyhow::anyhow!("Capture failed: {}", message)),
    }
}
