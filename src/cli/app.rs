//! Command execution.
//!
//! Builds the timer, store and feedback collaborators from the loaded
//! settings and runs one subcommand.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use chrono::Utc;
use clap::CommandFactory;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::analytics::HistoryService;
use crate::config::{default_config_path, default_data_dir, sessions_path, Settings};
use crate::export::{export_filename, write_csv};
use crate::i18n::{t, MessageKey};
use crate::identity::{LocalIdentity, User};
use crate::notification::{ConsoleNotifier, NotificationDispatcher};
use crate::recorder::SessionRecorder;
use crate::sound::{create_player, SilentPlayer, SoundPlayer};
use crate::store::{demo_sessions, JsonFileStore};
use crate::timer::{SessionPipeline, TimerController, TimerEngine};
use crate::types::TimerPhase;

use super::commands::{ChartArgs, Cli, Commands, SettingsArgs, StartArgs};
use super::display::Display;

/// Extra time granted to in-flight saves after a run ends.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Resolved paths and settings for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Context {
    /// Loads settings, falling back to the platform directories.
    pub fn load(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let settings_path = match config {
            Some(path) => path,
            None => default_config_path()?,
        };
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        let settings = Settings::load(&settings_path)
            .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;

        Ok(Self {
            settings,
            settings_path,
            data_dir,
        })
    }

    fn store(&self) -> Arc<JsonFileStore> {
        Arc::new(JsonFileStore::new(sessions_path(&self.data_dir)))
    }

    fn require_user(&self) -> Result<&str> {
        self.settings
            .user_id
            .as_deref()
            .ok_or_else(|| anyhow!("no profile set; run `focusflow settings --user <ID>` first"))
    }
}

/// Executes the CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let ctx = Context::load(cli.config, cli.data_dir)?;
    debug!(settings = %ctx.settings_path.display(), data = %ctx.data_dir.display(), "loaded context");

    match command {
        Commands::Start(args) => run_timer(args, &ctx).await,
        Commands::History { limit } => show_history(&ctx, limit).await,
        Commands::Stats => show_stats(&ctx).await,
        Commands::Chart(args) => show_chart(&ctx, args).await,
        Commands::Export { output } => export(&ctx, output).await,
        Commands::Settings(args) => update_settings(ctx, args),
        Commands::SeedDemo => seed_demo(&ctx).await,
        Commands::Completions { .. } => Ok(()),
    }
}

// ============================================================================
// Timer
// ============================================================================

/// Runs one foreground timer until it completes or is stopped.
async fn run_timer(args: StartArgs, ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;
    let lang = settings.language;
    let mode = args.resolve_mode(settings.default_mode);
    let minutes = args.minutes.unwrap_or_else(|| settings.minutes_for(mode));

    let identity = match (&settings.user_id, args.guest) {
        (Some(id), false) => LocalIdentity::with_signed_in(User::local(id.clone())),
        _ => LocalIdentity::new(),
    };
    let recorder = SessionRecorder::new(ctx.store(), Arc::new(identity))
        .with_save_timeout(settings.save_timeout());
    let sound = sound_player(settings.sound_enabled);
    let dispatcher = Arc::new(
        NotificationDispatcher::new(Arc::new(ConsoleNotifier::new()), Arc::clone(&sound), lang)
            .with_toggles(settings.sound_enabled, settings.notifications_enabled),
    );
    dispatcher.ensure_permission();
    if let Some(notice) = dispatcher.denial_notice() {
        Display::show_notice(notice);
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let pipeline = SessionPipeline::new(Arc::new(recorder), dispatcher)
        .with_outcomes(outcome_tx)
        .spawn(event_rx);

    let controller = TimerController::new(TimerEngine::new(mode, minutes, event_tx))
        .with_tick_period(Duration::from_millis(args.tick_millis));

    Display::show_controls();
    let (phase_tx, mut phase_rx) = watch::channel(TimerPhase::Idle);
    let render = controller
        .subscribe(move |snapshot| {
            Display::show_tick(snapshot, lang);
            phase_tx.send_replace(snapshot.phase);
        })
        .await;

    controller.start().await;

    let mut input = spawn_input_reader();
    let mut input_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                controller.stop().await;
                break;
            }
            changed = phase_rx.changed() => {
                if changed.is_err() || *phase_rx.borrow() == TimerPhase::Completed {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(line) => match line.trim() {
                    "p" => {
                        if !controller.pause().await {
                            controller.start().await;
                        }
                    }
                    "s" | "q" => {
                        println!();
                        controller.stop().await;
                        break;
                    }
                    other => debug!(input = other, "ignored input"),
                },
                None => input_open = false,
            },
        }
    }

    drop(render);
    controller.shutdown().await;
    drop(controller);

    // the pipeline ends once the engine is gone; outcomes end once every save has
    let drain = async {
        let _ = pipeline.await;
        while let Some(outcome) = outcome_rx.recv().await {
            Display::show_record_outcome(&outcome, lang);
        }
    };
    if tokio::time::timeout(settings.save_timeout().saturating_add(DRAIN_GRACE), drain)
        .await
        .is_err()
    {
        warn!("Timed out waiting for the session to be saved");
    }

    // the last handle joins the output thread, which finishes a queued cue
    let _ = tokio::task::spawn_blocking(move || drop(sound)).await;
    Ok(())
}

fn sound_player(enabled: bool) -> Arc<dyn SoundPlayer> {
    if enabled {
        create_player(false)
    } else {
        Arc::new(SilentPlayer)
    }
}

/// Forwards stdin lines from a detached thread; the channel closes at EOF.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

// ============================================================================
// History
// ============================================================================

async fn show_history(ctx: &Context, limit: usize) -> Result<()> {
    let user = ctx.require_user()?;
    let sessions = HistoryService::new(ctx.store())
        .sessions(user, Some(limit))
        .await;
    Display::show_history(&sessions, ctx.settings.language);
    Ok(())
}

async fn show_stats(ctx: &Context) -> Result<()> {
    let user = ctx.require_user()?;
    let stats = HistoryService::new(ctx.store()).stats(user).await;
    Display::show_stats(&stats, ctx.settings.language);
    Ok(())
}

async fn show_chart(ctx: &Context, args: ChartArgs) -> Result<()> {
    let user = ctx.require_user()?;
    let points = HistoryService::new(ctx.store()).chart(user, args.days).await;
    Display::show_chart(&points, args.metric);
    Ok(())
}

async fn export(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let user = ctx.require_user()?;
    let lang = ctx.settings.language;
    let sessions = HistoryService::new(ctx.store()).sessions(user, None).await;
    if sessions.is_empty() {
        Display::show_no_data(lang);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| PathBuf::from(export_filename(Utc::now().date_naive())));
    write_csv(&path, &sessions).with_context(|| format!("failed to export to {}", path.display()))?;
    Display::show_export_success(&path, sessions.len(), lang);
    Ok(())
}

async fn seed_demo(ctx: &Context) -> Result<()> {
    let user = ctx.require_user()?;
    let count = ctx
        .store()
        .extend(demo_sessions(user, Utc::now()))
        .await
        .context("failed to write demo sessions")?;
    println!("Added {} demo sessions for {}", count, user);
    Ok(())
}

// ============================================================================
// Settings
// ============================================================================

fn update_settings(ctx: Context, args: SettingsArgs) -> Result<()> {
    let Context {
        mut settings,
        settings_path,
        ..
    } = ctx;

    if args.has_changes() {
        if let Some(sound) = args.sound {
            settings.sound_enabled = sound.is_on();
        }
        if let Some(notifications) = args.notifications {
            settings.notifications_enabled = notifications.is_on();
        }
        if let Some(language) = args.language {
            settings.language = language;
        }
        if let Some(user) = args.user {
            settings.user_id = Some(user);
        }
        if args.sign_out {
            settings.user_id = None;
        }
        if let Some(minutes) = args.custom_minutes {
            settings.set_custom_minutes(i64::from(minutes));
        }
        if let Some(mode) = args.default_mode {
            settings.default_mode = mode;
        }

        settings
            .save(&settings_path)
            .with_context(|| format!("failed to save settings to {}", settings_path.display()))?;

        if args.notifications.is_some_and(|n| n.is_on()) {
            let dispatcher = NotificationDispatcher::new(
                Arc::new(ConsoleNotifier::new()),
                Arc::new(SilentPlayer),
                settings.language,
            )
            .with_toggles(false, false);
            if dispatcher.set_notifications_enabled(true) {
                println!("{}", t(MessageKey::NotificationsEnabled, settings.language));
            } else if let Some(notice) = dispatcher.denial_notice() {
                Display::show_notice(notice);
            }
        }
    }

    Display::show_settings(&settings);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
