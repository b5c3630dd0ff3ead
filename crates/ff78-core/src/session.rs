//! One launcher run: prepare files, start the game, hand over the startup
//! messages, then wait for the game to exit.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::channel::{self, Direction, HandshakeChannel, Message, Semaphore, SharedWords};
use crate::config::timing;
use crate::context::LaunchContext;
use crate::error::Result;
use crate::layout::Field;
use crate::paths::{self, GameDirs};
use crate::process::{CommandSpawner, GameSpawner, RunningGame};
use crate::settings_files;
use crate::worker::GameMessageWorker;

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    pub pid: u32,
    pub exit_code: Option<i32>,
    pub messages_sent: usize,
    pub messages_received: usize,
}

/// Messages sent to the game right after it starts, in order
pub fn startup_messages(ctx: &LaunchContext, dirs: &GameDirs) -> Vec<(Field, Message)> {
    let table = ctx.field_table();

    let candidates = [
        (
            Field::LocaleDataDir,
            Some(Message::text(table.locale_data_dir, paths::locale_data_dir(&ctx.lang))),
        ),
        (
            Field::UserSaveDir,
            Some(Message::text(table.user_save_dir, dirs.user_save_dir.display().to_string())),
        ),
        (
            Field::DocDir,
            Some(Message::text(table.doc_dir, dirs.settings_dir.display().to_string())),
        ),
        (
            Field::InstallDir,
            Some(Message::text(table.install_dir, dirs.install_dir.display().to_string())),
        ),
        (
            Field::GameVersion,
            Some(Message::value(table.game_version, ctx.config.game_version)),
        ),
        (
            Field::DisableCloud,
            table
                .disable_cloud
                .map(|kind| Message::flag(kind, ctx.config.disable_cloud)),
        ),
        (
            Field::BgPauseEnabled,
            table
                .bg_pause_enabled
                .map(|kind| Message::flag(kind, ctx.config.pause_game_on_background)),
        ),
        // Launcher completed
        (Field::EndUserInfo, Some(Message::empty(table.end_user_info))),
    ];

    candidates
        .into_iter()
        .filter_map(|(field, message)| message.map(|message| (field, message)))
        .collect()
}

/// Run with the real executable and, when needed, the OS channel
pub fn launch(ctx: &LaunchContext) -> Result<SessionOutcome> {
    let dirs = GameDirs::resolve(ctx.edition, &ctx.game_dir)?;
    info!("Directories: {:?}", dirs);

    if ctx.needs_settings_files() {
        settings_files::write_settings_files(&dirs.settings_dir, &ctx.config, ctx.edition)?;
    }

    if ctx.needs_channel() {
        info!(
            "Launching {:?} with launcher handshake ({})",
            ctx.executable,
            ctx.channel_prefix()
        );
        let channel = Arc::new(channel::open_os_channel(ctx.channel_prefix())?);
        run_with_channel(ctx, &dirs, channel, &CommandSpawner)
    } else {
        info!("Launching {:?} with FFNx context", ctx.executable);
        run_without_channel(ctx, &CommandSpawner)
    }
}

/// Start the game and wait for it, no handshake
pub fn run_without_channel<P: GameSpawner>(ctx: &LaunchContext, spawner: &P) -> Result<SessionOutcome> {
    let mut game = spawner.spawn(&ctx.executable_path(), &ctx.game_dir)?;
    let pid = game.pid();
    info!("Process launched (process_id: {})!", pid);

    let exit_code = game.wait()?;
    info!("Process {} exited with {:?}", pid, exit_code);

    Ok(SessionOutcome {
        pid,
        exit_code,
        ..SessionOutcome::default()
    })
}

/// Start the game, send the startup messages over `channel` and wait for it
pub fn run_with_channel<S, M, P>(
    ctx: &LaunchContext,
    dirs: &GameDirs,
    channel: Arc<HandshakeChannel<S, M>>,
    spawner: &P,
) -> Result<SessionOutcome>
where
    S: Semaphore + 'static,
    M: SharedWords + 'static,
    P: GameSpawner,
{
    let worker = GameMessageWorker::spawn(
        Arc::clone(&channel),
        ctx.field_table(),
        timing::WORKER_POLL_INTERVAL,
    )?;

    let mut game = match spawner.spawn(&ctx.executable_path(), &ctx.game_dir) {
        Ok(game) => game,
        Err(e) => {
            if let Err(stop_error) = worker.stop() {
                warn!("Game message worker failed: {}", stop_error);
            }
            return Err(e);
        }
    };
    let pid = game.pid();
    info!("Process launched (process_id: {})!", pid);

    let mut messages_sent = 0;
    let mut send_error = None;
    for (field, message) in startup_messages(ctx, dirs) {
        let name: &'static str = field.into();
        info!("send_{} -> {:?}", name, message.payload);
        if let Err(e) = channel.send(Direction::LauncherToGame, &message) {
            error!("Sending {} failed: {}", name, e);
            send_error = Some(e);
            break;
        }
        messages_sent += 1;
    }

    // The game keeps running even if the handshake broke
    let waited = game.wait();
    let messages_received = match worker.stop() {
        Ok(received) => received,
        Err(e) => {
            warn!("Game message worker failed: {}", e);
            0
        }
    };
    let exit_code = waited?;
    info!("Process {} exited with {:?}", pid, exit_code);

    if let Some(e) = send_error {
        return Err(e);
    }

    Ok(SessionOutcome {
        pid,
        exit_code,
        messages_sent,
        messages_received,
    })
}
