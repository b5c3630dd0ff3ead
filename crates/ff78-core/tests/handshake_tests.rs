//! Handshake tests against a simulated game.
//!
//! The game side runs on its own thread and talks to the launcher through an
//! in-memory channel that behaves like the named objects.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ff78_core::channel::AckPolicy;
use ff78_core::session::{run_with_channel, run_without_channel};
use ff78_core::{
    DetectedGame, Direction, Edition, Error, Field, FieldTable, GameDirs, GameSpawner,
    LaunchContext, LauncherConfig, MemoryChannel, Message, RawMessage, Result, RunningGame, Store,
};

fn context(edition: Edition, config: LauncherConfig) -> LaunchContext {
    let game = DetectedGame {
        executable: format!("{}_en.exe", edition.short_name()),
        edition,
        lang: "en".to_string(),
        uses_ffnx: false,
    };
    LaunchContext::new(game, config, Path::new("C:/Games/FF"))
}

fn dirs(ctx: &LaunchContext) -> GameDirs {
    GameDirs::resolve_in(ctx.edition, &ctx.game_dir, Path::new("C:/Users/me/Documents"))
}

/// Reads launcher messages until "launcher completed", then optionally answers
struct SimulatedSpawner {
    channel: Arc<MemoryChannel>,
    completed_kind: u32,
    reply: Option<Message>,
    received: Arc<Mutex<Vec<RawMessage>>>,
}

struct SimulatedGame {
    handle: Option<JoinHandle<()>>,
}

impl GameSpawner for SimulatedSpawner {
    type Game = SimulatedGame;

    fn spawn(&self, _executable: &Path, _working_dir: &Path) -> Result<SimulatedGame> {
        let channel = Arc::clone(&self.channel);
        let completed_kind = self.completed_kind;
        let reply = self.reply.clone();
        let received = Arc::clone(&self.received);

        let handle = thread::spawn(move || {
            loop {
                let message = channel.receive(Direction::LauncherToGame).unwrap();
                let done = message.kind == completed_kind;
                received.lock().unwrap().push(message);
                if done {
                    break;
                }
            }
            if let Some(reply) = reply {
                channel.send(Direction::GameToLauncher, &reply).unwrap();
            }
        });
        Ok(SimulatedGame {
            handle: Some(handle),
        })
    }
}

impl RunningGame for SimulatedGame {
    fn pid(&self) -> u32 {
        4242
    }

    fn wait(&mut self) -> Result<Option<i32>> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("simulated game panicked");
        }
        Ok(Some(0))
    }
}

/// A game that never reads anything
struct SilentSpawner;

struct SilentGame;

impl GameSpawner for SilentSpawner {
    type Game = SilentGame;

    fn spawn(&self, _executable: &Path, _working_dir: &Path) -> Result<SilentGame> {
        Ok(SilentGame)
    }
}

impl RunningGame for SilentGame {
    fn pid(&self) -> u32 {
        1
    }

    fn wait(&mut self) -> Result<Option<i32>> {
        Ok(Some(3))
    }
}

/// A game whose exit status cannot be read
struct LostSpawner;

struct LostGame;

impl GameSpawner for LostSpawner {
    type Game = LostGame;

    fn spawn(&self, _executable: &Path, _working_dir: &Path) -> Result<LostGame> {
        Ok(LostGame)
    }
}

impl RunningGame for LostGame {
    fn pid(&self) -> u32 {
        2
    }

    fn wait(&mut self) -> Result<Option<i32>> {
        Err(std::io::Error::other("process handle lost").into())
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn test_ff8_session_delivers_startup_messages() {
        let config = LauncherConfig {
            pause_game_on_background: true,
            disable_cloud: false,
            game_version: 2,
            ..LauncherConfig::default()
        };
        let ctx = context(Edition::FF8, config);
        let dirs = dirs(&ctx);
        let channel = Arc::new(MemoryChannel::in_memory(ctx.channel_prefix()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let spawner = SimulatedSpawner {
            channel: Arc::clone(&channel),
            completed_kind: FieldTable::FF8.end_user_info,
            reply: Some(Message::text(FieldTable::FF8.end_user_info, "ok")),
            received: Arc::clone(&received),
        };

        let outcome = run_with_channel(&ctx, &dirs, channel, &spawner).unwrap();
        assert_eq!(outcome.pid, 4242);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.messages_sent, 8);
        assert_eq!(outcome.messages_received, 1);

        let received = received.lock().unwrap();
        let kinds: Vec<u32> = received.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![12, 9, 10, 11, 17, 21, 23, 24]);

        assert_eq!(received[0].text().unwrap(), "lang-en");
        assert_eq!(
            received[1].text().unwrap(),
            dirs.user_save_dir.display().to_string()
        );
        assert_eq!(
            received[3].text().unwrap(),
            Path::new("C:/Games/FF").display().to_string()
        );
        assert_eq!(received[4].value().unwrap(), 2);
        assert_eq!(received[5].value().unwrap(), 0);
        assert_eq!(received[6].value().unwrap(), 1);
        assert!(received[7].is_empty());
    }

    #[test]
    fn test_estore_session_uses_estore_offsets() {
        let ctx = context(Edition::FF7(Store::EStore), LauncherConfig::default());
        let dirs = dirs(&ctx);
        let channel = Arc::new(MemoryChannel::in_memory(ctx.channel_prefix()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let spawner = SimulatedSpawner {
            channel: Arc::clone(&channel),
            completed_kind: FieldTable::ESTORE.end_user_info,
            reply: None,
            received: Arc::clone(&received),
        };

        let outcome = run_with_channel(&ctx, &dirs, channel, &spawner).unwrap();
        assert_eq!(outcome.messages_sent, 6);
        assert_eq!(outcome.messages_received, 0);

        let kinds: Vec<u32> = received.lock().unwrap().iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![12, 9, 10, 11, 17, 20]);
    }

    #[test]
    fn test_session_reports_missing_acknowledgment() {
        let ctx = context(Edition::FF7(Store::Standard), LauncherConfig::default());
        let dirs = dirs(&ctx);
        let channel = Arc::new(MemoryChannel::in_memory("ff7").with_ack_policy(AckPolicy {
            timeout: Duration::from_millis(10),
            attempts: 2,
        }));

        let result = run_with_channel(&ctx, &dirs, channel, &SilentSpawner);
        match result {
            Err(Error::WaitTimedOut(name)) => assert_eq!(name, "ff7_gameDidReadMsgSem"),
            other => panic!("Expected WaitTimedOut, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_wait_still_stops_worker() {
        let ctx = context(Edition::FF8, LauncherConfig::default());
        let dirs = dirs(&ctx);
        let channel = Arc::new(MemoryChannel::in_memory("ff8").with_ack_policy(AckPolicy {
            timeout: Duration::from_millis(5),
            attempts: 1,
        }));

        let result = run_with_channel(&ctx, &dirs, Arc::clone(&channel), &LostSpawner);
        assert!(matches!(result, Err(Error::Io(_))));
        // The worker thread was joined and released its handle on the channel
        assert_eq!(Arc::strong_count(&channel), 1);
    }

    #[test]
    fn test_session_without_channel() {
        let ctx = context(Edition::FF8, LauncherConfig::default());
        let outcome = run_without_channel(&ctx, &SilentSpawner).unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.messages_sent, 0);
    }
}

mod channel_tests {
    use super::*;

    #[test]
    fn test_reader_sees_written_message() {
        let channel = Arc::new(MemoryChannel::in_memory("ff7"));
        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.receive(Direction::LauncherToGame).unwrap())
        };

        let text = "C:\\Users\\me\\Documents\\Square Enix\\FINAL FANTASY VII Steam";
        channel
            .send(Direction::LauncherToGame, &Message::text(11, text))
            .unwrap();

        let message = reader.join().unwrap();
        assert_eq!(message.kind, 11);
        assert_eq!(message.text().unwrap(), text);
    }

    #[test]
    fn test_one_message_in_flight_per_direction() {
        let channel = Arc::new(MemoryChannel::in_memory("ff8"));

        let senders: Vec<_> = ["first", "second", "third"]
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    channel
                        .send(Direction::LauncherToGame, &Message::text(9 + i as u32, text))
                        .unwrap()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let message = channel.receive(Direction::LauncherToGame).unwrap();
            seen.insert((message.kind, message.text().unwrap()));
        }
        for sender in senders {
            sender.join().unwrap();
        }

        let expected: HashSet<(u32, String)> = [
            (9, "first".to_string()),
            (10, "second".to_string()),
            (11, "third".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_second_writer_waits_for_acknowledgment() {
        let channel = Arc::new(MemoryChannel::in_memory("ff7"));
        let second_done = Arc::new(AtomicBool::new(false));

        let first = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                channel
                    .send(Direction::LauncherToGame, &Message::text(13, "lang-en"))
                    .unwrap()
            })
        };
        thread::sleep(Duration::from_millis(50));

        let second = {
            let channel = Arc::clone(&channel);
            let second_done = Arc::clone(&second_done);
            thread::spawn(move || {
                channel
                    .send(Direction::LauncherToGame, &Message::value(18, 1))
                    .unwrap();
                second_done.store(true, Ordering::SeqCst);
            })
        };
        thread::sleep(Duration::from_millis(50));

        // The first message is still unacknowledged: the second writer is held back
        assert!(!second_done.load(Ordering::SeqCst));

        let message = channel.receive(Direction::LauncherToGame).unwrap();
        assert_eq!(message.kind, 13);
        assert_eq!(message.text().unwrap(), "lang-en");
        first.join().unwrap();

        let message = channel.receive(Direction::LauncherToGame).unwrap();
        assert_eq!(message.kind, 18);
        assert_eq!(message.value().unwrap(), 1);
        second.join().unwrap();
        assert!(second_done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_send_after_timeout_delivers_new_message() {
        let channel = Arc::new(MemoryChannel::in_memory("ff7").with_ack_policy(AckPolicy {
            timeout: Duration::from_millis(20),
            attempts: 10,
        }));

        let first = channel.send(Direction::LauncherToGame, &Message::text(13, "lang-en"));
        assert!(matches!(first, Err(Error::WaitTimedOut(_))));

        let reader = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.receive(Direction::LauncherToGame).unwrap())
        };
        channel
            .send(Direction::LauncherToGame, &Message::text(10, "C:/Games/FF7"))
            .unwrap();

        // The withdrawn message never reaches the reader
        let message = reader.join().unwrap();
        assert_eq!(message.kind, 10);
        assert_eq!(message.text().unwrap(), "C:/Games/FF7");
        let pending = channel
            .try_receive(Direction::LauncherToGame, Duration::from_millis(5))
            .unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_directions_are_independent() {
        let channel = Arc::new(MemoryChannel::in_memory("ff7"));

        // Game sends to the launcher while the launcher sends to the game
        let game = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                channel
                    .send(Direction::GameToLauncher, &Message::value(24, 7))
                    .unwrap();
                channel.receive(Direction::LauncherToGame).unwrap()
            })
        };

        let launcher = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                channel
                    .send(Direction::LauncherToGame, &Message::value(22, 1))
                    .unwrap();
            })
        };

        let from_game = channel.receive(Direction::GameToLauncher).unwrap();
        launcher.join().unwrap();
        let to_game = game.join().unwrap();

        assert_eq!(from_game.value().unwrap(), 7);
        assert_eq!(to_game.kind, 22);
        assert_eq!(to_game.value().unwrap(), 1);
    }

    #[test]
    fn test_try_receive_times_out() {
        let channel = MemoryChannel::in_memory("ff7");
        let result = channel
            .try_receive(Direction::GameToLauncher, Duration::from_millis(10))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_send_without_reader_times_out() {
        let channel = MemoryChannel::in_memory("choco").with_ack_policy(AckPolicy {
            timeout: Duration::from_millis(5),
            attempts: 3,
        });
        let result = channel.send(Direction::GameToLauncher, &Message::empty(24));
        match result {
            Err(Error::WaitTimedOut(name)) => assert_eq!(name, "choco_launcherDidReadMsgSem"),
            other => panic!("Expected WaitTimedOut, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_message_is_not_written() {
        let channel = MemoryChannel::in_memory("ff7");
        let text = "x".repeat(0x10000);
        let result = channel.send(Direction::LauncherToGame, &Message::text(11, text));
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));

        // Nothing was signaled
        let pending = channel
            .try_receive(Direction::LauncherToGame, Duration::from_millis(5))
            .unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_field_reverse_lookup_matches_table() {
        let table = FieldTable::for_edition(Edition::FF8);
        assert_eq!(table.field_for(table.locale_data_dir), Some(Field::LocaleDataDir));
    }
}
