//! Background worker draining game → launcher messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::{Direction, HandshakeChannel, RawMessage, Semaphore, SharedWords};
use crate::error::{Error, Result};
use crate::layout::FieldTable;

pub struct GameMessageWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Result<usize>>,
}

impl GameMessageWorker {
    pub fn spawn<S, M>(
        channel: Arc<HandshakeChannel<S, M>>,
        table: FieldTable,
        poll_interval: Duration,
    ) -> Result<Self>
    where
        S: Semaphore + 'static,
        M: SharedWords + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("game-messages".to_string())
                .spawn(move || process_game_messages(&*channel, table, poll_interval, &stop))?
        };
        Ok(Self { stop, handle })
    }

    /// Ask the worker to finish; returns how many messages it received
    pub fn stop(self) -> Result<usize> {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.join().map_err(|_| Error::WorkerPanicked)?
    }
}

fn process_game_messages<S: Semaphore, M: SharedWords>(
    channel: &HandshakeChannel<S, M>,
    table: FieldTable,
    poll_interval: Duration,
    stop: &AtomicBool,
) -> Result<usize> {
    debug!("Game message worker started");
    let mut received = 0;

    while !stop.load(Ordering::SeqCst) {
        match channel.try_receive(Direction::GameToLauncher, poll_interval) {
            Ok(Some(message)) => {
                log_message(&message, table);
                received += 1;
            }
            Ok(None) => {}
            Err(Error::InvalidMessage(reason)) => {
                warn!("Dropped malformed game message: {}", reason);
            }
            Err(e) => {
                warn!("Game message worker stopping: {}", e);
                return Err(e);
            }
        }
    }

    debug!("Game message worker stopped ({} messages)", received);
    Ok(received)
}

fn log_message(message: &RawMessage, table: FieldTable) {
    let field: &'static str = table
        .field_for(message.kind)
        .map(Into::into)
        .unwrap_or("unknown");
    match (message.length, message.text()) {
        (0, _) => info!("Game message {} ({})", message.kind, field),
        (1, _) => info!(
            "Game message {} ({}): value {:?}",
            message.kind,
            field,
            message.data.first()
        ),
        (_, Ok(text)) => info!("Game message {} ({}): {:?}", message.kind, field, text),
        (length, Err(_)) => warn!(
            "Game message {} ({}), undecodable text of length {}: {:?}",
            message.kind, field, length, message.data
        ),
    }
}
