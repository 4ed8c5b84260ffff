//! Connection loop.
//!
//! Reads one JSON message per line, hands it to the [`RaceEngine`] and
//! writes the reply before reading the next line, so replies leave in
//! arrival order. The loop is generic over the stream halves so it runs the
//! same over TCP and over in-memory pipes.

use racebot_engine::RaceEngine;
use racebot_protocol::{BotId, Command, InboundMessage, JoinRace, decode_line, encode_line};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::error::BotError;

/// How the bot asks to be placed in a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinMode {
    /// Whatever race the server assigns (`join`).
    Quick,
    /// A specific track and grid size (`joinRace`).
    Track {
        track_name: String,
        password: Option<String>,
        car_count: u32,
    },
}

/// First command sent after connecting.
pub fn join_command(bot: BotId, mode: &JoinMode) -> Command {
    match mode {
        JoinMode::Quick => Command::Join(bot),
        JoinMode::Track {
            track_name,
            password,
            car_count,
        } => Command::JoinRace(JoinRace {
            bot_id: bot,
            track_name: track_name.clone(),
            password: password.clone(),
            car_count: *car_count,
        }),
    }
}

/// Counters for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub received: u64,
    pub sent: u64,
    pub decode_errors: u64,
    pub races_finished: u64,
}

/// Opens the TCP connection to the race server.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, BotError> {
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| BotError::Connect {
            addr: addr.clone(),
            source,
        })?;
    // One small reply per tick; do not let Nagle hold it back.
    stream.set_nodelay(true)?;
    info!(%addr, "Connected to race server");
    Ok(stream)
}

async fn send<W>(writer: &mut W, command: &Command, stats: &mut SessionStats) -> Result<(), BotError>
where
    W: AsyncWrite + Unpin,
{
    let line = encode_line(command)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    stats.sent = stats.sent.saturating_add(1);
    Ok(())
}

/// Sends `join`, then answers server messages until the stream ends.
///
/// End of stream after at least one finished race is a normal shutdown; an
/// earlier end is reported as [`BotError::ConnectionClosed`].
pub async fn run<R, W>(
    reader: R,
    writer: &mut W,
    join: &Command,
    engine: &mut RaceEngine,
) -> Result<SessionStats, BotError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = SessionStats::default();
    send(writer, join, &mut stats).await?;
    info!(msg_type = join.msg_type(), "Join request sent");

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        stats.received = stats.received.saturating_add(1);

        let reply = match decode_line(&line) {
            Ok(inbound) => {
                if matches!(inbound.message, InboundMessage::GameEnd) {
                    stats.races_finished = stats.races_finished.saturating_add(1);
                }
                debug!(
                    msg_type = inbound.message.msg_type(),
                    tick = ?inbound.game_tick,
                    "Message received"
                );
                engine.handle(&inbound.message)
            }
            Err(error) => {
                stats.decode_errors = stats.decode_errors.saturating_add(1);
                warn!(%error, msg_type = ?error.msg_type(), "Undecodable message, answering with ping");
                Some(Command::ping())
            }
        };

        if let Some(command) = reply {
            send(writer, &command, &mut stats).await?;
        }
    }

    info!(
        received = stats.received,
        sent = stats.sent,
        decode_errors = stats.decode_errors,
        races = stats.races_finished,
        "Server closed the connection"
    );
    if stats.races_finished == 0 {
        return Err(BotError::ConnectionClosed {
            received: stats.received,
        });
    }
    Ok(stats)
}
