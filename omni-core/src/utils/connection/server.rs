//! WebSocket Server Module
//!
//! This module defines the WebSocket server implementation using the
//! `picoserve` framework. It serves the control page, decodes text frames
//! into drive commands and forwards them to the drive controller through
//! [`DRIVE_CHANNEL`]. A closed, broken or silent socket stops the robot.
//!
//! The control page sends [`HEARTBEAT`] while the operator is idle; a socket
//! that delivers no frame for [`LINK_TIMEOUT`] is treated as a lost link.

use core::future::Future;

use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::{
    io::embedded_io_async as embedded_aio,
    response::{
        ws::{Message, ReadMessageError, SocketRx, SocketTx, WebSocketCallback, WebSocketUpgrade},
        StatusCode,
    },
    Router,
};

use crate::utils::{
    connection::command::DriveCommand,
    controllers::{request_emergency_stop, CONFIG_SIGNAL, DRIVE_CHANNEL},
    frontend::HTML,
};

/// How long a socket waits for the controller to publish a config readback.
const READBACK_TIMEOUT: Duration = Duration::from_millis(500);
/// Longest silence tolerated on an open socket.
pub const LINK_TIMEOUT: Duration = Duration::from_millis(1_000);
/// Keep-alive token sent by the control page. Carries no command.
pub const HEARTBEAT: &str = "ping";

pub struct DriveSocket;

fn expects_readback(command: &DriveCommand) -> bool {
    matches!(
        command,
        DriveCommand::GetConfig | DriveCommand::SaveConfig | DriveCommand::ResetConfig
    )
}

/// Handles one controller connection.
impl WebSocketCallback for DriveSocket {
    async fn run<Reader, Writer>(
        self,
        mut rx: SocketRx<Reader>,
        mut tx: SocketTx<Writer>,
    ) -> Result<(), Writer::Error>
    where
        Reader: embedded_aio::Read,
        Writer: embedded_aio::Write<Error = Reader::Error>,
    {
        match stop_after(serve(&mut rx, &mut tx)).await {
            Ok(close_reason) => tx.close(close_reason).await,
            Err(error) => Err(error),
        }
    }
}

/// Run one socket session and stop the robot however it ends.
async fn stop_after<F: Future>(session: F) -> F::Output {
    let result = session.await;
    request_emergency_stop();
    result
}

/// Wait for the next frame; `None` once the link has been silent too long.
async fn within_link_timeout<F: Future>(frame: F) -> Option<F::Output> {
    embassy_time::with_timeout(LINK_TIMEOUT, frame).await.ok()
}

async fn serve<Reader, Writer>(
    rx: &mut SocketRx<Reader>,
    tx: &mut SocketTx<Writer>,
) -> Result<Option<(u16, &'static str)>, Writer::Error>
where
    Reader: embedded_aio::Read,
    Writer: embedded_aio::Write<Error = Reader::Error>,
{
    let mut buffer = [0; 512];

    loop {
        let Some(message) = within_link_timeout(rx.next_message(&mut buffer)).await else {
            tracing::warn!("no frame within link timeout, dropping socket");
            return Ok(Some((1001, "Link timeout")));
        };
        match message {
            Ok(Message::Pong(_)) => continue,
            Ok(Message::Ping(data)) => tx.send_pong(data).await?,
            Ok(Message::Close(reason)) => {
                tracing::info!(?reason, "websocket closed");
                return Ok(None);
            }
            Ok(Message::Text(HEARTBEAT)) => continue,
            Ok(Message::Text(data)) => {
                let Some(command) = DriveCommand::parse(data) else {
                    tracing::debug!(data, "ignoring malformed command");
                    continue;
                };
                let readback = expects_readback(&command);
                if readback {
                    CONFIG_SIGNAL.reset();
                }
                DRIVE_CHANNEL.send(command).await;
                if readback {
                    match embassy_time::with_timeout(READBACK_TIMEOUT, CONFIG_SIGNAL.wait()).await {
                        Ok(config) => match config.to_json() {
                            Ok(json) => tx.send_text(&json).await?,
                            Err(error) => tracing::error!(?error, "failed to encode configuration"),
                        },
                        Err(_) => tracing::warn!(?command, "no configuration readback"),
                    }
                }
            }
            Ok(Message::Binary(data)) => {
                tracing::debug!(len = data.len(), "ignoring binary frame");
            }
            Err(error) => {
                tracing::error!(?error, "websocket error");
                let code = match error {
                    ReadMessageError::TextIsNotUtf8 => 1007,
                    ReadMessageError::ReservedOpcode(_) => 1003,
                    ReadMessageError::ReadFrameError(_)
                    | ReadMessageError::UnexpectedMessageStart
                    | ReadMessageError::MessageStartsWithContinuation => 1002,
                    ReadMessageError::Io(err) => return Err(err),
                };
                return Ok(Some((code, "Websocket Error")));
            }
        }
    }
}

/// Creates WS Server
pub async fn run(
    id: usize,
    port: u16,
    stack: Stack<'static>,
    config: Option<&'static picoserve::Config<Duration>>,
) -> ! {
    let default_config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        persistent_start_read_request: None,
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(5)),
    });

    let config = config.unwrap_or(&default_config);

    let router = Router::new()
        .route(
            "/",
            picoserve::routing::get(|| async {
                picoserve::response::Response::new(StatusCode::OK, HTML)
                    .with_headers([("Content-Type", "text/html; charset=utf-8")])
            }),
        )
        .route(
            "/ws",
            picoserve::routing::get(|upgrade: WebSocketUpgrade| async move {
                tracing::info!("new drive socket");
                upgrade.on_upgrade(DriveSocket)
            }),
        );

    if let Some(ip_cfg) = stack.config_v4() {
        tracing::info!("Starting server at {}:{}", ip_cfg.address, port);
    } else {
        tracing::warn!(
            "Starting WebSocket server on port {port}, but no IPv4 address is assigned yet!"
        );
    }

    let (mut rx_buffer, mut tx_buffer, mut http_buffer) = ([0; 1024], [0; 1024], [0; 2048]);

    picoserve::listen_and_serve_with_state(
        id,
        &router,
        config,
        stack,
        port,
        &mut rx_buffer,
        &mut tx_buffer,
        &mut http_buffer,
        &(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_commands_wait_for_readback() {
        assert!(expects_readback(&DriveCommand::GetConfig));
        assert!(expects_readback(&DriveCommand::SaveConfig));
        assert!(expects_readback(&DriveCommand::ResetConfig));
        assert!(!expects_readback(&DriveCommand::STOP));
        assert!(!expects_readback(&DriveCommand::SetSpeed(10)));
    }

    #[test]
    fn test_heartbeat_is_not_a_command() {
        assert_eq!(DriveCommand::parse(HEARTBEAT), None);
    }

    #[tokio::test]
    async fn test_silent_link_stops_the_robot() {
        DRIVE_CHANNEL.try_send(DriveCommand::Joystick { x: 0, y: 255 }).unwrap();

        let frame = stop_after(within_link_timeout(core::future::pending::<()>())).await;

        assert_eq!(frame, None);
        assert!(matches!(DRIVE_CHANNEL.try_receive(), Ok(DriveCommand::EmergencyStop)));
        assert!(DRIVE_CHANNEL.try_receive().is_err());
    }

    #[tokio::test]
    async fn test_frame_within_timeout_is_delivered() {
        assert_eq!(within_link_timeout(async { 7 }).await, Some(7));
    }
}
