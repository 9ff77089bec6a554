//! Drives one websocket connection between the server and the terminal.

use crate::client::{Action, GameClient};
use anyhow::{Context, Result};
use crosswire_game::protocol::{decode_client_command, encode};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

/// Connects, joins a session and plays until the server ends the match.
#[instrument]
pub async fn play(url: &str) -> Result<()> {
    let (socket, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;
    info!("Connected");
    let (mut sink, mut stream) = socket.split();
    let mut client = GameClient::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    sink.send(Message::text(encode(&client.join())?)).await?;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let Some(frame) = frame else {
                    println!("Server went away.");
                    return Ok(());
                };
                let text = match frame? {
                    Message::Text(text) => text,
                    Message::Close(reason) => {
                        debug!(?reason, "Server closed the connection");
                        return Ok(());
                    }
                    _ => continue,
                };
                let command = match decode_client_command(text.as_str()) {
                    Ok(command) => command,
                    Err(e) => {
                        warn!(error = %e, "Ignoring unreadable frame");
                        continue;
                    }
                };
                for action in client.handle(command) {
                    match action {
                        Action::Show(text) => println!("{text}"),
                        Action::Prompt => match client.player_id() {
                            Some(id) => println!("Player {id}, your move (1-9):"),
                            None => println!("Your move (1-9):"),
                        },
                        Action::Exit(text) => {
                            println!("{text}");
                            sink.close().await.ok();
                            return Ok(());
                        }
                    }
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    sink.close().await.ok();
                    return Ok(());
                };
                match client.submit(&line) {
                    Ok(command) => sink.send(Message::text(encode(&command)?)).await?,
                    Err(e) => println!("{e}"),
                }
            }
        }
    }
}
