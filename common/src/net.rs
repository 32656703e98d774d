use anyhow::{Context, Result};
use quinn::Connection;

#[cfg(feature = "json")]
use serde::{Serialize, de::DeserializeOwned};

#[cfg(all(feature = "bincode", not(feature = "json")))]
use bincode::{Decode, Encode};

use crate::constants::MAX_MESSAGE_SIZE;

#[cfg(not(any(feature = "json", feature = "bincode")))]
compile_error!("enable either the `bincode` or the `json` feature");

// ============================================================================
// Wire Codec
// ============================================================================

// Anything that can cross the wire with the active codec
#[cfg(feature = "json")]
pub trait Wire: Serialize + DeserializeOwned {}

#[cfg(feature = "json")]
impl<T: Serialize + DeserializeOwned> Wire for T {}

#[cfg(all(feature = "bincode", not(feature = "json")))]
pub trait Wire: Encode + Decode<()> {}

#[cfg(all(feature = "bincode", not(feature = "json")))]
impl<T: Encode + Decode<()>> Wire for T {}

#[cfg(feature = "json")]
pub fn encode_message<T: Wire>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).context("failed to encode message")
}

#[cfg(feature = "json")]
pub fn decode_message<T: Wire>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).context("failed to decode message")
}

#[cfg(all(feature = "bincode", not(feature = "json")))]
pub fn encode_message<T: Wire>(msg: &T) -> Result<Vec<u8>> {
    bincode::encode_to_vec(msg, bincode::config::standard()).context("failed to encode message")
}

#[cfg(all(feature = "bincode", not(feature = "json")))]
pub fn decode_message<T: Wire>(data: &[u8]) -> Result<T> {
    let (msg, _) =
        bincode::decode_from_slice(data, bincode::config::standard()).context("failed to decode message")?;
    Ok(msg)
}

// ============================================================================
// Message Stream Abstraction
// ============================================================================

// One unidirectional QUIC stream per message
pub struct MessageStream<'a> {
    connection: &'a Connection,
}

impl<'a> MessageStream<'a> {
    #[must_use]
    pub const fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    pub async fn send<T: Wire + Sync>(&self, msg: &T) -> Result<()> {
        let data = encode_message(msg)?;
        let mut stream = self.connection.open_uni().await?;
        stream.write_all(&data).await?;
        stream.finish()?;
        Ok(())
    }

    // Raw payload of the next message. Errors here are connection-level; decoding is left to the
    // caller so that a malformed payload can be discarded without dropping the connection.
    pub async fn recv_bytes(&self) -> Result<Vec<u8>> {
        let mut stream = self.connection.accept_uni().await?;
        let data = stream.read_to_end(MAX_MESSAGE_SIZE).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;

    #[test]
    fn state_message_survives_the_codec() {
        let msg = ClientMessage::State(CState {
            x: 1.5,
            y: 2.0,
            z: -3.25,
            rot_y: 0.5,
            vx: 10.0,
            vz: -4.0,
            lives: 2,
            lap: 1,
            segment_id: Some(7),
            segment_t: 0.4,
        });
        let data = encode_message(&msg).expect("encode");
        let decoded: ClientMessage = decode_message(&data).expect("decode");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let result = decode_message::<ServerMessage>(&[0xff, 0xfe, 0xfd, 0x00, 0x13]);
        assert!(result.is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_messages_are_tagged_by_type() {
        let msg = ServerMessage::GameOver(SGameOver { winner_id: None });
        let text = String::from_utf8(encode_message(&msg).expect("encode")).expect("utf8");
        assert!(text.contains(r#""type":"game_over""#));
        assert!(text.contains(r#""winnerId":null"#));

        let welcome: ServerMessage = decode_message(
            br#"{"type":"welcome","id":4,"isHost":true,"canPlay":true,"gameActive":false,"trackSeed":9}"#,
        )
        .expect("decode");
        assert!(matches!(welcome, ServerMessage::Welcome(SWelcome { id: PlayerId(4), is_host: true, .. })));
    }

    #[cfg(feature = "json")]
    #[test]
    fn unknown_json_tag_is_rejected() {
        let result = decode_message::<ClientMessage>(br#"{"type":"teleport","x":1}"#);
        assert!(result.is_err());
    }
}
