//! A Tokio codec mapping byte streams to Bitcoin message streams.

use std::fmt;
use std::io::{Cursor, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use chainidx_chain::{
    block,
    serialization::{sha256d, BitcoinDeserialize, BitcoinSerialize, SerializationError as Error},
    transaction::Transaction,
};

use crate::types::Nonce;

use super::{command::Command, inv::InventoryHash, message::Message};

/// The length of a Bitcoin message header: magic(4) + command(12) + length(4) + checksum(4).
const HEADER_LEN: usize = 24usize;

/// Maximum size of a protocol message body.
const MAX_PROTOCOL_MESSAGE_LEN: usize = 2 * 1024 * 1024;

/// A codec which produces Bitcoin messages from byte streams and vice versa.
pub struct Codec {
    builder: Builder,
    state: DecodeState,
}

/// A builder for specifying [`Codec`] options.
pub struct Builder {
    /// The network magic bytes to expect/emit.
    magic: [u8; 4],
    /// The maximum allowable message length.
    max_len: usize,
}

impl Codec {
    /// Return a builder for constructing a [`Codec`].
    pub fn builder() -> Builder {
        Builder {
            magic: [0u8; 4],
            max_len: MAX_PROTOCOL_MESSAGE_LEN,
        }
    }
}

impl Builder {
    /// Finalize the builder and return a [`Codec`].
    pub fn finish(self) -> Codec {
        Codec {
            builder: self,
            state: DecodeState::Head,
        }
    }

    /// Configure the codec for the given network's magic bytes.
    pub fn for_magic(mut self, magic: [u8; 4]) -> Self {
        self.magic = magic;
        self
    }

    /// Configure the codec's maximum accepted payload size, in bytes.
    #[allow(dead_code)]
    pub fn with_max_body_len(mut self, len: usize) -> Self {
        self.max_len = len;
        self
    }
}

// ======== Encoding =========

impl Encoder<Message> for Codec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        use Error::Parse;

        // An extra allocation for the body lets us compute its checksum
        // before writing the header; the size here is never large enough
        // for this to matter.
        let mut body = Vec::new();
        self.write_body(&item, &mut body)?;

        if body.len() > self.builder.max_len {
            return Err(Parse("body length exceeded maximum size"));
        }

        let command = item.command().bytes();
        trace!(%item, len = body.len());

        let mut header = [0u8; HEADER_LEN];
        let mut header_writer = Cursor::new(&mut header[..]);
        header_writer.write_all(&self.builder.magic)?;
        header_writer.write_all(&command)?;
        header_writer.write_u32::<LittleEndian>(body.len() as u32)?;
        header_writer.write_all(&sha256d::Checksum::from(&body[..]).0)?;

        dst.reserve(HEADER_LEN + body.len());
        dst.extend_from_slice(&header);
        dst.extend_from_slice(&body);

        Ok(())
    }
}

impl Codec {
    /// Write the body of the message into the given writer. This allows
    /// writing the message body prior to writing the header, so that the
    /// header can contain a checksum of the message body.
    fn write_body<W: Write>(&self, msg: &Message, mut writer: W) -> Result<(), Error> {
        match msg {
            Message::Version(inner) => inner.bitcoin_serialize(&mut writer)?,
            Message::Verack => { /* Empty payload */ }
            Message::Ping(nonce) => nonce.bitcoin_serialize(&mut writer)?,
            Message::Pong(nonce) => nonce.bitcoin_serialize(&mut writer)?,
            Message::GetBlocks(get_blocks) => get_blocks.bitcoin_serialize(&mut writer)?,
            Message::Inv(hashes) => hashes.bitcoin_serialize(&mut writer)?,
            Message::GetData(hashes) => hashes.bitcoin_serialize(&mut writer)?,
            Message::Block(block) => block.bitcoin_serialize(&mut writer)?,
            Message::Tx(transaction) => transaction.bitcoin_serialize(&mut writer)?,
        }
        Ok(())
    }
}

// ======== Decoding =========

enum DecodeState {
    Head,
    Body {
        body_len: usize,
        command: Command,
        checksum: sha256d::Checksum,
    },
}

impl fmt::Debug for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeState::Head => write!(f, "DecodeState::Head"),
            DecodeState::Body {
                body_len,
                command,
                checksum,
            } => f
                .debug_struct("DecodeState::Body")
                .field("body_len", &body_len)
                .field("command", &command)
                .field("checksum", &checksum)
                .finish(),
        }
    }
}

impl Decoder for Codec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        use Error::Parse;
        match self.state {
            DecodeState::Head => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let header = src.split_to(HEADER_LEN);
                let mut header_reader = Cursor::new(&header);
                let magic = <[u8; 4]>::bitcoin_deserialize(&mut header_reader)?;
                let command = Command::bitcoin_deserialize(&mut header_reader)?;
                let body_len = header_reader.read_u32::<LittleEndian>()? as usize;
                let checksum =
                    sha256d::Checksum(<[u8; 4]>::bitcoin_deserialize(&mut header_reader)?);

                trace!(?magic, ?command, body_len, "read header from src buffer");

                if magic != self.builder.magic {
                    return Err(Parse("supplied magic did not meet expectations"));
                }
                if body_len > self.builder.max_len {
                    return Err(Parse("body length exceeded maximum size"));
                }

                src.reserve(body_len + HEADER_LEN);

                self.state = DecodeState::Body {
                    body_len,
                    command,
                    checksum,
                };

                self.decode(src)
            }
            DecodeState::Body {
                body_len,
                command,
                checksum,
            } => {
                if src.len() < body_len {
                    return Ok(None);
                }

                let body = src.split_to(body_len);
                self.state = DecodeState::Head;

                if checksum != sha256d::Checksum::from(&body[..]) {
                    return Err(Parse(
                        "supplied message checksum does not match computed checksum",
                    ));
                }

                let mut body_reader = Cursor::new(&body);
                let msg = match command {
                    Command::Version => {
                        Message::Version(crate::protocol::external::Version::bitcoin_deserialize(
                            &mut body_reader,
                        )?)
                    }
                    Command::Verack => Message::Verack,
                    Command::Ping => Message::Ping(Nonce::bitcoin_deserialize(&mut body_reader)?),
                    Command::Pong => Message::Pong(Nonce::bitcoin_deserialize(&mut body_reader)?),
                    Command::GetBlocks => Message::GetBlocks(
                        crate::protocol::external::GetBlocks::bitcoin_deserialize(
                            &mut body_reader,
                        )?,
                    ),
                    Command::Inv => {
                        Message::Inv(<Vec<InventoryHash>>::bitcoin_deserialize(&mut body_reader)?)
                    }
                    Command::GetData => Message::GetData(<Vec<InventoryHash>>::bitcoin_deserialize(
                        &mut body_reader,
                    )?),
                    Command::Block => {
                        Message::Block(<Arc<block::Block>>::bitcoin_deserialize(&mut body_reader)?)
                    }
                    Command::Tx => {
                        Message::Tx(<Arc<Transaction>>::bitcoin_deserialize(&mut body_reader)?)
                    }
                };
                trace!("finished message decoding");
                Ok(Some(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::prelude::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tokio::runtime::Runtime;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use crate::protocol::external::Version;
    use crate::types::PeerServices;
    use chainidx_chain::block;

    const MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

    #[test]
    fn version_message_round_trip() {
        let services = PeerServices::NODE_NETWORK;
        let rt = Runtime::new().unwrap();

        let v = Message::Version(Version::new(
            crate::constants::CURRENT_VERSION,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 6)), 8333),
            services,
            services,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 6)), 8333),
            Nonce(0x9082_4908_8927_9238),
            "Beaver".to_owned(),
            block::Height(540_000),
            true,
        ));

        let v_bytes = rt.block_on(async {
            let mut bytes = Vec::new();
            {
                let mut fw =
                    FramedWrite::new(&mut bytes, Codec::builder().for_magic(MAGIC).finish());
                fw.send(v.clone()).await.expect("message should serialize");
            }
            bytes
        });

        let v_parsed = rt.block_on(async {
            let mut fr =
                FramedRead::new(Cursor::new(&v_bytes), Codec::builder().for_magic(MAGIC).finish());
            fr.next()
                .await
                .expect("a next message should be available")
                .expect("that message should deserialize")
        });

        assert_eq!(v, v_parsed);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let rt = Runtime::new().unwrap();
        let v = Message::Verack;

        let v_bytes = rt.block_on(async {
            let mut bytes = Vec::new();
            {
                let mut fw =
                    FramedWrite::new(&mut bytes, Codec::builder().for_magic(MAGIC).finish());
                fw.send(v.clone()).await.expect("message should serialize");
            }
            bytes
        });

        rt.block_on(async {
            let mut fr = FramedRead::new(
                Cursor::new(&v_bytes),
                Codec::builder().for_magic([0, 0, 0, 0]).finish(),
            );
            fr.next()
                .await
                .expect("a next message should be available")
                .expect_err("magic mismatch should be rejected")
        });
    }
}
