//! The 12-byte ASCII command string that identifies a message's body type.

use std::io;

use chainidx_chain::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};

/// A message type, as named on the wire by a null-padded 12-byte ASCII string.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Command {
    Version,
    Verack,
    Ping,
    Pong,
    GetBlocks,
    Inv,
    GetData,
    Block,
    Tx,
}

impl Command {
    /// The null-padded 12-byte wire encoding of this command.
    pub fn bytes(&self) -> [u8; 12] {
        let name: &[u8] = match self {
            Command::Version => b"version",
            Command::Verack => b"verack",
            Command::Ping => b"ping",
            Command::Pong => b"pong",
            Command::GetBlocks => b"getblocks",
            Command::Inv => b"inv",
            Command::GetData => b"getdata",
            Command::Block => b"block",
            Command::Tx => b"tx",
        };
        let mut out = [0u8; 12];
        out[..name.len()].copy_from_slice(name);
        out
    }
}

impl BitcoinSerialize for Command {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(&self.bytes())
    }
}

impl BitcoinDeserialize for Command {
    fn bitcoin_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        let raw = <[u8; 12]>::bitcoin_deserialize(reader)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        match &raw[..end] {
            b"version" => Ok(Command::Version),
            b"verack" => Ok(Command::Verack),
            b"ping" => Ok(Command::Ping),
            b"pong" => Ok(Command::Pong),
            b"getblocks" => Ok(Command::GetBlocks),
            b"inv" => Ok(Command::Inv),
            b"getdata" => Ok(Command::GetData),
            b"block" => Ok(Command::Block),
            b"tx" => Ok(Command::Tx),
            _ => Err(SerializationError::Parse("unrecognized command string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_every_command() {
        let commands = [
            Command::Version,
            Command::Verack,
            Command::Ping,
            Command::Pong,
            Command::GetBlocks,
            Command::Inv,
            Command::GetData,
            Command::Block,
            Command::Tx,
        ];
        for command in commands {
            let decoded = Command::bitcoin_deserialize(&command.bytes()[..]).unwrap();
            assert_eq!(command, decoded);
        }
    }

    #[test]
    fn rejects_unknown_command() {
        let bytes = *b"notacmd\0\0\0\0\0";
        assert!(Command::bitcoin_deserialize(&bytes[..]).is_err());
    }
}
