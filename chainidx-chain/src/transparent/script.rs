use crate::{
    compactint::CompactInt,
    serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{self, Read},
};

/// An encoded locking/unlocking script.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct Script(pub Vec<u8>);

/// The standard script templates this indexer recognizes when resolving an
/// output's spender address. Anything else is `NonStandard`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScriptClass {
    PubKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessPubKeyHash([u8; 20]),
    WitnessScriptHash([u8; 32]),
    NullData,
    NonStandard,
}

impl ScriptClass {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptClass::PubKeyHash(_) => "pubkeyhash",
            ScriptClass::ScriptHash(_) => "scripthash",
            ScriptClass::WitnessPubKeyHash(_) => "witness_v0_keyhash",
            ScriptClass::WitnessScriptHash(_) => "witness_v0_scripthash",
            ScriptClass::NullData => "nulldata",
            ScriptClass::NonStandard => "nonstandard",
        }
    }
}

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_EQUAL: u8 = 0x87;
const OP_0: u8 = 0x00;
const OP_RETURN: u8 = 0x6a;

impl Script {
    pub fn serialized_size(&self) -> usize {
        CompactInt::size(self.0.len()) + self.0.len()
    }

    /// Classifies this script as one of the standard templates, if it
    /// matches one exactly.
    pub fn classify(&self) -> ScriptClass {
        let b = &self.0;
        if b.len() == 25 && b[0] == OP_DUP && b[1] == OP_HASH160 && b[2] == 20 {
            if b[23] == OP_EQUALVERIFY && b[24] == OP_CHECKSIG {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&b[3..23]);
                return ScriptClass::PubKeyHash(hash);
            }
        }
        if b.len() == 23 && b[0] == OP_HASH160 && b[1] == 20 && b[22] == OP_EQUAL {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&b[2..22]);
            return ScriptClass::ScriptHash(hash);
        }
        if b.len() == 22 && b[0] == OP_0 && b[1] == 20 {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&b[2..22]);
            return ScriptClass::WitnessPubKeyHash(hash);
        }
        if b.len() == 34 && b[0] == OP_0 && b[1] == 32 {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&b[2..34]);
            return ScriptClass::WitnessScriptHash(hash);
        }
        if b.first() == Some(&OP_RETURN) {
            return ScriptClass::NullData;
        }
        ScriptClass::NonStandard
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl BitcoinSerialize for Script {
    fn bitcoin_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        CompactInt::from(self.0.len()).bitcoin_serialize(&mut writer)?;
        writer.write_all(&self.0[..])?;
        Ok(())
    }
}

impl BitcoinDeserialize for Script {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = CompactInt::bitcoin_deserialize(&mut reader)?.value();
        let mut bytes = Vec::new();
        reader.take(len).read_to_end(&mut bytes)?;
        Ok(Script(bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn script_roundtrip() {
        let script = Script(vec![0x76, 0xa9, 20, 1, 2, 3]);
        let mut bytes = Cursor::new(Vec::new());
        script.bitcoin_serialize(&mut bytes).unwrap();

        bytes.set_position(0);
        let other = Script::bitcoin_deserialize(&mut bytes).unwrap();
        assert_eq!(script, other);
    }

    #[test]
    fn classifies_p2pkh() {
        let mut bytes = vec![OP_DUP, OP_HASH160, 20];
        bytes.extend_from_slice(&[0xabu8; 20]);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        let script = Script(bytes);
        assert_eq!(script.classify(), ScriptClass::PubKeyHash([0xab; 20]));
    }

    #[test]
    fn classifies_op_return_as_nulldata() {
        let script = Script(vec![OP_RETURN, 4, 1, 2, 3, 4]);
        assert_eq!(script.classify(), ScriptClass::NullData);
    }

    #[test]
    fn classifies_unknown_as_nonstandard() {
        let script = Script(vec![0x51, 0x52]);
        assert_eq!(script.classify(), ScriptClass::NonStandard);
    }
}
