use std::fmt;

use serde::{Deserialize, Serialize};

/// A block's position in the main chain, counting the genesis block as 0.
///
/// Heights are tracked by the sync manager as blocks are accepted; unlike
/// `block::Hash`, a `Height` is never read directly off the wire (Bitcoin
/// headers don't carry one - BIP34 height-in-coinbase parsing is out of
/// scope here).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Height(pub u64);

impl Height {
    pub const GENESIS: Height = Height(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Height {
        Height(self.0 + 1)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Height {
    fn from(value: u64) -> Self {
        Height(value)
    }
}
