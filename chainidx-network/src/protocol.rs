//! The Bitcoin P2P wire protocol this indexer speaks to its single peer.

pub mod external;
