//! # Wire Protocol Messages
//!
//! The peer-to-peer message set exchanged by `chain-sync` (C7/C8). Every
//! variant carries a `request_id`; `0` marks an unsolicited broadcast that
//! expects no matching response.

use crate::entities::{Block, BlockHeader, Hash};
use serde::{Deserialize, Serialize};

/// A `0` request id marks a message as an unsolicited broadcast rather
/// than part of a request/response pair.
pub const BROADCAST_REQUEST_ID: u64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireMessage {
    GetBlockHeaders {
        request_id: u64,
        /// Block locator hashes, most recent first, used to find the
        /// common ancestor with the responder's chain.
        locators: Vec<Hash>,
        stop: Option<Hash>,
        limit: u32,
    },
    BlockHeaders {
        request_id: u64,
        headers: Vec<BlockHeader>,
    },
    GetBlockBodies {
        request_id: u64,
        hashes: Vec<Hash>,
    },
    /// Same length and order as the request's `hashes`; a missing block
    /// is represented as an empty tx list, never by shortening the
    /// response.
    BlockBodies {
        request_id: u64,
        bodies: Vec<Vec<crate::entities::Tx>>,
    },
    /// Unsolicited: a peer announces a newly mined/received full block.
    NewBlock {
        request_id: u64,
        block: Block,
    },
    /// Unsolicited: a peer announces a newly mined/received header only.
    NewHeader {
        request_id: u64,
        header: BlockHeader,
    },
    GetMempoolHashes {
        request_id: u64,
    },
    MempoolHashes {
        request_id: u64,
        hashes: Vec<Hash>,
    },
    GetMempoolTxs {
        request_id: u64,
        hashes: Vec<Hash>,
    },
    MempoolTxs {
        request_id: u64,
        txs: Vec<crate::entities::Tx>,
    },
}

impl WireMessage {
    pub fn request_id(&self) -> u64 {
        match self {
            WireMessage::GetBlockHeaders { request_id, .. }
            | WireMessage::BlockHeaders { request_id, .. }
            | WireMessage::GetBlockBodies { request_id, .. }
            | WireMessage::BlockBodies { request_id, .. }
            | WireMessage::NewBlock { request_id, .. }
            | WireMessage::NewHeader { request_id, .. }
            | WireMessage::GetMempoolHashes { request_id }
            | WireMessage::MempoolHashes { request_id, .. }
            | WireMessage::GetMempoolTxs { request_id, .. }
            | WireMessage::MempoolTxs { request_id, .. } => *request_id,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.request_id() == BROADCAST_REQUEST_ID
    }

    /// Name for logging/metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::GetBlockHeaders { .. } => "get_block_headers",
            WireMessage::BlockHeaders { .. } => "block_headers",
            WireMessage::GetBlockBodies { .. } => "get_block_bodies",
            WireMessage::BlockBodies { .. } => "block_bodies",
            WireMessage::NewBlock { .. } => "new_block",
            WireMessage::NewHeader { .. } => "new_header",
            WireMessage::GetMempoolHashes { .. } => "get_mempool_hashes",
            WireMessage::MempoolHashes { .. } => "mempool_hashes",
            WireMessage::GetMempoolTxs { .. } => "get_mempool_txs",
            WireMessage::MempoolTxs { .. } => "mempool_txs",
        }
    }
}
