use serde::{Deserialize, Serialize};

use truevnd_controller::ControllerEvent;
use truevnd_core::{AccountId, BlockHeight, LedgerEvent, LedgerResult};

use crate::call::{Call, CallOutput};

/// 32-byte BLAKE3 digest identifying one submitted call
pub type CallHash = [u8; 32];

/// An event tagged with the instance that emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    Ledger { ledger: AccountId, event: LedgerEvent },
    Controller { controller: AccountId, event: ControllerEvent },
}

/// Outcome of one call submitted to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReceipt {
    /// Hash of the sequence number, caller and call
    pub call_hash: CallHash,

    /// Position of the call in the host's history
    pub sequence: u64,

    pub caller: AccountId,

    /// Host height when the call ran
    pub height: BlockHeight,

    pub success: bool,

    /// Any error message from the execution (if not successful)
    pub error_message: Option<String>,

    pub output: CallOutput,

    /// Events emitted by the call, in order; empty when it failed
    pub events: Vec<HostEvent>,
}

impl CallReceipt {
    pub fn new(
        sequence: u64,
        caller: AccountId,
        height: BlockHeight,
        call: &Call,
    ) -> LedgerResult<Self> {
        Ok(Self {
            call_hash: Self::hash_call(sequence, &caller, call)?,
            sequence,
            caller,
            height,
            success: true,
            error_message: None,
            output: CallOutput::None,
            events: Vec::new(),
        })
    }

    /// BLAKE3 over the bincode encoding of `(sequence, caller, call)`
    pub fn hash_call(sequence: u64, caller: &AccountId, call: &Call) -> LedgerResult<CallHash> {
        let encoded = bincode::serialize(&(sequence, caller, call))?;
        Ok(*blake3::hash(&encoded).as_bytes())
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = Some(message.into());
        self.events.clear();
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.call_hash)
    }

    /// Pretty JSON rendering for logs and audit exports
    pub fn to_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
