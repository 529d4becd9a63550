use serde::{Deserialize, Serialize};

use super::{write::LedgerEntryCommand, EntryId};

/// A stored ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    #[serde(flatten)]
    pub values: LedgerEntryCommand,
}
