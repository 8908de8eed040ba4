use uuid::Uuid;

use super::{Entry, LedgerState, PartnerMeta};
use crate::error::Result;

/// A validated change to the ledger. The same value is applied to the
/// persisted blob and then to the in-memory copy.
#[derive(Debug, Clone)]
pub enum Mutation {
    Add { partner: String, entry: Entry },
    Replace { partner: String, entry: Entry },
    Remove { partner: String, id: Uuid },
    SetMeta { partner: String, meta: PartnerMeta },
    Clear,
}

impl Mutation {
    /// Apply to `state`, returning the entry that was displaced or removed.
    pub fn apply(&self, state: &mut LedgerState) -> Result<Option<Entry>> {
        match self {
            Mutation::Add { partner, entry } => {
                state.add_entry(partner, entry.clone());
                Ok(None)
            }
            Mutation::Replace { partner, entry } => {
                state.replace_entry(partner, entry.clone()).map(Some)
            }
            Mutation::Remove { partner, id } => state.remove_entry(partner, *id).map(Some),
            Mutation::SetMeta { partner, meta } => {
                state.set_meta(partner, meta.clone())?;
                Ok(None)
            }
            Mutation::Clear => {
                state.clear();
                Ok(None)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Add { .. } => "add",
            Mutation::Replace { .. } => "edit",
            Mutation::Remove { .. } => "remove",
            Mutation::SetMeta { .. } => "commission",
            Mutation::Clear => "clear",
        }
    }
}
