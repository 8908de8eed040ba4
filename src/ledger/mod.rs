mod book;
mod entry;
mod form;
mod index;
mod mutation;
mod service;

pub use book::{Ledger, LedgerState, PartnerMeta, PartnerMetaMap};
pub use entry::{normalize_partner, parse_decimal, Entry};
pub use form::EntryForm;
pub use index::IncentiveIndex;
pub use mutation::Mutation;
pub use service::LedgerService;
