//! Contracts for the collaborators the core drives but does not own:
//! durable storage and completion alerts.

mod notification;
mod persistence;

pub use notification::{LogNotifier, NoopNotifier, NotificationGateway};
pub use persistence::{Collection, MemoryStore, PersistenceGateway, StoreTxn, TxnBody};
