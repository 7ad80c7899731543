//! # Repository Layer
//!
//! Repositories borrow the shared [`MemoryStore`](crate::db::MemoryStore) and
//! expose list/get/create/update(/delete) per entity kind, plus the stats row.
//! Every operation runs as a single critical section on the store lock.

pub mod delivery;
pub mod document;
pub mod stats;
pub mod supplier;
pub mod whatsapp_message;

pub use delivery::DeliveryRepository;
pub use document::DocumentRepository;
pub use stats::StatsRepository;
pub use supplier::SupplierRepository;
pub use whatsapp_message::WhatsappMessageRepository;
