//! Domain models for the maintenance tracker

pub mod clinic;
pub mod enums;
pub mod equipment;
pub mod media;
pub mod repair_request;
pub mod user;

// Re-export commonly used types
pub use clinic::Clinic;
pub use enums::{EquipmentStatus, RepairStatus, Role, StatusBucket};
pub use equipment::Equipment;
pub use repair_request::RepairRequest;
pub use user::{Actor, User};
