//! Identifier generation
//!
//! Suffixes are time-ordered snowflake ids, unique within the process.

use snowflaked::sync::Generator;

use crate::models::clinic::clinic_code;

static GENERATOR: Generator = Generator::new(0);

/// `REQ-{suffix}`
pub fn request_id() -> String {
    format!("REQ-{}", GENERATOR.generate::<u64>())
}

/// `EQ_{clinic code}_{suffix}`
pub fn equipment_id(clinic_id: &str) -> String {
    format!("EQ_{}_{}", clinic_code(clinic_id), GENERATOR.generate::<u64>())
}
