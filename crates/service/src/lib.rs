//! Service layer for the emoji resource.
//! - Business rules (permission, duplicate detection, soft-delete) live in `emoji::service`.
//! - Persistence goes through the `emoji::repository::IconRepository` seam.
//! - Every operation answers with an `envelope::Envelope`.

pub mod errors;
pub mod envelope;
pub mod emoji;
#[cfg(test)]
pub mod test_support;
