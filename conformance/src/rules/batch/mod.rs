//! Batch change-set response format rule.
//!
//! Verifies that a service answering a batched change-set wraps the
//! change-set response using `application/http` with
//! `Content-Transfer-Encoding: binary` instead of plain `multipart/mixed`
//! framing.

pub mod payload;
pub mod rule;
pub mod select;
pub mod shape;

pub use rule::ChangeSetResponseFormat;
