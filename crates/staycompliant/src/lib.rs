//! StayCompliant core: night-cap accounting, permit-expiry classification,
//! and the deduplicated renewal-reminder sweep for short-term-rental hosts.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
