//! Shared primitive types used across the back-office core.

/// A server-assigned identifier (customer, retail, business, account, mandate, ...).
pub type EntityId = String;

/// Identifier of a KYC record (individual or business).
pub type KycId = String;

/// Identifier of one wizard session.
pub type SessionId = String;
