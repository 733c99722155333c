//! Compact wire identity for participants
//!
//! Identifiers are opaque strings chosen by the transport (user ids, session ids...). Sending them
//! with every state update would dwarf the 14 bytes of actual state, so the wire carries a 32-bit
//! rolling hash instead and the receiver maps it back through its pool.
//!
//! The hash is the classic `h = h * 31 + unit` over UTF-16 code units with 32-bit wrapping, so
//! that any peer producing the same identifier string computes the same key.
//!
//! Known limitation: two identifiers can collide. With ~150 concurrent participants the odds are
//! roughly 2.6e-6 per session; the pool refuses to bind a second identifier onto a hash that is
//! already in use instead of silently redirecting its updates.

/// 32-bit identity hash used as the wire key of an entity
pub type IdentityHash = u32;

/// Hash an identifier string into its wire key
pub fn identity_hash(identifier: &str) -> IdentityHash {
    identifier
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as u32))
}
