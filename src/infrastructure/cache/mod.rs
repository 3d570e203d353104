//! In-process TTL caches: resolution, one-time codes, restrictions.

pub mod otp_store;
pub mod resolution_cache;
pub mod restriction_cache;

pub use otp_store::{IssueOutcome, OtpStore, VerifyOutcome};
pub use resolution_cache::ResolutionCache;
pub use restriction_cache::{Restriction, RestrictionCache};
