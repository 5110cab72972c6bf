//! Resilient upstream proxy layer.
//!
//! Everything that talks to the AI analysis backend goes through this module:
//! parameter canonicalization ([`params`]), the short-lived response cache
//! ([`cache`]), the single-shot HTTP executor ([`upstream`]), and the
//! degrade-and-retry cascade used by job search ([`cascade`]).

pub mod cache;
pub mod cascade;
pub mod params;
pub mod upstream;
