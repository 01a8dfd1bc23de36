//! statushound — polls a homework-review API and relays status changes to
//! a Telegram chat.
//!
//! The poll loop is the only active component: on each tick it fetches the
//! current submission snapshots through [`review::ReviewClient`], diffs
//! them against the owned [`store::StatusStore`], delivers change
//! notifications through [`notify::Notifier`], and advances the store only
//! for changes the notifier accepted.

pub mod config;
pub mod notify;
pub mod poll;
pub mod review;
pub mod store;
