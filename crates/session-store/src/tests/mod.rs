//! Scenario tests for the session store.
//!
//! - `harness.rs`     - scripted auth client, recording persistence, TestHarness
//! - `login.rs`       - login and registration, success and classified failures
//! - `logout.rs`      - explicit sign-out, remote failure tolerance
//! - `hydrate.rs`     - restoring from persistence at startup
//! - `refresh.rs`     - profile refresh, retries, implicit sign-out
//! - `concurrency.rs` - in-flight rejection and superseded responses
//! - `events.rs`      - subscriber notifications
//! - `invariants.rs`  - state/credential consistency over action sequences
//! - `vault.rs`       - the store over the real file-backed vault

mod invariants;
mod logout;
