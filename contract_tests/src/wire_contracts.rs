//! RealmLink wire contract tests
//!
//! These tests define the stable wire contract between two realms. They
//! fail when an action identifier, the schema version, or a payload field
//! shape drifts.
