//! Service tests for the order API
//!
//! Store implementations are exercised here; the REST client runs against
//! a local fake of the hosted store's HTTP protocol.
