//! arbiter-oracle
//!
//! Consumer-side plumbing for the external decentralized-compute oracle
//! network: request correlation (`RequestTracker`), consensus-gated reads
//! (`ProverGateway`), type-tagged result decoding (`ResultDecoder` functions),
//! and the prompt / tx-verification resolution flows (`OracleClient`).
//!
//! The network itself is reached only through the `RequestSubmitter` and
//! `DataProver` seams; this crate never reproduces its consensus algorithm.

pub mod client;
pub mod decode;
pub mod gateway;
pub mod seams;
pub mod testing;
pub mod tracker;

pub use client::{OracleClient, Resolution};
pub use decode::{decode, DomainValue, TxDetails, TxOutcome};
pub use gateway::ProverGateway;
pub use seams::{DataProver, DataResult, RequestSubmitter};
pub use tracker::RequestTracker;
