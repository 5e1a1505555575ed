//! In-process stand-in for the oracle network, used by tests across the
//! workspace. Assigns random request ids at submission (the way the real
//! network returns an id the consumer must capture) and lets a test post
//! results and flip consensus explicitly.

use std::collections::HashMap;
use std::sync::Mutex;

use arbiter_core::error::ArbiterError;
use arbiter_core::request::RequestKind;
use arbiter_core::types::RequestId;
use rand::RngCore;

use crate::seams::{DataProver, DataResult, RequestSubmitter};

#[derive(Default)]
pub struct MockOracleNetwork {
    results: Mutex<HashMap<RequestId, DataResult>>,
    submitted: Mutex<Vec<(RequestKind, Vec<u8>, RequestId)>>,
}

impl MockOracleNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post (or replace) a result for a known request and set its consensus
    /// flag. Resolving an id the network never issued is allowed so tests
    /// can model results for abandoned/superseded requests.
    pub fn resolve(&self, id: &RequestId, consensus: bool, result: Vec<u8>) {
        self.results
            .lock()
            .expect("mock network poisoned")
            .insert(*id, DataResult { consensus, result });
    }

    /// Every submission seen, in order.
    pub fn submissions(&self) -> Vec<(RequestKind, Vec<u8>, RequestId)> {
        self.submitted.lock().expect("mock network poisoned").clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().expect("mock network poisoned").len()
    }
}

impl RequestSubmitter for MockOracleNetwork {
    fn submit(&self, kind: RequestKind, payload: &[u8]) -> Result<RequestId, ArbiterError> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = RequestId::from_bytes(bytes);

        // Known to the network from submission, but without consensus until
        // a test resolves it.
        self.results
            .lock()
            .expect("mock network poisoned")
            .insert(id, DataResult { consensus: false, result: Vec::new() });
        self.submitted
            .lock()
            .expect("mock network poisoned")
            .push((kind, payload.to_vec(), id));
        Ok(id)
    }
}

impl DataProver for MockOracleNetwork {
    fn get_data_result(&self, request_id: &RequestId) -> Result<DataResult, ArbiterError> {
        self.results
            .lock()
            .expect("mock network poisoned")
            .get(request_id)
            .cloned()
            .ok_or_else(|| ArbiterError::ResultUnavailable(request_id.to_hex()))
    }
}
