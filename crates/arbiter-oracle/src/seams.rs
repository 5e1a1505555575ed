use arbiter_core::error::ArbiterError;
use arbiter_core::request::RequestKind;
use arbiter_core::types::RequestId;

/// Raw answer from the external prover for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct DataResult {
    /// Whether the network's nodes agreed the result is valid. A value may
    /// only be applied once this is true.
    pub consensus: bool,
    pub result: Vec<u8>,
}

/// Submission seam to the oracle network. The returned id is assigned by the
/// network, never generated locally — it must be captured from this call.
pub trait RequestSubmitter: Send + Sync {
    fn submit(&self, kind: RequestKind, payload: &[u8]) -> Result<RequestId, ArbiterError>;
}

/// Read seam to the network's prover contract. An unknown id fails with
/// `ResultUnavailable`; implementations must not answer for requests the
/// network has never seen.
pub trait DataProver: Send + Sync {
    fn get_data_result(&self, request_id: &RequestId) -> Result<DataResult, ArbiterError>;
}
