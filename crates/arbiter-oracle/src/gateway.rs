use std::sync::Arc;

use arbiter_core::error::ArbiterError;
use arbiter_core::types::RequestId;

use crate::seams::{DataProver, DataResult};

/// Pure read-through to the external prover. Performs no local mutation.
///
/// "Unavailable" and "resolved-to-zero" are distinct outcomes: a request the
/// prover does not know about (or has no consensus on yet) surfaces as
/// `ResultUnavailable` from `raw_result`, never as an empty or zero value.
pub struct ProverGateway {
    prover: Arc<dyn DataProver>,
}

impl ProverGateway {
    pub fn new(prover: Arc<dyn DataProver>) -> Self {
        Self { prover }
    }

    /// True once the network has reached consensus on the request. Unknown
    /// ids answer false — consensus has certainly not been reached on them.
    pub fn consensus_reached(&self, request_id: &RequestId) -> Result<bool, ArbiterError> {
        match self.prover.get_data_result(request_id) {
            Ok(DataResult { consensus, .. }) => Ok(consensus),
            Err(ArbiterError::ResultUnavailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The raw result bytes, only available after consensus. Fails with
    /// `ResultUnavailable` before consensus or for an unknown id.
    pub fn raw_result(&self, request_id: &RequestId) -> Result<Vec<u8>, ArbiterError> {
        let data = self.prover.get_data_result(request_id)?;
        if !data.consensus {
            return Err(ArbiterError::ResultUnavailable(request_id.to_hex()));
        }
        Ok(data.result)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracleNetwork;
    use arbiter_core::request::RequestKind;
    use crate::seams::RequestSubmitter;

    #[test]
    fn unavailable_is_not_a_zero_result() {
        let network = Arc::new(MockOracleNetwork::new());
        let gateway = ProverGateway::new(network.clone());
        let id = network.submit(RequestKind::PriceUpdate, b"eth-usdc").unwrap();

        // Known id, no consensus yet: false, and raw_result refuses.
        assert!(!gateway.consensus_reached(&id).unwrap());
        assert!(matches!(
            gateway.raw_result(&id).unwrap_err(),
            ArbiterError::ResultUnavailable(_)
        ));

        // Consensus on an explicit zero: reachable and readable, distinct
        // from the unavailable case above.
        network.resolve(&id, true, vec![0u8; 32]);
        assert!(gateway.consensus_reached(&id).unwrap());
        assert_eq!(gateway.raw_result(&id).unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn unknown_id_has_no_consensus() {
        let network = Arc::new(MockOracleNetwork::new());
        let gateway = ProverGateway::new(network);
        let unknown = RequestId::from_bytes([0xee; 32]);
        assert!(!gateway.consensus_reached(&unknown).unwrap());
        assert!(matches!(
            gateway.raw_result(&unknown).unwrap_err(),
            ArbiterError::ResultUnavailable(_)
        ));
    }
}
