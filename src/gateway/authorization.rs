// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed withdrawal authorization.
//!
//! A trusted signer authorizes one withdrawal by signing the EIP-712 typed
//! data of its exact parameters plus the caller's current nonce. The domain
//! binds the gateway name, version, chain id and verifying contract, so a
//! signature never transfers between deployments.

use alloy::{
    primitives::{Address, Signature, B256, U256},
    sol,
    sol_types::{eip712_domain, Eip712Domain, SolStruct},
};
use redb::WriteTransaction;

use super::error::{GatewayError, GatewayResult};
use crate::ledger::{nonces, signers};

pub const DOMAIN_NAME: &str = "RelationalTreasuryGateway";
pub const DOMAIN_VERSION: &str = "1";

sol! {
    /// Typed data signed by a trusted signer.
    #[derive(Debug)]
    struct Withdrawal {
        address caller;
        address asset;
        uint256 amount;
        address recipient;
        uint256 fee;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Parameters of one withdrawal as submitted by the caller.
///
/// The nonce is not part of the request: the caller's current nonce is
/// read from the ledger and must be the one that was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub caller: Address,
    pub asset: Address,
    pub amount: U256,
    pub recipient: Address,
    pub fee: U256,
    pub deadline: u64,
    /// 65-byte `r || s || v` signature.
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AuthorizationVerifier {
    domain: Eip712Domain,
}

impl AuthorizationVerifier {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        let domain = eip712_domain! {
            name: DOMAIN_NAME,
            version: DOMAIN_VERSION,
            chain_id: chain_id,
            verifying_contract: verifying_contract,
        };
        Self { domain }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Digest a signer signs to authorize `request` at `nonce`.
    pub fn signing_hash(&self, request: &WithdrawalRequest, nonce: u64) -> B256 {
        Withdrawal {
            caller: request.caller,
            asset: request.asset,
            amount: request.amount,
            recipient: request.recipient,
            fee: request.fee,
            nonce: U256::from(nonce),
            deadline: U256::from(request.deadline),
        }
        .eip712_signing_hash(&self.domain)
    }

    /// Check expiry, signature and signer, then consume the caller's nonce.
    ///
    /// The nonce increment is staged in `txn` and only persists if the
    /// caller commits it. Returns the consumed nonce.
    pub fn verify(
        &self,
        txn: &WriteTransaction,
        request: &WithdrawalRequest,
        now: u64,
    ) -> GatewayResult<u64> {
        if request.deadline < now {
            return Err(GatewayError::SignatureExpired {
                deadline: request.deadline,
                now,
            });
        }

        let nonce = nonces::current(txn, request.caller)?;
        let hash = self.signing_hash(request, nonce);
        let signature = parse_signature(&request.signature)?;
        let recovered = signature
            .recover_address_from_prehash(&hash)
            .map_err(|e| GatewayError::InvalidSignature(e.to_string()))?;

        if !signers::is_trusted(txn, recovered)? {
            tracing::warn!(caller = %request.caller, %recovered, nonce, "Untrusted withdrawal signer");
            return Err(GatewayError::InvalidSigner { recovered });
        }

        nonces::advance(txn, request.caller, nonce)?;
        Ok(nonce)
    }
}

/// Decode `r || s || v` with `v` in {0, 1, 27, 28} and a low `s`.
fn parse_signature(bytes: &[u8]) -> GatewayResult<Signature> {
    if bytes.len() != 65 {
        return Err(GatewayError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }
    let (rs, v) = (&bytes[..64], bytes[64]);
    let parity = match v {
        0 | 27 => false,
        1 | 28 => true,
        other => {
            return Err(GatewayError::InvalidSignature(format!(
                "unsupported recovery id {other}"
            )))
        }
    };

    let signature = Signature::from_bytes_and_parity(rs, parity);
    if signature.normalize_s().is_some() {
        return Err(GatewayError::InvalidSignature(
            "s value in upper half of the curve order".into(),
        ));
    }
    Ok(signature)
}

/// Sign `request` at `nonce` the way an off-system signer would.
#[cfg(test)]
pub(crate) fn sign_request(
    signer: &alloy::signers::local::PrivateKeySigner,
    verifier: &AuthorizationVerifier,
    request: &WithdrawalRequest,
    nonce: u64,
) -> Vec<u8> {
    use alloy::signers::SignerSync;

    let hash = verifier.signing_hash(request, nonce);
    signer.sign_hash_sync(&hash).unwrap().as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use alloy::signers::local::PrivateKeySigner;

    use super::*;
    use crate::ledger::{temp_ledger, Ledger};

    const NOW: u64 = 1_700_000_000;

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::from_slice(&[0x42; 32]).unwrap()
    }

    fn request() -> WithdrawalRequest {
        WithdrawalRequest {
            caller: Address::repeat_byte(0xca),
            asset: Address::repeat_byte(0x01),
            amount: U256::from(1_000u64),
            recipient: Address::repeat_byte(0xde),
            fee: U256::from(10u64),
            deadline: NOW + 600,
            signature: Vec::new(),
        }
    }

    fn trust(ledger: &Ledger, signer: Address) {
        signers::seed(ledger, &[signer]).unwrap();
    }

    fn verifier() -> AuthorizationVerifier {
        AuthorizationVerifier::new(43_113, Address::repeat_byte(0x9a))
    }

    #[test]
    fn valid_signature_consumes_exactly_one_nonce() {
        let (ledger, _dir) = temp_ledger();
        let signer = signer();
        trust(&ledger, signer.address());
        let verifier = verifier();

        let mut req = request();
        req.signature = sign_request(&signer, &verifier, &req, 0);

        let txn = ledger.begin_write().unwrap();
        assert_eq!(verifier.verify(&txn, &req, NOW).unwrap(), 0);
        txn.commit().unwrap();
        assert_eq!(nonces::nonce_of(&ledger, req.caller).unwrap(), 1);

        // Same signature again: the signed nonce is no longer current.
        let txn = ledger.begin_write().unwrap();
        assert!(matches!(
            verifier.verify(&txn, &req, NOW),
            Err(GatewayError::InvalidSigner { .. })
        ));
    }

    #[test]
    fn expiry_is_checked_before_the_signature() {
        let (ledger, _dir) = temp_ledger();
        let verifier = verifier();
        let mut req = request();
        req.signature = vec![0u8; 3];

        let txn = ledger.begin_write().unwrap();
        assert!(matches!(
            verifier.verify(&txn, &req, req.deadline + 1),
            Err(GatewayError::SignatureExpired { .. })
        ));
        // The deadline second itself is still valid.
        assert!(matches!(
            verifier.verify(&txn, &req, req.deadline),
            Err(GatewayError::InvalidSignature(_))
        ));
    }

    #[test]
    fn untrusted_signer_is_rejected_and_nonce_kept() {
        let (ledger, _dir) = temp_ledger();
        let verifier = verifier();
        let stranger = PrivateKeySigner::from_slice(&[0x07; 32]).unwrap();
        let mut req = request();
        req.signature = sign_request(&stranger, &verifier, &req, 0);

        let txn = ledger.begin_write().unwrap();
        match verifier.verify(&txn, &req, NOW) {
            Err(GatewayError::InvalidSigner { recovered }) => {
                assert_eq!(recovered, stranger.address())
            }
            other => panic!("expected invalid signer, got {other:?}"),
        }
        assert_eq!(nonces::current(&txn, req.caller).unwrap(), 0);
    }

    #[test]
    fn any_changed_field_breaks_the_signature() {
        let (ledger, _dir) = temp_ledger();
        let signer = signer();
        trust(&ledger, signer.address());
        let verifier = verifier();

        let mut req = request();
        req.signature = sign_request(&signer, &verifier, &req, 0);
        req.fee = U256::from(1u64);

        let txn = ledger.begin_write().unwrap();
        assert!(matches!(
            verifier.verify(&txn, &req, NOW),
            Err(GatewayError::InvalidSigner { .. })
        ));
    }

    #[test]
    fn signatures_do_not_cross_deployments() {
        let req = request();
        let here = verifier();
        let other_chain = AuthorizationVerifier::new(1, Address::repeat_byte(0x9a));
        let other_contract = AuthorizationVerifier::new(43_113, Address::repeat_byte(0x9b));
        assert_ne!(here.signing_hash(&req, 0), other_chain.signing_hash(&req, 0));
        assert_ne!(here.signing_hash(&req, 0), other_contract.signing_hash(&req, 0));
        assert_ne!(here.signing_hash(&req, 0), here.signing_hash(&req, 1));
    }

    #[test]
    fn recovery_ids_are_normalized() {
        let signer = signer();
        let verifier = verifier();
        let req = request();
        let mut bytes = sign_request(&signer, &verifier, &req, 0);
        let hash = verifier.signing_hash(&req, 0);

        bytes[64] -= 27;
        let parsed = parse_signature(&bytes).unwrap();
        assert_eq!(
            parsed.recover_address_from_prehash(&hash).unwrap(),
            signer.address()
        );

        bytes[64] = 29;
        assert!(parse_signature(&bytes).is_err());
        assert!(parse_signature(&bytes[..64]).is_err());
    }
}
