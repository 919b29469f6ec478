//! Authenticity check for completed-payment callbacks.
//!
//! The processor signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the
//! shared key secret and hands the lowercase hex digest to the client.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not 64 lowercase hex characters")]
    Malformed,
    #[error("signature does not match")]
    Mismatch,
}

#[derive(Clone)]
pub struct PaymentVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for PaymentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentVerifier").finish_non_exhaustive()
    }
}

impl PaymentVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Hex signature the processor would produce for this pair.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac(order_id, payment_id).finalize().into_bytes())
    }

    /// Constant-time comparison of the supplied signature against the expected digest.
    ///
    /// Only the canonical form is accepted: exactly 64 lowercase hex characters,
    /// no surrounding whitespace. Decoding that form is one-to-one, so the byte
    /// comparison is equivalent to comparing the strings.
    pub fn verify(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), SignatureError> {
        if !is_canonical_hex(signature) {
            return Err(SignatureError::Malformed);
        }
        let supplied = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
        self.mac(order_id, payment_id)
            .verify_slice(&supplied)
            .map_err(|_| SignatureError::Mismatch)
    }
}

fn is_canonical_hex(signature: &str) -> bool {
    signature.len() == SIGNATURE_HEX_LEN
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_signature_computed_over_order_and_payment() {
        let verifier = PaymentVerifier::new("S");
        let signature = verifier.sign("O1", "P1");
        assert_eq!(signature.len(), 64);
        assert_eq!(verifier.verify("O1", "P1", &signature), Ok(()));
    }

    #[test]
    fn matches_reference_hmac_construction() {
        let mut mac = HmacSha256::new_from_slice(b"S").unwrap();
        mac.update(b"O1|P1");
        let expected = hex::encode(mac.finalize().into_bytes());
        assert_eq!(PaymentVerifier::new("S").sign("O1", "P1"), expected);
    }

    #[test]
    fn rejects_tampered_identifiers_and_foreign_secret() {
        let verifier = PaymentVerifier::new("S");
        let signature = verifier.sign("O1", "P1");
        assert_eq!(
            verifier.verify("O1", "P2", &signature),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verifier.verify("O2", "P1", &signature),
            Err(SignatureError::Mismatch)
        );
        let forged = PaymentVerifier::new("other").sign("O1", "P1");
        assert_eq!(
            verifier.verify("O1", "P1", &forged),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_non_hex_and_truncated_input() {
        let verifier = PaymentVerifier::new("S");
        assert_eq!(
            verifier.verify("O1", "P1", "not-hex"),
            Err(SignatureError::Malformed)
        );
        let signature = verifier.sign("O1", "P1");
        assert_eq!(
            verifier.verify("O1", "P1", &signature[..32]),
            Err(SignatureError::Malformed)
        );
        assert_eq!(verifier.verify("O1", "P1", ""), Err(SignatureError::Malformed));
    }

    #[test]
    fn rejects_non_canonical_spellings_of_a_valid_digest() {
        let verifier = PaymentVerifier::new("S");
        let signature = verifier.sign("O1", "P1");
        assert_eq!(
            verifier.verify("O1", "P1", &signature.to_uppercase()),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verifier.verify("O1", "P1", &format!("  {signature}  ")),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verifier.verify("O1", "P1", &format!("{signature}\n")),
            Err(SignatureError::Malformed)
        );
    }
}
