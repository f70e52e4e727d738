//! The signed-message envelope: canonical hash, ECDSA signature and verification.
//!
//! The signed digest is
//!
//! ```text
//! sha256d( varint(24) "Bitcoin Signed Message:\n" varint(len P) P )
//! P = join(to, ":") reply subject join(context, ":") varint(ts) payload
//! ```
//!
//! `from` and `sig` are not covered by the digest.

use crate::util::{Error, Hash256, Result, now_millis, sha256d, var_int};
use crate::wallet::KeyPair;
use secp256k1::{Message, PublicKey, Secp256k1, ecdsa::Signature};
use serde::{Deserialize, Serialize};

/// Prefix shared with the Bitcoin signed-message convention
pub const MAGIC_BYTES: &[u8] = b"Bitcoin Signed Message:\n";

/// An application message carrying an optional signature over its canonical fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedMessage {
    /// Signer's user id, set by [`SignedMessage::sign`]
    pub from: String,
    /// Recipients
    pub to: Vec<String>,
    /// Id of the message this replies to
    pub reply: String,
    /// Command or topic, e.g. `LoadDerivations`
    pub subject: String,
    /// Free-form context tags
    pub context: Vec<String>,
    /// Opaque payload, usually JSON text
    pub payload: String,
    /// Milliseconds since the Unix epoch
    pub ts: u64,
    /// DER signature in hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl Default for SignedMessage {
    fn default() -> Self {
        SignedMessage {
            from: String::new(),
            to: vec![],
            reply: String::new(),
            subject: String::new(),
            context: vec![],
            payload: String::new(),
            ts: now_millis(),
            sig: None,
        }
    }
}

impl SignedMessage {
    /// An unsigned message with only `subject` set.
    #[must_use]
    pub fn with_subject(subject: &str) -> SignedMessage {
        SignedMessage {
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    /// Takes `message` and signs it as `user_id`.
    ///
    /// # Errors
    /// Propagates signing failures.
    pub fn signed(mut message: SignedMessage, user_id: &str, key_pair: &KeyPair) -> Result<SignedMessage> {
        message.sign(user_id, key_pair)?;
        Ok(message)
    }

    /// The canonical digest of the message.
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        let mut payload = Vec::with_capacity(64 + self.payload.len());
        payload.extend_from_slice(self.to.join(":").as_bytes());
        payload.extend_from_slice(self.reply.as_bytes());
        payload.extend_from_slice(self.subject.as_bytes());
        payload.extend_from_slice(self.context.join(":").as_bytes());
        payload.extend_from_slice(&var_int::to_vec(self.ts));
        payload.extend_from_slice(self.payload.as_bytes());

        let mut message = Vec::with_capacity(MAGIC_BYTES.len() + payload.len() + 12);
        message.extend_from_slice(&var_int::to_vec(MAGIC_BYTES.len() as u64));
        message.extend_from_slice(MAGIC_BYTES);
        message.extend_from_slice(&var_int::to_vec(payload.len() as u64));
        message.extend_from_slice(&payload);
        sha256d(&message)
    }

    /// Hex of [`SignedMessage::hash`] in digest byte order.
    #[must_use]
    pub fn id(&self) -> String {
        hex::encode(self.hash().0)
    }

    /// The payload parsed as JSON, or `None` when it is empty.
    ///
    /// # Errors
    /// `Error::JsonError` for a non-JSON payload.
    pub fn payload_obj(&self) -> Result<Option<serde_json::Value>> {
        if self.payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&self.payload)?))
    }

    /// Sets `from` and a fresh `ts`, then signs the digest with `key_pair`.
    ///
    /// # Errors
    /// Currently infallible; kept fallible to match the other signing calls.
    pub fn sign(&mut self, user_id: &str, key_pair: &KeyPair) -> Result<()> {
        self.from = user_id.to_string();
        self.ts = now_millis();
        let message = Message::from_digest(self.hash().0);
        let mut sig = Secp256k1::signing_only().sign_ecdsa(&message, key_pair.secret());
        sig.normalize_s();
        self.sig = Some(hex::encode(sig.serialize_der()));
        Ok(())
    }

    /// Checks the signature against `pubkey`. A well-formed but wrong signature is `Ok(false)`.
    ///
    /// # Errors
    /// `Error::BadData` when unsigned; hex or secp256k1 errors for a malformed signature.
    pub fn verify(&self, pubkey: &PublicKey) -> Result<bool> {
        let sig = self
            .sig
            .as_deref()
            .ok_or_else(|| Error::BadData("Message is not signed".to_string()))?;
        let mut sig = Signature::from_der(&hex::decode(sig)?)?;
        sig.normalize_s();
        let message = Message::from_digest(self.hash().0);
        Ok(Secp256k1::verification_only().verify_ecdsa(&message, &sig, pubkey).is_ok())
    }

    /// [`SignedMessage::verify`] with a hex-encoded public key.
    ///
    /// # Errors
    /// As `verify`, plus malformed public key hex.
    pub fn verify_hex(&self, pubkey_hex: &str) -> Result<bool> {
        let pubkey = PublicKey::from_slice(&hex::decode(pubkey_hex.trim())?)?;
        self.verify(&pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key() -> KeyPair {
        KeyPair::from_secret_hex("7d0e2b3a7b3d4c5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6").unwrap()
    }

    #[test]
    fn hash_vectors() {
        let msg = SignedMessage {
            ts: 1700000000000,
            ..SignedMessage::with_subject("LoadDerivations")
        };
        assert_eq!(msg.id(), "f4798ec7827282ef239a1974b3a31dca5acf0ddcd05825e7fbffb9c96694da9d");

        let msg = SignedMessage {
            from: "ignored".to_string(),
            to: vec!["a".to_string(), "b".to_string()],
            reply: "r1".to_string(),
            subject: "Hello".to_string(),
            context: vec!["c1".to_string(), "c2".to_string()],
            payload: "{\"x\":1}".to_string(),
            ts: 1700000000000,
            sig: None,
        };
        assert_eq!(msg.id(), "dc097132be15b81bd765032fb2110802e49fee29a77352f2042b06669cd42ccf");
        assert_eq!(msg.payload_obj().unwrap(), Some(serde_json::json!({"x": 1})));
    }

    #[test]
    fn sign_then_verify() {
        let kp = key();
        let msg = SignedMessage::signed(SignedMessage::with_subject("LoadDerivations"), "user-1", &kp).unwrap();
        assert_eq!(msg.from, "user-1");
        assert!(msg.verify(kp.public_key()).unwrap());
        assert!(msg.verify_hex(&hex::encode(kp.public_bytes())).unwrap());

        let other = KeyPair::from_secret_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        assert!(!msg.verify(other.public_key()).unwrap());
    }

    #[test]
    fn tampering_any_covered_field_fails() {
        let kp = key();
        let base = SignedMessage::signed(
            SignedMessage {
                to: vec!["svc".to_string()],
                context: vec!["ctx".to_string()],
                payload: "{}".to_string(),
                ..SignedMessage::with_subject("GetPaymentDestination")
            },
            "user-1",
            &kp,
        )
        .unwrap();
        let tampered: Vec<Box<dyn Fn(&mut SignedMessage)>> = vec![
            Box::new(|m| m.to.push("x".to_string())),
            Box::new(|m| m.reply = "x".to_string()),
            Box::new(|m| m.subject = "LoadDerivations".to_string()),
            Box::new(|m| m.context.clear()),
            Box::new(|m| m.ts += 1),
            Box::new(|m| m.payload = "{\"a\":1}".to_string()),
        ];
        for tamper in tampered {
            let mut m = base.clone();
            tamper(&mut m);
            assert!(!m.verify(kp.public_key()).unwrap());
        }
        // `from` is outside the digest
        let mut m = base.clone();
        m.from = "someone-else".to_string();
        assert!(m.verify(kp.public_key()).unwrap());
    }

    #[test]
    fn malformed_or_missing_signature_is_an_error() {
        let kp = key();
        let mut msg = SignedMessage::with_subject("x");
        assert!(matches!(msg.verify(kp.public_key()), Err(Error::BadData(_))));
        msg.sig = Some("zz".to_string());
        assert!(matches!(msg.verify(kp.public_key()), Err(Error::FromHexError(_))));
        msg.sig = Some("300602010102".to_string());
        assert!(msg.verify(kp.public_key()).is_err());
        assert!(msg.verify_hex("02").is_err());
    }

    #[test]
    fn json_shape() {
        let mut msg = SignedMessage::with_subject("LoadDerivations");
        msg.ts = 5;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": "", "to": [], "reply": "", "subject": "LoadDerivations",
                "context": [], "payload": "", "ts": 5
            })
        );
        let back: SignedMessage = serde_json::from_str(r#"{"subject":"s","ts":9,"sig":"30"}"#).unwrap();
        assert_eq!(back.subject, "s");
        assert_eq!(back.sig.as_deref(), Some("30"));
        assert!(SignedMessage { payload: "nope".to_string(), ..msg }.payload_obj().is_err());
    }
}
