//! Payload verification.
//!
//! [`Verifier`] is the seam where a real trust service plugs in. The
//! verifiers here are deterministic: the same payload and catalog always give
//! the same verdict, and the verdict records why.
//!
//! Payload grammar understood by [`CatalogVerifier`]:
//!
//! ```text
//! TT-<serial>[-<check>]
//! ```
//!
//! The product id is the first two `-`-separated segments. `check` is the first
//! eight hex digits of BLAKE3 over everything between `TT-` and the last `-`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use crate::error::VerifyError;

const PAYLOAD_PREFIX: &str = "TT-";
const MAX_PAYLOAD_LEN: usize = 256;
const CHECK_LEN: usize = 8;

/// Raw decoded text. Untrusted: nothing about its shape is assumed until a
/// verifier looks at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedPayload(String);

impl DecodedPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `TT-12345-abc` → `TT-12345`. `None` when there is no second segment.
    pub fn product_id(&self) -> Option<&str> {
        let mut cuts = self.0.match_indices('-').map(|(i, _)| i);
        let first = cuts.next()?;
        match cuts.next() {
            Some(second) => Some(&self.0[..second]),
            None if first + 1 < self.0.len() => Some(&self.0),
            None => None,
        }
    }
}

impl fmt::Display for DecodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product_id: String,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub purchase_location: String,
    pub scan_location: String,
}

/// Why a payload was judged the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Listed in the catalog or carrying a valid checksum.
    Genuine,
    /// Listed in the counterfeit registry.
    KnownCounterfeit,
    /// Unknown product whose checksum does not match.
    ChecksumMismatch,
    /// Already verified once; single-use codes are void on rescan.
    DuplicateScan,
}

impl Verdict {
    pub fn is_authentic(&self) -> bool {
        matches!(self, Verdict::Genuine)
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Genuine => "Authentic Product",
            Verdict::KnownCounterfeit | Verdict::ChecksumMismatch => "Counterfeit Detected",
            Verdict::DuplicateScan => "Code Already Used",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Verdict::Genuine => "This product has been verified as genuine",
            Verdict::KnownCounterfeit => "Warning: this code is registered as counterfeit",
            Verdict::ChecksumMismatch => "Warning: this product may be counterfeit",
            Verdict::DuplicateScan => {
                "Multiple scan attempts detected. This code has been invalidated for security."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub payload: DecodedPayload,
    pub is_authentic: bool,
    pub verdict: Verdict,
    pub product: ProductMetadata,
    pub verified_by: String,
}

/// Swappable verification capability.
pub trait Verifier: Send + Sync {
    fn name(&self) -> &str;

    fn verify(&self, payload: &DecodedPayload) -> Result<VerificationOutcome, VerifyError>;
}

/// First eight hex digits of BLAKE3 over `serial`.
pub fn payload_checksum(serial: &str) -> String {
    let hash = blake3::hash(serial.as_bytes());
    hash.to_hex()[..CHECK_LEN].to_string()
}

/// `serial` → `TT-<serial>-<check>`.
pub fn sign_serial(serial: &str) -> String {
    format!("{}{}-{}", PAYLOAD_PREFIX, serial, payload_checksum(serial))
}

/// Deterministic verifier over a product catalog and a counterfeit registry.
#[derive(Debug, Clone)]
pub struct CatalogVerifier {
    products: HashMap<String, ProductMetadata>,
    counterfeits: HashSet<String>,
    fallback: ProductMetadata,
}

impl CatalogVerifier {
    /// `fallback` describes products that are not in the catalog; its
    /// `product_id` is replaced by the payload's.
    pub fn new(fallback: ProductMetadata) -> Self {
        Self {
            products: HashMap::new(),
            counterfeits: HashSet::new(),
            fallback,
        }
    }

    pub fn with_product(mut self, product: ProductMetadata) -> Self {
        self.products.insert(product.product_id.clone(), product);
        self
    }

    pub fn with_products(mut self, products: impl IntoIterator<Item = ProductMetadata>) -> Self {
        for product in products {
            self.products.insert(product.product_id.clone(), product);
        }
        self
    }

    pub fn with_counterfeit(mut self, product_id: impl Into<String>) -> Self {
        self.counterfeits.insert(product_id.into());
        self
    }

    fn validate(payload: &DecodedPayload) -> Result<(), VerifyError> {
        let text = payload.as_str();
        if text.is_empty() {
            return Err(VerifyError::invalid("empty payload"));
        }
        if text.len() > MAX_PAYLOAD_LEN {
            return Err(VerifyError::invalid(format!(
                "payload is {} bytes, limit is {}",
                text.len(),
                MAX_PAYLOAD_LEN
            )));
        }
        if !text.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
            return Err(VerifyError::invalid("payload contains non-printable characters"));
        }
        if !text.starts_with(PAYLOAD_PREFIX) || payload.product_id().is_none() {
            return Err(VerifyError::invalid(format!(
                "expected a {}<serial> code",
                PAYLOAD_PREFIX
            )));
        }
        Ok(())
    }

    fn lookup(&self, payload: &DecodedPayload, product_id: &str) -> Option<&ProductMetadata> {
        self.products
            .get(payload.as_str())
            .or_else(|| self.products.get(product_id))
    }

    fn is_counterfeit(&self, payload: &DecodedPayload, product_id: &str) -> bool {
        self.counterfeits.contains(payload.as_str()) || self.counterfeits.contains(product_id)
    }

    fn checksum_matches(payload: &DecodedPayload) -> bool {
        let Some(body) = payload.as_str().strip_prefix(PAYLOAD_PREFIX) else {
            return false;
        };
        match body.rsplit_once('-') {
            Some((serial, check)) => !serial.is_empty() && payload_checksum(serial) == check,
            None => false,
        }
    }
}

impl Verifier for CatalogVerifier {
    fn name(&self) -> &str {
        "catalog"
    }

    fn verify(&self, payload: &DecodedPayload) -> Result<VerificationOutcome, VerifyError> {
        Self::validate(payload)?;
        let product_id = payload
            .product_id()
            .ok_or_else(|| VerifyError::invalid("missing product id"))?;

        let known = self.lookup(payload, product_id);
        let verdict = if self.is_counterfeit(payload, product_id) {
            Verdict::KnownCounterfeit
        } else if known.is_some() || Self::checksum_matches(payload) {
            Verdict::Genuine
        } else {
            Verdict::ChecksumMismatch
        };

        let product = match known {
            Some(product) => product.clone(),
            None => ProductMetadata {
                product_id: product_id.to_string(),
                ..self.fallback.clone()
            },
        };

        Ok(VerificationOutcome {
            payload: payload.clone(),
            is_authentic: verdict.is_authentic(),
            verdict,
            product,
            verified_by: self.name().to_string(),
        })
    }
}

/// Voids a code after its first successful verification.
#[derive(Debug)]
pub struct SingleUseVerifier<V> {
    inner: V,
    seen: Mutex<HashSet<DecodedPayload>>,
}

impl<V: Verifier> SingleUseVerifier<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn scan_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<V: Verifier> Verifier for SingleUseVerifier<V> {
    fn name(&self) -> &str {
        "single-use"
    }

    fn verify(&self, payload: &DecodedPayload) -> Result<VerificationOutcome, VerifyError> {
        let mut outcome = self.inner.verify(payload)?;
        let first_scan = self
            .seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(payload.clone());
        if !first_scan {
            outcome.verdict = Verdict::DuplicateScan;
            outcome.is_authentic = false;
        }
        outcome.verified_by = format!("{}+{}", self.name(), outcome.verified_by);
        Ok(outcome)
    }
}
