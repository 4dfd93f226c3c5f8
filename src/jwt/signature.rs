//! Conversion of ECDSA signatures from their ASN.1 DER form to the fixed-width
//! `r || s` layout used by JWS ([RFC7518 section 3.4]).
//!
//! Remote signing services return `Ecdsa-Sig-Value` structures
//! ([RFC3279 section 2.2.3]):
//!
//! ```text
//! Ecdsa-Sig-Value ::= SEQUENCE {
//!     r INTEGER,
//!     s INTEGER }
//! ```
//!
//! Only exactly that structure is accepted: anything after `s`, inside or after
//! the sequence, is rejected.
//!
//! [RFC7518 section 3.4]: https://www.rfc-editor.org/rfc/rfc7518#section-3.4
//! [RFC3279 section 2.2.3]: https://www.rfc-editor.org/rfc/rfc3279#section-2.2.3
use der::Decode;
use der::asn1::UintRef;
use thiserror::Error;

/// Width in bytes of each of `r` and `s` for the P-256 curve.
pub const P256_FIELD_WIDTH: usize = 32;

/// Errors produced when a DER signature does not have the expected shape.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedSignatureError {
    /// Not a DER `SEQUENCE` of exactly two non-negative `INTEGER`s.
    #[error("invalid DER signature: {0}")]
    Der(#[from] der::Error),
    /// An integer does not fit the field width of the curve.
    #[error("integer `{field}` is {len} bytes long, expected at most {width}")]
    FieldTooWide {
        field: &'static str,
        len: usize,
        width: usize,
    },
}

#[derive(der::Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Converts a DER encoded ECDSA signature into the JOSE `r || s` form, where each
/// of `r` and `s` takes exactly `field_width` big-endian bytes.
///
/// Both integers are always re-padded to `field_width`, so short values (a leading
/// zero byte dropped by the signer) still produce a signature of `2 * field_width`
/// bytes. Integers wider than `field_width` once the DER sign byte is removed are
/// rejected, as they come from a different curve.
pub fn der_to_jose(der: &[u8], field_width: usize) -> Result<Vec<u8>, MalformedSignatureError> {
    let signature = EcdsaSigValue::from_der(der)?;

    let mut jose = Vec::with_capacity(field_width * 2);
    jose.extend(left_pad(signature.r.as_bytes(), field_width, "r")?);
    jose.extend(left_pad(signature.s.as_bytes(), field_width, "s")?);
    Ok(jose)
}

/// Fits an unsigned big-endian magnitude into exactly `width` bytes.
fn left_pad(
    magnitude: &[u8],
    width: usize,
    field: &'static str,
) -> Result<Vec<u8>, MalformedSignatureError> {
    // `UintRef` has already dropped the DER sign byte.
    if magnitude.len() > width {
        return Err(MalformedSignatureError::FieldTooWide {
            field,
            len: magnitude.len(),
            width,
        });
    }

    let mut padded = vec![0u8; width - magnitude.len()];
    padded.extend_from_slice(magnitude);
    Ok(padded)
}
