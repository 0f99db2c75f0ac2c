//! Schnorr adaptor signature implementation.
//!
//! Implements `commitment_point`, `pre_sign`, `pre_verify`, `complete`, and
//! `extract` over secp256k1 following BIP340 challenge computation. A
//! pre-signature is locked to an adaptor point `T`; whoever knows `t` with
//! `T = t·G` can complete it, and anyone holding the pre-signature learns `t`
//! from the completed signature.

use secp256k1::schnorr::Signature;
use tracing::debug;

use crate::hash::challenge;
use crate::nonce::sample_adaptor_nonce;
use crate::{EngineConfig, Point, Result, Scalar};

/// Adaptor pre-signature locked to an adaptor point `T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptorSignature {
    /// `s_a = r + c·x (mod n)`.
    pub s_a: Scalar,
    /// Signer's public nonce `R = r·G` (even y).
    pub r: Point,
    /// Adaptor point `T`.
    pub t: Point,
}

impl AdaptorSignature {
    /// The nonce of the completed signature, `R + T`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::PointAtInfinity` if `T == -R`.
    pub fn adapted_nonce(&self) -> Result<Point> {
        self.r.add(&self.t)
    }
}

/// A secret scalar together with the public point it commits to.
#[derive(Clone, Copy, Debug)]
pub struct Commitment {
    /// Public nonce x-coordinate used for the commitment.
    pub nonce: [u8; 32],
    /// `t = r + c·k`, the scalar of a BIP340 signature over the message.
    pub secret: Scalar,
    /// `T = t·G`.
    pub point: Point,
}

/// Commitment to a future BIP340 signature by `signer` with public nonce
/// `nonce` over `msg`: `T = lift_x(nonce) + H(nonce || signer || msg)·lift_x(signer)`.
///
/// `T` is computable by anyone; its discrete log is the `s` half of the
/// signature `(nonce, s)`, known only to the signer.
///
/// # Errors
///
/// Returns `AdaptorError::InvalidPoint` if either x-coordinate is not on the
/// curve.
pub fn commitment_point(nonce: &[u8; 32], signer: &[u8; 32], msg: &[u8; 32]) -> Result<Point> {
    let r = Point::lift_x(nonce)?;
    let p = Point::lift_x(signer)?;
    let c = challenge(nonce, signer, msg);
    r.add(&p.mul(&c)?)
}

/// Computes the signer's side of [`commitment_point`]: the secret `t` that
/// completes any pre-signature locked to the commitment.
///
/// Both `nonce_secret` and `key` are BIP340 sign-normalized first, so
/// `(nonce.x, t)` is a valid BIP340 signature over `msg`.
///
/// # Errors
///
/// Returns `AdaptorError::PointAtInfinity` if either scalar is zero.
pub fn commit(key: &Scalar, nonce_secret: &Scalar, msg: &[u8; 32]) -> Result<Commitment> {
    let (r, nonce_point) = nonce_secret.normalize_even()?;
    let (k, pubkey) = key.normalize_even()?;
    let nonce = nonce_point.x_bytes();
    let c = challenge(&nonce, &pubkey.x_bytes(), msg);
    let secret = r + c * k;
    Ok(Commitment {
        nonce,
        secret,
        point: Point::mul_base(&secret)?,
    })
}

/// Create an adaptor signature (pre-signature) locked to an adaptor point.
///
/// The pre-signature can only be completed by someone who knows the discrete
/// log of the adaptor point (the adaptor secret).
///
/// # Arguments
/// * `key` - Signer's secret key
/// * `msg` - 32-byte message to sign
/// * `adaptor_point` - The adaptor point T
/// * `config` - Bounds the even-y nonce sampling
///
/// # Errors
/// Returns `AdaptorError::NonceExhausted` if no even-y nonce was found, or
/// `AdaptorError::PointAtInfinity` for a zero key.
pub fn pre_sign(
    key: &Scalar,
    msg: &[u8; 32],
    adaptor_point: &Point,
    config: &EngineConfig,
) -> Result<AdaptorSignature> {
    let pubkey = Point::mul_base(key)?;
    let nonce = sample_adaptor_nonce(adaptor_point, config)?;

    // e = H((R+T).x || P.x || msg)
    let mut c = challenge(&nonce.adapted.x_bytes(), &pubkey.x_bytes(), msg);

    // BIP340 uses x-only keys with even y; an odd-y key signs with -x, which
    // is the same as negating the challenge.
    if !pubkey.has_even_y() {
        c = -c;
    }

    let s_a = nonce.secret + c * *key;
    let r_hex = nonce.point.x_hex();
    debug!(
        attempts = nonce.attempts,
        "created adaptor pre-signature with nonce {}",
        &r_hex[..8]
    );

    Ok(AdaptorSignature {
        s_a,
        r: nonce.point,
        t: *adaptor_point,
    })
}

/// Verify an adaptor signature (pre-signature).
///
/// Checks `s_a·G == R + c·P` or `s_a·G == R + (n - c)·P` with
/// `c = H((R+T).x || P.x || msg)`; the two forms cover either y-parity of
/// the signer's key. `R + T` must have even y, otherwise no completion can
/// ever be a valid BIP340 signature.
///
/// Returns `false`, never an error, for malformed or mismatching input.
#[must_use]
pub fn pre_verify(signer: &[u8; 32], msg: &[u8; 32], pre_sig: &AdaptorSignature) -> bool {
    pre_verify_inner(signer, msg, pre_sig).unwrap_or(false)
}

fn pre_verify_inner(signer: &[u8; 32], msg: &[u8; 32], pre_sig: &AdaptorSignature) -> Result<bool> {
    let adapted = pre_sig.adapted_nonce()?;
    if !adapted.has_even_y() {
        return Ok(false);
    }

    let p = Point::lift_x(signer)?;
    let c = challenge(&adapted.x_bytes(), signer, msg);

    let left = Point::mul_base(&pre_sig.s_a)?;
    let right_even = pre_sig.r.add(&p.mul(&c)?)?;
    let right_odd = pre_sig.r.add(&p.mul(&-c)?)?;

    Ok(left == right_even || left == right_odd)
}

/// Complete an adaptor signature using the adaptor secret.
///
/// Produces the 64-byte signature `(R+T).x || (s_a + t)`.
///
/// # Errors
///
/// Returns `AdaptorError::PointAtInfinity` if `R + T` is infinity, or
/// `AdaptorError::Secp256k1` if the bytes do not form a signature.
pub fn complete(pre_sig: &AdaptorSignature, secret: &Scalar) -> Result<Signature> {
    let adapted = pre_sig.adapted_nonce()?;
    signature_from_parts(&adapted.x_bytes(), &(pre_sig.s_a + *secret))
}

/// Extract the adaptor secret from a completed signature: `t = s - s_a`.
///
/// # Errors
///
/// Returns `AdaptorError::InvalidScalar` if the `s` half of the signature is
/// not below the group order.
pub fn extract(completed: &Signature, s_a: &Scalar) -> Result<Scalar> {
    let mut s = [0u8; 32];
    s.copy_from_slice(&completed.serialize()[32..]);
    Ok(Scalar::from_be_bytes(s)? - *s_a)
}

/// Assembles a BIP340 signature from a nonce x-coordinate and a scalar.
///
/// # Errors
///
/// Returns `AdaptorError::Secp256k1` if the bytes do not form a signature.
pub fn signature_from_parts(nonce: &[u8; 32], s: &Scalar) -> Result<Signature> {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(nonce);
    sig_bytes[32..].copy_from_slice(&s.to_be_bytes());
    Ok(Signature::from_slice(&sig_bytes)?)
}
