//! Scalar and point value types over secp256k1.
//!
//! `Scalar` is always kept reduced below the group order `n`, so every
//! arithmetic result is already `mod n`. `Point` wraps a full `PublicKey`
//! and carries the BIP340 parity helpers used throughout the engine.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use secp256k1::constants::CURVE_ORDER;
use secp256k1::{Parity, PublicKey, SecretKey, XOnlyPublicKey, SECP256K1};

use crate::{AdaptorError, Result};

/// An integer modulo the secp256k1 group order, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scalar([u8; 32]);

impl Scalar {
    /// The additive identity.
    pub const ZERO: Scalar = Scalar([0u8; 32]);

    /// Parses a big-endian scalar, rejecting values `>= n`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::InvalidScalar` if the value is not below the
    /// group order.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Result<Self> {
        if bytes < CURVE_ORDER {
            Ok(Scalar(bytes))
        } else {
            Err(AdaptorError::InvalidScalar(
                "value is not below the group order".into(),
            ))
        }
    }

    /// Interprets 32 big-endian bytes as an integer and reduces it mod `n`.
    ///
    /// `2^256 < 2n`, so a single conditional subtraction is enough.
    #[must_use]
    pub fn reduce(mut bytes: [u8; 32]) -> Self {
        if bytes >= CURVE_ORDER {
            let mut borrow = 0i16;
            for i in (0..32).rev() {
                let diff = i16::from(bytes[i]) - i16::from(CURVE_ORDER[i]) - borrow;
                if diff < 0 {
                    bytes[i] = (diff + 256) as u8;
                    borrow = 1;
                } else {
                    bytes[i] = diff as u8;
                    borrow = 0;
                }
            }
        }
        Scalar(bytes)
    }

    /// Parses a 64-char hex scalar, rejecting values `>= n`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::Hex` for malformed hex and
    /// `AdaptorError::InvalidScalar` for wrong lengths or out-of-range values.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AdaptorError::InvalidScalar(format!("expected 32 bytes: {s}")))?;
        Self::from_be_bytes(bytes)
    }

    /// Samples a uniformly random non-zero scalar.
    #[must_use]
    pub fn random() -> Self {
        let sk = SecretKey::new(&mut rand::thread_rng());
        Scalar(sk.secret_bytes())
    }

    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Fixed-width (64 chars) zero-padded hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The scalar as a secret key, or `None` for zero.
    #[must_use]
    pub fn secret_key(&self) -> Option<SecretKey> {
        SecretKey::from_slice(&self.0).ok()
    }

    fn tweak(&self) -> secp256k1::Scalar {
        match self.secret_key() {
            Some(sk) => sk.into(),
            None => secp256k1::Scalar::ZERO,
        }
    }

    /// Returns `(k', k'·G)` where `k'` is `k` negated if `k·G` has odd y.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::PointAtInfinity` for the zero scalar.
    pub fn normalize_even(&self) -> Result<(Scalar, Point)> {
        let point = Point::mul_base(self)?;
        if point.has_even_y() {
            Ok((*self, point))
        } else {
            Ok((-*self, point.negate()))
        }
    }
}

impl From<SecretKey> for Scalar {
    fn from(sk: SecretKey) -> Self {
        Scalar(sk.secret_bytes())
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", self.to_hex())
    }
}

impl Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar {
        match (self.secret_key(), rhs.secret_key()) {
            (None, _) => rhs,
            (_, None) => self,
            // add_tweak only fails when the sum is zero mod n
            (Some(a), Some(_)) => a.add_tweak(&rhs.tweak()).map_or(Scalar::ZERO, Scalar::from),
        }
    }
}

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        match self.secret_key() {
            Some(sk) => Scalar::from(sk.negate()),
            None => Scalar::ZERO,
        }
    }
}

impl Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar {
        self + (-rhs)
    }
}

impl Mul for Scalar {
    type Output = Scalar;

    fn mul(self, rhs: Scalar) -> Scalar {
        match (self.secret_key(), rhs.is_zero()) {
            (Some(a), false) => a.mul_tweak(&rhs.tweak()).map_or(Scalar::ZERO, Scalar::from),
            _ => Scalar::ZERO,
        }
    }
}

/// A non-infinity point on secp256k1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point(PublicKey);

impl Point {
    /// BIP340 `lift_x`: the point with the given x-coordinate and even y.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::InvalidPoint` if `x` is not on the curve.
    pub fn lift_x(x: &[u8; 32]) -> Result<Self> {
        let xonly =
            XOnlyPublicKey::from_slice(x).map_err(|e| AdaptorError::InvalidPoint(e.to_string()))?;
        Ok(Point(xonly.public_key(Parity::Even)))
    }

    /// Parses a 32-byte x-only key (lifted to even y) or a 33-byte
    /// compressed point.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::Hex` or `AdaptorError::InvalidPoint`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        match bytes.len() {
            32 => {
                let mut x = [0u8; 32];
                x.copy_from_slice(&bytes);
                Self::lift_x(&x)
            }
            33 => PublicKey::from_slice(&bytes)
                .map(Point)
                .map_err(|e| AdaptorError::InvalidPoint(e.to_string())),
            n => Err(AdaptorError::InvalidPoint(format!("unexpected length {n}"))),
        }
    }

    /// `s·G`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::PointAtInfinity` for the zero scalar.
    pub fn mul_base(s: &Scalar) -> Result<Self> {
        let sk = s.secret_key().ok_or(AdaptorError::PointAtInfinity)?;
        Ok(Point(PublicKey::from_secret_key(SECP256K1, &sk)))
    }

    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::PointAtInfinity` if `other == -self`.
    pub fn add(&self, other: &Point) -> Result<Self> {
        self.0
            .combine(&other.0)
            .map(Point)
            .map_err(|_| AdaptorError::PointAtInfinity)
    }

    /// `s·self`.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError::PointAtInfinity` for the zero scalar.
    pub fn mul(&self, s: &Scalar) -> Result<Self> {
        if s.is_zero() {
            return Err(AdaptorError::PointAtInfinity);
        }
        Ok(Point(self.0.mul_tweak(SECP256K1, &s.tweak())?))
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Point(self.0.negate(SECP256K1))
    }

    #[must_use]
    pub fn has_even_y(&self) -> bool {
        self.0.x_only_public_key().1 == Parity::Even
    }

    /// The 32-byte x-coordinate.
    #[must_use]
    pub fn x_bytes(&self) -> [u8; 32] {
        self.0.x_only_public_key().0.serialize()
    }

    #[must_use]
    pub fn x_hex(&self) -> String {
        hex::encode(self.x_bytes())
    }

    /// Compressed SEC1 encoding (66 hex chars).
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.serialize())
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.0
    }
}

impl From<PublicKey> for Point {
    fn from(pk: PublicKey) -> Self {
        Point(pk)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.to_hex())
    }
}
