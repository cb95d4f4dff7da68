//! Decimal and duration values.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Arbitrary-precision decimal: an unscaled two's-complement integer and a scale.
///
/// The value is `unscaled × 10^-scale`. The unscaled bytes are kept in
/// minimal big-endian form, so equal values with equal scales compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: Vec<u8>,
    scale: u32,
}

impl Decimal {
    /// Build from big-endian two's-complement bytes.
    pub fn from_be_bytes(bytes: &[u8], scale: u32) -> Self {
        Self {
            unscaled: minimize(bytes),
            scale,
        }
    }

    /// Build from an unscaled integer.
    pub fn from_i128(unscaled: i128, scale: u32) -> Self {
        Self::from_be_bytes(&unscaled.to_be_bytes(), scale)
    }

    /// Minimal big-endian two's-complement bytes of the unscaled value.
    pub fn unscaled_bytes(&self) -> &[u8] {
        &self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled.first().is_some_and(|b| b & 0x80 != 0)
    }

    /// The unscaled value, if it fits in an `i128`.
    pub fn to_i128(&self) -> Option<i128> {
        if self.unscaled.len() > 16 {
            return None;
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let mut buf = [fill; 16];
        buf[16 - self.unscaled.len()..].copy_from_slice(&self.unscaled);
        Some(i128::from_be_bytes(buf))
    }

    /// Sign-extend the unscaled value into exactly `size` bytes.
    pub fn to_fixed_bytes(&self, size: usize) -> Result<Vec<u8>, ValueError> {
        if self.unscaled.len() > size {
            return Err(ValueError::InvalidDecimal(format!(
                "unscaled value needs {} bytes, fixed holds {}",
                self.unscaled.len(),
                size
            )));
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let mut out = vec![fill; size - self.unscaled.len()];
        out.extend_from_slice(&self.unscaled);
        Ok(out)
    }

    /// Number of decimal digits in the unscaled value.
    pub fn digits(&self) -> usize {
        let (_, magnitude) = to_sign_magnitude(&self.unscaled);
        magnitude_to_digits(magnitude).len()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, magnitude) = to_sign_magnitude(&self.unscaled);
        let mut digits = magnitude_to_digits(magnitude);
        let scale = self.scale as usize;
        if digits.len() <= scale {
            let mut padded = "0".repeat(scale + 1 - digits.len());
            padded.push_str(&digits);
            digits = padded;
        }

        if negative {
            f.write_str("-")?;
        }
        let split = digits.len() - scale;
        f.write_str(&digits[..split])?;
        if scale > 0 {
            write!(f, ".{}", &digits[split..])?;
        }
        Ok(())
    }
}

impl FromStr for Decimal {
    type Err = ValueError;

    /// Parse plain decimal notation such as `-12.340`. The scale is the
    /// number of digits after the point.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidDecimal(format!("cannot parse '{}'", s));

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let mut magnitude: Vec<u8> = Vec::new();
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            mul_add(&mut magnitude, 10, digit as u8);
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Self {
            unscaled: from_sign_magnitude(negative, &magnitude),
            scale,
        })
    }
}

/// Strip redundant sign-extension bytes. Zero is a single `0x00`.
fn minimize(bytes: &[u8]) -> Vec<u8> {
    if bytes.is_empty() {
        return vec![0];
    }
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (b, next) = (bytes[start], bytes[start + 1]);
        let redundant = (b == 0x00 && next & 0x80 == 0) || (b == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn to_sign_magnitude(twos: &[u8]) -> (bool, Vec<u8>) {
    let negative = twos.first().is_some_and(|b| b & 0x80 != 0);
    if !negative {
        return (false, twos.to_vec());
    }
    // Negate: invert, then add one
    let mut magnitude: Vec<u8> = twos.iter().map(|b| !b).collect();
    for byte in magnitude.iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    (true, magnitude)
}

fn from_sign_magnitude(negative: bool, magnitude: &[u8]) -> Vec<u8> {
    let mut twos = Vec::with_capacity(magnitude.len() + 1);
    twos.push(0);
    twos.extend_from_slice(magnitude);
    if negative {
        for byte in twos.iter_mut() {
            *byte = !*byte;
        }
        for byte in twos.iter_mut().rev() {
            let (sum, overflow) = byte.overflowing_add(1);
            *byte = sum;
            if !overflow {
                break;
            }
        }
    }
    minimize(&twos)
}

/// `magnitude = magnitude * mul + add`, big-endian unsigned.
fn mul_add(magnitude: &mut Vec<u8>, mul: u8, add: u8) {
    let mut carry = add as u16;
    for byte in magnitude.iter_mut().rev() {
        let v = (*byte as u16) * (mul as u16) + carry;
        *byte = (v & 0xFF) as u8;
        carry = v >> 8;
    }
    if carry > 0 {
        magnitude.insert(0, carry as u8);
    }
}

/// Base-10 digits of a big-endian unsigned magnitude, by repeated division.
fn magnitude_to_digits(mut magnitude: Vec<u8>) -> String {
    let mut digits = Vec::new();
    while magnitude.iter().any(|&b| b != 0) {
        let mut remainder: u16 = 0;
        for byte in magnitude.iter_mut() {
            let v = (remainder << 8) | *byte as u16;
            *byte = (v / 10) as u8;
            remainder = v % 10;
        }
        digits.push(b'0' + remainder as u8);
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Calendar duration stored as three unsigned 32-bit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    pub months: u32,
    pub days: u32,
    pub millis: u32,
}

impl Duration {
    pub fn new(months: u32, days: u32, millis: u32) -> Self {
        Self {
            months,
            days,
            millis,
        }
    }

    /// Encode as three big-endian `u32` fields.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[0..4].copy_from_slice(&self.months.to_be_bytes());
        out[4..8].copy_from_slice(&self.days.to_be_bytes());
        out[8..12].copy_from_slice(&self.millis.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        let field = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            months: field(0),
            days: field(4),
            millis: field(8),
        }
    }
}
