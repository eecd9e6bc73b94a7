//! Text form of PostgreSQL `numeric` for values `rust_decimal` cannot hold:
//! `NaN`, the infinities and anything past 28 significant digits.

use bytes::{Buf, BufMut, BytesMut};
use std::{error::Error, iter};
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// Decimal digits per base-10000 digit of the wire format.
const DIGITS_PER_GROUP: usize = 4;

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_PINF: u16 = 0xD000;
const SIGN_NINF: u16 = 0xF000;

/// A `numeric` carried as its canonical text, e.g. `-12.50` or `NaN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(pub String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, mut raw: &'a [u8]) -> Result<Self, BoxError> {
        if raw.len() < 8 {
            return Err("numeric header truncated".into());
        }
        let ndigits = raw.get_i16();
        let weight = i32::from(raw.get_i16());
        let sign = raw.get_u16();
        let dscale = usize::from(raw.get_u16());

        match sign {
            SIGN_NAN => return Ok(Self("NaN".into())),
            SIGN_PINF => return Ok(Self("Infinity".into())),
            SIGN_NINF => return Ok(Self("-Infinity".into())),
            SIGN_POS | SIGN_NEG => {}
            other => return Err(format!("invalid numeric sign {other:#06x}").into()),
        }

        let ndigits = usize::try_from(ndigits).map_err(|_| "negative numeric digit count")?;
        if raw.len() < ndigits * 2 {
            return Err("numeric digits truncated".into());
        }
        let groups: Vec<i16> = (0..ndigits).map(|_| raw.get_i16()).collect();
        let group = |i: i32| {
            usize::try_from(i)
                .ok()
                .and_then(|i| groups.get(i).copied())
                .unwrap_or(0)
        };

        let mut text = String::new();
        if sign == SIGN_NEG {
            text.push('-');
        }
        if weight < 0 {
            text.push('0');
        } else {
            text.push_str(&group(0).to_string());
            for i in 1..=weight {
                text.push_str(&format!("{:04}", group(i)));
            }
        }
        if dscale > 0 {
            let mut fraction = String::with_capacity(dscale + DIGITS_PER_GROUP);
            let mut i = weight + 1;
            while fraction.len() < dscale {
                fraction.push_str(&format!("{:04}", group(i)));
                i += 1;
            }
            fraction.truncate(dscale);
            text.push('.');
            text.push_str(&fraction);
        }
        Ok(Self(text))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

impl ToSql for PgNumeric {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let text = self.0.trim();
        let special = match text {
            "NaN" => Some(SIGN_NAN),
            "Infinity" => Some(SIGN_PINF),
            "-Infinity" => Some(SIGN_NINF),
            _ => None,
        };
        if let Some(sign) = special {
            out.put_i16(0);
            out.put_i16(0);
            out.put_u16(sign);
            out.put_u16(0);
            return Ok(IsNull::No);
        }

        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (SIGN_NEG, rest),
            None => (SIGN_POS, text.strip_prefix('+').unwrap_or(text)),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = integer
            .bytes()
            .chain(fraction.bytes())
            .all(|b| b.is_ascii_digit());
        if (integer.is_empty() && fraction.is_empty()) || !all_digits {
            return Err(format!("invalid numeric literal `{}`", self.0).into());
        }

        let integer_pad = (DIGITS_PER_GROUP - integer.len() % DIGITS_PER_GROUP) % DIGITS_PER_GROUP;
        let fraction_pad =
            (DIGITS_PER_GROUP - fraction.len() % DIGITS_PER_GROUP) % DIGITS_PER_GROUP;
        let padded: Vec<u8> = iter::repeat_n(b'0', integer_pad)
            .chain(integer.bytes())
            .chain(fraction.bytes())
            .chain(iter::repeat_n(b'0', fraction_pad))
            .collect();
        let mut groups: Vec<i16> = padded
            .chunks(DIGITS_PER_GROUP)
            .map(|chunk| {
                chunk
                    .iter()
                    .fold(0i16, |acc, b| acc * 10 + i16::from(b - b'0'))
            })
            .collect();

        let mut weight = i32::try_from((integer_pad + integer.len()) / DIGITS_PER_GROUP)? - 1;
        let leading = groups.iter().take_while(|g| **g == 0).count();
        groups.drain(..leading);
        weight -= i32::try_from(leading)?;
        while groups.last() == Some(&0) {
            groups.pop();
        }
        let (weight, sign) = if groups.is_empty() {
            (0, SIGN_POS)
        } else {
            (weight, sign)
        };

        out.put_i16(i16::try_from(groups.len())?);
        out.put_i16(i16::try_from(weight)?);
        out.put_u16(sign);
        out.put_u16(u16::try_from(fraction.len())?);
        for group in groups {
            out.put_i16(group);
        }
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }

    to_sql_checked!();
}
