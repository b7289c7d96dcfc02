//! 数値リテラルの格納と解析
//!
//! 整数・実数リテラルの値をノードごとのヒープ確保なしで保持する。
//! 64ビットに収まる整数はインライン、それを超える整数はアリーナ所有の
//! ワード列として格納される。値のコピーは意図的に禁止されており、
//! 読み出しはアクセサ経由で行う（二重解放・エイリアシングの防止）。

use serde::{Deserialize, Serialize};

use super::arena::{AstArena, WordsId};
use crate::error::LiteralError;

/// 任意精度整数値。`Clone`は実装しない。
#[derive(Debug, Serialize, Deserialize)]
pub enum IntValue {
    /// 64ビットに収まる値
    Small(i64),
    /// アリーナ所有のリトルエンディアンのワード列（絶対値）
    Big { words: WordsId, negative: bool },
}

impl IntValue {
    /// テキストから整数リテラルを解析する。
    ///
    /// `radix`は10進のほか、BOZリテラル用に2/8/16を受け付ける。
    /// 64ビットを超える値はアリーナにワード列として確保される。
    pub fn parse(text: &str, radix: u32, arena: &mut AstArena) -> Result<IntValue, LiteralError> {
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        if digits.is_empty() {
            return Err(LiteralError::Empty);
        }

        let mut words: Vec<u64> = vec![0];
        for ch in digits.chars() {
            let digit = ch
                .to_digit(radix)
                .ok_or(LiteralError::InvalidDigit { digit: ch, radix })?;
            mul_add(&mut words, radix as u64, digit as u64);
        }
        while words.len() > 1 && *words.last().unwrap() == 0 {
            words.pop();
        }

        if words.len() == 1 && words[0] <= i64::MAX as u64 {
            let v = words[0] as i64;
            return Ok(IntValue::Small(if negative { -v } else { v }));
        }
        Ok(IntValue::Big {
            words: arena.alloc_words(&words),
            negative,
        })
    }

    /// 値が64ビットに収まる場合のみ返す。
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IntValue::Small(v) => Some(*v),
            IntValue::Big { .. } => None,
        }
    }

    /// 絶対値の表現に必要なビット幅。
    pub fn bit_width(&self, arena: &AstArena) -> u32 {
        match self {
            IntValue::Small(v) => 64 - v.unsigned_abs().leading_zeros(),
            IntValue::Big { words, .. } => {
                let slice = arena.word_slice(*words);
                let top = slice.last().copied().unwrap_or(0);
                (slice.len() as u32 - 1) * 64 + (64 - top.leading_zeros())
            }
        }
    }

    /// 10進文字列として値を取り出す。
    pub fn to_decimal_string(&self, arena: &AstArena) -> String {
        match self {
            IntValue::Small(v) => v.to_string(),
            IntValue::Big { words, negative } => {
                let mut digits = Vec::new();
                let mut scratch: Vec<u64> = arena.word_slice(*words).to_vec();
                while scratch.iter().any(|&w| w != 0) {
                    digits.push(b'0' + div_rem_small(&mut scratch, 10) as u8);
                }
                if digits.is_empty() {
                    digits.push(b'0');
                }
                if *negative {
                    digits.push(b'-');
                }
                digits.reverse();
                String::from_utf8(digits).expect("decimal digits are ASCII")
            }
        }
    }
}

/// `words = words * mul + add`（リトルエンディアン）
fn mul_add(words: &mut Vec<u64>, mul: u64, add: u64) {
    let mut carry = add as u128;
    for w in words.iter_mut() {
        let v = (*w as u128) * (mul as u128) + carry;
        *w = v as u64;
        carry = v >> 64;
    }
    while carry > 0 {
        words.push(carry as u64);
        carry >>= 64;
    }
}

/// `words /= div` を実行し、余りを返す。
fn div_rem_small(words: &mut [u64], div: u64) -> u64 {
    let mut rem: u128 = 0;
    for w in words.iter_mut().rev() {
        let v = (rem << 64) | (*w as u128);
        *w = (v / div as u128) as u64;
        rem = v % div as u128;
    }
    rem as u64
}

/// 浮動小数点値のIEEE意味論タグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatSemantics {
    /// 16ビット
    Half,
    /// 32ビット（既定の実数リテラル）
    Single,
    /// 64ビット（倍精度、`D`指数）
    Double,
    /// 128ビット
    Quad,
}

/// ビットパターンと意味論タグで保持される浮動小数点値。`Clone`は実装しない。
#[derive(Debug, Serialize, Deserialize)]
pub struct FloatValue {
    bits: u128,
    semantics: FloatSemantics,
}

impl FloatValue {
    pub fn from_f64(semantics: FloatSemantics, value: f64) -> Self {
        let bits = match semantics {
            FloatSemantics::Half | FloatSemantics::Single => (value as f32).to_bits() as u128,
            FloatSemantics::Double | FloatSemantics::Quad => value.to_bits() as u128,
        };
        Self { bits, semantics }
    }

    /// 実数リテラルを解析する。`D`指数は倍精度を選択する。
    pub fn parse(text: &str) -> Result<FloatValue, LiteralError> {
        let mut semantics = FloatSemantics::Single;
        let normalized: String = text
            .chars()
            .map(|c| {
                if c == 'd' || c == 'D' {
                    semantics = FloatSemantics::Double;
                    'e'
                } else {
                    c
                }
            })
            .collect();
        let value: f64 = normalized
            .parse()
            .map_err(|_| LiteralError::InvalidReal {
                text: text.to_string(),
            })?;
        Ok(Self::from_f64(semantics, value))
    }

    pub fn semantics(&self) -> FloatSemantics {
        self.semantics
    }

    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// 値を実体化して返す。格納セルそのもののコピーは提供しない。
    pub fn value(&self) -> f64 {
        match self.semantics {
            FloatSemantics::Half | FloatSemantics::Single => {
                f32::from_bits(self.bits as u32) as f64
            }
            FloatSemantics::Double | FloatSemantics::Quad => f64::from_bits(self.bits as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_small_integer() {
        let mut arena = AstArena::new();
        let v = IntValue::parse("42", 10, &mut arena).unwrap();
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.to_decimal_string(&arena), "42");
    }

    #[test]
    fn test_parse_negative_integer() {
        let mut arena = AstArena::new();
        let v = IntValue::parse("-7", 10, &mut arena).unwrap();
        assert_eq!(v.as_i64(), Some(-7));
    }

    #[test]
    fn test_parse_boz_radix() {
        let mut arena = AstArena::new();
        let v = IntValue::parse("1F", 16, &mut arena).unwrap();
        assert_eq!(v.as_i64(), Some(31));
        let v = IntValue::parse("777", 8, &mut arena).unwrap();
        assert_eq!(v.as_i64(), Some(511));
    }

    #[test]
    fn test_parse_wide_integer_uses_arena_words() {
        let mut arena = AstArena::new();
        let text = "340282366920938463463374607431768211455"; // 2^128 - 1
        let v = IntValue::parse(text, 10, &mut arena).unwrap();
        assert_eq!(v.as_i64(), None);
        assert_eq!(v.bit_width(&arena), 128);
        assert_eq!(v.to_decimal_string(&arena), text);
    }

    #[test]
    fn test_invalid_digit() {
        let mut arena = AstArena::new();
        assert!(IntValue::parse("12x", 10, &mut arena).is_err());
        assert!(IntValue::parse("", 10, &mut arena).is_err());
    }

    #[test]
    fn test_parse_real_default_single() {
        let v = FloatValue::parse("3.25").unwrap();
        assert_eq!(v.semantics(), FloatSemantics::Single);
        assert_eq!(v.value(), 3.25);
    }

    #[test]
    fn test_parse_real_d_exponent_selects_double() {
        let v = FloatValue::parse("1.5D2").unwrap();
        assert_eq!(v.semantics(), FloatSemantics::Double);
        assert_eq!(v.value(), 150.0);
    }
}
