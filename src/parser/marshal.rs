//! Decoder for the Python `marshal` serialization.
//!
//! `cProfile` and `pstats` write their stats dictionary with `marshal.dump`.
//! Only the value types that can occur in such a file are supported; code
//! objects, complex numbers and the like are rejected.

use crate::utils::error::ParseError;

const FLAG_REF: u8 = 0x80;

const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_INT: u8 = b'i';
const TYPE_LONG: u8 = b'l';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BINARY_FLOAT: u8 = b'g';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_REF: u8 = b'r';
const TYPE_TUPLE: u8 = b'(';
const TYPE_LIST: u8 = b'[';
const TYPE_DICT: u8 = b'{';
const TYPE_UNICODE: u8 = b'u';
const TYPE_SET: u8 = b'<';
const TYPE_FROZENSET: u8 = b'>';
const TYPE_ASCII: u8 = b'a';
const TYPE_ASCII_INTERNED: u8 = b'A';
const TYPE_SMALL_TUPLE: u8 = b')';
const TYPE_SHORT_ASCII: u8 = b'z';
const TYPE_SHORT_ASCII_INTERNED: u8 = b'Z';

// Python longs are stored as base 2**15 digits.
const LONG_SHIFT: u32 = 15;
const MAX_NESTING: usize = 256;

/// A decoded marshal value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Name used in shape errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
        }
    }
}

/// Decode a single marshal value from the start of `input`
pub fn decode(input: &[u8]) -> Result<Value, ParseError> {
    let mut reader = Reader {
        input,
        pos: 0,
        refs: Vec::new(),
        nesting: 0,
    };
    reader.read_value()
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    /// Objects flagged with `FLAG_REF`, in the order they were opened
    refs: Vec<Value>,
    nesting: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(ParseError::UnexpectedEof(self.pos))?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, ParseError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_len(&mut self) -> Result<usize, ParseError> {
        let offset = self.pos;
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| ParseError::InvalidFormat(format!("negative length {len} at byte {offset}")))
    }

    fn read_value(&mut self) -> Result<Value, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::InvalidFormat(format!(
                "marshal nesting deeper than {MAX_NESTING}"
            )));
        }
        self.nesting += 1;
        let value = self.read_value_inner();
        self.nesting -= 1;
        value
    }

    fn read_value_inner(&mut self) -> Result<Value, ParseError> {
        let offset = self.pos;
        let raw = self.read_u8()?;
        let code = raw & !FLAG_REF;

        // Containers claim their reference slot before their items are read,
        // so nested back-references number the same way the writer did.
        let slot = if raw & FLAG_REF != 0 {
            self.refs.push(Value::None);
            Some(self.refs.len() - 1)
        } else {
            None
        };

        let value = match code {
            TYPE_NONE => Value::None,
            TYPE_FALSE => Value::Bool(false),
            TYPE_TRUE => Value::Bool(true),
            TYPE_INT => Value::Int(i64::from(self.read_i32()?)),
            TYPE_LONG => Value::Int(self.read_long(offset)?),
            TYPE_BINARY_FLOAT => {
                let bytes = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Value::Float(f64::from_le_bytes(buf))
            }
            TYPE_FLOAT => {
                let len = usize::from(self.read_u8()?);
                let text = self.read_text(len)?;
                let parsed = text.trim().parse::<f64>().map_err(|e| {
                    ParseError::InvalidFormat(format!("bad float {text:?} at byte {offset}: {e}"))
                })?;
                Value::Float(parsed)
            }
            TYPE_STRING => {
                let len = self.read_len()?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            TYPE_INTERNED | TYPE_UNICODE | TYPE_ASCII | TYPE_ASCII_INTERNED => {
                let len = self.read_len()?;
                Value::Str(self.read_text(len)?)
            }
            TYPE_SHORT_ASCII | TYPE_SHORT_ASCII_INTERNED => {
                let len = usize::from(self.read_u8()?);
                Value::Str(self.read_text(len)?)
            }
            TYPE_SMALL_TUPLE => {
                let len = usize::from(self.read_u8()?);
                Value::Tuple(self.read_items(len)?)
            }
            TYPE_TUPLE => {
                let len = self.read_len()?;
                Value::Tuple(self.read_items(len)?)
            }
            TYPE_LIST => {
                let len = self.read_len()?;
                Value::List(self.read_items(len)?)
            }
            TYPE_SET | TYPE_FROZENSET => {
                let len = self.read_len()?;
                Value::Set(self.read_items(len)?)
            }
            TYPE_DICT => {
                let mut pairs = Vec::new();
                loop {
                    if self.input.get(self.pos) == Some(&TYPE_NULL) {
                        self.pos += 1;
                        break;
                    }
                    let key = self.read_value()?;
                    let value = self.read_value()?;
                    pairs.push((key, value));
                }
                Value::Dict(pairs)
            }
            TYPE_REF => {
                let index = self.read_len()?;
                self.refs
                    .get(index)
                    .cloned()
                    .ok_or(ParseError::InvalidReference { index, offset })?
            }
            _ => return Err(ParseError::UnsupportedType { code: raw, offset }),
        };

        if let Some(slot) = slot {
            self.refs[slot] = value.clone();
        }
        Ok(value)
    }

    fn read_items(&mut self, len: usize) -> Result<Vec<Value>, ParseError> {
        // Each item takes at least one byte; bound the allocation by what is left.
        let mut items = Vec::with_capacity(len.min(self.input.len() - self.pos));
        for _ in 0..len {
            items.push(self.read_value()?);
        }
        Ok(items)
    }

    fn read_text(&mut self, len: usize) -> Result<String, ParseError> {
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ParseError::InvalidFormat(format!("invalid UTF-8 at byte {offset}: {e}")))
    }

    fn read_long(&mut self, offset: usize) -> Result<i64, ParseError> {
        let count = self.read_i32()?;
        let negative = count < 0;
        let digits = count.unsigned_abs();

        let mut magnitude: i64 = 0;
        for index in 0..digits {
            let bytes = self.take(2)?;
            let digit = i64::from(u16::from_le_bytes([bytes[0], bytes[1]]));
            let shifted = digit
                .checked_shl(index.saturating_mul(LONG_SHIFT))
                .filter(|shifted| shifted >> (index * LONG_SHIFT) == digit)
                .ok_or_else(|| {
                    ParseError::InvalidFormat(format!("integer at byte {offset} overflows i64"))
                })?;
            magnitude = magnitude.checked_add(shifted).ok_or_else(|| {
                ParseError::InvalidFormat(format!("integer at byte {offset} overflows i64"))
            })?;
        }

        Ok(if negative { -magnitude } else { magnitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_ascii(text: &str) -> Vec<u8> {
        let mut out = vec![TYPE_SHORT_ASCII, text.len() as u8];
        out.extend_from_slice(text.as_bytes());
        out
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(b"N").unwrap(), Value::None);
        assert_eq!(decode(b"T").unwrap(), Value::Bool(true));
        assert_eq!(decode(&[TYPE_INT, 0x2a, 0, 0, 0]).unwrap(), Value::Int(42));
        assert_eq!(decode(&[TYPE_INT, 0xff, 0xff, 0xff, 0xff]).unwrap(), Value::Int(-1));

        let mut float = vec![TYPE_BINARY_FLOAT];
        float.extend_from_slice(&0.25f64.to_le_bytes());
        assert_eq!(decode(&float).unwrap(), Value::Float(0.25));
    }

    #[test]
    fn test_decode_text_float() {
        assert_eq!(decode(b"f\x031.5").unwrap(), Value::Float(1.5));
        assert!(matches!(decode(b"f\x041.5e"), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_decode_long() {
        // 2**15 + 1 as two base-2**15 digits
        let input = [TYPE_LONG, 2, 0, 0, 0, 1, 0, 1, 0];
        assert_eq!(decode(&input).unwrap(), Value::Int(32769));

        let negative = [TYPE_LONG, 0xfe, 0xff, 0xff, 0xff, 1, 0, 1, 0];
        assert_eq!(decode(&negative).unwrap(), Value::Int(-32769));
    }

    #[test]
    fn test_decode_tuple_and_dict() {
        let mut input = vec![TYPE_DICT];
        input.extend(short_ascii("k"));
        input.extend([TYPE_SMALL_TUPLE, 2, TYPE_TRUE, TYPE_NONE]);
        input.push(TYPE_NULL);

        let value = decode(&input).unwrap();
        assert_eq!(
            value,
            Value::Dict(vec![(
                Value::Str("k".to_string()),
                Value::Tuple(vec![Value::Bool(true), Value::None])
            )])
        );
    }

    #[test]
    fn test_decode_back_reference() {
        // A small tuple holding a flagged string and a reference back to it.
        // Slot 0 is the tuple itself, slot 1 the string.
        let mut input = vec![TYPE_SMALL_TUPLE | FLAG_REF, 2, TYPE_SHORT_ASCII | FLAG_REF, 4];
        input.extend_from_slice(b"a.py");
        input.extend([TYPE_REF, 1, 0, 0, 0]);

        let value = decode(&input).unwrap();
        assert_eq!(
            value,
            Value::Tuple(vec![
                Value::Str("a.py".to_string()),
                Value::Str("a.py".to_string())
            ])
        );
    }

    #[test]
    fn test_invalid_reference() {
        let result = decode(&[TYPE_REF, 5, 0, 0, 0]);
        assert!(matches!(
            result,
            Err(ParseError::InvalidReference { index: 5, .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            decode(&[TYPE_INT, 1, 0]),
            Err(ParseError::UnexpectedEof(_))
        ));
        assert!(matches!(decode(&[TYPE_DICT]), Err(ParseError::UnexpectedEof(_))));
    }

    #[test]
    fn test_unsupported_type() {
        assert!(matches!(
            decode(b"c"),
            Err(ParseError::UnsupportedType { code: b'c', offset: 0 })
        ));
    }
}
