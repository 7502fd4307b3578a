//! Cursor codec: encodes/decodes opaque cursors binding
//! `(typeName, orderByKey, directions, values)`. The value list is a short
//! heterogeneous array serialized as length-prefixed scalars tagged by
//! GraphQL type rather than looked up reflectively at decode time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tidb_graphql_error::{codes, PlanError};

/// Sort direction for one cursor/orderBy column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single cursor-carried scalar, tagged by its GraphQL type so decoding
/// never has to guess.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
}

const TAG_NULL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_BOOL: u8 = 4;
const TAG_BYTES: u8 = 5;

const DIR_ASC: u8 = 0;
const DIR_DESC: u8 = 1;

/// The decoded contents of an opaque cursor string.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub type_name: String,
    pub order_by_key: String,
    pub directions: Vec<SortDirection>,
    pub values: Vec<CursorValue>,
}

impl Cursor {
    pub fn new(
        type_name: impl Into<String>,
        order_by_key: impl Into<String>,
        directions: Vec<SortDirection>,
        values: Vec<CursorValue>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            order_by_key: order_by_key.into(),
            directions,
            values,
        }
    }

    /// Encodes this cursor into an opaque URL-safe base64 string.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        write_string(&mut buf, &self.type_name);
        write_string(&mut buf, &self.order_by_key);
        buf.push(self.directions.len() as u8);
        for dir in &self.directions {
            buf.push(match dir {
                SortDirection::Asc => DIR_ASC,
                SortDirection::Desc => DIR_DESC,
            });
        }
        buf.push(self.values.len() as u8);
        for value in &self.values {
            write_value(&mut buf, value);
        }
        URL_SAFE_NO_PAD.encode(buf)
    }

    /// Decodes an opaque cursor string produced by [`Cursor::encode`].
    pub fn decode(text: &str) -> Result<Self, PlanError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(text)
            .map_err(|e| PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("malformed cursor: {e}")))?;
        let mut cursor = Reader::new(&bytes);
        let type_name = cursor.read_string()?;
        let order_by_key = cursor.read_string()?;
        let direction_count = cursor.read_u8()? as usize;
        let mut directions = Vec::with_capacity(direction_count);
        for _ in 0..direction_count {
            directions.push(match cursor.read_u8()? {
                DIR_ASC => SortDirection::Asc,
                DIR_DESC => SortDirection::Desc,
                other => {
                    return Err(PlanError::new(
                        codes::CONSISTENCY_VALUE_COERCION,
                        format!("malformed cursor: unknown direction tag {other}"),
                    ))
                }
            });
        }
        let value_count = cursor.read_u8()? as usize;
        let mut values = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            values.push(cursor.read_value()?);
        }
        Ok(Cursor {
            type_name,
            order_by_key,
            directions,
            values,
        })
    }

    /// Rejects a cursor whose type/orderKey/directions don't match the
    /// current query — the contract between successive pages.
    pub fn validate(&self, type_name: &str, order_by_key: &str, directions: &[SortDirection]) -> Result<(), PlanError> {
        if self.type_name != type_name || self.order_by_key != order_by_key || self.directions != directions {
            return Err(PlanError::new(
                codes::CONSISTENCY_CURSOR_MISMATCH,
                "cursor does not match the shape of the current query (type, orderBy, or direction changed)",
            ));
        }
        Ok(())
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn write_value(buf: &mut Vec<u8>, value: &CursorValue) {
    match value {
        CursorValue::Null => buf.push(TAG_NULL),
        CursorValue::Int(i) => {
            buf.push(TAG_INT);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        CursorValue::Float(f) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&f.to_bits().to_le_bytes());
        }
        CursorValue::String(s) => {
            buf.push(TAG_STRING);
            write_string(buf, s);
        }
        CursorValue::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(if *b { 1 } else { 0 });
        }
        CursorValue::Bytes(b) => {
            buf.push(TAG_BYTES);
            buf.extend_from_slice(&(b.len() as u32).to_le_bytes());
            buf.extend_from_slice(b);
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PlanError> {
        if self.pos + n > self.bytes.len() {
            return Err(PlanError::new(
                codes::CONSISTENCY_VALUE_COERCION,
                "malformed cursor: truncated".to_string(),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, PlanError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, PlanError> {
        let slice = self.take(4)?;
        Ok(u32::from_le_bytes(slice.try_into().unwrap()))
    }

    fn read_string(&mut self) -> Result<String, PlanError> {
        let len = self.read_u32()? as usize;
        let slice = self.take(len)?;
        String::from_utf8(slice.to_vec())
            .map_err(|e| PlanError::new(codes::CONSISTENCY_VALUE_COERCION, format!("malformed cursor: {e}")))
    }

    fn read_value(&mut self) -> Result<CursorValue, PlanError> {
        let tag = self.read_u8()?;
        Ok(match tag {
            TAG_NULL => CursorValue::Null,
            TAG_INT => CursorValue::Int(i64::from_le_bytes(self.take(8)?.try_into().unwrap())),
            TAG_FLOAT => CursorValue::Float(f64::from_bits(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))),
            TAG_STRING => CursorValue::String(self.read_string()?),
            TAG_BOOL => CursorValue::Bool(self.read_u8()? != 0),
            TAG_BYTES => {
                let len = self.read_u32()? as usize;
                CursorValue::Bytes(self.take(len)?.to_vec())
            }
            other => {
                return Err(PlanError::new(
                    codes::CONSISTENCY_VALUE_COERCION,
                    format!("malformed cursor: unknown value tag {other}"),
                ))
            }
        })
    }
}
