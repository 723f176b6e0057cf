//! Positional binary encoding shared by rows, keys and catalog records.
//!
//! Integers are 8 bytes big-endian, strings are a 4 byte big-endian length
//! followed by their UTF-8 bytes. No type tags are written for values: the
//! reader always knows the expected type from the schema.

use super::{Datum, ErrorKind, SQLError, Type};

#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_int(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v.as_bytes());
    }

    pub fn write_datum(&mut self, datum: &Datum) {
        match datum {
            Datum::Int(v) => self.write_int(*v),
            Datum::String(v) => self.write_string(v),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SQLError> {
        if self.buf.len() - self.pos < len {
            return Err(SQLError::new(
                ErrorKind::StorageFault,
                format!(
                    "truncated record: need {} bytes at offset {}, have {}",
                    len,
                    self.pos,
                    self.buf.len() - self.pos
                ),
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SQLError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, SQLError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, SQLError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, SQLError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read_int(&mut self) -> Result<i64, SQLError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn read_string(&mut self) -> Result<String, SQLError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SQLError::new(ErrorKind::StorageFault, format!("invalid utf-8: {}", e)))
    }

    pub fn read_datum(&mut self, typ: Type) -> Result<Datum, SQLError> {
        match typ {
            Type::Int => Ok(Datum::Int(self.read_int()?)),
            Type::String => Ok(Datum::String(self.read_string()?)),
        }
    }

    /// Fails if bytes are left over, a sign the record was written with a
    /// different schema.
    pub fn finish(self) -> Result<(), SQLError> {
        if self.pos != self.buf.len() {
            return Err(SQLError::new(
                ErrorKind::StorageFault,
                format!("{} trailing bytes in record", self.buf.len() - self.pos),
            ));
        }
        Ok(())
    }
}

pub fn encode_datum(datum: &Datum) -> Vec<u8> {
    let mut encoder = Encoder::new();
    encoder.write_datum(datum);
    encoder.finish()
}

pub fn decode_datum(bytes: &[u8], typ: Type) -> Result<Datum, SQLError> {
    let mut decoder = Decoder::new(bytes);
    let datum = decoder.read_datum(typ)?;
    decoder.finish()?;
    Ok(datum)
}
