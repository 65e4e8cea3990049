//! Little-endian NBT encoding.
//!
//! Ints are i32_le, string lengths are u16_le, list and array lengths are
//! i32_le. Lists must be homogeneous.

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::tag::{
    NbtCompound, NbtRoot, NbtTag, TAG_BYTE, TAG_COMPOUND, TAG_END, TAG_INT, TAG_INT_ARRAY,
    TAG_LIST, TAG_LONG, TAG_STRING,
};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

pub(crate) struct NbtReader<'a, B: Buf> {
    buf: &'a mut B,
}

impl<'a, B: Buf> NbtReader<'a, B> {
    pub(crate) fn new(buf: &'a mut B) -> Self {
        Self { buf }
    }

    pub(crate) fn read_root(&mut self) -> Result<NbtRoot, NbtError> {
        self.need(1)?;
        let tag_type = self.buf.get_u8();
        if tag_type != TAG_COMPOUND {
            return Err(NbtError::ExpectedCompound { got: tag_type });
        }
        let name = self.read_string()?;
        let compound = self.read_compound(0)?;
        Ok(NbtRoot { name, compound })
    }

    fn read_tag(&mut self, tag_type: u8, depth: usize) -> Result<NbtTag, NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
        }
        match tag_type {
            TAG_BYTE => {
                self.need(1)?;
                Ok(NbtTag::Byte(self.buf.get_i8()))
            }
            TAG_INT => Ok(NbtTag::Int(self.read_i32()?)),
            TAG_LONG => {
                self.need(8)?;
                Ok(NbtTag::Long(self.buf.get_i64_le()))
            }
            TAG_STRING => Ok(NbtTag::String(self.read_string()?)),
            TAG_LIST => {
                self.need(1)?;
                let element_type = self.buf.get_u8();
                let len = self.read_len()?;
                let mut list = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    list.push(self.read_tag(element_type, depth + 1)?);
                }
                Ok(NbtTag::List(list))
            }
            TAG_COMPOUND => Ok(NbtTag::Compound(self.read_compound(depth + 1)?)),
            TAG_INT_ARRAY => {
                let len = self.read_len()?;
                self.need(len.saturating_mul(4))?;
                let values = (0..len).map(|_| self.buf.get_i32_le()).collect();
                Ok(NbtTag::IntArray(values))
            }
            other => Err(NbtError::UnknownTagType(other)),
        }
    }

    fn read_compound(&mut self, depth: usize) -> Result<NbtCompound, NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
        }
        let mut compound = NbtCompound::new();
        loop {
            self.need(1)?;
            let tag_type = self.buf.get_u8();
            if tag_type == TAG_END {
                return Ok(compound);
            }
            let name = self.read_string()?;
            let tag = self.read_tag(tag_type, depth)?;
            compound.insert(name, tag);
        }
    }

    fn read_i32(&mut self) -> Result<i32, NbtError> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn read_len(&mut self) -> Result<usize, NbtError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| NbtError::NegativeLength(len))
    }

    fn read_string(&mut self) -> Result<String, NbtError> {
        self.need(2)?;
        let len = self.buf.get_u16_le() as usize;
        self.need(len)?;
        let data = self.buf.copy_to_bytes(len);
        String::from_utf8(data.to_vec()).map_err(|_| NbtError::InvalidUtf8)
    }

    fn need(&self, needed: usize) -> Result<(), NbtError> {
        if self.buf.remaining() < needed {
            Err(NbtError::UnexpectedEof)
        } else {
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------

pub(crate) fn write_root(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    buf.put_u8(TAG_COMPOUND);
    write_string(buf, &root.name)?;
    write_compound(buf, &root.compound)
}

fn write_tag(buf: &mut impl BufMut, tag: &NbtTag) -> Result<(), NbtError> {
    match tag {
        NbtTag::Byte(v) => buf.put_i8(*v),
        NbtTag::Int(v) => buf.put_i32_le(*v),
        NbtTag::Long(v) => buf.put_i64_le(*v),
        NbtTag::String(s) => write_string(buf, s)?,
        NbtTag::List(list) => {
            let element_type = list.first().map_or(TAG_END, NbtTag::tag_type_id);
            if let Some(bad) = list.iter().find(|t| t.tag_type_id() != element_type) {
                return Err(NbtError::MixedList {
                    expected: element_type,
                    got: bad.tag_type_id(),
                });
            }
            buf.put_u8(element_type);
            buf.put_i32_le(list.len() as i32);
            for item in list {
                write_tag(buf, item)?;
            }
        }
        NbtTag::Compound(c) => write_compound(buf, c)?,
        NbtTag::IntArray(values) => {
            buf.put_i32_le(values.len() as i32);
            for &v in values {
                buf.put_i32_le(v);
            }
        }
    }
    Ok(())
}

fn write_compound(buf: &mut impl BufMut, compound: &NbtCompound) -> Result<(), NbtError> {
    for (name, tag) in compound.iter() {
        buf.put_u8(tag.tag_type_id());
        write_string(buf, name)?;
        write_tag(buf, tag)?;
    }
    buf.put_u8(TAG_END);
    Ok(())
}

fn write_string(buf: &mut impl BufMut, s: &str) -> Result<(), NbtError> {
    let len = u16::try_from(s.len()).map_err(|_| NbtError::StringTooLong(s.len()))?;
    buf.put_u16_le(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}
