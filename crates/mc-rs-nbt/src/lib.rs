//! NBT (Named Binary Tag) documents for structure persistence.
//!
//! Pieces are saved as compounds of scalars, int arrays and nested lists,
//! encoded little-endian and optionally gzipped for files.

mod codec;
pub mod error;
pub mod gzip;
pub mod tag;

pub use error::NbtError;
pub use tag::{NbtCompound, NbtRoot, NbtTag};

use bytes::{Buf, BufMut, BytesMut};

/// Read a little-endian NBT document from a buffer.
pub fn read_nbt(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    codec::NbtReader::new(buf).read_root()
}

/// Write a little-endian NBT document to a buffer.
pub fn write_nbt(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    codec::write_root(buf, root)
}

/// Encode a document into a fresh byte vector.
pub fn to_bytes(root: &NbtRoot) -> Result<Vec<u8>, NbtError> {
    let mut buf = BytesMut::new();
    write_nbt(&mut buf, root)?;
    Ok(buf.to_vec())
}

/// Decode a document from a byte slice.
pub fn from_bytes(mut data: &[u8]) -> Result<NbtRoot, NbtError> {
    read_nbt(&mut data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece_document() -> NbtRoot {
        let mut piece = NbtCompound::new();
        piece.put_string("id", "SHCC");
        piece.put_int_array("BB", vec![-4, 53, 10, 0, 57, 16]);
        piece.put_int("O", 2);
        piece.put_int("GD", 7);
        piece.put_bool("Chest", false);

        let mut root = NbtCompound::new();
        root.put_string("Structure", "stronghold");
        root.put_list("Children", vec![NbtTag::Compound(piece)]);
        root.put_long("Seed", -1_234_567_890_123);
        NbtRoot::new("", root)
    }

    #[test]
    fn piece_document_roundtrip() {
        let root = piece_document();
        let bytes = to_bytes(&root).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), root);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = to_bytes(&piece_document()).unwrap();
        let b = to_bytes(&piece_document()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn gzip_roundtrip() {
        let root = piece_document();
        let packed = gzip::compress(&root).unwrap();
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);
        assert_eq!(gzip::decompress(&packed).unwrap(), root);
    }

    #[test]
    fn empty_list_roundtrip() {
        let mut c = NbtCompound::new();
        c.put_list("Entrances", vec![]);
        let root = NbtRoot::new("", c);
        assert_eq!(from_bytes(&to_bytes(&root).unwrap()).unwrap(), root);
    }

    #[test]
    fn mixed_list_is_rejected() {
        let mut c = NbtCompound::new();
        c.put_list("bad", vec![NbtTag::Int(1), NbtTag::Byte(0)]);
        let err = to_bytes(&NbtRoot::new("", c)).unwrap_err();
        assert!(matches!(err, NbtError::MixedList { expected: 3, got: 1 }));
    }

    #[test]
    fn empty_buffer_error() {
        assert!(matches!(from_bytes(&[]), Err(NbtError::UnexpectedEof)));
    }

    #[test]
    fn wrong_root_type_error() {
        assert!(matches!(
            from_bytes(&[1]),
            Err(NbtError::ExpectedCompound { got: 1 })
        ));
    }

    #[test]
    fn truncated_int_array_error() {
        let mut c = NbtCompound::new();
        c.put_int_array("BB", vec![1, 2, 3, 4, 5, 6]);
        let bytes = to_bytes(&NbtRoot::new("", c)).unwrap();
        assert!(matches!(
            from_bytes(&bytes[..bytes.len() - 6]),
            Err(NbtError::UnexpectedEof)
        ));
    }

    #[test]
    fn unsupported_tag_type_error() {
        // root compound "" containing a TAG_Float named "f"
        let data = [10, 0, 0, 5, 1, 0, b'f', 0, 0, 0, 0, 0];
        assert!(matches!(
            from_bytes(&data),
            Err(NbtError::UnknownTagType(5))
        ));
    }
}
