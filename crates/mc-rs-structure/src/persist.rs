//! Piece documents.
//!
//! Every piece saves `id`, `BB`, `O` and `GD` followed by its kind's own
//! keys. Loading goes through a [`PieceRegistry`] that maps each `id` to
//! the loader of the family that owns it.

use std::collections::HashMap;
use std::sync::OnceLock;

use mc_rs_nbt::NbtCompound;
use tracing::warn;

use crate::direction::Direction;
use crate::error::StructureError;
use crate::families::{
    corridor_tree, desert_pyramid, end_city, fortress, mansion, mineshaft, monument, stronghold,
};
use crate::geometry::BoundingBox;
use crate::piece::{Piece, PieceData};

pub const KEY_ID: &str = "id";
pub const KEY_BOX: &str = "BB";
pub const KEY_ORIENTATION: &str = "O";
pub const KEY_DEPTH: &str = "GD";

/// Builds the kind state of a piece from its document.
pub type PieceLoader = fn(&str, &NbtCompound) -> Result<PieceData, StructureError>;

pub fn save_piece(piece: &Piece) -> NbtCompound {
    let mut tag = NbtCompound::new();
    tag.put_string(KEY_ID, piece.id());
    tag.put_int_array(KEY_BOX, piece.bbox.to_array().to_vec());
    tag.put_int(
        KEY_ORIENTATION,
        piece.orientation.and_then(Direction::data_2d).unwrap_or(-1),
    );
    tag.put_int(KEY_DEPTH, piece.depth as i32);
    match &piece.data {
        PieceData::Fortress(p) => p.save(&mut tag),
        PieceData::Stronghold(p) => p.save(&mut tag),
        PieceData::Mineshaft(p) => p.save(&mut tag),
        PieceData::Mansion(p) => p.save(&mut tag),
        PieceData::Monument(p) => p.save(&mut tag),
        PieceData::Corridor(p) => p.save(&mut tag),
        PieceData::EndCity(p) => p.save(&mut tag),
        PieceData::DesertPyramid(p) => p.save(&mut tag),
    }
    tag
}

/// Kind tag to loader table.
#[derive(Default)]
pub struct PieceRegistry {
    loaders: HashMap<&'static str, PieceLoader>,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding every built-in family, built once.
    pub fn standard() -> &'static PieceRegistry {
        static REGISTRY: OnceLock<PieceRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut registry = PieceRegistry::new();
            registry.register_all(fortress::IDS, |id, tag| {
                fortress::FortressPiece::load(id, tag).map(PieceData::Fortress)
            });
            registry.register_all(stronghold::IDS, |id, tag| {
                stronghold::StrongholdPiece::load(id, tag).map(PieceData::Stronghold)
            });
            registry.register_all(mineshaft::IDS, |id, tag| {
                mineshaft::MineshaftPiece::load(id, tag).map(PieceData::Mineshaft)
            });
            registry.register_all(mansion::IDS, |id, tag| {
                mansion::MansionPiece::load(id, tag).map(PieceData::Mansion)
            });
            registry.register_all(monument::IDS, |id, tag| {
                monument::MonumentPiece::load(id, tag).map(PieceData::Monument)
            });
            registry.register_all(corridor_tree::IDS, |id, tag| {
                corridor_tree::CorridorPiece::load(id, tag).map(PieceData::Corridor)
            });
            registry.register_all(end_city::IDS, |id, tag| {
                end_city::EndCityPiece::load(id, tag).map(PieceData::EndCity)
            });
            registry.register_all(desert_pyramid::IDS, |id, tag| {
                desert_pyramid::DesertPyramidPiece::load(id, tag).map(PieceData::DesertPyramid)
            });
            registry
        })
    }

    /// Adds a loader. A tag may only be registered once.
    pub fn register(&mut self, id: &'static str, loader: PieceLoader) -> Result<(), StructureError> {
        if self.loaders.contains_key(id) {
            return Err(StructureError::InvalidCatalog(format!(
                "piece id {id} registered twice"
            )));
        }
        self.loaders.insert(id, loader);
        Ok(())
    }

    fn register_all(&mut self, ids: &[&'static str], loader: PieceLoader) {
        for &id in ids {
            if let Err(err) = self.register(id, loader) {
                warn!(%err, "skipping piece loader");
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.loaders.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub fn load_piece(&self, tag: &NbtCompound) -> Result<Piece, StructureError> {
        let id = tag.get_str(KEY_ID).ok_or_else(|| StructureError::MissingField {
            kind: "<unknown>".into(),
            field: KEY_ID,
        })?;
        let loader = self
            .loaders
            .get(id)
            .ok_or_else(|| StructureError::UnknownPieceKind(id.to_string()))?;

        let values = tag.get_int_array(KEY_BOX).ok_or_else(|| StructureError::MissingField {
            kind: id.to_string(),
            field: KEY_BOX,
        })?;
        let bbox = BoundingBox::from_slice(values)
            .ok_or_else(|| StructureError::InvalidBoundingBox { kind: id.to_string() })?;
        let orientation = match tag.get_int(KEY_ORIENTATION).unwrap_or(-1) {
            -1 => None,
            value => Some(Direction::from_data_2d(value)),
        };
        let depth = tag.get_int(KEY_DEPTH).unwrap_or(0).max(0) as u32;
        let data = loader(id, tag)?;
        Ok(Piece::new(data, bbox, orientation, depth))
    }
}

// ---------------------------------------------------------------------------
// Field helpers for family loaders
// ---------------------------------------------------------------------------

/// A missing boolean reads as false.
pub(crate) fn flag(tag: &NbtCompound, key: &str) -> bool {
    tag.get_bool(key).unwrap_or(false)
}

pub(crate) fn int_or(tag: &NbtCompound, key: &str, default: i32) -> i32 {
    tag.get_int(key).unwrap_or(default)
}

pub(crate) fn require_int(tag: &NbtCompound, kind: &str, key: &'static str) -> Result<i32, StructureError> {
    tag.get_int(key).ok_or_else(|| StructureError::MissingField {
        kind: kind.to_string(),
        field: key,
    })
}

pub(crate) fn unknown(id: &str) -> StructureError {
    StructureError::UnknownPieceKind(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::corridor_tree::CorridorPiece;

    #[test]
    fn standard_registry_knows_every_family() {
        let registry = PieceRegistry::standard();
        for id in ["NeBCr", "SHStart", "MSRoom", "WMRoom2x2", "OMB", "CTRoom", "ECTower", "TeDP"] {
            assert!(registry.contains(id), "missing {id}");
        }
        assert!(!registry.contains("Iglu"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = PieceRegistry::new();
        let loader: PieceLoader = |_, _| Ok(PieceData::Corridor(CorridorPiece::Stub));
        registry.register("X", loader).unwrap();
        assert!(matches!(
            registry.register("X", loader),
            Err(StructureError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn common_fields_roundtrip() {
        let piece = Piece::new(
            PieceData::Corridor(CorridorPiece::Stub),
            BoundingBox::new(1, 20, 3, 5, 24, 5),
            Some(Direction::West),
            6,
        );
        let tag = save_piece(&piece);
        assert_eq!(tag.get_str(KEY_ID), Some("CTStub"));
        assert_eq!(tag.get_int(KEY_ORIENTATION), Some(1));
        assert_eq!(PieceRegistry::standard().load_piece(&tag).unwrap(), piece);
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut tag = NbtCompound::new();
        tag.put_string(KEY_ID, "Nope");
        tag.put_int_array(KEY_BOX, vec![0; 6]);
        assert!(matches!(
            PieceRegistry::standard().load_piece(&tag),
            Err(StructureError::UnknownPieceKind(id)) if id == "Nope"
        ));
    }

    #[test]
    fn short_box_is_rejected() {
        let mut tag = NbtCompound::new();
        tag.put_string(KEY_ID, "CTStub");
        tag.put_int_array(KEY_BOX, vec![0; 5]);
        assert!(matches!(
            PieceRegistry::standard().load_piece(&tag),
            Err(StructureError::InvalidBoundingBox { .. })
        ));
    }
}
