//! Collision-checked placement.

use crate::geometry::BoundingBox;
use crate::piece::{Piece, PieceId};

/// First placed piece whose box shares a cell with `bbox`. Enclosures are
/// skipped.
pub fn find_collision(pieces: &[Piece], bbox: &BoundingBox) -> Option<PieceId> {
    pieces
        .iter()
        .position(|p| !p.is_enclosure() && p.bbox.intersects(bbox))
        .map(PieceId)
}

/// Accepts `bbox` if it sits above `floor_y` and touches no placed piece.
pub fn try_place(pieces: &[Piece], bbox: BoundingBox, floor_y: i32) -> Option<BoundingBox> {
    if bbox.min_y <= floor_y || find_collision(pieces, &bbox).is_some() {
        return None;
    }
    Some(bbox)
}

/// Tries each length in order, longest first, and returns the first one
/// whose box is free.
pub fn shrink_to_fit(
    pieces: &[Piece],
    lengths: impl IntoIterator<Item = i32>,
    floor_y: i32,
    make_box: impl Fn(i32) -> BoundingBox,
) -> Option<(i32, BoundingBox)> {
    lengths
        .into_iter()
        .filter(|&len| len > 0)
        .find_map(|len| try_place(pieces, make_box(len), floor_y).map(|bbox| (len, bbox)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::corridor_tree::CorridorPiece;
    use crate::piece::PieceData;

    fn stub(bbox: BoundingBox) -> Piece {
        Piece::new(PieceData::Corridor(CorridorPiece::Stub), bbox, None, 0)
    }

    #[test]
    fn touching_faces_do_not_collide() {
        let pieces = vec![stub(BoundingBox::new(0, 0, 0, 4, 4, 4))];
        assert!(find_collision(&pieces, &BoundingBox::new(5, 0, 0, 9, 4, 4)).is_none());
        assert_eq!(
            find_collision(&pieces, &BoundingBox::new(4, 0, 0, 9, 4, 4)),
            Some(PieceId(0))
        );
    }

    #[test]
    fn floor_is_exclusive() {
        let bbox = BoundingBox::new(0, 10, 0, 4, 14, 4);
        assert!(try_place(&[], bbox, 10).is_none());
        assert_eq!(try_place(&[], bbox, 9), Some(bbox));
    }

    #[test]
    fn shrink_picks_longest_free_length() {
        let pieces = vec![stub(BoundingBox::new(0, 0, 12, 4, 4, 20))];
        let found = shrink_to_fit(&pieces, [15, 10, 5], -64, |len| {
            BoundingBox::new(0, 0, 0, 2, 2, len - 1)
        });
        assert_eq!(found, Some((10, BoundingBox::new(0, 0, 0, 2, 2, 9))));
    }

    #[test]
    fn shrink_fails_when_nothing_fits() {
        let pieces = vec![stub(BoundingBox::new(0, 0, 0, 4, 4, 4))];
        let found = shrink_to_fit(&pieces, [3, 2, 1], -64, |len| {
            BoundingBox::new(1, 1, 1, 1, 1, len)
        });
        assert!(found.is_none());
    }
}
