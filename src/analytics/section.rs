use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockIndex, BlockInterface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionAxis {
    X,
    Y,
    Z,
}

/// One cell of a 2D section; `u`/`v` are the in-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPoint {
    pub ind: BlockIndex,
    pub u: i64,
    pub v: i64,
    pub grade1: f64,
}

/// Blocks on the plane `axis = value`.
///
/// `X` and `Y` sections are vertical, with `v` the elevation. For `Z` the
/// plane value is a depth as written in the block file, and `(u, v)` is `(x, y)`.
/// Points come back sorted by `(u, v)`.
pub fn section<'a, I>(blocks: I, axis: SectionAxis, value: i64) -> Vec<SectionPoint>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut points = blocks
        .into_iter()
        .filter_map(|b| {
            let ind = b.index();
            let (on_plane, u, v) = match axis {
                SectionAxis::X => (ind.x == value, ind.y, ind.z),
                SectionAxis::Y => (ind.y == value, ind.x, ind.z),
                SectionAxis::Z => (ind.depth() == value, ind.x, ind.y),
            };
            on_plane.then(|| SectionPoint {
                ind,
                u,
                v,
                grade1: b.grade1(),
            })
        })
        .collect::<Vec<_>>();
    points.sort_by_key(|p| (p.u, p.v));
    points
}
