//! User selections: a set of probe points or a polygon.
use ndarray::Array2;
use serde_derive::*;

use crate::{
    error::{Result, ThermalError},
    frame::Shape,
    mask::{self, Coord},
};

/// Color cycle assigned to points in creation order.
pub const POINT_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectedPoint {
    pub index: usize,
    pub coord: Coord,
    pub color: &'static str,
}

impl SelectedPoint {
    /// Nearest grid cell as `(row, col)`. May lie outside the
    /// grid. `None` if either coordinate is not finite.
    pub fn cell(&self) -> Option<(i64, i64)> {
        let Coord { x, y } = self.coord;
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        Some((y.round_ties_even() as i64, x.round_ties_even() as i64))
    }
}

/// Append-only list of probe points. Indices and colors are
/// fixed at creation.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<SelectedPoint>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point and return its index.
    pub fn push(&mut self, coord: impl Into<Coord>) -> usize {
        let index = self.points.len();
        self.points.push(SelectedPoint {
            index,
            coord: coord.into(),
            color: POINT_COLORS[index % POINT_COLORS.len()],
        });
        index
    }

    pub fn get(&self, index: usize) -> Option<&SelectedPoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Remove all points; the next point gets index 0 and the
    /// first color again.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<C: Into<Coord>> std::iter::FromIterator<C> for PointSet {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut set = PointSet::new();
        for c in iter {
            set.push(c);
        }
        set
    }
}

/// Closed polygon with at least three vertices.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coord>,
}

impl Polygon {
    pub fn new<I>(vertices: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Coord>,
    {
        let vertices: Vec<Coord> = vertices.into_iter().map(Into::into).collect();
        if vertices.len() < 3 {
            return Err(ThermalError::InvalidPolygon {
                vertices: vertices.len(),
            });
        }
        Ok(Polygon { vertices })
    }

    pub fn vertices(&self) -> &[Coord] {
        &self.vertices
    }

    pub fn mask(&self, shape: Shape) -> Array2<bool> {
        mask::contains(shape, &self.vertices)
    }
}

/// The active selection of a session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Selection {
    Points(PointSet),
    Polygon(Polygon),
}

impl From<PointSet> for Selection {
    fn from(p: PointSet) -> Self {
        Selection::Points(p)
    }
}

impl From<Polygon> for Selection {
    fn from(p: Polygon) -> Self {
        Selection::Polygon(p)
    }
}
