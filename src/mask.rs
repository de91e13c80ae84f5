//! Polygon containment masks over a grid.
//!
//! Vertices live in grid index space with `x` the column and
//! `y` the row, and are used at their real-valued
//! coordinates. Cell `(row, col)` is tested as the point
//! `(col, row)`.
//!
//! # Containment rule
//!
//! Even-odd rule, with the boundary included: a cell lying
//! on an edge or vertex (within [`EPSILON`]) counts as
//! inside. Polygons with a non-finite vertex, fewer than
//! three distinct vertices or (numerically) zero area produce
//! an all-false mask, including for cells on their edges.
use ndarray::{s, Array2};
use serde_derive::*;

use crate::frame::Shape;

/// Tolerance for on-edge and zero-area tests.
pub const EPSILON: f64 = 1e-9;

/// A point in grid index space.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord { x, y }
    }
}

/// Boolean mask of the cells of a `shape` grid that lie in
/// `polygon`. The polygon is closed implicitly.
pub fn contains(shape: Shape, polygon: &[Coord]) -> Array2<bool> {
    let mut mask = Array2::from_elem(shape.dim(), false);

    if polygon.iter().any(|v| !(v.x.is_finite() && v.y.is_finite())) {
        return mask;
    }
    let vertices = effective_vertices(polygon);
    if vertices.len() < 3 || signed_area(&vertices).abs() <= EPSILON {
        return mask;
    }

    // Only cells inside the bounding box can be inside.
    let (min_x, max_x, min_y, max_y) = vertices.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(x0, x1, y0, y1), v| (x0.min(v.x), x1.max(v.x), y0.min(v.y), y1.max(v.y)),
    );
    let (cols, rows) = match (
        cell_span(min_x, max_x, shape.cols),
        cell_span(min_y, max_y, shape.rows),
    ) {
        (Some(c), Some(r)) => (c, r),
        _ => return mask,
    };

    mask.slice_mut(s![rows.0..rows.1, cols.0..cols.1])
        .indexed_iter_mut()
        .for_each(|((r, c), cell)| {
            let p = Coord::new((cols.0 + c) as f64, (rows.0 + r) as f64);
            *cell = on_boundary(&vertices, p) || crosses_odd(&vertices, p);
        });
    mask
}

/// Number of cells `mask` selects.
pub fn count(mask: &Array2<bool>) -> usize {
    mask.iter().filter(|&&m| m).count()
}

/// Drop consecutive repeats (and a repeated closing vertex).
fn effective_vertices(polygon: &[Coord]) -> Vec<Coord> {
    let mut out: Vec<Coord> = Vec::with_capacity(polygon.len());
    for &v in polygon {
        if out.last().map_or(true, |last| !same_point(*last, v)) {
            out.push(v);
        }
    }
    while out.len() > 1 && same_point(out[0], out[out.len() - 1]) {
        out.pop();
    }
    out
}

fn same_point(a: Coord, b: Coord) -> bool {
    (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}

/// Shoelace formula.
fn signed_area(vertices: &[Coord]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.
}

/// Half-open range of integer cells in `[lo, hi]` clipped
/// to `0..len`.
fn cell_span(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    let start = (lo - EPSILON).ceil().max(0.);
    let end = ((hi + EPSILON).floor() + 1.).min(len as f64);
    if start >= end {
        return None;
    }
    Some((start as usize, end as usize))
}

fn edges(vertices: &[Coord]) -> impl Iterator<Item = (Coord, Coord)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[(i + n - 1) % n], vertices[i]))
}

fn on_boundary(vertices: &[Coord], p: Coord) -> bool {
    edges(vertices).any(|(a, b)| {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
        let len_sq = dx * dx + dy * dy;
        if cross.abs() > EPSILON * len_sq.sqrt().max(1.) {
            return false;
        }
        let dot = (p.x - a.x) * dx + (p.y - a.y) * dy;
        dot >= -EPSILON && dot <= len_sq + EPSILON
    })
}

/// Ray casting towards +x, counting crossings.
fn crosses_odd(vertices: &[Coord], p: Coord) -> bool {
    edges(vertices).fold(false, |inside, (a, b)| {
        if (a.y > p.y) != (b.y > p.y) {
            let x_at = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_at {
                return !inside;
            }
        }
        inside
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn poly(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().copied().map(Coord::from).collect()
    }

    fn selected(mask: &Array2<bool>) -> Vec<(usize, usize)> {
        mask.indexed_iter()
            .filter(|(_, m)| **m)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn full_bounding_box() {
        let shape = Shape::new(4, 6);
        let mask = contains(shape, &poly(&[(0., 0.), (5., 0.), (5., 3.), (0., 3.)]));
        assert_eq!(mask.dim(), (4, 6));
        assert!(mask.iter().all(|&m| m));
    }

    #[test]
    fn boundary_cells_are_inside() {
        let shape = Shape::new(5, 5);
        let mask = contains(shape, &poly(&[(1., 1.), (2., 1.), (2., 2.), (1., 2.)]));
        assert_eq!(selected(&mask), vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn real_valued_vertices_are_not_truncated() {
        // Truncating to integers would turn this into the
        // 1..2 square and select four cells.
        let shape = Shape::new(5, 5);
        let mask = contains(shape, &poly(&[(1.6, 1.6), (2.4, 1.6), (2.4, 2.4), (1.6, 2.4)]));
        assert_eq!(selected(&mask), vec![(2, 2)]);
    }

    #[test]
    fn triangle() {
        let shape = Shape::new(4, 4);
        let mask = contains(shape, &poly(&[(0., 0.), (3., 0.), (0., 3.)]));
        assert_eq!(count(&mask), 10);
        assert!(mask[(0, 3)]);
        assert!(mask[(1, 2)]);
        assert!(!mask[(2, 2)]);
        assert!(!mask[(3, 3)]);
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U shape opening upwards (rows grow downwards).
        let shape = Shape::new(5, 5);
        let mask = contains(
            shape,
            &poly(&[(0., 0.), (1., 0.), (1., 3.), (3., 3.), (3., 0.), (4., 0.), (4., 4.), (0., 4.)]),
        );
        assert!(!mask[(1, 2)]);
        assert!(mask[(1, 0)]);
        assert!(mask[(4, 2)]);
    }

    #[test]
    fn degenerate_polygons_select_nothing() {
        let shape = Shape::new(5, 5);
        let collinear = contains(shape, &poly(&[(0., 0.), (2., 2.), (4., 4.)]));
        assert_eq!(count(&collinear), 0);

        let repeated = contains(shape, &poly(&[(1., 1.), (1., 1.), (3., 3.), (1., 1.)]));
        assert_eq!(count(&repeated), 0);

        let too_few = contains(shape, &poly(&[(0., 0.), (4., 4.)]));
        assert_eq!(count(&too_few), 0);
        assert_eq!(too_few.dim(), (5, 5));
    }

    #[test]
    fn non_finite_vertex_selects_nothing() {
        let shape = Shape::new(5, 5);
        let nan = contains(shape, &poly(&[(0., 0.), (4., 0.), (f64::NAN, 2.), (4., 4.), (0., 4.)]));
        assert_eq!(count(&nan), 0);

        let inf = contains(shape, &poly(&[(0., 0.), (f64::INFINITY, 0.), (0., 4.)]));
        assert_eq!(count(&inf), 0);
    }

    #[test]
    fn outside_grid_selects_nothing() {
        let shape = Shape::new(3, 3);
        let mask = contains(shape, &poly(&[(10., 10.), (20., 10.), (20., 20.)]));
        assert_eq!(count(&mask), 0);
    }

    #[test]
    fn partially_outside_is_clipped() {
        let shape = Shape::new(3, 3);
        let mask = contains(shape, &poly(&[(-5., -5.), (1., -5.), (1., 10.), (-5., 10.)]));
        assert_eq!(selected(&mask), vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);
    }

    #[test]
    fn deterministic() {
        let shape = Shape::new(8, 8);
        let p = poly(&[(0.3, 0.2), (7.1, 1.9), (5.5, 6.8), (1.2, 5.1)]);
        assert_eq!(contains(shape, &p), contains(shape, &p));
    }

    proptest! {
        #[test]
        fn mask_has_input_shape(
            rows in 1usize..20,
            cols in 1usize..20,
            pts in prop::collection::vec((-5f64..25., -5f64..25.), 3..8),
        ) {
            let mask = contains(Shape::new(rows, cols), &poly(&pts));
            prop_assert_eq!(mask.dim(), (rows, cols));
        }

        #[test]
        fn covering_box_selects_all(rows in 1usize..20, cols in 1usize..20, pad in 0.1f64..3.) {
            let (w, h) = ((cols - 1) as f64, (rows - 1) as f64);
            let mask = contains(
                Shape::new(rows, cols),
                &poly(&[(-pad, -pad), (w + pad, -pad), (w + pad, h + pad), (-pad, h + pad)]),
            );
            prop_assert!(mask.iter().all(|&m| m));
        }
    }
}
