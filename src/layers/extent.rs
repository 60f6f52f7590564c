//! Layer extents
//!
//! Axis-aligned bounding boxes over layer content.

use geo_types::{Coord, Geometry, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The null rectangle reported for layers without geometry
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    fn from_coord(c: Coord<f64>) -> Self {
        Self::new(c.x, c.y, c.x, c.y)
    }

    fn include_coord(&mut self, c: Coord<f64>) {
        self.xmin = self.xmin.min(c.x);
        self.ymin = self.ymin.min(c.y);
        self.xmax = self.xmax.max(c.x);
        self.ymax = self.ymax.max(c.y);
    }

    /// Smallest extent covering both
    pub fn union(&self, other: &Extent) -> Extent {
        Extent::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Bounds of a single geometry, `None` for empty geometries
    pub fn of_geometry(geometry: &Geometry<f64>) -> Option<Extent> {
        let mut extent: Option<Extent> = None;
        for_each_coord(geometry, &mut |c| {
            extent = Some(match extent {
                Some(mut e) => {
                    e.include_coord(c);
                    e
                }
                None => Extent::from_coord(c),
            });
        });
        extent
    }

    /// Bounds of a set of geometries, `None` when none has coordinates
    pub fn of_geometries<'a, I>(geometries: I) -> Option<Extent>
    where
        I: IntoIterator<Item = &'a Geometry<f64>>,
    {
        geometries
            .into_iter()
            .filter_map(Extent::of_geometry)
            .reduce(|a, b| a.union(&b))
    }
}

fn for_each_coord(geometry: &Geometry<f64>, f: &mut dyn FnMut(Coord<f64>)) {
    match geometry {
        Geometry::Point(p) => f(p.0),
        Geometry::Line(l) => {
            f(l.start);
            f(l.end);
        }
        Geometry::LineString(ls) => ls.0.iter().copied().for_each(f),
        Geometry::Polygon(poly) => polygon_coords(poly, f),
        Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| f(p.0)),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                ls.0.iter().copied().for_each(&mut *f);
            }
        }
        Geometry::MultiPolygon(mpoly) => {
            for poly in &mpoly.0 {
                polygon_coords(poly, f);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                for_each_coord(g, f);
            }
        }
        Geometry::Rect(r) => {
            f(r.min());
            f(r.max());
        }
        Geometry::Triangle(t) => t.to_array().into_iter().for_each(f),
    }
}

fn polygon_coords(poly: &Polygon<f64>, f: &mut dyn FnMut(Coord<f64>)) {
    poly.exterior().0.iter().copied().for_each(&mut *f);
    for ring in poly.interiors() {
        ring.0.iter().copied().for_each(&mut *f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{line_string, point, polygon};

    #[test]
    fn test_point_extent() {
        let e = Extent::of_geometry(&Geometry::Point(point!(x: 2.0, y: 3.0))).unwrap();
        assert_eq!(e, Extent::new(2.0, 3.0, 2.0, 3.0));
        assert_relative_eq!(e.width(), 0.0);
    }

    #[test]
    fn test_polygon_and_line_union() {
        let poly: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]
        .into();
        let line: Geometry<f64> = line_string![(x: -1.5, y: 1.0), (x: 1.0, y: 5.25)].into();

        let e = Extent::of_geometries([&poly, &line]).unwrap();
        assert_relative_eq!(e.xmin, -1.5);
        assert_relative_eq!(e.ymin, 0.0);
        assert_relative_eq!(e.xmax, 4.0);
        assert_relative_eq!(e.ymax, 5.25);
    }

    #[test]
    fn test_empty_geometry_has_no_extent() {
        let empty: Geometry<f64> = Geometry::LineString(geo_types::LineString::new(vec![]));
        assert!(Extent::of_geometry(&empty).is_none());
        assert!(Extent::of_geometries(std::iter::empty()).is_none());
        assert!(Extent::null().is_null());
    }
}
