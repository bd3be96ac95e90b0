use std::ops::Range;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::geom::axis::MapAxis;
use crate::geom::coord::{wrap_delta_lon, MapCoord, SkyCoord};
use crate::geom::error::{CutoutError, GeomError, GeomResult};

/// How a cutout treats a region that extends past the parent geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoutMode {
    /// Clip the cutout to the overlapping part of the parent.
    Trim,
    /// Require the cutout to lie entirely inside the parent.
    Strict,
}

/// Pixel ranges of a cutout within its parent geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoutSlices {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

/// Plate-carrée sky grid with an optional energy axis.
///
/// Pixel centers sit on integer pixel coordinates; pixel `(0, 0)` is centered
/// on `origin`. Longitude and latitude grow with the pixel index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WcsGeom {
    origin: SkyCoord,
    binsz_deg: f64,
    nx: usize,
    ny: usize,
    energy: Option<MapAxis>,
}

impl WcsGeom {
    pub fn new(
        origin: SkyCoord,
        binsz_deg: f64,
        npix: (usize, usize),
        energy: Option<MapAxis>,
    ) -> GeomResult<Self> {
        if !(binsz_deg > 0.0) || !binsz_deg.is_finite() {
            return Err(GeomError::InvalidParameter(format!(
                "bin size must be positive and finite, got {binsz_deg}"
            )));
        }
        if !origin.lon_deg.is_finite() || !origin.lat_deg.is_finite() {
            return Err(GeomError::InvalidParameter(format!(
                "geometry origin must be finite, got {origin:?}"
            )));
        }
        let (nx, ny) = npix;
        if nx == 0 || ny == 0 {
            return Err(GeomError::InvalidParameter(format!(
                "geometry needs at least one pixel, got {nx}x{ny}"
            )));
        }
        Ok(Self {
            origin,
            binsz_deg,
            nx,
            ny,
            energy,
        })
    }

    /// Grid centered on `skydir` with the given full width in degrees.
    pub fn create(
        skydir: SkyCoord,
        binsz_deg: f64,
        width_deg: (f64, f64),
        energy: Option<MapAxis>,
    ) -> GeomResult<Self> {
        let positive = |value: f64| value > 0.0 && value.is_finite();
        if !positive(binsz_deg) || !positive(width_deg.0) || !positive(width_deg.1) {
            return Err(GeomError::InvalidParameter(format!(
                "invalid bin size {binsz_deg} or width {width_deg:?}"
            )));
        }
        let nx = (width_deg.0 / binsz_deg).round().max(1.0) as usize;
        let ny = (width_deg.1 / binsz_deg).round().max(1.0) as usize;
        let origin = SkyCoord::new(
            skydir.lon_deg - (nx as f64 - 1.0) / 2.0 * binsz_deg,
            skydir.lat_deg - (ny as f64 - 1.0) / 2.0 * binsz_deg,
        );
        Self::new(origin, binsz_deg, (nx, ny), energy)
    }

    pub fn origin(&self) -> SkyCoord {
        self.origin
    }

    pub fn binsz_deg(&self) -> f64 {
        self.binsz_deg
    }

    pub fn npix(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn is_image(&self) -> bool {
        self.energy.is_none()
    }

    pub fn energy_axis(&self) -> Option<&MapAxis> {
        self.energy.as_ref()
    }

    pub fn n_energy(&self) -> usize {
        self.energy.as_ref().map_or(1, MapAxis::nbin)
    }

    /// Shape of the backing array: `(energy, lat, lon)`. Images use a single
    /// plane.
    pub fn data_shape(&self) -> (usize, usize, usize) {
        (self.n_energy(), self.ny, self.nx)
    }

    pub fn spatial_shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn to_image(&self) -> Self {
        Self {
            energy: None,
            ..self.clone()
        }
    }

    pub fn with_energy_axis(&self, axis: MapAxis) -> Self {
        Self {
            energy: Some(axis),
            ..self.clone()
        }
    }

    /// Geometry with the energy axis reduced to a single bin.
    pub fn squash_energy(&self) -> Self {
        Self {
            energy: self.energy.as_ref().map(MapAxis::squash),
            ..self.clone()
        }
    }

    pub fn pix_to_coord(&self, ix: usize, iy: usize) -> SkyCoord {
        SkyCoord::new(
            self.origin.lon_deg + ix as f64 * self.binsz_deg,
            self.origin.lat_deg + iy as f64 * self.binsz_deg,
        )
    }

    /// Fractional pixel position `(x, y)` of a sky coordinate.
    pub fn coord_to_pix(&self, coord: &SkyCoord) -> (f64, f64) {
        (
            wrap_delta_lon(coord.lon_deg - self.origin.lon_deg) / self.binsz_deg,
            (coord.lat_deg - self.origin.lat_deg) / self.binsz_deg,
        )
    }

    /// Pixel index `(iy, ix)` containing `coord`, if it falls on the grid.
    /// Non-finite coordinates never do.
    pub fn coord_to_idx(&self, coord: &SkyCoord) -> Option<(usize, usize)> {
        let (x, y) = self.coord_to_pix(coord);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let ix = (x + 0.5).floor();
        let iy = (y + 0.5).floor();
        if ix < 0.0 || iy < 0.0 || ix >= self.nx as f64 || iy >= self.ny as f64 {
            return None;
        }
        Some((iy as usize, ix as usize))
    }

    /// Angular separation of every pixel center from `center`, shape `(ny, nx)`.
    pub fn separation(&self, center: &SkyCoord) -> Array2<f64> {
        Array2::from_shape_fn((self.ny, self.nx), |(iy, ix)| {
            self.pix_to_coord(ix, iy).separation_deg(center)
        })
    }

    /// Pixel solid angle in steradian, shape `(ny, nx)`.
    pub fn solid_angle(&self) -> Array2<f64> {
        let binsz_rad = self.binsz_deg.to_radians();
        Array2::from_shape_fn((self.ny, self.nx), |(iy, ix)| {
            binsz_rad * binsz_rad * self.pix_to_coord(ix, iy).lat_deg.to_radians().cos()
        })
    }

    /// Boolean image that is `inside` within `radius_deg` of `center` and
    /// `!inside` elsewhere.
    pub fn region_mask(&self, center: &SkyCoord, radius_deg: f64, inside: bool) -> Array2<bool> {
        self.separation(center)
            .mapv(|separation| (separation < radius_deg) == inside)
    }

    /// Coordinates of every pixel in data order.
    pub fn get_coord(&self) -> MapCoord {
        let (n_energy, ny, nx) = self.data_shape();
        let total = n_energy * ny * nx;
        let mut lon = Vec::with_capacity(total);
        let mut lat = Vec::with_capacity(total);
        let mut energy = self.energy.as_ref().map(|_| Vec::with_capacity(total));

        for ie in 0..n_energy {
            for iy in 0..ny {
                for ix in 0..nx {
                    let coord = self.pix_to_coord(ix, iy);
                    lon.push(coord.lon_deg);
                    lat.push(coord.lat_deg);
                    if let (Some(values), Some(axis)) = (energy.as_mut(), self.energy.as_ref()) {
                        values.push(axis.center(ie));
                    }
                }
            }
        }

        MapCoord { lon, lat, energy }
    }

    /// Pixel ranges of a square cutout of full width `width_deg` centered on
    /// `position`.
    pub fn cutout_slices(
        &self,
        position: &SkyCoord,
        width_deg: f64,
        mode: CutoutMode,
    ) -> Result<CutoutSlices, CutoutError> {
        let npix = (width_deg / self.binsz_deg).max(1.0).round() as i64;
        let (x, y) = self.coord_to_pix(position);

        let edges_x = overlap_edges(x, npix);
        let edges_y = overlap_edges(y, npix);
        let large_x = self.nx as i64;
        let large_y = self.ny as i64;

        for ((edge_min, edge_max), large) in [(edges_x, large_x), (edges_y, large_y)] {
            if edge_max <= 0 || edge_min >= large {
                return Err(CutoutError::NoOverlap);
            }
        }

        if mode == CutoutMode::Strict {
            for ((edge_min, edge_max), large) in [(edges_x, large_x), (edges_y, large_y)] {
                if edge_min < 0 || edge_max > large {
                    return Err(CutoutError::PartialOverlap);
                }
            }
        }

        Ok(CutoutSlices {
            x: clip_range(edges_x, large_x),
            y: clip_range(edges_y, large_y),
        })
    }

    pub fn cutout(
        &self,
        position: &SkyCoord,
        width_deg: f64,
        mode: CutoutMode,
    ) -> Result<WcsGeom, CutoutError> {
        let slices = self.cutout_slices(position, width_deg, mode)?;
        Ok(self.slice(&slices))
    }

    /// Sub-grid covering `slices`; pixels stay aligned with this geometry.
    pub fn slice(&self, slices: &CutoutSlices) -> WcsGeom {
        Self {
            origin: self.pix_to_coord(slices.x.start, slices.y.start),
            binsz_deg: self.binsz_deg,
            nx: slices.x.len(),
            ny: slices.y.len(),
            energy: self.energy.clone(),
        }
    }
}

fn overlap_edges(position: f64, npix: i64) -> (i64, i64) {
    let half = npix as f64 / 2.0;
    ((position - half).ceil() as i64, (position + half).ceil() as i64)
}

fn clip_range((edge_min, edge_max): (i64, i64), large: i64) -> Range<usize> {
    edge_min.max(0) as usize..edge_max.min(large) as usize
}
