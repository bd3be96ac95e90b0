use ndarray::{s, Array2, Array3, Axis, Zip};

use crate::geom::{CutoutError, CutoutMode, MapCoord, SkyCoord, WcsGeom};
use crate::map::error::{MapError, MapResult};
use crate::map::unit::Unit;

/// Data cube bound to a geometry and a unit.
///
/// The backing array is shaped `(energy, lat, lon)`; image geometries keep a
/// single energy plane so that every map is three-dimensional.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    geom: WcsGeom,
    data: Array3<f64>,
    unit: Unit,
}

impl Map {
    /// Zero-filled map on `geom`.
    pub fn from_geom(geom: WcsGeom, unit: Unit) -> Self {
        Self::filled(geom, unit, 0.0)
    }

    pub fn filled(geom: WcsGeom, unit: Unit, value: f64) -> Self {
        let data = Array3::from_elem(geom.data_shape(), value);
        Self { geom, data, unit }
    }

    pub fn from_data(geom: WcsGeom, data: Array3<f64>, unit: Unit) -> MapResult<Self> {
        let expected = geom.data_shape();
        if data.dim() != expected {
            return Err(MapError::ShapeMismatch {
                expected,
                actual: data.dim(),
            });
        }
        Ok(Self { geom, data, unit })
    }

    /// Mask map (1 = true, 0 = false) broadcasting a spatial mask over every
    /// energy plane of `geom`.
    pub fn from_image_mask(geom: WcsGeom, mask: &Array2<bool>) -> MapResult<Self> {
        let (n_energy, ny, nx) = geom.data_shape();
        if mask.dim() != (ny, nx) {
            return Err(MapError::ShapeMismatch {
                expected: (n_energy, ny, nx),
                actual: (n_energy, mask.nrows(), mask.ncols()),
            });
        }
        let data = Array3::from_shape_fn((n_energy, ny, nx), |(_, iy, ix)| {
            if mask[[iy, ix]] {
                1.0
            } else {
                0.0
            }
        });
        Ok(Self {
            geom,
            data,
            unit: Unit::Dimensionless,
        })
    }

    pub fn geom(&self) -> &WcsGeom {
        &self.geom
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<f64> {
        &mut self.data
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Values expressed in `unit`.
    pub fn to_value(&self, unit: Unit) -> MapResult<Array3<f64>> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(if factor == 1.0 {
            self.data.clone()
        } else {
            self.data.mapv(|value| value * factor)
        })
    }

    pub fn convert_to(&self, unit: Unit) -> MapResult<Map> {
        Ok(Self {
            geom: self.geom.clone(),
            data: self.to_value(unit)?,
            unit,
        })
    }

    /// Adds `values` at `coords`. Coordinates that fall outside the map are
    /// dropped. Values are taken to be in this map's unit.
    pub fn fill_by_coord(&mut self, coords: &MapCoord, values: &[f64]) -> MapResult<()> {
        if coords.len() != values.len() {
            return Err(MapError::LengthMismatch {
                coords: coords.len(),
                values: values.len(),
            });
        }

        let axis = self.geom.energy_axis();
        for (index, &value) in values.iter().enumerate() {
            let Some((iy, ix)) = self.geom.coord_to_idx(&coords.skycoord(index)) else {
                continue;
            };
            let ie = match axis {
                None => 0,
                Some(axis) => {
                    let energy = coords.energy(index).ok_or(MapError::MissingEnergyCoord)?;
                    match axis.coord_to_idx(energy) {
                        Some(ie) => ie,
                        None => continue,
                    }
                }
            };
            self.data[[ie, iy, ix]] += value;
        }
        Ok(())
    }

    /// Adds `other` onto this map by coordinate, converting to this map's unit.
    pub fn stack(&mut self, other: &Map) -> MapResult<()> {
        let values: Vec<f64> = other.to_value(self.unit)?.iter().copied().collect();
        self.fill_by_coord(&other.geom.get_coord(), &values)
    }

    /// Zeroes every pixel flagged in `mask` (shape `(ny, nx)`) on all energy
    /// planes.
    pub fn apply_fov_mask(&mut self, mask: &Array2<bool>) -> MapResult<()> {
        let (n_energy, ny, nx) = self.data.dim();
        if mask.dim() != (ny, nx) {
            return Err(MapError::ShapeMismatch {
                expected: (n_energy, ny, nx),
                actual: (n_energy, mask.nrows(), mask.ncols()),
            });
        }
        for mut plane in self.data.outer_iter_mut() {
            Zip::from(&mut plane).and(mask).for_each(|value, &masked| {
                if masked {
                    *value = 0.0;
                }
            });
        }
        Ok(())
    }

    /// Sums over the energy axis. With `keepdims` the result keeps a single
    /// energy bin spanning the full range, otherwise it is an image.
    pub fn sum_over_energy(&self, keepdims: bool) -> MapResult<Map> {
        if self.geom.is_image() {
            return Err(MapError::MissingEnergyAxis);
        }
        let data = self.data.sum_axis(Axis(0)).insert_axis(Axis(0));
        let geom = if keepdims {
            self.geom.squash_energy()
        } else {
            self.geom.to_image()
        };
        Self::from_data(geom, data, self.unit)
    }

    /// Image of a single energy plane.
    pub fn slice_by_energy_idx(&self, index: usize) -> MapResult<Map> {
        let axis = self.geom.energy_axis().ok_or(MapError::MissingEnergyAxis)?;
        if index >= axis.nbin() {
            return Err(MapError::EnergyIndex {
                index,
                nbin: axis.nbin(),
            });
        }
        let data = self.data.slice(s![index..index + 1, .., ..]).to_owned();
        Self::from_data(self.geom.to_image(), data, self.unit)
    }

    /// Multiplies each energy plane by the matching weight.
    pub fn scale_energy_planes(&self, weights: &[f64]) -> MapResult<Map> {
        let axis = self.geom.energy_axis().ok_or(MapError::MissingEnergyAxis)?;
        if weights.len() != axis.nbin() {
            return Err(MapError::InvalidParameter(format!(
                "expected {} weights, got {}",
                axis.nbin(),
                weights.len()
            )));
        }
        let mut data = self.data.clone();
        for (mut plane, &weight) in data.outer_iter_mut().zip(weights) {
            plane.mapv_inplace(|value| value * weight);
        }
        Self::from_data(self.geom.clone(), data, self.unit)
    }

    pub fn cutout(
        &self,
        position: &SkyCoord,
        width_deg: f64,
        mode: CutoutMode,
    ) -> Result<Map, CutoutError> {
        let slices = self.geom.cutout_slices(position, width_deg, mode)?;
        let data = self
            .data
            .slice(s![.., slices.y.clone(), slices.x.clone()])
            .to_owned();
        Ok(Self {
            geom: self.geom.slice(&slices),
            data,
            unit: self.unit,
        })
    }

    pub fn get_by_coord(&self, coord: &SkyCoord, energy: Option<f64>) -> Option<f64> {
        let (iy, ix) = self.geom.coord_to_idx(coord)?;
        let ie = match self.geom.energy_axis() {
            None => 0,
            Some(axis) => axis.coord_to_idx(energy?)?,
        };
        Some(self.data[[ie, iy, ix]])
    }
}
