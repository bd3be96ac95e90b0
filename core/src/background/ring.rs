use ndarray::{Array2, Array3, Zip};
use serde::{Deserialize, Serialize};

use crate::background::BackgroundEstimator;
use crate::map::{Map, MapError, MapKey, MapResult, MapSet, Unit};
use crate::math::{convolve_direct, convolve_fft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvolutionMethod {
    #[default]
    Direct,
    Fft,
}

/// Ring background: off counts and off exposure are the exclusion-masked
/// counts and background template summed over an annulus around each pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingBackgroundEstimator {
    pub r_in_deg: f64,
    pub width_deg: f64,
    pub method: ConvolutionMethod,
}

impl Default for RingBackgroundEstimator {
    fn default() -> Self {
        Self {
            r_in_deg: 0.5,
            width_deg: 0.3,
            method: ConvolutionMethod::Direct,
        }
    }
}

impl RingBackgroundEstimator {
    pub fn new(r_in_deg: f64, width_deg: f64) -> MapResult<Self> {
        let estimator = Self {
            r_in_deg,
            width_deg,
            method: ConvolutionMethod::Direct,
        };
        estimator.validate()?;
        Ok(estimator)
    }

    pub fn with_method(mut self, method: ConvolutionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> MapResult<()> {
        let finite = self.r_in_deg.is_finite() && self.width_deg.is_finite();
        if !finite || !(self.r_in_deg >= 0.0) || !(self.width_deg > 0.0) {
            return Err(MapError::InvalidParameter(format!(
                "ring needs r_in >= 0 and width > 0, got r_in={} width={}",
                self.r_in_deg, self.width_deg
            )));
        }
        Ok(())
    }

    pub fn r_out_deg(&self) -> f64 {
        self.r_in_deg + self.width_deg
    }

    /// Binary annulus kernel for pixels of `binsz_deg`, odd-sized and centered.
    pub fn kernel(&self, binsz_deg: f64) -> MapResult<Array2<f64>> {
        self.validate()?;
        if !(binsz_deg > 0.0) || !binsz_deg.is_finite() {
            return Err(MapError::InvalidParameter(format!(
                "ring kernel needs a positive pixel size, got {binsz_deg}"
            )));
        }
        let r_in = snap(self.r_in_deg / binsz_deg);
        let r_out = snap(self.r_out_deg() / binsz_deg);
        let half = r_out.ceil() as usize;
        let size = 2 * half + 1;
        Ok(Array2::from_shape_fn((size, size), |(iy, ix)| {
            let dy = iy as f64 - half as f64;
            let dx = ix as f64 - half as f64;
            let radius = dx.hypot(dy);
            if radius >= r_in && radius <= r_out {
                1.0
            } else {
                0.0
            }
        }))
    }

    fn convolve(&self, image: &Array3<f64>, kernel: &Array2<f64>) -> Array3<f64> {
        let mut output = Array3::zeros(image.dim());
        for (mut out_plane, in_plane) in output.outer_iter_mut().zip(image.outer_iter()) {
            let convolved = match self.method {
                ConvolutionMethod::Direct => convolve_direct(in_plane, kernel.view()),
                ConvolutionMethod::Fft => convolve_fft(in_plane, kernel.view()),
            };
            out_plane.assign(&convolved);
        }
        output
    }
}

/// Rounds a radius in pixels to 1e-9 so radii that are integers up to
/// floating-point noise stay integers.
fn snap(pixels: f64) -> f64 {
    (pixels * 1e9).round() / 1e9
}

fn required<'m>(maps: &'m MapSet, key: MapKey) -> MapResult<&'m Map> {
    maps.get(&key).ok_or(MapError::MissingKey(key))
}

impl BackgroundEstimator for RingBackgroundEstimator {
    fn run(&self, maps: &MapSet) -> MapResult<MapSet> {
        let counts = required(maps, MapKey::Counts)?;
        let background = required(maps, MapKey::Background)?;
        let exclusion = required(maps, MapKey::Exclusion)?;

        let shape = counts.data().dim();
        for other in [background, exclusion] {
            if other.data().dim() != shape {
                return Err(MapError::ShapeMismatch {
                    expected: shape,
                    actual: other.data().dim(),
                });
            }
        }

        let kernel = self.kernel(counts.geom().binsz_deg())?;
        let counts_excluded = counts.data() * exclusion.data();
        let background_excluded = background.data() * exclusion.data();

        let off = self.convolve(&counts_excluded, &kernel);
        let exposure_off = self.convolve(&background_excluded, &kernel);

        let mut alpha = Array3::<f64>::zeros(shape);
        Zip::from(&mut alpha)
            .and(background.data())
            .and(&exposure_off)
            .for_each(|alpha, &on, &off| {
                if off > 0.0 {
                    *alpha = on / off;
                }
            });

        let geom = counts.geom().clone();
        let mut result = MapSet::new();
        result.insert(
            MapKey::Off,
            Map::from_data(geom.clone(), off, Unit::Dimensionless)?,
        );
        result.insert(
            MapKey::ExposureOff,
            Map::from_data(geom.clone(), exposure_off, background.unit())?,
        );
        result.insert(
            MapKey::Alpha,
            Map::from_data(geom, alpha, Unit::Dimensionless)?,
        );
        result.insert(MapKey::Background, background.clone());
        Ok(result)
    }
}
