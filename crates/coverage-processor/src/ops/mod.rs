//! Coverage transforms. Each takes a coverage by reference and returns a new
//! one; inputs are never modified.

mod crop;
mod reproject;
mod resample;

pub use crop::crop;
pub use reproject::{reproject, REPROJECT_DENSIFY_SAMPLES};
pub use resample::resample;

use rayon::prelude::*;

use crate::config::InterpolationMethod;
use crate::coverage::{RenderedImage, SampleDimension};
use crate::interpolation::interpolate;

/// Sample every band of `image` at precomputed source positions.
///
/// `positions` holds one `(x, y)` per output pixel in row-major order, in
/// the source's sample space (pixel centers at integer coordinates). NaN
/// positions and samples that land on no-data yield the band's fill value.
pub(crate) fn sample_planes(
    image: &RenderedImage,
    bands: &[SampleDimension],
    positions: &[(f64, f64)],
    out_width: usize,
    method: InterpolationMethod,
) -> Vec<Vec<f32>> {
    let (width, height) = (image.width(), image.height());

    image
        .bands()
        .zip(bands)
        .map(|(plane, band)| {
            let masked = mask_no_data(plane, band, method);
            let source: &[f32] = masked.as_deref().unwrap_or(plane);
            let fill = band.fill_value();

            let mut output = vec![fill; positions.len()];
            output
                .par_chunks_mut(out_width)
                .zip(positions.par_chunks(out_width))
                .for_each(|(row, row_positions)| {
                    for (value, &(x, y)) in row.iter_mut().zip(row_positions) {
                        let sample = interpolate(method, source, width, height, x, y);
                        if !band.is_no_data(sample) {
                            *value = sample;
                        }
                    }
                });
            output
        })
        .collect()
}

/// Plane with no-data replaced by NaN so smoothing kernels skip it.
/// Nearest neighbor copies values as-is and needs no mask.
fn mask_no_data(
    plane: &[f32],
    band: &SampleDimension,
    method: InterpolationMethod,
) -> Option<Vec<f32>> {
    if method == InterpolationMethod::Nearest || band.no_data.is_none() {
        return None;
    }
    Some(
        plane
            .iter()
            .map(|&v| if band.is_no_data(v) { f32::NAN } else { v })
            .collect(),
    )
}
