//! Interpolation kernels for reprojection and resampling.
//!
//! Coordinates are in sample space: `(0.0, 0.0)` is the center of the top-left
//! pixel and `(width - 1, height - 1)` the center of the bottom-right one.
//! Points more than half a pixel outside the grid yield NaN.

use crate::config::InterpolationMethod;

/// Sample `data` at `(x, y)` with the given method.
pub fn interpolate(
    method: InterpolationMethod,
    data: &[f32],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
) -> f32 {
    match method {
        InterpolationMethod::Nearest => nearest_interpolate(data, width, height, x, y),
        InterpolationMethod::Bilinear => bilinear_interpolate(data, width, height, x, y),
        InterpolationMethod::Cubic => cubic_interpolate(data, width, height, x, y),
    }
}

fn in_footprint(width: usize, height: usize, x: f64, y: f64) -> bool {
    width > 0
        && height > 0
        && x >= -0.5
        && y >= -0.5
        && x < width as f64 - 0.5
        && y < height as f64 - 0.5
}

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !in_footprint(width, height, x, y) {
        return f32::NAN;
    }

    let col = (x.round().max(0.0) as usize).min(width - 1);
    let row = (y.round().max(0.0) as usize).min(height - 1);
    data[row * width + col]
}

/// Bilinear interpolation.
///
/// Smoothly interpolates between the four nearest grid points. Edge pixels
/// extend half a pixel outward.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !in_footprint(width, height, x, y) {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    // any NaN corner poisons the sample
    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f32::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Bicubic interpolation.
///
/// Uses the 16 surrounding points; falls back to bilinear when any of them
/// is NaN.
pub fn cubic_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !in_footprint(width, height, x, y) {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;

    let xf = (x - xi as f64) as f32;
    let yf = (y - yi as f64) as f32;

    let mut values = [[0.0f32; 4]; 4];
    for (j, row_values) in values.iter_mut().enumerate() {
        for (i, value) in row_values.iter_mut().enumerate() {
            let px = (xi + i as i64 - 1).clamp(0, width as i64 - 1) as usize;
            let py = (yi + j as i64 - 1).clamp(0, height as i64 - 1) as usize;
            *value = data[py * width + px];

            if value.is_nan() {
                return bilinear_interpolate(data, width, height, x, y);
            }
        }
    }

    let mut columns = [0.0f32; 4];
    for (column, row) in columns.iter_mut().zip(values.iter()) {
        *column = cubic_1d(row[0], row[1], row[2], row[3], xf);
    }

    cubic_1d(columns[0], columns[1], columns[2], columns[3], yf)
}

/// 1D cubic interpolation using Catmull-Rom spline.
fn cubic_1d(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}
