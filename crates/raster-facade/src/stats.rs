//! Band statistics lookup.

use serde::Serialize;

use crate::error::{RasterError, Result};
use crate::info::RasterInfo;

/// Minimum, maximum and no-data value of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandStats {
    pub min: f64,
    pub max: f64,
    pub no_data: Option<f64>,
}

/// Statistics of band `index`, [`RasterError::Index`] when out of range.
pub fn band_stats(raster: &RasterInfo, index: usize) -> Result<BandStats> {
    let band = raster.bands().get(index).ok_or(RasterError::Index {
        index,
        count: raster.band_count(),
    })?;
    Ok(BandStats {
        min: band.min,
        max: band.max,
        no_data: band.no_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{make_envelope, matrix_to_raster};

    #[test]
    fn test_band_stats() {
        let envelope = make_envelope("EPSG:4326", 0.0, 0.0, 3.0, 1.0).unwrap();
        let raster = matrix_to_raster("m", &[[-2.5, 7.0, 3.0]], &envelope).unwrap();

        let stats = band_stats(&raster, 0).unwrap();
        assert_eq!(stats, BandStats { min: -2.5, max: 7.0, no_data: None });

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["max"], 7.0);

        assert!(matches!(
            band_stats(&raster, 1),
            Err(RasterError::Index { index: 1, count: 1 })
        ));
    }
}
