//! ESRI ASCII grid (`.asc`) reader. The CRS comes from a `.prj` sidecar
//! holding WKT.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use projection::{parse_crs_wkt, Crs};
use raster_common::AffineTransform;
use tracing::debug;

use crate::coverage::{default_band_name, GridCoverage, RenderedImage, SampleDimension};
use crate::error::{CoverageError, Result};
use crate::grid::GridGeometry;

#[derive(Debug, Default)]
struct AsciiHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    x_corner: Option<f64>,
    y_corner: Option<f64>,
    x_center: Option<f64>,
    y_center: Option<f64>,
    cell_x: Option<f64>,
    cell_y: Option<f64>,
    no_data: Option<f64>,
}

struct ArcGridLayout {
    grid: GridGeometry,
    no_data: Option<f64>,
}

impl AsciiHeader {
    /// Apply one `key value` header line. Returns false for lines that are
    /// not header lines.
    fn apply(&mut self, line: &str) -> std::result::Result<bool, String> {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Ok(false);
        };
        let key = key.to_ascii_lowercase();
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Ok(false);
        }

        let number = || {
            value
                .parse::<f64>()
                .map_err(|_| format!("invalid value '{value}' for {key}"))
        };
        let count = || {
            value
                .parse::<usize>()
                .map_err(|_| format!("invalid value '{value}' for {key}"))
        };

        match key.as_str() {
            "ncols" => self.ncols = Some(count()?),
            "nrows" => self.nrows = Some(count()?),
            "xllcorner" => self.x_corner = Some(number()?),
            "yllcorner" => self.y_corner = Some(number()?),
            "xllcenter" => self.x_center = Some(number()?),
            "yllcenter" => self.y_center = Some(number()?),
            "cellsize" => {
                let size = number()?;
                self.cell_x = Some(size);
                self.cell_y = Some(size);
            }
            "dx" => self.cell_x = Some(number()?),
            "dy" => self.cell_y = Some(number()?),
            "nodata_value" => self.no_data = Some(number()?),
            other => return Err(format!("unknown header key '{other}'")),
        }
        Ok(true)
    }

    fn layout(&self) -> std::result::Result<ArcGridLayout, String> {
        let ncols = self.ncols.ok_or("missing ncols")?;
        let nrows = self.nrows.ok_or("missing nrows")?;
        let (cell_x, cell_y) = match (self.cell_x, self.cell_y) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err("missing cellsize".to_string()),
        };

        let (x_ll, y_ll) = match (self.x_corner, self.y_corner, self.x_center, self.y_center) {
            (Some(x), Some(y), _, _) => (x, y),
            (_, _, Some(x), Some(y)) => (x - cell_x / 2.0, y - cell_y / 2.0),
            _ => return Err("missing lower-left corner".to_string()),
        };

        let origin_y = y_ll + nrows as f64 * cell_y;
        let grid = GridGeometry::new(
            AffineTransform::north_up(x_ll, origin_y, cell_x, cell_y),
            ncols,
            nrows,
        )
        .map_err(|e| e.to_string())?;

        Ok(ArcGridLayout {
            grid,
            no_data: self.no_data,
        })
    }
}

/// Decode an ASCII grid into a single-band coverage named `name`.
pub fn read_arcgrid(path: &Path, name: &str) -> Result<GridCoverage> {
    let text = std::fs::read_to_string(path).map_err(|e| CoverageError::decode(path, e.to_string()))?;

    let mut header = AsciiHeader::default();
    let mut lines = text.lines().peekable();
    while let Some(&line) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
            continue;
        }
        match header.apply(line) {
            Ok(true) => {
                lines.next();
            }
            Ok(false) => break,
            Err(message) => return Err(CoverageError::decode(path, message)),
        }
    }
    let layout = header
        .layout()
        .map_err(|message| CoverageError::decode(path, message))?;
    let (width, height) = (layout.grid.width, layout.grid.height);
    let expected = layout.grid.pixel_count();

    // every sample takes at least two bytes of text
    let mut values = Vec::with_capacity(expected.min(text.len() / 2 + 1));
    for token in lines.flat_map(str::split_whitespace) {
        let value = token
            .parse::<f64>()
            .map_err(|_| CoverageError::decode(path, format!("invalid sample '{token}'")))?;
        values.push(value as f32);
    }
    if values.len() != expected {
        return Err(CoverageError::decode(
            path,
            format!("found {} samples, expected {expected}", values.len()),
        ));
    }

    let crs = read_sidecar_crs(path)?;
    let band = SampleDimension {
        name: default_band_name(0),
        no_data: layout.no_data,
    };
    let image = RenderedImage::new(width, height, vec![values])
        .map_err(|e| CoverageError::decode(path, e.to_string()))?;

    debug!(path = %path.display(), width = width, height = height, crs = %crs, "Decoded ASCII grid");

    GridCoverage::new(name, crs, layout.grid, vec![band], image)
        .map_err(|e| CoverageError::decode(path, e.to_string()))
}

/// Header-only read of an ASCII grid.
pub fn read_arcgrid_metadata(path: &Path, name: &str) -> Result<GridCoverage> {
    let file = File::open(path).map_err(|e| CoverageError::decode(path, e.to_string()))?;

    let mut header = AsciiHeader::default();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| CoverageError::decode(path, e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        match header.apply(&line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => return Err(CoverageError::decode(path, message)),
        }
    }
    let layout = header
        .layout()
        .map_err(|message| CoverageError::decode(path, message))?;

    let crs = read_sidecar_crs(path)?;
    let band = SampleDimension {
        name: default_band_name(0),
        no_data: layout.no_data,
    };
    Ok(GridCoverage::metadata_only(name, crs, layout.grid, vec![band]))
}

fn read_sidecar_crs(path: &Path) -> Result<Crs> {
    let prj = path.with_extension("prj");
    let wkt = std::fs::read_to_string(&prj).map_err(|e| {
        CoverageError::decode(path, format!("cannot read CRS sidecar {}: {e}", prj.display()))
    })?;
    parse_crs_wkt(&wkt).map_err(|e| CoverageError::decode(path, format!("{}: {e}", prj.display())))
}
