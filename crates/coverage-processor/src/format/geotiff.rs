//! GeoTIFF codec.
//!
//! Reading goes through the `tiff` decoder and accepts any sample type it
//! can produce; pixels are widened to f32. Writing always produces tiled,
//! pixel-interleaved f32 data. Tiles are compressed here (weezl for LZW,
//! flate2 for Deflate) and handed to the low-level directory encoder.
//!
//! Georeferencing uses `ModelPixelScale` + `ModelTiepoint` for north-up
//! grids and `ModelTransformation` otherwise. The CRS is written both as an
//! EPSG code (when it has one) and as WKT in `GTCitationGeoKey`, so custom
//! authority definitions survive a round trip.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use projection::{decode_crs, parse_crs_wkt, Crs};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use raster_common::AffineTransform;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::config::{TiffCompression, WriteConfig};
use crate::coverage::{default_band_name, GridCoverage, RenderedImage, SampleDimension};
use crate::error::{CoverageError, Result};
use crate::grid::GridGeometry;

use super::chunks;

// GeoTIFF and GDAL tag IDs
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GEO_ASCII_PARAMS: u16 = 34737;
const TAG_GDAL_METADATA: u16 = 42112;
const TAG_GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const GEOG_CITATION_GEO_KEY: u16 = 2049;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const PCS_CITATION_GEO_KEY: u16 = 3073;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

// TIFF field values
const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PLANAR_CHUNKY: u16 = 1;
const SAMPLE_FORMAT_IEEE_FLOAT: u16 = 3;

/// Decode a GeoTIFF into a coverage named `name`.
pub fn read_geotiff(path: &Path, name: &str) -> Result<GridCoverage> {
    let (mut decoder, header) = open(path)?;

    let (width, height) = (header.grid.width, header.grid.height);
    let samples = header.bands.len();
    let planes = if samples > 1 {
        // the decoder only expands single-sample gray images
        chunks::read_interleaved(path, &mut decoder, width, height, samples)?
    } else {
        let decoded = decoder
            .read_image()
            .map_err(|e| CoverageError::decode(path, e.to_string()))?;
        let values = convert_decoding_result(decoded)
            .ok_or_else(|| CoverageError::decode(path, "unsupported sample type"))?;
        if values.len() != width * height {
            return Err(CoverageError::decode(
                path,
                format!("decoded {} samples, expected {}", values.len(), width * height),
            ));
        }
        vec![values]
    };

    let image = RenderedImage::new(width, height, planes)
        .map_err(|e| CoverageError::decode(path, e.to_string()))?;

    debug!(
        path = %path.display(),
        width = width,
        height = height,
        bands = samples,
        crs = %header.crs,
        "Decoded GeoTIFF"
    );

    GridCoverage::new(name, header.crs, header.grid, header.bands, image)
        .map_err(|e| CoverageError::decode(path, e.to_string()))
}

/// Read only the header: grid, CRS and band metadata, no pixels.
pub fn read_geotiff_metadata(path: &Path, name: &str) -> Result<GridCoverage> {
    let (_, header) = open(path)?;
    Ok(GridCoverage::metadata_only(
        name,
        header.crs,
        header.grid,
        header.bands,
    ))
}

/// Encode `coverage` as a tiled GeoTIFF at `path`.
///
/// The file is assembled in memory, written to a temporary file next to
/// `path` and renamed into place, so a failed write never leaves a partial
/// file behind.
pub fn write_geotiff(coverage: &GridCoverage, path: &Path, config: &WriteConfig) -> Result<()> {
    config.validate()?;
    let image = coverage
        .require_image()
        .map_err(|e| CoverageError::encode(e.to_string()))?;
    if image.band_count() == 0 {
        return Err(CoverageError::encode(format!(
            "coverage '{}' has no bands",
            coverage.name()
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    encode(coverage, image, config, &mut buffer)?;
    let bytes = buffer.into_inner();
    persist(path, &bytes)?;

    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        compression = %config.compression,
        tile_width = config.tile_width,
        tile_height = config.tile_height,
        "Wrote GeoTIFF"
    );
    Ok(())
}

struct GeoTiffHeader {
    grid: GridGeometry,
    crs: Crs,
    bands: Vec<SampleDimension>,
}

fn open(path: &Path) -> Result<(Decoder<BufReader<File>>, GeoTiffHeader)> {
    let decode_err = |e: tiff::TiffError| CoverageError::decode(path, e.to_string());

    let file = File::open(path).map_err(|e| CoverageError::decode(path, e.to_string()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(decode_err)?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let samples = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1) as usize;
    let planar = decoder.get_tag_u32(Tag::PlanarConfiguration).unwrap_or(1);
    if samples > 1 && planar != u32::from(PLANAR_CHUNKY) {
        return Err(CoverageError::decode(
            path,
            "band-separate (planar) layout is not supported",
        ));
    }

    let keys = GeoKeys::read(&mut decoder);

    let mut transform = read_transform(&mut decoder)
        .ok_or_else(|| CoverageError::decode(path, "missing georeferencing tags"))?;
    if keys.short(GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT) {
        // tie points address pixel centers
        transform = transform.offset(-0.5, -0.5);
    }
    let grid = GridGeometry::new(transform, width as usize, height as usize)
        .map_err(|e| CoverageError::decode(path, e.to_string()))?;

    let crs = resolve_crs(&keys).ok_or_else(|| {
        CoverageError::decode(path, "no usable coordinate reference system in GeoKeys")
    })?;

    let no_data = decoder
        .get_tag_ascii_string(tag(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok());
    let names = decoder
        .get_tag_ascii_string(tag(TAG_GDAL_METADATA))
        .map(|xml| parse_band_descriptions(&xml))
        .unwrap_or_default();

    let bands = (0..samples)
        .map(|band| {
            let name = names
                .get(&band)
                .cloned()
                .unwrap_or_else(|| default_band_name(band));
            SampleDimension { name, no_data }
        })
        .collect();

    Ok((decoder, GeoTiffHeader { grid, crs, bands }))
}

/// Named tag for a numeric ID, matching how the decoder keys its IFD.
fn tag(id: u16) -> Tag {
    Tag::from_u16_exhaustive(id)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<AffineTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(tag(TAG_MODEL_TRANSFORMATION)) {
        if m.len() >= 8 {
            return Some(AffineTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let scale = decoder.get_tag_f64_vec(tag(TAG_MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(TAG_MODEL_TIEPOINT)).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    let (scale_x, scale_y) = (scale[0], scale[1]);
    Some(AffineTransform::north_up(
        tiepoint[3] - tiepoint[0] * scale_x,
        tiepoint[4] + tiepoint[1] * scale_y,
        scale_x,
        scale_y,
    ))
}

/// Parsed GeoKeyDirectory with its ASCII parameter block.
#[derive(Default)]
struct GeoKeys {
    entries: Vec<[u16; 4]>,
    ascii: String,
}

impl GeoKeys {
    fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> Self {
        let Ok(directory) = decoder.get_tag_u16_vec(tag(TAG_GEO_KEY_DIRECTORY)) else {
            return Self::default();
        };
        let ascii = decoder
            .get_tag_ascii_string(tag(TAG_GEO_ASCII_PARAMS))
            .unwrap_or_default();

        let count = directory.get(3).copied().unwrap_or(0) as usize;
        let entries = directory
            .get(4..)
            .unwrap_or_default()
            .chunks_exact(4)
            .take(count)
            .map(|key| [key[0], key[1], key[2], key[3]])
            .collect();
        Self { entries, ascii }
    }

    fn entry(&self, id: u16) -> Option<&[u16; 4]> {
        self.entries.iter().find(|key| key[0] == id)
    }

    /// Inline SHORT value of a key.
    fn short(&self, id: u16) -> Option<u16> {
        self.entry(id).filter(|key| key[1] == 0).map(|key| key[3])
    }

    /// ASCII value of a key, without the `|` terminator.
    fn ascii(&self, id: u16) -> Option<&str> {
        let key = self.entry(id).filter(|key| key[1] == TAG_GEO_ASCII_PARAMS)?;
        let start = key[3] as usize;
        let end = (start + key[2] as usize).min(self.ascii.len());
        self.ascii
            .get(start..end)
            .map(|s| s.trim_end_matches(['|', '\0']))
            .filter(|s| !s.is_empty())
    }
}

/// EPSG code keys first, then WKT carried in a citation key.
fn resolve_crs(keys: &GeoKeys) -> Option<Crs> {
    let code = keys
        .short(PROJECTED_CS_TYPE_GEO_KEY)
        .or_else(|| keys.short(GEOGRAPHIC_TYPE_GEO_KEY))
        .filter(|&code| code != 0 && code != USER_DEFINED);
    if let Some(code) = code {
        match decode_crs(&format!("EPSG:{code}")) {
            Ok(crs) => return Some(crs),
            Err(e) => warn!(code = code, error = %e, "Unknown EPSG code in GeoKeys"),
        }
    }

    [GT_CITATION_GEO_KEY, PCS_CITATION_GEO_KEY, GEOG_CITATION_GEO_KEY]
        .into_iter()
        .filter_map(|id| keys.ascii(id))
        .find_map(|citation| parse_crs_wkt(citation).ok())
}

fn convert_decoding_result(result: DecodingResult) -> Option<Vec<f32>> {
    #[allow(unreachable_patterns)]
    let values = match result {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        _ => return None,
    };
    Some(values)
}

fn encode<W: Write + Seek>(
    coverage: &GridCoverage,
    image: &RenderedImage,
    config: &WriteConfig,
    writer: W,
) -> Result<()> {
    let bands = image.band_count();
    let samples = u16::try_from(bands)
        .map_err(|_| CoverageError::encode(format!("too many bands ({bands})")))?;
    let width = u32::try_from(image.width())
        .map_err(|_| CoverageError::encode("image too wide for TIFF"))?;
    let height = u32::try_from(image.height())
        .map_err(|_| CoverageError::encode("image too tall for TIFF"))?;

    let mut encoder = TiffEncoder::new(writer)?;
    let mut dir = encoder.new_directory()?;

    dir.write_tag(Tag::ImageWidth, width)?;
    dir.write_tag(Tag::ImageLength, height)?;
    dir.write_tag(Tag::BitsPerSample, vec![32u16; bands].as_slice())?;
    dir.write_tag(Tag::Compression, config.compression.tag_value())?;
    dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_BLACK_IS_ZERO)?;
    dir.write_tag(Tag::SamplesPerPixel, samples)?;
    dir.write_tag(Tag::PlanarConfiguration, PLANAR_CHUNKY)?;
    dir.write_tag(Tag::SampleFormat, vec![SAMPLE_FORMAT_IEEE_FLOAT; bands].as_slice())?;
    if bands > 1 {
        // unspecified extra samples
        dir.write_tag(Tag::ExtraSamples, vec![0u16; bands - 1].as_slice())?;
    }
    dir.write_tag(Tag::TileWidth, config.tile_width)?;
    dir.write_tag(Tag::TileLength, config.tile_height)?;

    write_georeferencing(&mut dir, coverage)?;
    write_band_metadata(&mut dir, coverage.bands())?;

    let (tile_width, tile_height) = (config.tile_width as usize, config.tile_height as usize);
    let tiles_across = image.width().div_ceil(tile_width);
    let tiles_down = image.height().div_ceil(tile_height);
    let mut offsets = Vec::with_capacity(tiles_across * tiles_down);
    let mut byte_counts = Vec::with_capacity(tiles_across * tiles_down);

    for tile_row in 0..tiles_down {
        for tile_col in 0..tiles_across {
            let raw = tile_bytes(
                image,
                coverage.bands(),
                tile_col * tile_width,
                tile_row * tile_height,
                tile_width,
                tile_height,
            );
            let data = compress(raw, config)?;
            let offset = dir.write_data(data.as_slice())?;
            offsets.push(
                u32::try_from(offset)
                    .map_err(|_| CoverageError::encode("file exceeds 4 GiB classic TIFF limit"))?,
            );
            byte_counts.push(data.len() as u32);
        }
    }

    dir.write_tag(Tag::TileOffsets, offsets.as_slice())?;
    dir.write_tag(Tag::TileByteCounts, byte_counts.as_slice())?;
    dir.finish()?;
    Ok(())
}

/// One full-size tile of interleaved native-endian f32 samples. Parts of
/// edge tiles beyond the image are padded with each band's fill value.
fn tile_bytes(
    image: &RenderedImage,
    bands: &[SampleDimension],
    col_off: usize,
    row_off: usize,
    tile_width: usize,
    tile_height: usize,
) -> Vec<u8> {
    let planes: Vec<&[f32]> = image.bands().collect();
    let fills: Vec<f32> = bands.iter().map(SampleDimension::fill_value).collect();
    let mut bytes = Vec::with_capacity(tile_width * tile_height * planes.len() * 4);

    for row in row_off..row_off + tile_height {
        for col in col_off..col_off + tile_width {
            let inside = row < image.height() && col < image.width();
            for (plane, &fill) in planes.iter().zip(&fills) {
                let value = if inside {
                    plane[row * image.width() + col]
                } else {
                    fill
                };
                bytes.extend_from_slice(&value.to_ne_bytes());
            }
        }
    }
    bytes
}

fn compress(raw: Vec<u8>, config: &WriteConfig) -> Result<Vec<u8>> {
    match config.compression {
        TiffCompression::None => Ok(raw),
        TiffCompression::Lzw => weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .encode(&raw)
            .map_err(|e| CoverageError::encode(format!("LZW: {e}"))),
        TiffCompression::Deflate => {
            let mut encoder =
                ZlibEncoder::new(Vec::new(), flate2::Compression::new(config.deflate_level()));
            encoder
                .write_all(&raw)
                .and_then(|_| encoder.finish())
                .map_err(|e| CoverageError::encode(format!("Deflate: {e}")))
        }
    }
}

fn write_georeferencing<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    coverage: &GridCoverage,
) -> Result<()> {
    let gt = coverage.grid().transform;
    if gt.is_axis_aligned() && gt.pixel_width > 0.0 && gt.pixel_height < 0.0 {
        let pixel_scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        #[rustfmt::skip]
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    let (keys, ascii) = build_geo_keys(coverage.crs());
    dir.write_tag(Tag::Unknown(TAG_GEO_KEY_DIRECTORY), keys.as_slice())?;
    if !ascii.is_empty() {
        dir.write_tag(Tag::Unknown(TAG_GEO_ASCII_PARAMS), ascii.as_str())?;
    }
    Ok(())
}

/// GeoKeyDirectory entries (sorted by key ID) and the ASCII parameter block.
fn build_geo_keys(crs: &Crs) -> (Vec<u16>, String) {
    let geographic = crs.is_geographic();
    let mut entries: Vec<[u16; 4]> = vec![
        [
            GT_MODEL_TYPE_GEO_KEY,
            0,
            1,
            if geographic {
                MODEL_TYPE_GEOGRAPHIC
            } else {
                MODEL_TYPE_PROJECTED
            },
        ],
        [GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
    ];

    let mut ascii = String::new();
    let wkt = ascii_safe(crs.wkt());
    match u16::try_from(wkt.len() + 1) {
        Ok(count) => {
            entries.push([GT_CITATION_GEO_KEY, TAG_GEO_ASCII_PARAMS, count, 0]);
            ascii.push_str(&wkt);
            ascii.push('|');
        }
        Err(_) => warn!(crs = %crs, "WKT too long for GeoAsciiParams, writing code only"),
    }

    let code = crs
        .identifier()
        .and_then(|id| id.epsg_code())
        .unwrap_or(USER_DEFINED);
    let code_key = if geographic {
        GEOGRAPHIC_TYPE_GEO_KEY
    } else {
        PROJECTED_CS_TYPE_GEO_KEY
    };
    entries.push([code_key, 0, 1, code]);

    let mut directory = vec![1, 1, 0, entries.len() as u16];
    directory.extend(entries.iter().flatten());
    (directory, ascii)
}

/// TIFF ASCII fields are 7-bit; `|` terminates GeoAsciiParams entries.
fn ascii_safe(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii() && c != '|' && c != '\0' {
                c
            } else {
                '?'
            }
        })
        .collect()
}

fn write_band_metadata<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    bands: &[SampleDimension],
) -> Result<()> {
    // GDAL_NODATA holds a single value for every band
    let mut no_data = bands.iter().filter_map(|band| band.no_data);
    if let Some(value) = no_data.next() {
        if no_data.any(|other| other.to_bits() != value.to_bits()) {
            warn!(no_data = value, "Bands disagree on no-data, writing the first");
        }
        dir.write_tag(Tag::Unknown(TAG_GDAL_NODATA), value.to_string().as_str())?;
    }

    let xml = gdal_metadata_xml(bands).map_err(|e| CoverageError::encode(e.to_string()))?;
    dir.write_tag(Tag::Unknown(TAG_GDAL_METADATA), xml.as_str())?;
    Ok(())
}

/// `<GDALMetadata>` block carrying one DESCRIPTION item per band.
fn gdal_metadata_xml(bands: &[SampleDimension]) -> std::result::Result<String, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("GDALMetadata")))?;
    for (index, band) in bands.iter().enumerate() {
        let sample = index.to_string();
        let item = BytesStart::new("Item").with_attributes([
            ("name", "DESCRIPTION"),
            ("sample", sample.as_str()),
            ("role", "description"),
        ]);
        writer.write_event(Event::Start(item))?;
        writer.write_event(Event::Text(BytesText::new(&ascii_safe(&band.name))))?;
        writer.write_event(Event::End(BytesEnd::new("Item")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("GDALMetadata")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Band descriptions from a GDAL_METADATA block, keyed by sample index.
///
/// Malformed XML keeps whatever was read before the error.
fn parse_band_descriptions(xml: &str) -> BTreeMap<usize, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut names = BTreeMap::new();
    // sample index of the open description item
    let mut open_item: Option<usize> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"Item" => {
                open_item = description_sample(&e);
                text.clear();
            }
            Ok(Event::Text(t)) if open_item.is_some() => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(e) => {
                    warn!(error = %e, "Bad entity in GDAL_METADATA");
                    break;
                }
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"Item" => {
                if let Some(sample) = open_item.take() {
                    names.insert(sample, std::mem::take(&mut text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "Malformed GDAL_METADATA"
                );
                break;
            }
            _ => {}
        }
    }
    names
}

/// Sample index of an `<Item role="description">`, `None` for other items.
fn description_sample(item: &BytesStart<'_>) -> Option<usize> {
    let mut sample = None;
    let mut is_description = false;
    for attr in item.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"role" => is_description = value == "description",
            b"sample" => sample = value.parse::<usize>().ok(),
            _ => {}
        }
    }
    sample.filter(|_| is_description)
}

/// Write `bytes` to a temporary file beside `path`, then rename it over
/// `path`.
fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| CoverageError::io(parent, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CoverageError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| CoverageError::io(path, e.error))?;
    Ok(())
}
