//! Chunk-level reader for pixel-interleaved TIFFs with several samples per
//! pixel.
//!
//! The `tiff` decoder only expands gray images with one sample, so
//! multi-band files are read here: offsets and layout come from the decoder's
//! tags, the chunks themselves are pulled from the file and decompressed with
//! weezl or flate2.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::ZlibDecoder;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::{CoverageError, Result};

const COMPRESSION_NONE: u32 = 1;
const COMPRESSION_LZW: u32 = 5;
const COMPRESSION_DEFLATE: u32 = 8;
const COMPRESSION_OLD_DEFLATE: u32 = 32946;
const PREDICTOR_NONE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SampleKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleKind {
    fn from_tags(format: u16, bits: u16) -> Option<Self> {
        match (format, bits) {
            (1, 8) => Some(Self::U8),
            (2, 8) => Some(Self::I8),
            (1, 16) => Some(Self::U16),
            (2, 16) => Some(Self::I16),
            (1, 32) => Some(Self::U32),
            (2, 32) => Some(Self::I32),
            (3, 32) => Some(Self::F32),
            (3, 64) => Some(Self::F64),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    fn read(self, bytes: &[u8], little_endian: bool) -> f32 {
        macro_rules! value {
            ($ty:ty, $n:expr) => {{
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&bytes[..$n]);
                if little_endian {
                    <$ty>::from_le_bytes(raw)
                } else {
                    <$ty>::from_be_bytes(raw)
                }
            }};
        }
        match self {
            Self::U8 => f32::from(bytes[0]),
            Self::I8 => f32::from(bytes[0] as i8),
            Self::U16 => f32::from(value!(u16, 2)),
            Self::I16 => f32::from(value!(i16, 2)),
            Self::U32 => value!(u32, 4) as f32,
            Self::I32 => value!(i32, 4) as f32,
            Self::F32 => value!(f32, 4),
            Self::F64 => value!(f64, 8) as f32,
        }
    }
}

/// Chunk grid of one image directory.
struct ChunkLayout {
    chunk_width: usize,
    chunk_height: usize,
    tiled: bool,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

/// Decode every chunk of the current image into one f32 plane per sample.
pub(crate) fn read_interleaved<R: Read + Seek>(
    path: &Path,
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
    samples: usize,
) -> Result<Vec<Vec<f32>>> {
    let fail = |message: String| CoverageError::decode(path, message);

    let compression = decoder.get_tag_u32(Tag::Compression).unwrap_or(COMPRESSION_NONE);
    let predictor = decoder.get_tag_u32(Tag::Predictor).unwrap_or(PREDICTOR_NONE);
    if predictor != PREDICTOR_NONE {
        return Err(fail(format!("predictor {predictor} is not supported for multi-band images")));
    }

    let bits = decoder
        .get_tag_u16_vec(Tag::BitsPerSample)
        .map_err(|e| fail(e.to_string()))?;
    let format = decoder
        .get_tag_u16_vec(Tag::SampleFormat)
        .ok()
        .and_then(|formats| formats.first().copied())
        .unwrap_or(1);
    let first_bits = bits.first().copied().unwrap_or(0);
    if bits.iter().any(|&b| b != first_bits) {
        return Err(fail(format!("mixed bits per sample {bits:?}")));
    }
    let kind = SampleKind::from_tags(format, first_bits)
        .ok_or_else(|| fail(format!("unsupported sample format {format} with {first_bits} bits")))?;

    let layout = chunk_layout(decoder, width, height).map_err(fail)?;
    let chunks_across = width.div_ceil(layout.chunk_width);
    let chunks_down = height.div_ceil(layout.chunk_height);
    let chunk_count = chunks_across
        .checked_mul(chunks_down)
        .ok_or_else(|| fail("chunk count overflows".to_string()))?;
    if layout.offsets.len() < chunk_count || layout.byte_counts.len() < chunk_count {
        return Err(fail(format!(
            "{} chunk offsets for {chunk_count} chunks",
            layout.offsets.len().min(layout.byte_counts.len())
        )));
    }

    let mut file = File::open(path).map_err(|e| fail(e.to_string()))?;
    let file_len = file.metadata().map_err(|e| fail(e.to_string()))?.len();
    let little_endian = read_byte_order(&mut file).map_err(fail)?;

    let pixel_bytes = samples * kind.size();
    let mut planes = vec![vec![0.0f32; width * height]; samples];

    for chunk in 0..chunk_count {
        let (offset, count) = (layout.offsets[chunk], layout.byte_counts[chunk]);
        if offset.saturating_add(count) > file_len {
            return Err(fail(format!("chunk {chunk} extends past end of file")));
        }
        let mut compressed = vec![0u8; count as usize];
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut compressed))
            .map_err(|e| fail(format!("chunk {chunk}: {e}")))?;

        let col_off = (chunk % chunks_across) * layout.chunk_width;
        let row_off = (chunk / chunks_across) * layout.chunk_height;
        let rows = if layout.tiled {
            layout.chunk_height
        } else {
            layout.chunk_height.min(height - row_off)
        };
        let expected = layout.chunk_width * rows * pixel_bytes;
        let raw = decompress(compression, compressed, expected)
            .map_err(|message| fail(format!("chunk {chunk}: {message}")))?;
        if raw.len() < expected {
            return Err(fail(format!(
                "chunk {chunk} holds {} bytes, expected {expected}",
                raw.len()
            )));
        }

        let data_cols = layout.chunk_width.min(width - col_off);
        let data_rows = rows.min(height - row_off);
        for row in 0..data_rows {
            for col in 0..data_cols {
                let pixel = (row * layout.chunk_width + col) * pixel_bytes;
                let target = (row_off + row) * width + col_off + col;
                for (sample, plane) in planes.iter_mut().enumerate() {
                    let at = pixel + sample * kind.size();
                    plane[target] = kind.read(&raw[at..], little_endian);
                }
            }
        }
    }

    Ok(planes)
}

fn chunk_layout<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
) -> std::result::Result<ChunkLayout, String> {
    let tile = (
        decoder.get_tag_u32(Tag::TileWidth).ok(),
        decoder.get_tag_u32(Tag::TileLength).ok(),
    );
    let (chunk_width, chunk_height, tiled, offsets, byte_counts) = match tile {
        (Some(w), Some(h)) => (
            w as usize,
            h as usize,
            true,
            decoder.get_tag_u64_vec(Tag::TileOffsets),
            decoder.get_tag_u64_vec(Tag::TileByteCounts),
        ),
        _ => {
            let rows = decoder
                .get_tag_u32(Tag::RowsPerStrip)
                .map_or(height, |r| (r as usize).min(height));
            (
                width,
                rows,
                false,
                decoder.get_tag_u64_vec(Tag::StripOffsets),
                decoder.get_tag_u64_vec(Tag::StripByteCounts),
            )
        }
    };
    if chunk_width == 0 || chunk_height == 0 {
        return Err("zero chunk dimensions".to_string());
    }
    Ok(ChunkLayout {
        chunk_width,
        chunk_height,
        tiled,
        offsets: offsets.map_err(|e| e.to_string())?,
        byte_counts: byte_counts.map_err(|e| e.to_string())?,
    })
}

fn read_byte_order(file: &mut File) -> std::result::Result<bool, String> {
    let mut magic = [0u8; 2];
    file.read_exact(&mut magic).map_err(|e| e.to_string())?;
    match &magic {
        b"II" => Ok(true),
        b"MM" => Ok(false),
        other => Err(format!("bad byte order mark {other:?}")),
    }
}

fn decompress(
    compression: u32,
    data: Vec<u8>,
    expected: usize,
) -> std::result::Result<Vec<u8>, String> {
    match compression {
        COMPRESSION_NONE => Ok(data),
        COMPRESSION_LZW => weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .decode(&data)
            .map_err(|e| format!("LZW: {e}")),
        COMPRESSION_DEFLATE | COMPRESSION_OLD_DEFLATE => {
            let mut out = Vec::with_capacity(expected);
            ZlibDecoder::new(data.as_slice())
                .read_to_end(&mut out)
                .map_err(|e| format!("Deflate: {e}"))?;
            Ok(out)
        }
        other => Err(format!("compression {other} is not supported for multi-band images")),
    }
}
