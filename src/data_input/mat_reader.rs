//! Reader for MATLAB Level 5 MAT-files.
//!
//! A Level 5 file is a 128-byte header followed by a flat sequence of tagged
//! data elements. Variables are `miMATRIX` elements, optionally wrapped in a
//! zlib-compressed `miCOMPRESSED` element (the MATLAB default since v7).
//! Decoding pipeline for one variable:
//!
//! 1. Inflate the element if it is compressed
//! 2. Read the array flags, dimensions and name sub-elements
//! 3. Convert the real part to `f64` (whatever the storage type) and lay it
//!    out column-major into an `ndarray::ArrayD`
//!
//! Only numeric arrays are materialised. Cell, struct, char, sparse, object
//! and logical arrays are reported as skipped.

use std::fmt;
use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use log::debug;
use ndarray::{ArrayD, Axis, IxDyn, ShapeBuilder};

pub const HEADER_LEN: usize = 128;
pub const HEADER_TEXT_LEN: usize = 116;
pub const VERSION_OFFSET: usize = 124;
pub const ENDIAN_OFFSET: usize = 126;
pub const MAT_V5_VERSION: u16 = 0x0100;
pub const MAT_V73_VERSION: u16 = 0x0200;
pub const TAG_LEN: usize = 8;

// Data element types
pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;

// Array flag bits (second byte of the first flags word)
pub const FLAG_COMPLEX: u32 = 0x0800;
pub const FLAG_LOGICAL: u32 = 0x0200;

// Compressed elements inside compressed elements are not produced by MATLAB.
const MAX_COMPRESSION_DEPTH: usize = 2;

/// Byte order declared by the header's endian indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Indicator bytes as stored at offset 126 ("IM" for little endian).
    pub fn indicator(self) -> [u8; 2] {
        match self {
            Endian::Little => *b"IM",
            Endian::Big => *b"MI",
        }
    }

    pub fn from_indicator(bytes: [u8; 2]) -> Option<Self> {
        match &bytes {
            b"IM" => Some(Endian::Little),
            b"MI" => Some(Endian::Big),
            _ => None,
        }
    }

    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    fn read_scalar(self, data_type: u32, buf: &[u8]) -> f64 {
        match (self, data_type) {
            (_, MI_INT8) => buf[0] as i8 as f64,
            (_, MI_UINT8) => buf[0] as f64,
            (Endian::Little, MI_INT16) => LittleEndian::read_i16(buf) as f64,
            (Endian::Big, MI_INT16) => BigEndian::read_i16(buf) as f64,
            (Endian::Little, MI_UINT16) => LittleEndian::read_u16(buf) as f64,
            (Endian::Big, MI_UINT16) => BigEndian::read_u16(buf) as f64,
            (Endian::Little, MI_INT32) => LittleEndian::read_i32(buf) as f64,
            (Endian::Big, MI_INT32) => BigEndian::read_i32(buf) as f64,
            (Endian::Little, MI_UINT32) => LittleEndian::read_u32(buf) as f64,
            (Endian::Big, MI_UINT32) => BigEndian::read_u32(buf) as f64,
            (Endian::Little, MI_INT64) => LittleEndian::read_i64(buf) as f64,
            (Endian::Big, MI_INT64) => BigEndian::read_i64(buf) as f64,
            (Endian::Little, MI_UINT64) => LittleEndian::read_u64(buf) as f64,
            (Endian::Big, MI_UINT64) => BigEndian::read_u64(buf) as f64,
            (Endian::Little, MI_SINGLE) => LittleEndian::read_f32(buf) as f64,
            (Endian::Big, MI_SINGLE) => BigEndian::read_f32(buf) as f64,
            (Endian::Little, _) => LittleEndian::read_f64(buf),
            (Endian::Big, _) => BigEndian::read_f64(buf),
        }
    }

    /// Decodes a numeric data element payload into `f64` values.
    pub fn decode_numeric(self, data_type: u32, bytes: &[u8]) -> Result<Vec<f64>, MatReadError> {
        let width = numeric_width(data_type).ok_or(MatReadError::UnsupportedDataType(data_type))?;
        if bytes.len() % width != 0 {
            return Err(MatReadError::Malformed(format!(
                "{} payload bytes is not a multiple of the {}-byte element size",
                bytes.len(),
                width
            )));
        }
        Ok(bytes
            .chunks_exact(width)
            .map(|chunk| self.read_scalar(data_type, chunk))
            .collect())
    }
}

/// Byte width of one value of a numeric data element type.
pub fn numeric_width(data_type: u32) -> Option<usize> {
    match data_type {
        MI_INT8 | MI_UINT8 => Some(1),
        MI_INT16 | MI_UINT16 => Some(2),
        MI_INT32 | MI_UINT32 | MI_SINGLE => Some(4),
        MI_DOUBLE | MI_INT64 | MI_UINT64 => Some(8),
        _ => None,
    }
}

/// MATLAB array class stored in the low byte of the array flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayClass {
    Cell,
    Struct,
    Object,
    Char,
    Sparse,
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Function,
    Opaque,
    Unknown(u8),
}

impl ArrayClass {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ArrayClass::Cell,
            2 => ArrayClass::Struct,
            3 => ArrayClass::Object,
            4 => ArrayClass::Char,
            5 => ArrayClass::Sparse,
            6 => ArrayClass::Double,
            7 => ArrayClass::Single,
            8 => ArrayClass::Int8,
            9 => ArrayClass::UInt8,
            10 => ArrayClass::Int16,
            11 => ArrayClass::UInt16,
            12 => ArrayClass::Int32,
            13 => ArrayClass::UInt32,
            14 => ArrayClass::Int64,
            15 => ArrayClass::UInt64,
            16 => ArrayClass::Function,
            17 => ArrayClass::Opaque,
            other => ArrayClass::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ArrayClass::Cell => 1,
            ArrayClass::Struct => 2,
            ArrayClass::Object => 3,
            ArrayClass::Char => 4,
            ArrayClass::Sparse => 5,
            ArrayClass::Double => 6,
            ArrayClass::Single => 7,
            ArrayClass::Int8 => 8,
            ArrayClass::UInt8 => 9,
            ArrayClass::Int16 => 10,
            ArrayClass::UInt16 => 11,
            ArrayClass::Int32 => 12,
            ArrayClass::UInt32 => 13,
            ArrayClass::Int64 => 14,
            ArrayClass::UInt64 => 15,
            ArrayClass::Function => 16,
            ArrayClass::Opaque => 17,
            ArrayClass::Unknown(code) => code,
        }
    }

    pub fn is_numeric(self) -> bool {
        (6..=15).contains(&self.code())
    }
}

impl fmt::Display for ArrayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayClass::Unknown(code) => write!(f, "unknown class {code}"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

/// Errors that can occur while reading a MAT-file
#[derive(Debug, thiserror::Error)]
pub enum MatReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a Level 5 MAT-file (header text does not start with \"MATLAB\")")]
    NotMatFile,

    #[error("invalid endian indicator {0:?}")]
    BadEndianIndicator([u8; 2]),

    #[error("unsupported MAT-file version 0x{0:04x} (v7.3/HDF5 files are not supported)")]
    UnsupportedVersion(u16),

    #[error("truncated file: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("malformed data element: {0}")]
    Malformed(String),

    #[error("unsupported numeric data type {0}")]
    UnsupportedDataType(u32),

    #[error("variable '{name}': dimensions require {expected} values, found {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// A numeric variable decoded from the file, in MATLAB's logical shape.
#[derive(Debug, Clone)]
pub struct MatVariable {
    pub name: String,
    pub class: ArrayClass,
    pub complex: bool,
    pub data: ArrayD<f64>,
}

/// An array present in the file but not materialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArray {
    pub name: String,
    pub class: ArrayClass,
    pub logical: bool,
}

#[derive(Debug, Clone)]
pub struct MatFile {
    pub header_text: String,
    pub endian: Endian,
    pub variables: Vec<MatVariable>,
    pub skipped: Vec<SkippedArray>,
}

impl MatFile {
    pub fn variable(&self, name: &str) -> Option<&MatVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Reads and decodes a MAT-file from disk.
pub fn read_mat_file(path: &Path) -> Result<MatFile, MatReadError> {
    let bytes = std::fs::read(path)?;
    parse_mat_bytes(&bytes)
}

/// Decodes an in-memory MAT-file image.
pub fn parse_mat_bytes(bytes: &[u8]) -> Result<MatFile, MatReadError> {
    let header = slice_at(bytes, 0, HEADER_LEN)?;
    let text = &header[..HEADER_TEXT_LEN];
    if !text.starts_with(b"MATLAB") {
        return Err(MatReadError::NotMatFile);
    }

    let indicator = [header[ENDIAN_OFFSET], header[ENDIAN_OFFSET + 1]];
    let endian =
        Endian::from_indicator(indicator).ok_or(MatReadError::BadEndianIndicator(indicator))?;
    let version = endian.read_u16(&header[VERSION_OFFSET..ENDIAN_OFFSET]);
    if version != MAT_V5_VERSION {
        return Err(MatReadError::UnsupportedVersion(version));
    }

    let header_text = String::from_utf8_lossy(text)
        .trim_end_matches([' ', '\0'])
        .to_string();
    debug!("MAT header: '{}' ({:?} endian)", header_text, endian);

    let mut file = MatFile {
        header_text,
        endian,
        variables: Vec::new(),
        skipped: Vec::new(),
    };
    parse_elements(&bytes[HEADER_LEN..], endian, 0, &mut file)?;
    Ok(file)
}

/// Removes every length-1 axis. A `1xN` MATLAB vector becomes rank 1 and a
/// `1x1` scalar becomes rank 0; empty axes are kept.
pub fn squeeze(mut array: ArrayD<f64>) -> ArrayD<f64> {
    for axis in (0..array.ndim()).rev() {
        if array.len_of(Axis(axis)) == 1 {
            array = array.index_axis_move(Axis(axis), 0);
        }
    }
    array
}

struct Element<'a> {
    data_type: u32,
    data: &'a [u8],
    next: usize,
}

fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], MatReadError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(MatReadError::Truncated {
            offset,
            needed: len,
        })
}

/// Rounds an element payload length up to the 8-byte element boundary.
pub fn padded_len(len: usize) -> usize {
    (len + 7) & !7
}

fn read_element(buf: &[u8], offset: usize, endian: Endian) -> Result<Element<'_>, MatReadError> {
    let tag = slice_at(buf, offset, TAG_LEN)?;
    let first = endian.read_u32(&tag[..4]);

    // Small data element: type and length packed into the first word,
    // payload in the remaining four tag bytes.
    let small_len = (first >> 16) as usize;
    if small_len != 0 {
        if small_len > 4 {
            return Err(MatReadError::Malformed(format!(
                "small data element at offset {offset} claims {small_len} bytes"
            )));
        }
        return Ok(Element {
            data_type: first & 0xFFFF,
            data: &tag[4..4 + small_len],
            next: offset + TAG_LEN,
        });
    }

    let len = endian.read_u32(&tag[4..8]) as usize;
    let data = slice_at(buf, offset + TAG_LEN, len)?;
    let next = if first == MI_COMPRESSED {
        offset + TAG_LEN + len
    } else {
        offset + TAG_LEN + padded_len(len)
    };
    Ok(Element {
        data_type: first,
        data,
        next,
    })
}

fn parse_elements(
    buf: &[u8],
    endian: Endian,
    depth: usize,
    file: &mut MatFile,
) -> Result<(), MatReadError> {
    let mut offset = 0;
    while offset + TAG_LEN <= buf.len() {
        let element = read_element(buf, offset, endian)?;
        match element.data_type {
            MI_COMPRESSED => {
                if depth >= MAX_COMPRESSION_DEPTH {
                    return Err(MatReadError::Malformed(
                        "compressed elements nested too deeply".to_string(),
                    ));
                }
                let mut inflated = Vec::new();
                ZlibDecoder::new(element.data).read_to_end(&mut inflated)?;
                parse_elements(&inflated, endian, depth + 1, file)?;
            }
            MI_MATRIX => parse_matrix(element.data, endian, file)?,
            other => debug!("Ignoring top-level data element of type {other}"),
        }
        offset = element.next;
    }
    Ok(())
}

fn parse_matrix(data: &[u8], endian: Endian, file: &mut MatFile) -> Result<(), MatReadError> {
    // Zero-length miMATRIX elements are valid placeholders (empty cells).
    if data.is_empty() {
        return Ok(());
    }

    let flags_el = read_element(data, 0, endian)?;
    if flags_el.data_type != MI_UINT32 || flags_el.data.len() < 8 {
        return Err(MatReadError::Malformed(
            "array flags sub-element missing".to_string(),
        ));
    }
    let flags = endian.read_u32(&flags_el.data[..4]);
    let class = ArrayClass::from_code((flags & 0xFF) as u8);
    let complex = flags & FLAG_COMPLEX != 0;
    let logical = flags & FLAG_LOGICAL != 0;

    let dims_el = read_element(data, flags_el.next, endian)?;
    if dims_el.data_type != MI_INT32 || dims_el.data.len() % 4 != 0 {
        return Err(MatReadError::Malformed(
            "dimensions sub-element missing".to_string(),
        ));
    }
    let dims = dims_el
        .data
        .chunks_exact(4)
        .map(|chunk| {
            let dim = endian.read_u32(chunk) as i32;
            usize::try_from(dim)
                .map_err(|_| MatReadError::Malformed(format!("negative dimension {dim}")))
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let name_el = read_element(data, dims_el.next, endian)?;
    let name = String::from_utf8_lossy(name_el.data).into_owned();

    if !class.is_numeric() || logical {
        file.skipped.push(SkippedArray {
            name,
            class,
            logical,
        });
        return Ok(());
    }

    let real_el = read_element(data, name_el.next, endian)?;
    let values = endian.decode_numeric(real_el.data_type, real_el.data)?;
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| MatReadError::Malformed("dimension product overflows".to_string()))?;
    if values.len() != expected {
        return Err(MatReadError::ShapeMismatch {
            name,
            expected,
            actual: values.len(),
        });
    }
    if complex {
        debug!("Variable '{name}' is complex; keeping the real part only");
    }

    // MATLAB stores arrays column-major.
    let array = ArrayD::from_shape_vec(IxDyn(&dims).f(), values)
        .map_err(|e| MatReadError::Malformed(format!("variable '{name}': {e}")))?;
    file.variables.push(MatVariable {
        name,
        class,
        complex,
        data: array,
    });
    Ok(())
}
