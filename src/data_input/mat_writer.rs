// src/data_input/mat_writer.rs

// Minimal Level 5 MAT-file writer: numeric (double/int16) and char arrays,
// either endianness, optionally zlib-compressed per variable. Produces the
// same layout MATLAB's `save` does, which is all the sample generator and the
// test fixtures need.

use std::io::{self, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::Array2;

use crate::data_input::mat_reader::{
    padded_len, ArrayClass, Endian, HEADER_LEN, HEADER_TEXT_LEN, MAT_V5_VERSION, MI_COMPRESSED,
    MI_DOUBLE, MI_INT16, MI_INT32, MI_INT8, MI_MATRIX, MI_UINT16, MI_UINT32,
};

const HEADER_TEXT: &str = "MATLAB 5.0 MAT-file, Platform: rust, Created by: mat_plot_render";

enum Payload {
    Double(Vec<f64>),
    Int16(Vec<i16>),
    Char(Vec<u16>),
}

struct Entry {
    name: String,
    dims: Vec<usize>,
    payload: Payload,
}

pub struct MatWriter {
    endian: Endian,
    compress: bool,
    entries: Vec<Entry>,
}

impl Default for MatWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MatWriter {
    pub fn new() -> Self {
        Self {
            endian: Endian::Little,
            compress: false,
            entries: Vec::new(),
        }
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Wrap every variable in an `miCOMPRESSED` element.
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Adds a 2-D matrix, stored column-major as MATLAB expects.
    pub fn add_matrix(&mut self, name: &str, matrix: &Array2<f64>) -> &mut Self {
        let (rows, cols) = matrix.dim();
        let values = matrix.t().iter().copied().collect();
        self.push(name, vec![rows, cols], Payload::Double(values))
    }

    /// Adds a row vector (`1xN`), the shape MATLAB gives `linspace` results.
    pub fn add_vector(&mut self, name: &str, values: &[f64]) -> &mut Self {
        self.push(name, vec![1, values.len()], Payload::Double(values.to_vec()))
    }

    /// Adds a double array with explicit dimensions and column-major values.
    pub fn add_array(&mut self, name: &str, dims: &[usize], column_major: &[f64]) -> &mut Self {
        self.push(name, dims.to_vec(), Payload::Double(column_major.to_vec()))
    }

    pub fn add_int16_array(&mut self, name: &str, dims: &[usize], column_major: &[i16]) -> &mut Self {
        self.push(name, dims.to_vec(), Payload::Int16(column_major.to_vec()))
    }

    pub fn add_char(&mut self, name: &str, text: &str) -> &mut Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.push(name, vec![1, units.len()], Payload::Char(units))
    }

    fn push(&mut self, name: &str, dims: Vec<usize>, payload: Payload) -> &mut Self {
        self.entries.push(Entry {
            name: name.to_string(),
            dims,
            payload,
        });
        self
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = self.header();
        for entry in &self.entries {
            let matrix = self.encode_matrix(entry);
            if self.compress {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&matrix)?;
                let compressed = encoder.finish()?;
                self.put_tag(&mut out, MI_COMPRESSED, compressed.len());
                out.extend_from_slice(&compressed);
            } else {
                out.extend_from_slice(&matrix);
            }
        }
        Ok(out)
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_bytes()?)
    }

    fn header(&self) -> Vec<u8> {
        let mut header = vec![b' '; HEADER_LEN];
        header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT.as_bytes());
        // Subsystem data offset: unused.
        header[HEADER_TEXT_LEN..HEADER_TEXT_LEN + 8].fill(0);
        let mut version = [0u8; 2];
        match self.endian {
            Endian::Little => LittleEndian::write_u16(&mut version, MAT_V5_VERSION),
            Endian::Big => BigEndian::write_u16(&mut version, MAT_V5_VERSION),
        }
        header[HEADER_TEXT_LEN + 8..HEADER_TEXT_LEN + 10].copy_from_slice(&version);
        header[HEADER_TEXT_LEN + 10..HEADER_LEN].copy_from_slice(&self.endian.indicator());
        header
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        let mut word = [0u8; 4];
        match self.endian {
            Endian::Little => LittleEndian::write_u32(&mut word, value),
            Endian::Big => BigEndian::write_u32(&mut word, value),
        }
        out.extend_from_slice(&word);
    }

    fn put_tag(&self, out: &mut Vec<u8>, data_type: u32, len: usize) {
        self.put_u32(out, data_type);
        self.put_u32(out, len as u32);
    }

    fn pad(out: &mut Vec<u8>, payload_len: usize) {
        out.resize(out.len() + padded_len(payload_len) - payload_len, 0);
    }

    fn encode_matrix(&self, entry: &Entry) -> Vec<u8> {
        let class = match entry.payload {
            Payload::Double(_) => ArrayClass::Double,
            Payload::Int16(_) => ArrayClass::Int16,
            Payload::Char(_) => ArrayClass::Char,
        };

        let mut body = Vec::new();

        self.put_tag(&mut body, MI_UINT32, 8);
        self.put_u32(&mut body, class.code() as u32);
        self.put_u32(&mut body, 0);

        self.put_tag(&mut body, MI_INT32, entry.dims.len() * 4);
        for &dim in &entry.dims {
            self.put_u32(&mut body, dim as u32);
        }
        Self::pad(&mut body, entry.dims.len() * 4);

        let name = entry.name.as_bytes();
        if !name.is_empty() && name.len() <= 4 {
            // Short names use the packed small-element form, as MATLAB does.
            self.put_u32(&mut body, ((name.len() as u32) << 16) | MI_INT8);
            body.extend_from_slice(name);
            body.resize(body.len() + 4 - name.len(), 0);
        } else {
            self.put_tag(&mut body, MI_INT8, name.len());
            body.extend_from_slice(name);
            Self::pad(&mut body, name.len());
        }

        match &entry.payload {
            Payload::Double(values) => {
                self.put_tag(&mut body, MI_DOUBLE, values.len() * 8);
                for &v in values {
                    let mut buf = [0u8; 8];
                    match self.endian {
                        Endian::Little => LittleEndian::write_f64(&mut buf, v),
                        Endian::Big => BigEndian::write_f64(&mut buf, v),
                    }
                    body.extend_from_slice(&buf);
                }
            }
            Payload::Int16(values) => {
                self.put_tag(&mut body, MI_INT16, values.len() * 2);
                for &v in values {
                    let mut buf = [0u8; 2];
                    match self.endian {
                        Endian::Little => LittleEndian::write_i16(&mut buf, v),
                        Endian::Big => BigEndian::write_i16(&mut buf, v),
                    }
                    body.extend_from_slice(&buf);
                }
                Self::pad(&mut body, values.len() * 2);
            }
            Payload::Char(units) => {
                self.put_tag(&mut body, MI_UINT16, units.len() * 2);
                for &u in units {
                    let mut buf = [0u8; 2];
                    match self.endian {
                        Endian::Little => LittleEndian::write_u16(&mut buf, u),
                        Endian::Big => BigEndian::write_u16(&mut buf, u),
                    }
                    body.extend_from_slice(&buf);
                }
                Self::pad(&mut body, units.len() * 2);
            }
        }

        let mut element = Vec::with_capacity(body.len() + 8);
        self.put_tag(&mut element, MI_MATRIX, body.len());
        element.extend_from_slice(&body);
        element
    }
}
