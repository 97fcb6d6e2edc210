//! PCD (Point Cloud Data) decoding
//!
//! Supports the ASCII, binary and binary_compressed body layouts. Only the
//! `x`, `y` and `z` fields are extracted; every other field is skipped.

use crate::error::DecodeError;
use crate::{lzf, PointCloudFormat, PointDecoder, RawCoordinates};
use tracing::debug;

/// PCD data format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdDataFormat {
    Ascii,
    Binary,
    BinaryCompressed,
}

/// PCD field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdFieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PcdFieldType {
    fn from_declaration(type_char: &str, size: usize) -> Result<Self, DecodeError> {
        let field_type = match (type_char, size) {
            ("I", 1) => PcdFieldType::I8,
            ("I", 2) => PcdFieldType::I16,
            ("I", 4) => PcdFieldType::I32,
            ("I", 8) => PcdFieldType::I64,
            ("U", 1) => PcdFieldType::U8,
            ("U", 2) => PcdFieldType::U16,
            ("U", 4) => PcdFieldType::U32,
            ("U", 8) => PcdFieldType::U64,
            ("F", 4) => PcdFieldType::F32,
            ("F", 8) => PcdFieldType::F64,
            _ => {
                return Err(DecodeError::UnsupportedFieldType {
                    type_char: type_char.to_string(),
                    size,
                })
            }
        };
        Ok(field_type)
    }

    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            PcdFieldType::I8 | PcdFieldType::U8 => 1,
            PcdFieldType::I16 | PcdFieldType::U16 => 2,
            PcdFieldType::I32 | PcdFieldType::U32 | PcdFieldType::F32 => 4,
            PcdFieldType::I64 | PcdFieldType::U64 | PcdFieldType::F64 => 8,
        }
    }

    /// Read one little-endian element at `offset`, or `None` if `bytes` is
    /// too short
    fn read_le(&self, bytes: &[u8], offset: usize) -> Option<f64> {
        let end = offset.checked_add(self.size())?;
        let b = bytes.get(offset..end)?;
        let value = match self {
            PcdFieldType::I8 => b[0] as i8 as f64,
            PcdFieldType::U8 => b[0] as f64,
            PcdFieldType::I16 => i16::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::U16 => u16::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::I32 => i32::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::U32 => u32::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::F32 => f32::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::I64 => i64::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::U64 => u64::from_le_bytes(b.try_into().ok()?) as f64,
            PcdFieldType::F64 => f64::from_le_bytes(b.try_into().ok()?),
        };
        Some(value)
    }
}

/// PCD field definition
#[derive(Debug, Clone, PartialEq)]
pub struct PcdField {
    pub name: String,
    pub field_type: PcdFieldType,
    pub count: usize,
}

impl PcdField {
    /// Bytes occupied by this field in one point record
    pub fn byte_len(&self) -> usize {
        self.field_type.size() * self.count
    }
}

/// PCD header information
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    pub version: Option<String>,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub points: usize,
    pub viewpoint: [f64; 7], // tx, ty, tz, qw, qx, qy, qz
    pub data_format: PcdDataFormat,
}

/// Where one coordinate lives inside a point record
#[derive(Debug, Clone, Copy)]
struct CoordinateSlot {
    field_type: PcdFieldType,
    /// Index of the field's first element among all values of a row
    value_index: usize,
    /// Byte offset inside an interleaved record. In a field-major
    /// (compressed) body the field's block starts at `byte_offset * points`.
    byte_offset: usize,
    /// Bytes per point taken by the whole field
    field_len: usize,
}

impl PcdHeader {
    /// Bytes per interleaved point record
    pub fn point_step(&self) -> usize {
        self.fields.iter().map(PcdField::byte_len).sum()
    }

    /// Whether the header declares a field with this name
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    fn slot(&self, name: &'static str) -> Result<CoordinateSlot, DecodeError> {
        let mut value_index = 0;
        let mut byte_offset = 0;
        for field in &self.fields {
            if field.name == name {
                if field.count == 0 {
                    return Err(DecodeError::InvalidHeaderValue {
                        keyword: "COUNT",
                        value: format!("{name}=0"),
                    });
                }
                return Ok(CoordinateSlot {
                    field_type: field.field_type,
                    value_index,
                    byte_offset,
                    field_len: field.byte_len(),
                });
            }
            value_index += field.count;
            byte_offset += field.byte_len();
        }
        Err(DecodeError::MissingCoordinate(name))
    }

    fn coordinate_slots(&self) -> Result<[CoordinateSlot; 3], DecodeError> {
        Ok([self.slot("x")?, self.slot("y")?, self.slot("z")?])
    }
}

/// Parse the PCD header, returning it with the byte offset where the body starts
pub fn parse_header(bytes: &[u8]) -> Result<(PcdHeader, usize), DecodeError> {
    let mut version = None;
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width = None;
    let mut height = None;
    let mut viewpoint = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    let mut points = None;

    let mut cursor = 0;
    let mut line_no = 0;

    let data_format = loop {
        if cursor >= bytes.len() {
            return Err(DecodeError::UnterminatedHeader);
        }
        line_no += 1;
        let end = bytes[cursor..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| cursor + p + 1)
            .unwrap_or(bytes.len());
        let line = std::str::from_utf8(&bytes[cursor..end])
            .map_err(|_| DecodeError::InvalidUtf8 { line: line_no })?
            .trim();
        cursor = end;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let values = &parts[1..];

        match parts[0] {
            "VERSION" => version = values.first().map(|v| v.to_string()),
            "FIELDS" => names = values.iter().map(|v| v.to_string()).collect(),
            "SIZE" => sizes = parse_list("SIZE", values)?,
            "TYPE" => types = values.iter().map(|v| v.to_string()).collect(),
            "COUNT" => counts = parse_list("COUNT", values)?,
            "WIDTH" => width = Some(parse_single("WIDTH", values)?),
            "HEIGHT" => height = Some(parse_single("HEIGHT", values)?),
            "POINTS" => points = Some(parse_single("POINTS", values)?),
            "VIEWPOINT" => {
                if values.len() >= 7 {
                    for (slot, value) in viewpoint.iter_mut().zip(values) {
                        *slot = value.parse::<f64>().map_err(|_| {
                            DecodeError::InvalidHeaderValue {
                                keyword: "VIEWPOINT",
                                value: value.to_string(),
                            }
                        })?;
                    }
                }
            }
            "DATA" => {
                break match values.first().copied() {
                    Some("ascii") => PcdDataFormat::Ascii,
                    Some("binary") => PcdDataFormat::Binary,
                    Some("binary_compressed") => PcdDataFormat::BinaryCompressed,
                    other => {
                        return Err(DecodeError::UnknownDataFormat(
                            other.unwrap_or_default().to_string(),
                        ))
                    }
                };
            }
            _ => {
                // Ignore unknown header fields
            }
        }
    };

    if names.is_empty() {
        return Err(DecodeError::MissingHeaderField { keyword: "FIELDS" });
    }
    // COUNT is optional and defaults to one element per field
    if counts.is_empty() {
        counts = vec![1; names.len()];
    }
    if names.len() != sizes.len() || names.len() != types.len() || names.len() != counts.len() {
        return Err(DecodeError::FieldDeclarationMismatch);
    }

    let fields = names
        .into_iter()
        .zip(types.iter().zip(sizes.iter().zip(counts.iter())))
        .map(|(name, (type_char, (&size, &count)))| {
            Ok(PcdField {
                name,
                field_type: PcdFieldType::from_declaration(type_char, size)?,
                count,
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    // Field sizes come from the file; make sure a record length fits in usize
    // so `point_step` can stay unchecked.
    let step = fields
        .iter()
        .try_fold(0usize, |step, f| {
            f.field_type
                .size()
                .checked_mul(f.count)
                .and_then(|len| step.checked_add(len))
        })
        .ok_or_else(|| DecodeError::InvalidHeaderValue {
            keyword: "COUNT",
            value: counts_label(&fields),
        })?;
    if step == 0 {
        return Err(DecodeError::InvalidHeaderValue {
            keyword: "COUNT",
            value: counts_label(&fields),
        });
    }

    let width = width.ok_or(DecodeError::MissingHeaderField { keyword: "WIDTH" })?;
    let height = height.ok_or(DecodeError::MissingHeaderField { keyword: "HEIGHT" })?;
    let expected = width
        .checked_mul(height)
        .ok_or_else(|| DecodeError::InvalidHeaderValue {
            keyword: "WIDTH",
            value: format!("{width} (HEIGHT {height})"),
        })?;
    let points = points.unwrap_or(expected);
    if points != expected {
        return Err(DecodeError::PointCountMismatch { points, expected });
    }

    Ok((
        PcdHeader {
            version,
            fields,
            width,
            height,
            points,
            viewpoint,
            data_format,
        },
        cursor,
    ))
}

fn counts_label(fields: &[PcdField]) -> String {
    fields
        .iter()
        .map(|f| f.count.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Body length in bytes for `points` interleaved records
fn body_len(header: &PcdHeader) -> Result<usize, DecodeError> {
    header
        .point_step()
        .checked_mul(header.points)
        .ok_or_else(|| DecodeError::InvalidHeaderValue {
            keyword: "POINTS",
            value: header.points.to_string(),
        })
}

/// Shortest possible ASCII row, `"0 0 0\n"`
const MIN_ASCII_ROW: usize = 6;

fn parse_single(keyword: &'static str, values: &[&str]) -> Result<usize, DecodeError> {
    let value = values.first().copied().unwrap_or_default();
    value.parse::<usize>().map_err(|_| DecodeError::InvalidHeaderValue {
        keyword,
        value: value.to_string(),
    })
}

fn parse_list(keyword: &'static str, values: &[&str]) -> Result<Vec<usize>, DecodeError> {
    values
        .iter()
        .map(|value| {
            value.parse::<usize>().map_err(|_| DecodeError::InvalidHeaderValue {
                keyword,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Decoder for `.pcd` files
pub struct PcdDecoder;

impl PcdDecoder {
    /// Decode a whole PCD file into its header and flat `x, y, z` coordinates
    pub fn decode_with_header(bytes: &[u8]) -> Result<(PcdHeader, RawCoordinates), DecodeError> {
        let (header, body_start) = parse_header(bytes)?;
        let body = &bytes[body_start..];
        let slots = header.coordinate_slots()?;

        debug!(
            points = header.points,
            fields = header.fields.len(),
            format = ?header.data_format,
            "parsed PCD header"
        );

        let coords = match header.data_format {
            PcdDataFormat::Ascii => read_ascii(body, &header, &slots)?,
            PcdDataFormat::Binary => read_binary(body, &header, &slots)?,
            PcdDataFormat::BinaryCompressed => read_compressed(body, &header, &slots)?,
        };
        Ok((header, coords))
    }
}

impl PointDecoder for PcdDecoder {
    fn format(&self) -> PointCloudFormat {
        PointCloudFormat::Pcd
    }

    fn decode(&self, bytes: &[u8]) -> pointview_core::Result<RawCoordinates> {
        let (_, coords) = Self::decode_with_header(bytes)?;
        Ok(coords)
    }
}

fn read_ascii(
    body: &[u8],
    header: &PcdHeader,
    slots: &[CoordinateSlot; 3],
) -> Result<RawCoordinates, DecodeError> {
    let text = std::str::from_utf8(body).map_err(|e| DecodeError::InvalidUtf8 {
        line: body[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1,
    })?;
    let needed = slots.iter().map(|s| s.value_index + 1).max().unwrap_or(3);

    // POINTS is untrusted; never reserve more rows than the body can hold
    let mut coords = Vec::with_capacity(header.points.min(body.len() / MIN_ASCII_ROW) * 3);
    let mut rows = 0;

    for line in text.lines() {
        if rows == header.points {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split_whitespace().collect();
        if values.len() < needed {
            return Err(DecodeError::ShortRow {
                row: rows,
                found: values.len(),
                expected: needed,
            });
        }
        for slot in slots {
            // Unparseable tokens become NaN and are filtered downstream
            coords.push(values[slot.value_index].parse::<f64>().unwrap_or(f64::NAN));
        }
        rows += 1;
    }

    if rows < header.points {
        return Err(DecodeError::Truncated {
            expected: header.points,
            actual: rows,
        });
    }
    Ok(coords)
}

fn read_binary(
    body: &[u8],
    header: &PcdHeader,
    slots: &[CoordinateSlot; 3],
) -> Result<RawCoordinates, DecodeError> {
    let step = header.point_step();
    let expected = body_len(header)?;
    if body.len() < expected {
        return Err(DecodeError::Truncated {
            expected,
            actual: body.len(),
        });
    }

    let mut coords = Vec::with_capacity(header.points * 3);
    for record in body[..expected].chunks_exact(step) {
        for slot in slots {
            let value = slot
                .field_type
                .read_le(record, slot.byte_offset)
                .ok_or(DecodeError::Truncated {
                    expected: step,
                    actual: record.len(),
                })?;
            coords.push(value);
        }
    }
    Ok(coords)
}

fn read_compressed(
    body: &[u8],
    header: &PcdHeader,
    slots: &[CoordinateSlot; 3],
) -> Result<RawCoordinates, DecodeError> {
    if body.len() < 8 {
        return Err(DecodeError::Truncated {
            expected: 8,
            actual: body.len(),
        });
    }
    let compressed_len = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
    let decompressed_len = u32::from_le_bytes([body[4], body[5], body[6], body[7]]) as usize;

    let payload = body
        .get(8..8 + compressed_len)
        .ok_or(DecodeError::Truncated {
            expected: 8 + compressed_len,
            actual: body.len(),
        })?;
    let expected = body_len(header)?;
    if decompressed_len != expected {
        return Err(DecodeError::Truncated {
            expected,
            actual: decompressed_len,
        });
    }
    let data = lzf::decompress(payload, decompressed_len)?;

    // Field-major layout: each field's values for all points are contiguous.
    let mut coords = Vec::with_capacity(header.points * 3);
    for i in 0..header.points {
        for slot in slots {
            let offset = slot.byte_offset * header.points + i * slot.field_len;
            let value = slot
                .field_type
                .read_le(&data, offset)
                .ok_or(DecodeError::Truncated {
                    expected,
                    actual: data.len(),
                })?;
            coords.push(value);
        }
    }
    Ok(coords)
}
