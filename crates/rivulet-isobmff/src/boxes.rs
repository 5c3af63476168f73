//! Box location by type path.

use std::fmt;

use crate::bytes::read_u32;
use crate::error::Error;

/// A four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const SIDX: FourCc = FourCc(*b"sidx");
    pub const MOOV: FourCc = FourCc(*b"moov");
    pub const MOOF: FourCc = FourCc(*b"moof");

    pub const fn new(code: [u8; 4]) -> Self {
        Self(code)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "{:02x?}", self.0),
        }
    }
}

/// A located box: its payload slice and its absolute offsets within the
/// buffer it was found in.
#[derive(Debug, Clone, Copy)]
pub struct BoxView<'a> {
    /// Box payload, header excluded.
    pub data: &'a [u8],
    /// Absolute offset of the box header within the scanned buffer.
    pub start: usize,
    /// Absolute offset one past the last byte of the box.
    pub end: usize,
    pub box_type: FourCc,
}

/// Locate every box matching `path`, recursing through payloads.
///
/// A path of `[moov, trak]` yields every `trak` inside every top-level
/// `moov`. Sizes of `0` and `1` both mean "extends to the end of the
/// buffer"; 64-bit extended sizes are not decoded.
pub fn find_boxes<'a>(data: &'a [u8], path: &[FourCc]) -> Result<Vec<BoxView<'a>>, Error> {
    let Some((wanted, rest)) = path.split_first() else {
        return Ok(Vec::new());
    };
    let mut found = Vec::new();
    let mut offset = 0usize;
    while offset + 8 <= data.len() {
        let declared = read_u32(data, offset)? as usize;
        let box_type = FourCc([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]);
        // 0 and 1 are "to end of buffer" sentinels in this reader.
        let end = if declared <= 1 {
            data.len()
        } else {
            let end = offset + declared;
            if end > data.len() {
                return Err(Error::TruncatedBox {
                    box_type: box_type.to_string(),
                    declared,
                    available: data.len() - offset,
                });
            }
            end
        };
        if declared > 1 && declared < 8 {
            return Err(Error::TruncatedBox {
                box_type: box_type.to_string(),
                declared,
                available: data.len() - offset,
            });
        }
        if box_type == *wanted {
            let view = BoxView {
                data: &data[offset + 8..end],
                start: offset,
                end,
                box_type,
            };
            if rest.is_empty() {
                found.push(view);
            } else {
                found.extend(find_boxes(view.data, rest)?);
            }
        }
        offset = end;
    }
    Ok(found)
}
