//! Segment index (`sidx`) decoding.

use tracing::trace;

use crate::boxes::{find_boxes, BoxView, FourCc};
use crate::bytes::{read_u16, read_u32, read_u64};
use crate::error::Error;

/// One media-segment reference decoded from a `sidx` box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidxReference {
    /// Referenced size in bytes.
    pub size: u32,
    /// Subsegment duration in timescale units.
    pub unscaled_duration: u32,
    /// Subsegment duration in seconds.
    pub duration: f64,
    /// First byte of the referenced segment, absolute within the resource
    /// the index was fetched from.
    pub byte_start: u64,
    /// Last byte of the referenced segment, inclusive.
    pub byte_end: u64,
}

/// A decoded segment index.
///
/// References are media references only; a hierarchical index (references
/// to further `sidx` boxes) is rejected as unsupported.
#[derive(Debug, Clone, PartialEq)]
pub struct SidxBox {
    pub version: u8,
    /// Ticks per second for the duration fields.
    pub timescale: u32,
    /// Presentation time of the first referenced subsegment, in timescale
    /// units.
    pub earliest_presentation_time: u64,
    /// Distance from the end of the `sidx` box to the first referenced
    /// byte.
    pub first_offset: u64,
    pub references: Vec<SidxReference>,
}

impl SidxBox {
    /// Decode the first top-level `sidx` box in `data`, if one is present.
    pub fn from_buffer(data: &[u8]) -> Result<Option<SidxBox>, Error> {
        let boxes = find_boxes(data, &[FourCc::SIDX])?;
        match boxes.first() {
            Some(view) => Self::from_box(view).map(Some),
            None => Ok(None),
        }
    }

    /// Decode a located `sidx` box.
    pub fn from_box(view: &BoxView<'_>) -> Result<SidxBox, Error> {
        let payload = view.data;
        if payload.is_empty() {
            return Err(Error::BufferUnderflow { need: 1, have: 0 });
        }
        let version = payload[0];

        // Version, flags and reference_ID precede the timescale.
        let mut offset = if version == 0 { 8 } else { 16 };
        let timescale = read_u32(payload, offset)?;
        offset += 4;
        if timescale == 0 {
            return Err(Error::Unsupported("sidx with zero timescale".into()));
        }

        let (earliest_presentation_time, first_offset) = if version == 0 {
            let ept = read_u32(payload, offset)? as u64;
            let first = read_u32(payload, offset + 4)? as u64;
            offset += 8;
            (ept, first)
        } else {
            let ept = read_u64(payload, offset)?;
            let first = read_u64(payload, offset + 8)?;
            offset += 16;
            (ept, first)
        };

        // Two reserved bytes, then the reference count.
        offset += 2;
        let reference_count = read_u16(payload, offset)? as usize;
        offset += 2;

        let mut references = Vec::with_capacity(reference_count);
        let mut cursor = view.end as u64 + first_offset;
        for _ in 0..reference_count {
            let head = read_u32(payload, offset)?;
            if head & 0x8000_0000 != 0 {
                return Err(Error::Unsupported(
                    "hierarchical sidx reference".into(),
                ));
            }
            let size = head & 0x7FFF_FFFF;
            if size == 0 {
                // A zero-size reference cannot form an inclusive byte
                // range.
                return Err(Error::Unsupported(
                    "zero-size sidx reference".into(),
                ));
            }
            let unscaled_duration = read_u32(payload, offset + 4)?;
            // Four bytes of SAP flags are not consumed.
            offset += 12;

            let byte_start = cursor;
            let byte_end = cursor + size as u64 - 1;
            cursor += size as u64;
            references.push(SidxReference {
                size,
                unscaled_duration,
                duration: unscaled_duration as f64 / timescale as f64,
                byte_start,
                byte_end,
            });
        }
        trace!(
            timescale,
            reference_count,
            first_offset,
            "decoded segment index"
        );
        Ok(SidxBox {
            version,
            timescale,
            earliest_presentation_time,
            first_offset,
            references,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sidx_v0(
        timescale: u32,
        ept: u32,
        first_offset: u32,
        refs: &[(u32, u32)],
    ) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0, 0, 0, 0]); // version + flags
        payload.extend_from_slice(&1u32.to_be_bytes()); // reference_ID
        payload.extend_from_slice(&timescale.to_be_bytes());
        payload.extend_from_slice(&ept.to_be_bytes());
        payload.extend_from_slice(&first_offset.to_be_bytes());
        payload.extend_from_slice(&[0, 0]); // reserved
        payload.extend_from_slice(&(refs.len() as u16).to_be_bytes());
        for (size, duration) in refs {
            payload.extend_from_slice(&size.to_be_bytes());
            payload.extend_from_slice(&duration.to_be_bytes());
            payload.extend_from_slice(&[0, 0, 0, 0]); // SAP
        }
        let mut out = Vec::new();
        out.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
        out.extend_from_slice(b"sidx");
        out.extend(payload);
        out
    }

    #[test]
    fn test_decodes_v0_references() {
        let data = make_sidx_v0(1000, 2000, 0, &[(100, 2000), (50, 1000)]);
        let sidx = SidxBox::from_buffer(&data).unwrap().unwrap();

        assert_eq!(sidx.version, 0);
        assert_eq!(sidx.timescale, 1000);
        assert_eq!(sidx.earliest_presentation_time, 2000);
        assert_eq!(sidx.references.len(), 2);

        let first = sidx.references[0];
        assert_eq!(first.byte_start, data.len() as u64);
        assert_eq!(first.byte_end, data.len() as u64 + 99);
        assert_eq!(first.duration, 2.0);

        // Consecutive references are byte-contiguous.
        let second = sidx.references[1];
        assert_eq!(second.byte_start, first.byte_end + 1);
        assert_eq!(second.duration, 1.0);

        for r in &sidx.references {
            assert_eq!(
                r.duration * sidx.timescale as f64,
                r.unscaled_duration as f64
            );
        }
    }

    #[test]
    fn test_first_offset_shifts_byte_ranges() {
        let data = make_sidx_v0(90000, 0, 40, &[(500, 90000)]);
        let sidx = SidxBox::from_buffer(&data).unwrap().unwrap();
        assert_eq!(sidx.references[0].byte_start, data.len() as u64 + 40);
    }

    #[test]
    fn test_rejects_hierarchical_references() {
        let data = make_sidx_v0(1000, 0, 0, &[(0x8000_0064, 1000)]);
        assert!(matches!(
            SidxBox::from_buffer(&data),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_zero_size_references() {
        // byte_end is inclusive; a zero-size reference would invert it
        // below byte_start.
        let data = make_sidx_v0(1000, 0, 0, &[(100, 1000), (0, 1000)]);
        assert!(matches!(
            SidxBox::from_buffer(&data),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_no_sidx_is_none() {
        let mut data = Vec::new();
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(&[0x00; 4]);
        assert_eq!(SidxBox::from_buffer(&data).unwrap(), None);
    }
}
