//! Marker collection payload codec
//!
//! Little-endian binary layout, one collection per payload:
//!
//! ```text
//! version:u8  count:u32  marker*count
//! marker = frame_id:str  sec:i32  nanosec:u32  namespace:str  id:i64
//!          kind:u8  action:u8  position:3xf64  orientation:4xf64
//!          scale:3xf64  color:4xf32
//! str    = len:u16  utf8
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use skelbridge_core::{BridgeError, BridgeResult, BusTime, Point3};

use crate::{Color, Marker, MarkerAction, MarkerArray, MarkerKind, Orientation};

/// Payload format version
pub const CODEC_VERSION: u8 = 1;

/// Fixed part of one encoded marker (everything but the two strings)
const MARKER_FIXED_SIZE: usize = 2 + 4 + 4 + 2 + 8 + 1 + 1 + 24 + 32 + 24 + 16;

/// Marker collection codec
pub struct MarkerCodec;

impl MarkerCodec {
    /// Serialize a collection
    pub fn encode(array: &MarkerArray) -> Bytes {
        let mut buf = BytesMut::with_capacity(5 + array.len() * (MARKER_FIXED_SIZE + 24));
        buf.put_u8(CODEC_VERSION);
        buf.put_u32_le(array.len() as u32);

        for marker in array.iter() {
            put_str(&mut buf, &marker.frame_id);
            buf.put_i32_le(marker.stamp.sec);
            buf.put_u32_le(marker.stamp.nanosec);
            put_str(&mut buf, &marker.namespace);
            buf.put_i64_le(marker.id);
            buf.put_u8(marker.kind as u8);
            buf.put_u8(marker.action as u8);
            put_point(&mut buf, marker.position);
            buf.put_f64_le(marker.orientation.x);
            buf.put_f64_le(marker.orientation.y);
            buf.put_f64_le(marker.orientation.z);
            buf.put_f64_le(marker.orientation.w);
            put_point(&mut buf, marker.scale);
            buf.put_f32_le(marker.color.r);
            buf.put_f32_le(marker.color.g);
            buf.put_f32_le(marker.color.b);
            buf.put_f32_le(marker.color.a);
        }

        buf.freeze()
    }

    /// Parse a collection
    pub fn decode(data: &[u8]) -> BridgeResult<MarkerArray> {
        let mut buf = data;
        ensure(&buf, 5)?;

        let version = buf.get_u8();
        if version != CODEC_VERSION {
            return Err(BridgeError::LogFormat(format!(
                "Unsupported payload version {}",
                version
            )));
        }

        let count = buf.get_u32_le() as usize;
        let mut markers = Vec::with_capacity(count.min(buf.remaining() / MARKER_FIXED_SIZE));

        for _ in 0..count {
            let frame_id = get_str(&mut buf)?;
            ensure(&buf, 8)?;
            let stamp = BusTime {
                sec: buf.get_i32_le(),
                nanosec: buf.get_u32_le(),
            };
            let namespace = get_str(&mut buf)?;
            ensure(&buf, 8 + 1 + 1 + 24 + 32 + 24 + 16)?;

            let id = buf.get_i64_le();
            let kind = MarkerKind::from_byte(buf.get_u8())
                .ok_or_else(|| BridgeError::LogFormat("Unknown marker kind".into()))?;
            let action = MarkerAction::from_byte(buf.get_u8())
                .ok_or_else(|| BridgeError::LogFormat("Unknown marker action".into()))?;
            let position = get_point(&mut buf);
            let orientation = Orientation {
                x: buf.get_f64_le(),
                y: buf.get_f64_le(),
                z: buf.get_f64_le(),
                w: buf.get_f64_le(),
            };
            let scale = get_point(&mut buf);
            let color = Color {
                r: buf.get_f32_le(),
                g: buf.get_f32_le(),
                b: buf.get_f32_le(),
                a: buf.get_f32_le(),
            };

            markers.push(Marker {
                frame_id,
                stamp,
                namespace,
                id,
                kind,
                action,
                position,
                orientation,
                scale,
                color,
            });
        }

        if buf.has_remaining() {
            return Err(BridgeError::LogFormat(format!(
                "{} trailing bytes after marker collection",
                buf.remaining()
            )));
        }

        Ok(MarkerArray { markers })
    }
}

fn ensure(buf: &&[u8], needed: usize) -> BridgeResult<()> {
    if buf.remaining() < needed {
        return Err(BridgeError::LogFormat(format!(
            "Payload truncated: expected {} more bytes, got {}",
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

pub(crate) fn put_str(buf: &mut BytesMut, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    buf.put_u16_le(len as u16);
    buf.put_slice(&bytes[..len]);
}

fn get_str(buf: &mut &[u8]) -> BridgeResult<String> {
    ensure(buf, 2)?;
    let len = buf.get_u16_le() as usize;
    ensure(buf, len)?;
    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| BridgeError::LogFormat(e.to_string()))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

fn put_point(buf: &mut BytesMut, p: Point3) {
    buf.put_f64_le(p.x);
    buf.put_f64_le(p.y);
    buf.put_f64_le(p.z);
}

fn get_point(buf: &mut &[u8]) -> Point3 {
    Point3 {
        x: buf.get_f64_le(),
        y: buf.get_f64_le(),
        z: buf.get_f64_le(),
    }
}
