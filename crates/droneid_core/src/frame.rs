use crate::params::MESSAGE_BYTES;
use std::f64::consts::PI;

// Message region layout of the decoded 176-byte payload. Offsets are into
// the payload; the message occupies bytes [0, 91).
//
//  FIELD          START  LEN  ENCODING
//  packet_len       0     1   u8, typically 88
//  packet_type      1     1   u8, typically 16
//  version          2     1   u8, typically 2
//  sequence_num     3     2   le i16, running counter
//  state_info       5     2   u8[2], meaning unknown
//  serial           7    16   ASCII, zero padded
//  uav_lon         23     4   le i32, scaled degrees
//  uav_lat         27     4   le i32, scaled degrees
//  uav_height      31     2   le i16, metres
//  uav_alt         33     2   le i16, decimetres
//  uav_vel_n/e/u   35     6   le i16 each, cm/s
//  uav_yaw         41     2   le i16, centidegrees
//  pilot_time      43     8   le u64, UNIX ms
//  pilot_lat       51     4   le i32, scaled degrees
//  pilot_lon       55     4   le i32, scaled degrees
//  home_lon        59     4   le i32, scaled degrees
//  home_lat        63     4   le i32, scaled degrees
//  product_type    67     1   u8
//  uuid_len        68     1   u8, at most 19
//  uuid            69    19   bytes, zero padded
//  terminator      88     1   0x00
//  payload_crc     89     2   inner crc over bytes [0, 89)

/// Angle scale used on the air: raw = degrees * 1e7 * pi / 180.
const ANGLE_SCALE: f64 = 1.0e7 * PI / 180.0;

/// Decoded broadcast identification message.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastMessage {
    pub packet_len: u8,
    pub packet_type: u8,
    pub version: u8,
    pub sequence_num: i16,
    pub serial: String,
    pub uav_longitude: f64,
    pub uav_latitude: f64,
    pub uav_height_m: f32,
    pub uav_altitude_m: f32,
    pub uav_velocity_north: f32,
    pub uav_velocity_east: f32,
    pub uav_velocity_up: f32,
    pub uav_yaw_deg: f32,
    pub pilot_time_ms: u64,
    pub pilot_latitude: f64,
    pub pilot_longitude: f64,
    pub home_longitude: f64,
    pub home_latitude: f64,
    pub product_type: u8,
    pub uuid: String,
}

impl BroadcastMessage {
    /// Parses the message region of a decoded payload. The slice must hold
    /// at least the 91-byte message; trailing reserved/checksum bytes are
    /// ignored.
    pub fn parse(payload: &[u8]) -> Self {
        assert!(payload.len() >= MESSAGE_BYTES, "Message region needs {} bytes but got {}", MESSAGE_BYTES, payload.len());
        let uuid_len = (payload[68] as usize).min(19);
        Self {
            packet_len: payload[0],
            packet_type: payload[1],
            version: payload[2],
            sequence_num: le_i16(payload, 3),
            serial: ascii_field(&payload[7..23]),
            uav_longitude: angle(le_i32(payload, 23)),
            uav_latitude: angle(le_i32(payload, 27)),
            uav_height_m: le_i16(payload, 31) as f32,
            uav_altitude_m: le_i16(payload, 33) as f32 / 10.0,
            uav_velocity_north: le_i16(payload, 35) as f32 / 100.0,
            uav_velocity_east: le_i16(payload, 37) as f32 / 100.0,
            uav_velocity_up: le_i16(payload, 39) as f32 / 100.0,
            uav_yaw_deg: le_i16(payload, 41) as f32 / 100.0,
            pilot_time_ms: le_u64(payload, 43),
            pilot_latitude: angle(le_i32(payload, 51)),
            pilot_longitude: angle(le_i32(payload, 55)),
            home_longitude: angle(le_i32(payload, 59)),
            home_latitude: angle(le_i32(payload, 63)),
            product_type: payload[67],
            uuid: ascii_field(&payload[69..69 + uuid_len]),
        }
    }

    /// Human readable name of the product type, where known.
    pub fn product_name(&self) -> Option<&'static str> {
        match self.product_type {
            16 => Some("Mavic Pro"),
            41 => Some("Mavic 2"),
            61 => Some("DJI FPV"),
            63 => Some("Mini 2"),
            68 => Some("Mavic 3"),
            _ => None,
        }
    }
}

fn angle(raw: i32) -> f64 {
    raw as f64 / ANGLE_SCALE
}

fn ascii_field(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

fn le_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn le_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Vec<u8> {
        let mut buf = vec![0u8; MESSAGE_BYTES];
        buf[0] = 88;
        buf[1] = 16;
        buf[2] = 2;
        buf[3..5].copy_from_slice(&12345i16.to_le_bytes());
        buf[7..15].copy_from_slice(b"Skysense");
        let lon = (17.961863 * ANGLE_SCALE).round() as i32;
        let lat = (59.401961 * ANGLE_SCALE).round() as i32;
        buf[23..27].copy_from_slice(&lon.to_le_bytes());
        buf[27..31].copy_from_slice(&lat.to_le_bytes());
        buf[31..33].copy_from_slice(&89i16.to_le_bytes());
        buf[33..35].copy_from_slice(&1000i16.to_le_bytes());
        buf[35..37].copy_from_slice(&12i16.to_le_bytes());
        buf[41..43].copy_from_slice(&1200i16.to_le_bytes());
        buf[43..51].copy_from_slice(&1668595129000u64.to_le_bytes());
        buf[67] = 68;
        buf[68] = 4;
        buf[69..73].copy_from_slice(b"abcd");
        buf
    }

    #[test]
    fn parses_field_layout() {
        let msg = BroadcastMessage::parse(&sample_message());
        assert_eq!(msg.packet_len, 88);
        assert_eq!(msg.packet_type, 16);
        assert_eq!(msg.version, 2);
        assert_eq!(msg.sequence_num, 12345);
        assert_eq!(msg.serial, "Skysense");
        // The i32 encoding quantizes angles at 180/(1e7*pi) degrees, a bit
        // under 6e-6, so the round trip is only exact to that step.
        assert!((msg.uav_longitude - 17.961863).abs() < 5e-6);
        assert!((msg.uav_latitude - 59.401961).abs() < 5e-6);
        assert_eq!(msg.uav_height_m, 89.0);
        assert_eq!(msg.uav_altitude_m, 100.0);
        assert_eq!(msg.uav_velocity_north, 0.12);
        assert_eq!(msg.uav_yaw_deg, 12.0);
        assert_eq!(msg.pilot_time_ms, 1668595129000);
        assert_eq!(msg.product_name(), Some("Mavic 3"));
        assert_eq!(msg.uuid, "abcd");
    }

    #[test]
    fn non_ascii_serial_is_sanitised() {
        let mut buf = sample_message();
        buf[7] = 0xFF;
        let msg = BroadcastMessage::parse(&buf);
        assert!(msg.serial.starts_with('.'));
    }
}
