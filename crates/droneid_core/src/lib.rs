pub mod bits;
pub mod crc24;
pub mod frame;
pub mod gold;
pub mod params;
