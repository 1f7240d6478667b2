pub mod channel;
pub mod demodulator;
pub mod derotate;
pub mod zc;
