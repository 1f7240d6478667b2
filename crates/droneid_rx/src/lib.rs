pub mod decoder;
pub mod encoder;
pub mod matched_filter;
