pub mod legacy;
pub mod meta;
