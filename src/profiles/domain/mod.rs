pub mod inout;
pub mod profile;
