pub mod aggregate;
pub mod replay;
