pub mod category;
pub mod ids;
pub mod status;
