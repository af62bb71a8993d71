pub mod applications;
pub mod directory;
