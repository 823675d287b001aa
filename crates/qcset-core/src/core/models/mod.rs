pub mod molecule;
pub mod section;
