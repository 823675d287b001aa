pub mod presets;
pub mod write;
