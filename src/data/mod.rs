pub mod animation;
pub mod line_style;
pub mod sample;
