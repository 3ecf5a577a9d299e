//! Charts module - Chart rendering

mod renderer;

pub use renderer::{
    band_half_width, parse_color, z_value, MarkerGlyph, PlotStyle, RenderError,
    StaticChartRenderer, CONFIDENCE_LEVEL,
};
