//! pixplot-export: Pure format serializers (sans-IO)
//!
//! Converts ordered toolpaths into machine programs. Currently supports
//! G-code.

pub mod gcode;

pub use gcode::{DotPolicy, GCodeConfig, GCodeConfigError, GCodeMetadata, GCodeProgram, emit};
