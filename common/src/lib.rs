//! Roof Estimate Common Library
//!
//! CLIとオーケストレーション層で共有される、I/Oを持たない型とロジック

pub mod types;
pub mod address;
pub mod capture;
pub mod cost;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod render;
pub mod state;

pub use types::{
    AddressCandidate, AddressComponent, CapturedImage, Coordinates, ResolvedPlace,
    RoofMeasurements, StructuredAddress,
};
pub use address::{is_complete_address, structured_address, INCOMPLETE_ADDRESS_MESSAGE};
pub use capture::{CaptureSession, CaptureStatus, CAPTURE_ANGLES};
pub use cost::{CostEstimate, PricePerSquare};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_measurements_response};
pub use prompts::ROOF_ANALYSIS_PROMPT;
pub use render::{render, render_cost_estimate};
pub use state::{PredictionsState, SearchState, SearchTicket, ShellState, MIN_QUERY_CHARS};
