//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod converter;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use conversion::{ConversionRecord, ConversionRecorder, NewConversion, convert, resolve};
pub use converter::{Converter, ConverterState};
pub use currency::{Currency, RatePair};
pub use error::{ConvertError, ValidationError};
pub use rates::{RateProvider, RateSnapshot, RateTable, refresh_rates};
