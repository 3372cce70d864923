//! Min-Entropy Assessment Library
//!
//! An implementation of the NIST SP800-90B entropy estimation suite
//! for assessing noise sources. Takes raw sample data and produces a
//! conservative min-entropy estimate in bits per symbol.
//!
//! # Architecture
//!
//! The engine follows an explicit data flow:
//!
//! ```text
//! raw bytes → sample (validation, bit expansion)
//!                 ↓
//!     IID battery  /  non-IID battery
//!                 ↓
//!       restart validation (optional)
//!                 ↓
//!          assessment result
//! ```
//!
//! # Design Principles
//!
//! - **Conservative**: The binding estimate is the minimum over every
//!   applicable sub-test, never an average
//! - **Deterministic**: A fixed permutation seed reproduces results
//!   bit-for-bit, regardless of the worker count
//! - **Stateless**: Each assessment call is independent; nothing is
//!   cached between calls
//! - **No cryptographic claims**: These are statistical estimates of a
//!   noise source, not proofs of unpredictability
//!
//! # Example
//!
//! ```no_run
//! use entropy_assessment::{Assessment, AssessmentOptions};
//!
//! let data: Vec<u8> = std::fs::read("noise_source.bin").unwrap();
//!
//! let engine = Assessment::with_options(AssessmentOptions {
//!     permutation_seed: Some([7u8; 32]),
//!     ..AssessmentOptions::default()
//! });
//!
//! // Run the non-IID estimator battery on 8-bit symbols.
//! let result = engine.assess_non_iid(&data, 8).unwrap();
//! println!("min-entropy: {:.4} bits/symbol", result.min_entropy);
//!
//! for test in &result.per_test {
//!     if let Some(h) = test.estimate {
//!         println!("  {:<24} {:.4}", test.name, h);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod assessment;
mod iid;
mod noniid;
mod numeric;
pub mod restart;
pub mod sample;

// Re-export commonly used types at crate root
pub use assessment::{
    Assessment, AssessmentError, AssessmentOptions, AssessmentResult, TestResult, TestType,
};
pub use restart::{RestartData, RestartOutcome};
pub use sample::SampleSet;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
