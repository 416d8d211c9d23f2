//! Presentation Practice - record a talk and get speaking feedback
//!
//! This crate records a presentation from the microphone as chunked
//! WebM/Opus, submits it to a feedback service and renders the returned
//! report (confidence score, pronunciation mistakes, overall feedback and
//! optional spoken feedback).
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Sessions, payloads, reports, settings and the workflow state machine
//! - **Application**: The recording workflow and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, Opus/WebM, reqwest, rodio, TOML config)
//! - **CLI**: Argument parsing, presentation, keyboard controls and session runners

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
