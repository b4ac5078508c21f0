//! Voicenote - minimal voice note recorder with single-slot playback
//!
//! This crate records microphone input into one fixed recording slot and
//! plays the most recent recording back. There is exactly one current
//! recording at a time; starting a new one overwrites the previous file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Transport state machine, snapshots, value objects, and errors
//! - **Application**: The session controller and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, flacenc, rodio, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and command runners

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
