//! Playback infrastructure module

mod rodio_player;

pub use rodio_player::RodioPlayback;
