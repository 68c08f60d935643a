//! Step-by-step training of a tiny 2-2-1 sigmoid network, sequenced for
//! visualization: forward pass, backward pass, weight update, pause.

pub mod input;
pub mod journal;
pub mod network;
pub mod plot;
pub mod sequencer;
pub mod trainer;
pub mod tween;
