//! MIDI synthesis: channel allocation, per-track event emission, bend-curve
//! interpolation, and Standard MIDI File encoding.
//!
//! Mirrors the shape of [`crate::decode`]: a small `SynthOptions`
//! configuration struct (named, overridable fields instead of hidden
//! globals or inline literals), a `thiserror`-derived error enum for the
//! one failure mode that can actually occur (an output-sink I/O failure),
//! and the `write_smf` entry point the rest of this module builds toward.

pub mod bend;
pub mod channel;
pub mod writer;

use thiserror::Error;

use crate::ir::Song;

/// Bend-unit and bend-position conventions as explicit, overridable fields
/// rather than silent literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthOptions {
    /// Allocate six channels per non-percussion track (one per guitar
    /// string) so simultaneous per-string pitch bends never collide.
    /// When `false`, every track gets a single shared channel.
    pub high_fidelity: bool,
    /// Interpolation resolution for bend curves, in ticks. Default 30.
    pub bend_step_ticks: u32,
    /// Whether `BendPoint::position` is interpreted as a percentage
    /// (0..100) of the note's duration, as opposed to an absolute tick
    /// offset. The decoder and synthesizer currently only implement the
    /// percent convention; this field documents the decision rather than
    /// selecting dead code.
    pub bend_position_is_percent: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            high_fidelity: true,
            bend_step_ticks: bend::DEFAULT_STEP_TICKS,
            bend_position_is_percent: true,
        }
    }
}

/// The synthesizer never classifies musical data as an error — out-of-range
/// values are clamped and unknown effects are ignored. The
/// only failure this module can produce is a caller-supplied output sink
/// rejecting the bytes, which `write_smf`'s in-memory buffer cannot
/// trigger; this variant exists for callers that layer their own sink on
/// top of [`synthesize`].
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("failed to write MIDI output: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// Render a decoded [`Song`] to a serialized Type-1 Standard MIDI File.
pub fn synthesize(song: &Song, options: &SynthOptions) -> Result<Vec<u8>, SynthError> {
    Ok(writer::write_smf(song, options))
}
