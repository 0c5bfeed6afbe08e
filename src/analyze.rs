//! A thin, synthesis-free projection over a decoded [`crate::ir::Song`],
//! used by callers (e.g. a UI track-selection panel) that only need track
//! identity and routing metadata rather than the full playable IR.

use serde::{Deserialize, Serialize};

use crate::ir::{Song, Track};

/// One track's identity and advisory routing info, without decoding its
/// measures into playable events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: u32,
    pub name: String,
    pub program: u8,
    pub is_percussion: bool,
    /// The provisional channel assigned during track-list decoding
    /// (`i mod 16` for melodic tracks, fixed 9 for percussion). Advisory
    /// only: `crate::synth` reassigns channels at synthesis time and may
    /// allocate more than one per track in high-fidelity mode.
    pub channel: u8,
}

fn provisional_channel(index: usize, track: &Track) -> u8 {
    if track.is_percussion {
        crate::synth::channel::PERCUSSION_CHANNEL
    } else {
        (index % 16) as u8
    }
}

/// Summarize a decoded [`Song`]'s tracks without running synthesis.
pub fn summarize(song: &Song) -> Vec<TrackSummary> {
    song.tracks
        .iter()
        .enumerate()
        .map(|(index, track)| TrackSummary {
            id: track.number,
            name: track.name.clone(),
            program: track.program,
            is_percussion: track.is_percussion,
            channel: provisional_channel(index, track),
        })
        .collect()
}

/// Decode `bytes` and summarize its tracks in one step, without running
/// synthesis.
pub fn analyze(bytes: &[u8]) -> Result<Vec<TrackSummary>, crate::decode::DecodeError> {
    let (song, _warnings) = crate::decode::parse(bytes)?;
    Ok(summarize(&song))
}

/// Same as [`analyze`], serialized to JSON text. Exists for callers at a
/// process boundary (a UI track-selection panel, typically) that want the
/// summary without linking against this crate's Rust types.
pub fn analyze_json(bytes: &[u8]) -> Result<String, AnalyzeJsonError> {
    let summary = analyze(bytes)?;
    Ok(serde_json::to_string(&summary)?)
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeJsonError {
    #[error(transparent)]
    Decode(#[from] crate::decode::DecodeError),
    #[error("failed to serialize track summary: {0}")]
    Serialize(#[from] serde_json::Error),
}
