//! Decodes a Guitar-Pro GPIF tablature document into a musical intermediate
//! representation and synthesizes that representation into a Standard MIDI
//! File.
//!
//! ```text
//! bytes --[decode::parse]--> ir::Song --[synth::synthesize]--> SMF bytes
//! ```
//!
//! The three modules compose leaves-first and own a single responsibility
//! each:
//!
//! - [`ir`] — the plain, owned Song/Track/Measure/Beat/Note data model.
//! - [`decode`] — opens the zipped GPIF container and walks its
//!   MasterBar × Track structure into an [`ir::Song`].
//! - [`synth`] — allocates MIDI channels, flattens the IR into absolute-time
//!   events, and encodes a Type-1 Standard MIDI File.
//!
//! The pipeline is a pure function of its input: no process-wide mutable
//! state, nothing persisted between calls. See `DESIGN.md` for the grounding
//! ledger behind each module's design.

pub mod analyze;
pub mod decode;
pub mod ir;
pub mod synth;

pub use analyze::{analyze, analyze_json, AnalyzeJsonError, TrackSummary};
pub use synth::{synthesize, SynthError, SynthOptions};

use thiserror::Error;

/// A single error type spanning both `parse` and `synthesize`, for callers
/// that want to handle the whole pipeline under one `Result`. Each stage's
/// own module (`decode::DecodeError`, `synth::SynthError`) stays the
/// primary error type for code that only touches that stage.
#[derive(Debug, Error)]
pub enum GpCoreError {
    #[error(transparent)]
    Decode(#[from] decode::DecodeError),
    #[error(transparent)]
    Synth(#[from] synth::SynthError),
}

/// Decode a `.gp`/`.gpx` container's bytes into a [`ir::Song`].
///
/// Field-level faults (dangling references, malformed numeric fields) are
/// recovered in place and logged via the `log` crate rather than failing
/// this call; callers that need the accumulated warning list can use
/// [`decode::parse`] directly instead.
pub fn parse(bytes: &[u8]) -> Result<ir::Song, decode::DecodeError> {
    decode::parse(bytes).map(|(song, _warnings)| song)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zipped_gpif(xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            writer.start_file("score.gpif", FileOptions::default()).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    /// One track, one 4/4 measure, one quarter beat, one note at Midi=60,
    /// default velocity. Expect a conductor track with `set_tempo(500000)`
    /// and one music track with `note_on(60, 100, 0)` at t=0 and
    /// `note_off` at t=960.
    #[test]
    fn end_to_end_minimal_single_note() {
        let xml = r#"<GPIF>
            <Rhythms><Rhythm id="r0"><NoteValue>Quarter</NoteValue></Rhythm></Rhythms>
            <MasterTrack><Tracks>0</Tracks></MasterTrack>
            <Tracks><Track id="0"><Name>Lead</Name></Track></Tracks>
            <MasterBars><MasterBar><Time>4/4</Time><Bars>b0</Bars></MasterBar></MasterBars>
            <Bars><Bar id="b0"><Voices>v0</Voices></Bar></Bars>
            <Voices><Voice id="v0"><Beats>bt0</Beats></Voice></Voices>
            <Beats><Beat id="bt0"><Rhythm ref="r0"/><Notes>n0</Notes></Beat></Beats>
            <Notes><Note id="n0"><Properties>
                <Property name="Midi"><Number>60</Number></Property>
            </Properties></Note></Notes>
        </GPIF>"#;
        let bytes = zipped_gpif(xml);

        let song = parse(&bytes).unwrap();
        assert_eq!(song.tempo_bpm, 120);

        let options = SynthOptions {
            high_fidelity: false,
            ..SynthOptions::default()
        };
        let smf_bytes = synthesize(&song, &options).unwrap();

        let smf = midly::Smf::parse(&smf_bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);

        let tempo_event = smf.tracks[0]
            .iter()
            .find_map(|e| match e.kind {
                midly::TrackEventKind::Meta(midly::MetaMessage::Tempo(t)) => Some(t.as_int()),
                _ => None,
            })
            .expect("conductor track should carry a tempo");
        assert_eq!(tempo_event, 500_000);

        let mut tick = 0u32;
        let mut note_on_tick = None;
        let mut note_off_tick = None;
        for event in &smf.tracks[1] {
            tick += event.delta.as_int();
            match event.kind {
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOn { key, vel },
                    channel,
                } if key.as_int() == 60 && vel.as_int() == 100 => {
                    assert_eq!(channel.as_int(), 0);
                    note_on_tick = Some(tick);
                }
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOff { key, .. },
                    ..
                } if key.as_int() == 60 => {
                    note_off_tick = Some(tick);
                }
                _ => {}
            }
        }
        assert_eq!(note_on_tick, Some(0));
        assert_eq!(note_off_tick, Some(960));
    }

    #[test]
    fn analyze_reports_tracks_without_synthesizing() {
        let xml = r#"<GPIF>
            <MasterTrack><Tracks>0 1</Tracks></MasterTrack>
            <Tracks>
                <Track id="0"><Name>Guitar</Name></Track>
                <Track id="1"><Name>Drums</Name><InstrumentSet><Type>drumKit</Type></InstrumentSet></Track>
            </Tracks>
        </GPIF>"#;
        let bytes = zipped_gpif(xml);
        let summary = analyze(&bytes).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].channel, 0);
        assert!(summary[1].is_percussion);
        assert_eq!(summary[1].channel, 9);
    }

    #[test]
    fn invalid_container_surfaces_as_decode_error() {
        let err = parse(b"not a zip").unwrap_err();
        assert!(matches!(err, decode::DecodeError::Zip(_)));
    }
}
