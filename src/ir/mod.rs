//! The musical intermediate representation that connects the GPIF decoder
//! (`crate::decode`) to the MIDI synthesizer (`crate::synth`).
//!
//! Every type here is plain, owned, value data: the decoder builds a `Song`
//! in a single pass and hands it to the synthesizer read-only. There is no
//! shared mutable state and no back-reference to the decoder's ID graph.

/// Ticks per quarter note, fixed throughout the IR and the emitted SMF.
pub const TICKS_PER_QUARTER: u32 = 960;

/// A decoded Guitar-Pro document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    /// Tempo in beats per minute. Defaults to 120 when the source document
    /// carries no tempo automation.
    pub tempo_bpm: u32,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new() -> Self {
        Self {
            title: "Untitled".to_string(),
            artist: "Unknown".to_string(),
            tempo_bpm: 120,
            tracks: Vec::new(),
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

/// A single instrument part.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// 1-based position in score order.
    pub number: u32,
    pub name: String,
    pub is_percussion: bool,
    /// General MIDI program number, 0-127.
    pub program: u8,
    pub bank_msb: Option<u8>,
    pub bank_lsb: Option<u8>,
    /// MIDI pitch per string, low index = string 1. Empty for percussion.
    pub tuning: Vec<u8>,
    pub measures: Vec<Measure>,
}

impl Track {
    pub fn new(number: u32, name: String) -> Self {
        Self {
            number,
            name,
            is_percussion: false,
            program: 0,
            bank_msb: None,
            bank_lsb: None,
            tuning: Vec::new(),
            measures: Vec::new(),
        }
    }
}

/// One measure of a track, flattened across voices (see `DESIGN.md` for
/// the voice-flattening design notes).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Measure {
    /// 1-based, matches the owning MasterBar's position.
    pub number: u32,
    pub numerator: u32,
    pub denominator: u32,
    pub beats: Vec<Beat>,
}

impl Measure {
    pub fn new(number: u32, numerator: u32, denominator: u32) -> Self {
        Self {
            number,
            numerator,
            denominator,
            beats: Vec::new(),
        }
    }

    /// Length of this measure in ticks: `numerator * 960 * 4 / denominator`.
    pub fn length_ticks(&self) -> u32 {
        (self.numerator as u64 * TICKS_PER_QUARTER as u64 * 4 / self.denominator as u64) as u32
    }
}

/// A rhythmic position holding zero or more simultaneous notes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Beat {
    pub start_time: u32,
    pub duration: u32,
    pub notes: Vec<Note>,
    pub text: Option<String>,
}

impl Beat {
    pub fn new(start_time: u32, duration: u32) -> Self {
        Self {
            start_time,
            duration,
            notes: Vec::new(),
            text: None,
        }
    }

    pub fn end_time(&self) -> u32 {
        self.start_time + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NoteType {
    Normal,
    Rest,
    Tie,
    Dead,
}

/// A single played (or rested/tied/deadened) note.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    /// 1-based string index; 1 is conventionally the highest string.
    pub string: u32,
    /// Non-negative fret number, or drum key for percussion tracks.
    pub fret: i32,
    pub velocity: u8,
    pub note_type: NoteType,
    /// When set, overrides `fret + tuning[string - 1]` when rendering pitch.
    pub midi_number: Option<i32>,
    pub effects: Vec<Effect>,
}

impl Note {
    pub fn new(string: u32, fret: i32) -> Self {
        Self {
            string,
            fret,
            velocity: 100,
            note_type: NoteType::Normal,
            midi_number: None,
            effects: Vec::new(),
        }
    }

    /// `fret + tuning[string - 1]`, clamped to 0..127. Percussion tracks
    /// ignore tuning entirely and just clamp `fret`. `midi_number`, when
    /// present, overrides this whole computation (also clamped).
    pub fn render_pitch(&self, tuning: &[u8], is_percussion: bool) -> u8 {
        let raw = if let Some(midi) = self.midi_number {
            midi
        } else if is_percussion {
            self.fret
        } else {
            let string_idx = self.string as i64 - 1;
            let open_string = if string_idx >= 0 && (string_idx as usize) < tuning.len() {
                tuning[string_idx as usize] as i32
            } else {
                0
            };
            self.fret + open_string
        };
        raw.clamp(0, 127) as u8
    }
}

/// A tagged effect attached to a note. Only `Bend` has synthesis behavior;
/// the rest are advisory and are no-ops in `crate::synth`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Effect {
    Bend(Vec<BendPoint>),
    Slide,
    Hammer,
    Pull,
    Trill,
    Harmonic,
    PalmMute,
    Vibrato,
}

/// One point on a bend curve. `position` is 0..100, a percentage of the
/// note's duration. `value` is in GP bend units, 50 = 1 semitone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BendPoint {
    pub position: i32,
    pub value: i32,
}
