//! Bend curve interpolation: turns a note's `Bend` effect into a series of
//! absolute-tick pitch wheel values.
//!
//! GP bend units are 50 per semitone; `BendPoint::position` is a percentage
//! (0..100) of the note's duration. Points `(0,0) (50,50) (100,100)` land
//! at roughly 1 and 2 semitones across a 960-tick note.

use crate::ir::BendPoint;

/// GP bend units per semitone.
const UNITS_PER_SEMITONE: f64 = 50.0;
/// 14-bit pitch wheel range, centered at 0x2000 in the raw MIDI byte pair
/// but represented here as a signed offset from center (`midly`'s
/// `PitchBend` takes a signed `i16` in -8192..=8191).
const WHEEL_PER_SEMITONE: f64 = 8192.0 / 12.0;

/// Resolution of the interpolation: one pitch wheel event at most every
/// `step_ticks` ticks between bend points.
pub const DEFAULT_STEP_TICKS: u32 = 30;

/// One emitted pitch wheel event, in ticks relative to the note's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BendEvent {
    pub tick_offset: u32,
    pub wheel: i16,
}

fn units_to_wheel(units: i32) -> i16 {
    let semitones = units as f64 / UNITS_PER_SEMITONE;
    (semitones * WHEEL_PER_SEMITONE).round().clamp(-8192.0, 8191.0) as i16
}

/// Build the pitch wheel event stream for one note's bend curve.
///
/// `points` must be non-empty and sorted by `position`. `note_duration`
/// ticks is the note's full length; each point's `position` (0..100) is
/// interpreted as a percentage of that duration. The stream always starts
/// with an event at offset 0 and ends with a reset-to-0 event at
/// `note_duration`, so a synthesizer never leaves a voice permanently bent.
pub fn interpolate(points: &[BendPoint], note_duration: u32, step_ticks: u32) -> Vec<BendEvent> {
    if points.is_empty() {
        return Vec::new();
    }
    let step_ticks = step_ticks.max(1);

    let mut events = Vec::new();
    let to_tick = |position: i32| -> u32 {
        ((position.clamp(0, 100) as u64 * note_duration as u64) / 100) as u32
    };

    events.push(BendEvent {
        tick_offset: to_tick(points[0].position),
        wheel: units_to_wheel(points[0].value),
    });

    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);
        let start_tick = to_tick(start.position);
        let end_tick = to_tick(end.position);
        if end_tick <= start_tick {
            continue;
        }
        let span = end_tick - start_tick;
        let steps = (span / step_ticks).max(1);

        for step in 1..=steps {
            let tick_offset = start_tick + (span * step / steps).min(span);
            let fraction = step as f64 / steps as f64;
            let value = start.value as f64 + (end.value - start.value) as f64 * fraction;
            events.push(BendEvent {
                tick_offset,
                wheel: units_to_wheel(value.round() as i32),
            });
        }
    }

    events.push(BendEvent {
        tick_offset: note_duration,
        wheel: 0,
    });

    events
}
