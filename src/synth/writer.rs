//! Standard MIDI File (format 1) emission, grounded in this corpus's
//! `write_smf`: build each track's events as an unsorted list of
//! absolute-tick `(tick, TrackEventKind)` pairs, sort by tick, then convert
//! to the delta-time encoding `midly` expects.

use midly::{
    num::{u14, u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::ir::{Effect, Song, Track as IrTrack, TICKS_PER_QUARTER};
use super::bend::{self, BendEvent};
use super::channel::ChannelManager;
use super::SynthOptions;

/// Microseconds per quarter note for a given BPM, as the conductor track's
/// `MetaMessage::Tempo` expects.
fn micros_per_quarter(bpm: u32) -> u24 {
    let bpm = bpm.max(1);
    u24::from(60_000_000 / bpm)
}

struct Event<'a> {
    tick: u32,
    kind: TrackEventKind<'a>,
}

fn sorted_track_events<'a>(mut events: Vec<Event<'a>>, track_name: Option<&'a str>) -> Track<'a> {
    events.sort_by_key(|e| e.tick);

    let mut track = Track::new();
    if let Some(name) = track_name {
        track.push(TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        });
    }

    let mut last_tick = 0u32;
    for event in events {
        let delta = event.tick.saturating_sub(last_tick);
        last_tick = event.tick;
        track.push(TrackEvent {
            delta: u28::from(delta),
            kind: event.kind,
        });
    }
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

fn build_conductor_track(song: &Song) -> Track<'static> {
    let events = vec![Event {
        tick: 0,
        kind: TrackEventKind::Meta(MetaMessage::Tempo(micros_per_quarter(song.tempo_bpm))),
    }];
    sorted_track_events(events, Some("Conductor"))
}

fn pitch_bend_range_events<'a>(channel: u4, semitones: u7) -> Vec<Event<'a>> {
    let cc = |controller: u8, value: u8| TrackEventKind::Midi {
        channel,
        message: MidiMessage::Controller {
            controller: u7::from(controller),
            value: u7::from(value),
        },
    };
    vec![
        Event { tick: 0, kind: cc(101, 0) },
        Event { tick: 0, kind: cc(100, 0) },
        Event { tick: 0, kind: cc(6, semitones.as_int()) },
        Event { tick: 0, kind: cc(38, 0) },
        Event { tick: 0, kind: cc(101, 127) },
        Event { tick: 0, kind: cc(100, 127) },
    ]
}

/// Pitch-bend range in semitones advertised via the RPN 0 sequence (CC 6).
const BEND_RANGE_SEMITONES: u8 = 12;

fn build_track<'a>(ir_track: &'a IrTrack, channels: &[u8], options: &SynthOptions) -> Track<'a> {
    let mut events = Vec::new();

    for &raw_channel in channels {
        let channel = u4::from(raw_channel);
        if let Some(msb) = ir_track.bank_msb {
            events.push(Event {
                tick: 0,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::Controller {
                        controller: u7::from(0u8),
                        value: u7::from(msb),
                    },
                },
            });
        }
        if let Some(lsb) = ir_track.bank_lsb {
            events.push(Event {
                tick: 0,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::Controller {
                        controller: u7::from(32u8),
                        value: u7::from(lsb),
                    },
                },
            });
        }
        events.push(Event {
            tick: 0,
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::from(ir_track.program),
                },
            },
        });
        events.extend(pitch_bend_range_events(channel, u7::from(BEND_RANGE_SEMITONES)));
    }

    let select_channel = |string: u32| -> u4 {
        let idx = if options.high_fidelity && !ir_track.is_percussion {
            (string.saturating_sub(1) as usize) % channels.len()
        } else {
            0
        };
        u4::from(channels[idx])
    };

    for measure in &ir_track.measures {
        for beat in &measure.beats {
            for note in &beat.notes {
                if matches!(
                    note.note_type,
                    crate::ir::NoteType::Rest | crate::ir::NoteType::Dead
                ) {
                    continue;
                }
                let pitch = note.render_pitch(&ir_track.tuning, ir_track.is_percussion);
                let channel = select_channel(note.string);
                let start = beat.start_time;
                let end = beat.end_time();

                events.push(Event {
                    tick: start,
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn {
                            key: u7::from(pitch),
                            vel: u7::from(note.velocity.min(127)),
                        },
                    },
                });

                for effect in &note.effects {
                    if let Effect::Bend(points) = effect {
                        for BendEvent { tick_offset, wheel } in
                            bend::interpolate(points, beat.duration, options.bend_step_ticks)
                        {
                            events.push(Event {
                                tick: start + tick_offset,
                                kind: TrackEventKind::Midi {
                                    channel,
                                    message: MidiMessage::PitchBend {
                                        bend: midly::PitchBend(u14::from(
                                            (wheel as i32 + 8192) as u16,
                                        )),
                                    },
                                },
                            });
                        }
                    }
                }

                events.push(Event {
                    tick: end,
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOff {
                            key: u7::from(pitch),
                            vel: u7::from(0u8),
                        },
                    },
                });
            }
        }
    }

    sorted_track_events(events, Some(ir_track.name.as_str()))
}

/// Render a [`Song`] to a serialized Standard MIDI File (format 1, 960
/// ticks per quarter note): one conductor track carrying tempo, followed by
/// one track per instrument part.
pub fn write_smf(song: &Song, options: &SynthOptions) -> Vec<u8> {
    let mut channels = ChannelManager::new();
    let mut tracks = vec![build_conductor_track(song)];

    for ir_track in &song.tracks {
        let requested = if options.high_fidelity { 6 } else { 1 };
        let allocated = channels.allocate(requested, ir_track.is_percussion);
        tracks.push(build_track(ir_track, &allocated, options));
    }

    let smf = Smf {
        header: Header::new(
            Format::Parallel,
            Timing::Metrical(u15::from(TICKS_PER_QUARTER as u16)),
        ),
        tracks,
    };

    let mut buf = Vec::new();
    smf.write(&mut buf).expect("in-memory SMF write cannot fail");
    buf
}
