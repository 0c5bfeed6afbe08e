//! Top-level GPIF decode: metadata, tempo, track list, then the MasterBar
//! × Track walk that assembles the IR with absolute tick timing.

use std::collections::HashMap;

use super::errors::DecodeContext;
use super::rhythm::{self, RhythmTable};
use super::xml::{Dom, NodeId};
use super::note::decode_note;
use crate::ir::{Beat, Measure, Song, Track};

pub fn decode_song(dom: &Dom, ctx: &mut DecodeContext) -> Song {
    let root = dom.root();
    let mut song = Song::new();

    parse_metadata(dom, root, &mut song);
    let rhythm_table = rhythm::parse_rhythms(dom);
    parse_tempo(dom, root, &mut song);

    let track_ids = track_refs(dom, root);
    parse_tracks(dom, root, &track_ids, &mut song);
    parse_structure(dom, root, &track_ids, &rhythm_table, &mut song, ctx);

    song
}

fn parse_metadata(dom: &Dom, root: NodeId, song: &mut Song) {
    if let Some(title) = dom.child_text(root, "Title") {
        if !title.is_empty() {
            song.title = title.to_string();
        }
    }
    if let Some(artist) = dom.child_text(root, "Artist") {
        if !artist.is_empty() {
            song.artist = artist.to_string();
        }
    }
}

fn parse_tempo(dom: &Dom, root: NodeId, song: &mut Song) {
    let Some(master_track) = dom.child(root, "MasterTrack") else {
        return;
    };
    let Some(automations) = dom.child(master_track, "Automations") else {
        return;
    };

    for automation in dom.children(automations, "Automation") {
        let is_tempo = dom.child_text(automation, "Type") == Some("Tempo");
        if !is_tempo {
            continue;
        }
        if let Some(value_text) = dom.child_text(automation, "Value") {
            if let Some(first_token) = value_text.split_whitespace().next() {
                if let Ok(bpm) = first_token.parse::<u32>() {
                    song.tempo_bpm = bpm;
                    return;
                }
            }
        }
    }
}

fn track_refs(dom: &Dom, root: NodeId) -> Vec<String> {
    let Some(master_track) = dom.child(root, "MasterTrack") else {
        return Vec::new();
    };
    dom.child_ref_list(master_track, "Tracks")
}

fn parse_tracks(dom: &Dom, _root: NodeId, track_ids: &[String], song: &mut Song) {
    for (index, track_gp_id) in track_ids.iter().enumerate() {
        let Some(track_elem) = dom.by_id("Track", track_gp_id) else {
            continue;
        };

        let name = dom
            .child_text(track_elem, "Name")
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Track {}", index + 1));

        let mut track = Track::new((index + 1) as u32, name);

        if let Some(sounds) = dom.child(track_elem, "Sounds") {
            if let Some(sound) = dom.child(sounds, "Sound") {
                if let Some(midi_node) = dom.child(sound, "MIDI") {
                    track.program = dom
                        .child_text(midi_node, "Program")
                        .and_then(|p| p.parse::<u8>().ok())
                        .unwrap_or(0);
                }
            }
        }

        if let Some(inst_set) = dom.child(track_elem, "InstrumentSet") {
            if dom.child_text(inst_set, "Type") == Some("drumKit") {
                track.is_percussion = true;
            }
        }

        if let Some(properties) = dom.child(track_elem, "Properties") {
            for prop in dom.children(properties, "Property") {
                if dom.attr(prop, "name") == Some("Tuning") {
                    if let Some(pitches) = dom.child_text(prop, "Pitches") {
                        track.tuning = pitches
                            .split_whitespace()
                            .filter_map(|p| p.parse::<i32>().ok())
                            .map(|p| p.clamp(0, 127) as u8)
                            .collect();
                    }
                    break;
                }
            }
        }

        song.tracks.push(track);
    }
}

fn parse_structure(
    dom: &Dom,
    root: NodeId,
    track_ids: &[String],
    rhythm_table: &RhythmTable,
    song: &mut Song,
    ctx: &mut DecodeContext,
) {
    let mut track_by_gp_id: HashMap<&str, usize> = HashMap::new();
    for (i, id) in track_ids.iter().enumerate() {
        track_by_gp_id.insert(id.as_str(), i);
    }
    let mut cursors: Vec<u32> = vec![0; track_ids.len()];

    let Some(master_bars_node) = dom.child(root, "MasterBars") else {
        return;
    };
    let master_bars = dom.children(master_bars_node, "MasterBar");

    for (mb_index, master_bar) in master_bars.into_iter().enumerate() {
        let (numerator, denominator) = parse_time_signature(dom, master_bar, ctx);
        let measure_template = Measure::new((mb_index + 1) as u32, numerator, denominator);
        let measure_length = measure_template.length_ticks();

        let bar_ids = dom.child_ref_list(master_bar, "Bars");

        for (track_index, bar_id) in bar_ids.iter().enumerate() {
            if track_index >= track_ids.len() {
                break;
            }
            let Some(&track_pos) = track_by_gp_id.get(track_ids[track_index].as_str()) else {
                continue;
            };

            let mut measure = measure_template.clone();
            let cursor = cursors[track_index];

            match dom.by_id("Bar", bar_id) {
                Some(bar_elem) => {
                    populate_bar(dom, bar_elem, cursor, rhythm_table, &mut measure, ctx);
                }
                None => {
                    ctx.dangling_reference("Bar", bar_id);
                }
            }

            song.tracks[track_pos].measures.push(measure);
            cursors[track_index] += measure_length;
        }
    }
}

fn parse_time_signature(dom: &Dom, master_bar: NodeId, ctx: &mut DecodeContext) -> (u32, u32) {
    let text = dom.child_text(master_bar, "Time").unwrap_or("4/4");
    match text.split_once('/') {
        Some((num, den)) => {
            let numerator = num.trim().parse::<u32>().unwrap_or_else(|_| {
                ctx.malformed_field("MasterBar.Time.numerator", format!("\"{num}\""));
                4
            });
            let denominator = den.trim().parse::<u32>().unwrap_or_else(|_| {
                ctx.malformed_field("MasterBar.Time.denominator", format!("\"{den}\""));
                4
            });
            (numerator, if denominator == 0 { 4 } else { denominator })
        }
        None => {
            ctx.malformed_field("MasterBar.Time", format!("\"{text}\" is not num/den"));
            (4, 4)
        }
    }
}

fn populate_bar(
    dom: &Dom,
    bar_elem: NodeId,
    cursor: u32,
    rhythm_table: &RhythmTable,
    measure: &mut Measure,
    ctx: &mut DecodeContext,
) {
    let voice_ids = dom.child_ref_list(bar_elem, "Voices");

    for voice_id in voice_ids {
        let Some(voice_elem) = dom.by_id("Voice", &voice_id) else {
            ctx.dangling_reference("Voice", &voice_id);
            continue;
        };

        let mut voice_cursor = cursor;
        let beat_ids = dom.child_ref_list(voice_elem, "Beats");

        for beat_id in beat_ids {
            let Some(beat_elem) = dom.by_id("Beat", &beat_id) else {
                ctx.dangling_reference("Beat", &beat_id);
                continue;
            };

            let rhythm_ref = dom
                .child(beat_elem, "Rhythm")
                .and_then(|r| dom.attr(r, "ref"));
            let duration = rhythm::duration_ticks(rhythm_table, rhythm_ref);

            let mut beat = Beat::new(voice_cursor, duration);

            for note_id in dom.child_ref_list(beat_elem, "Notes") {
                match dom.by_id("Note", &note_id) {
                    Some(note_elem) => beat.notes.push(decode_note(dom, note_elem, ctx)),
                    None => ctx.dangling_reference("Note", &note_id),
                }
            }

            measure.beats.push(beat);
            voice_cursor += duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(xml: &str) -> (Song, Vec<super::super::errors::DecodeWarning>) {
        let dom = Dom::parse(xml).unwrap();
        let mut ctx = DecodeContext::new();
        let song = decode_song(&dom, &mut ctx);
        (song, ctx.warnings())
    }

    fn minimal_single_note_doc() -> String {
        r#"<GPIF>
            <Title>Test Song</Title>
            <Artist>Test Artist</Artist>
            <Rhythms><Rhythm id="r0"><NoteValue>Quarter</NoteValue></Rhythm></Rhythms>
            <MasterTrack>
                <Tracks>0</Tracks>
                <Automations>
                    <Automation><Type>Tempo</Type><Value>120</Value></Automation>
                </Automations>
            </MasterTrack>
            <Tracks><Track id="0"><Name>Guitar</Name></Track></Tracks>
            <MasterBars>
                <MasterBar><Time>4/4</Time><Bars>b0</Bars></MasterBar>
            </MasterBars>
            <Bars><Bar id="b0"><Voices>v0</Voices></Bar></Bars>
            <Voices><Voice id="v0"><Beats>bt0</Beats></Voice></Voices>
            <Beats><Beat id="bt0"><Rhythm ref="r0"/><Notes>n0</Notes></Beat></Beats>
            <Notes><Note id="n0"><Properties>
                <Property name="Midi"><Number>60</Number></Property>
            </Properties></Note></Notes>
        </GPIF>"#
            .to_string()
    }

    #[test]
    fn decodes_minimal_single_note_song() {
        let (song, warnings) = decode(&minimal_single_note_doc());
        assert!(warnings.is_empty());
        assert_eq!(song.title, "Test Song");
        assert_eq!(song.tempo_bpm, 120);
        assert_eq!(song.tracks.len(), 1);
        let measure = &song.tracks[0].measures[0];
        assert_eq!(measure.beats.len(), 1);
        let beat = &measure.beats[0];
        assert_eq!(beat.start_time, 0);
        assert_eq!(beat.duration, 960);
        assert_eq!(beat.notes[0].midi_number, Some(60));
    }

    #[test]
    fn underfilled_measure_still_advances_cursor_by_full_length() {
        // A 4/4 measure with only one quarter beat; the next measure's
        // first beat must start at 3840, not 960.
        let xml = format!(
            r#"<GPIF>
                <Rhythms><Rhythm id="r0"><NoteValue>Quarter</NoteValue></Rhythm></Rhythms>
                <MasterTrack><Tracks>0</Tracks></MasterTrack>
                <Tracks><Track id="0"><Name>Guitar</Name></Track></Tracks>
                <MasterBars>
                    <MasterBar><Time>4/4</Time><Bars>b0</Bars></MasterBar>
                    <MasterBar><Time>4/4</Time><Bars>b1</Bars></MasterBar>
                </MasterBars>
                <Bars>
                    <Bar id="b0"><Voices>v0</Voices></Bar>
                    <Bar id="b1"><Voices>v1</Voices></Bar>
                </Bars>
                <Voices>
                    <Voice id="v0"><Beats>bt0</Beats></Voice>
                    <Voice id="v1"><Beats>bt1</Beats></Voice>
                </Voices>
                <Beats>
                    <Beat id="bt0"><Rhythm ref="r0"/><Notes>n0</Notes></Beat>
                    <Beat id="bt1"><Rhythm ref="r0"/><Notes>n1</Notes></Beat>
                </Beats>
                <Notes>
                    <Note id="n0"><Properties><Property name="Midi"><Number>60</Number></Property></Properties></Note>
                    <Note id="n1"><Properties><Property name="Midi"><Number>62</Number></Property></Properties></Note>
                </Notes>
            </GPIF>"#
        );
        let (song, _) = decode(&xml);
        let measures = &song.tracks[0].measures;
        assert_eq!(measures[0].beats[0].start_time, 0);
        assert_eq!(measures[1].beats[0].start_time, 3840);
    }

    #[test]
    fn dangling_bar_reference_yields_zero_beat_measure_and_advances_cursor() {
        // A MasterBar referencing a missing Bar id produces an empty
        // measure for that track and the cursor still advances fully.
        let xml = r#"<GPIF>
            <MasterTrack><Tracks>0</Tracks></MasterTrack>
            <Tracks><Track id="0"><Name>Guitar</Name></Track></Tracks>
            <MasterBars>
                <MasterBar><Time>4/4</Time><Bars>missing</Bars></MasterBar>
                <MasterBar><Time>4/4</Time><Bars>missing2</Bars></MasterBar>
            </MasterBars>
        </GPIF>"#;
        let (song, warnings) = decode(xml);
        assert_eq!(warnings.len(), 2);
        let measures = &song.tracks[0].measures;
        assert_eq!(measures.len(), 2);
        assert!(measures[0].beats.is_empty());
        assert!(measures[1].beats.is_empty());
    }

    #[test]
    fn namespaced_and_non_namespaced_documents_parse_equivalently() {
        let plain = minimal_single_note_doc();
        let namespaced = plain.replacen(
            "<GPIF>",
            r#"<GPIF xmlns="http://www.guitar-pro.com/GPIF/1.0">"#,
            1,
        );
        let (song_plain, _) = decode(&plain);
        let (song_ns, _) = decode(&namespaced);
        assert_eq!(song_plain, song_ns);
    }

    #[test]
    fn decoding_twice_is_idempotent() {
        let xml = minimal_single_note_doc();
        let (a, _) = decode(&xml);
        let (b, _) = decode(&xml);
        assert_eq!(a, b);
    }

    #[test]
    fn tuning_out_of_bounds_string_falls_back_to_fret_only() {
        let xml = r#"<GPIF>
            <MasterTrack><Tracks>0</Tracks></MasterTrack>
            <Tracks><Track id="0"><Name>Guitar</Name>
                <Properties><Property name="Tuning"><Pitches>64</Pitches></Property></Properties>
            </Track></Tracks>
            <MasterBars><MasterBar><Time>4/4</Time><Bars>b0</Bars></MasterBar></MasterBars>
            <Bars><Bar id="b0"><Voices>v0</Voices></Bar></Bars>
            <Voices><Voice id="v0"><Beats>bt0</Beats></Voice></Voices>
            <Beats><Beat id="bt0"><Notes>n0</Notes></Beat></Beats>
            <Notes><Note id="n0"><Properties>
                <Property name="String"><String>5</String></Property>
                <Property name="Fret"><Fret>3</Fret></Property>
            </Properties></Note></Notes>
        </GPIF>"#;
        let (song, _) = decode(xml);
        let note = &song.tracks[0].measures[0].beats[0].notes[0];
        assert_eq!(note.render_pitch(&song.tracks[0].tuning, false), 3);
    }
}
