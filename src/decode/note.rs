//! Decodes a single `<Note>` element: a `Properties`/`Property[name=...]`
//! lookup table, integer coercion through float (`"60.0"` parses as `60`),
//! and silent-zero recovery on malformed fields rather than aborting the
//! whole document.

use super::errors::DecodeContext;
use super::xml::{Dom, NodeId};
use crate::ir::{BendPoint, Effect, Note, NoteType};

/// Reads the first present of `{Number, Int, Fret, String}` child text as
/// an integer payload, coercing through `f64` to tolerate `"60.0"`-style
/// values. Returns 0 (and records a `MalformedField` warning) when the
/// property is present but unparsable.
fn property_int(dom: &Dom, prop: NodeId, field_name: &str, ctx: &mut DecodeContext) -> i32 {
    for tag in ["Number", "Int", "Fret", "String"] {
        if let Some(text) = dom.child_text(prop, tag) {
            match text.parse::<f64>() {
                Ok(v) => return v as i32,
                Err(_) => {
                    ctx.malformed_field(field_name, format!("could not parse \"{text}\" as a number"));
                    return 0;
                }
            }
        }
    }
    0
}

fn properties_by_name(dom: &Dom, note: NodeId) -> Vec<(String, NodeId)> {
    let Some(props_node) = dom.child(note, "Properties") else {
        return Vec::new();
    };
    dom.children(props_node, "Property")
        .into_iter()
        .filter_map(|p| dom.attr(p, "name").map(|name| (name.to_string(), p)))
        .collect()
}

fn parse_bend(dom: &Dom, bend_prop: NodeId, ctx: &mut DecodeContext) -> Option<Effect> {
    let points: Vec<BendPoint> = dom
        .children(bend_prop, "Point")
        .into_iter()
        .map(|point| {
            let position = dom
                .child_text(point, "Position")
                .and_then(|t| t.parse::<f64>().ok())
                .map(|v| v as i32)
                .unwrap_or_else(|| {
                    ctx.malformed_field("Bend.Position", "missing or unparsable");
                    0
                });
            let value = dom
                .child_text(point, "Value")
                .and_then(|t| t.parse::<f64>().ok())
                .map(|v| v as i32)
                .unwrap_or_else(|| {
                    ctx.malformed_field("Bend.Value", "missing or unparsable");
                    0
                });
            BendPoint { position, value }
        })
        .collect();

    if points.is_empty() {
        None
    } else {
        Some(Effect::Bend(points))
    }
}

/// Decode a `<Note id="...">` element into an `ir::Note`. Unknown
/// properties are ignored; malformed numeric fields degrade to 0 rather
/// than aborting the parse.
pub fn decode_note(dom: &Dom, note_id: NodeId, ctx: &mut DecodeContext) -> Note {
    let props = properties_by_name(dom, note_id);
    let lookup = |name: &str| props.iter().find(|(n, _)| n == name).map(|(_, p)| *p);

    let fret = lookup("Fret").map(|p| property_int(dom, p, "Fret", ctx)).unwrap_or(0);
    let string = lookup("String")
        .map(|p| property_int(dom, p, "String", ctx) + 1)
        .unwrap_or(1);
    let velocity = lookup("Velocity")
        .map(|p| property_int(dom, p, "Velocity", ctx))
        .unwrap_or(100);
    let midi_number = lookup("Midi").map(|p| property_int(dom, p, "Midi", ctx));

    let is_tie = dom
        .child(note_id, "Tie")
        .map(|tie| dom.attr(tie, "destination") == Some("true"))
        .unwrap_or(false);

    let mut note = Note::new(string.max(1) as u32, fret);
    note.velocity = velocity.clamp(0, 127) as u8;
    note.note_type = if is_tie { NoteType::Tie } else { NoteType::Normal };
    note.midi_number = midi_number;

    if let Some(bend_prop) = lookup("Bends") {
        if let Some(effect) = parse_bend(dom, bend_prop, ctx) {
            note.effects.push(effect);
        }
    }

    note
}
