//! The `<Rhythms>` table: maps rhythm IDs to a fractional quarter-note
//! length.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::xml::Dom;

/// `NoteValue` string -> fractional quarter-note length, undotted.
static BASE_VALUES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("Whole", 4.0),
        ("Half", 2.0),
        ("Quarter", 1.0),
        ("Eighth", 0.5),
        ("16th", 0.25),
        ("32nd", 0.125),
        ("64th", 0.0625),
        ("128th", 0.03125),
    ])
});

fn base_value(note_value: &str) -> f64 {
    BASE_VALUES.get(note_value).copied().unwrap_or(1.0)
}

/// id → fractional quarter-note length (e.g. `1.0` for a quarter note,
/// `1.75` for a double-dotted... actually a dotted half at count=2).
pub type RhythmTable = HashMap<String, f64>;

/// Build the rhythm table from `<Rhythms><Rhythm id="...">...`, applying
/// the `AugmentationDot` multiplier `2 - 2^-N` (N defaults to 1).
pub fn parse_rhythms(dom: &Dom) -> RhythmTable {
    let mut table = RhythmTable::new();

    let Some(rhythms_node) = dom.child(dom.root(), "Rhythms") else {
        return table;
    };

    for rhythm in dom.children(rhythms_node, "Rhythm") {
        let Some(id) = dom.attr(rhythm, "id") else {
            continue;
        };

        let note_value = dom.child_text(rhythm, "NoteValue").unwrap_or("Quarter");
        let mut value = base_value(note_value);

        if let Some(dot) = dom.child(rhythm, "AugmentationDot") {
            let count: u32 = dom
                .attr(dot, "count")
                .and_then(|c| c.parse().ok())
                .unwrap_or(1);
            value *= 2.0 - 2f64.powi(-(count as i32));
        }

        table.insert(id.to_string(), value);
    }

    table
}

/// Resolve a beat's `<Rhythm ref="...">` to a tick duration, defaulting to
/// one quarter note (960 ticks) when unresolvable.
pub fn duration_ticks(table: &RhythmTable, rhythm_ref: Option<&str>) -> u32 {
    let fraction = rhythm_ref
        .and_then(|id| table.get(id))
        .copied()
        .unwrap_or(1.0);
    (960.0 * fraction).round() as u32
}
