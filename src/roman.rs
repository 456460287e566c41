use crate::chord::{Chord, ChordType};
use crate::pitch::{interval_between, USIZE_NOTES_PER_OCTAVE};

const TRITONE: usize = 6;

/// Upper- and lower-case numerals for each semitone above the reference root.
const ROMAN_NUMERALS: [(&str, &str); USIZE_NOTES_PER_OCTAVE] = [
    ("I", "i"),
    ("\u{266d}II", "\u{266d}ii"),
    ("II", "ii"),
    ("\u{266d}III", "\u{266d}iii"),
    ("III", "iii"),
    ("IV", "iv"),
    ("\u{266f}IV", "\u{266f}iv"),
    ("V", "v"),
    ("\u{266d}VI", "\u{266d}vi"),
    ("VI", "vi"),
    ("\u{266d}VII", "\u{266d}vii"),
    ("VII", "vii"),
];

fn quality_suffix(chord_type: ChordType) -> &'static str {
    match chord_type {
        ChordType::Major | ChordType::Minor => "",
        ChordType::Diminished => "\u{b0}",
        ChordType::Augmented => "+",
        ChordType::Maj7 => "\u{394}",
        ChordType::Min7 | ChordType::Dom7 => "7",
        ChordType::Dim7 => "\u{b0}7",
        ChordType::HalfDim7 => "\u{f8}7",
        // Extended qualities are labelled by case alone.
        _ => "",
    }
}

/// Scale-degree label of `suggestion` relative to the root of `reference`.
///
/// The tritone is spelled as a raised fourth for upper-case qualities and as
/// a lowered fifth otherwise: `♯IV`, `♯IV+`, `♭v`, `♭v°`.
pub fn roman_numeral(reference: &Chord, suggestion: &Chord) -> String {
    let interval = interval_between(reference.root().semitone(), suggestion.root().semitone()) as usize;
    let chord_type = suggestion.chord_type();
    let upper = chord_type.is_upper_case();

    if interval == TRITONE {
        return if upper {
            if chord_type == ChordType::Augmented {
                "\u{266f}IV+".to_string()
            } else {
                "\u{266f}IV".to_string()
            }
        } else if chord_type.is_diminished() {
            "\u{266d}v\u{b0}".to_string()
        } else {
            "\u{266d}v".to_string()
        };
    }

    let (upper_case, lower_case) = ROMAN_NUMERALS[interval];
    let base = if upper { upper_case } else { lower_case };
    format!("{base}{}", quality_suffix(chord_type))
}
