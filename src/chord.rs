use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::bail;
use bare_metal_modulo::MNum;
use enum_iterator::{all, Sequence};

use crate::pitch::{pitches, MidiNote, PitchClass, Semitone};

/// Largest number of tones in any chord quality.
pub const MAX_CHORD_SIZE: usize = 6;

/// Chord qualities in ordinal order. The first nine are the base qualities;
/// the rest layer 9ths, 11ths and 13ths over the major, minor and dominant
/// sevenths.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Sequence)]
pub enum ChordType {
    Major, Minor, Diminished, Augmented,
    Maj7, Min7, Dom7, Dim7, HalfDim7,
    Maj9, Maj11, Maj13,
    Min9, Min11, Min13,
    Dom9, Dom11, Dom13,
}

pub const BASE_CHORD_TYPES: [ChordType; 9] = [
    ChordType::Major,
    ChordType::Minor,
    ChordType::Diminished,
    ChordType::Augmented,
    ChordType::Maj7,
    ChordType::Min7,
    ChordType::Dom7,
    ChordType::Dim7,
    ChordType::HalfDim7,
];

impl ChordType {
    /// Semitone offsets from the root, ascending.
    pub fn intervals(&self) -> &'static [MidiNote] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Maj7 => &[0, 4, 7, 11],
            ChordType::Min7 => &[0, 3, 7, 10],
            ChordType::Dom7 => &[0, 4, 7, 10],
            ChordType::Dim7 => &[0, 3, 6, 9],
            ChordType::HalfDim7 => &[0, 3, 6, 10],
            ChordType::Maj9 => &[0, 4, 7, 11, 14],
            ChordType::Maj11 => &[0, 4, 7, 11, 14, 17],
            ChordType::Maj13 => &[0, 4, 7, 11, 14, 21],
            ChordType::Min9 => &[0, 3, 7, 10, 14],
            ChordType::Min11 => &[0, 3, 7, 10, 14, 17],
            ChordType::Min13 => &[0, 3, 7, 10, 14, 21],
            ChordType::Dom9 => &[0, 4, 7, 10, 14],
            ChordType::Dom11 => &[0, 4, 7, 10, 14, 17],
            ChordType::Dom13 => &[0, 4, 7, 10, 14, 21],
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ChordType::Major => "",
            ChordType::Minor => "m",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Maj7 => "maj7",
            ChordType::Min7 => "m7",
            ChordType::Dom7 => "7",
            ChordType::Dim7 => "dim7",
            ChordType::HalfDim7 => "m7b5",
            ChordType::Maj9 => "maj9",
            ChordType::Maj11 => "maj11",
            ChordType::Maj13 => "maj13",
            ChordType::Min9 => "m9",
            ChordType::Min11 => "m11",
            ChordType::Min13 => "m13",
            ChordType::Dom9 => "9",
            ChordType::Dom11 => "11",
            ChordType::Dom13 => "13",
        }
    }

    pub fn note_count(&self) -> usize {
        self.intervals().len()
    }

    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        all::<ChordType>().nth(ordinal)
    }

    pub fn is_base(&self) -> bool {
        BASE_CHORD_TYPES.contains(self)
    }

    /// Qualities written with an upper-case Roman numeral.
    pub fn is_upper_case(&self) -> bool {
        matches!(
            self,
            ChordType::Major
                | ChordType::Augmented
                | ChordType::Maj7
                | ChordType::Dom7
                | ChordType::Maj9
                | ChordType::Maj11
                | ChordType::Maj13
                | ChordType::Dom9
                | ChordType::Dom11
                | ChordType::Dom13
        )
    }

    pub fn is_diminished(&self) -> bool {
        matches!(self, ChordType::Diminished | ChordType::Dim7 | ChordType::HalfDim7)
    }

    pub fn family(&self) -> QualityFamily {
        match self {
            ChordType::Major | ChordType::Maj7 | ChordType::Dom7 => QualityFamily::Major,
            ChordType::Minor | ChordType::Min7 => QualityFamily::Minor,
            _ => QualityFamily::Other,
        }
    }
}

impl Display for ChordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

impl FromStr for ChordType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match all::<ChordType>().find(|t| t.suffix() == s) {
            Some(t) => Ok(t),
            None => bail!("No chord quality with suffix '{s}'"),
        }
    }
}

/// Coarse grouping of qualities used to keep suggestion lists varied.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Sequence)]
pub enum QualityFamily {
    Major,
    Minor,
    Other,
}

impl QualityFamily {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Chord {
    root: PitchClass,
    chord_type: ChordType,
}

impl Chord {
    pub const fn new(root: PitchClass, chord_type: ChordType) -> Self {
        Chord { root, chord_type }
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn chord_type(&self) -> ChordType {
        self.chord_type
    }

    pub fn note_count(&self) -> usize {
        self.chord_type.note_count()
    }

    /// Root-position notes in `octave`, in interval-table order.
    pub fn midi_notes(&self, octave: MidiNote) -> Vec<MidiNote> {
        let root_midi = self.root.midi_note(octave);
        self.chord_type
            .intervals()
            .iter()
            .map(|offset| root_midi + offset)
            .collect()
    }

    /// The semitone of each chord tone, in interval-table order.
    pub fn semitones(&self) -> impl Iterator<Item = MidiNote> + '_ {
        let root = self.root.semitone();
        self.chord_type
            .intervals()
            .iter()
            .map(move |offset| Semitone::new(root + offset).a())
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.root.name(), self.chord_type.suffix())
    }
}

impl Default for Chord {
    fn default() -> Self {
        Chord::new(pitches::C, ChordType::Major)
    }
}

impl Display for Chord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Chord {
    type Err = anyhow::Error;

    /// Parses names such as `C`, `F#m7`, `Bbm7b5` or `Ebmaj9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(first) = s.chars().next() else {
            bail!("Empty chord name");
        };
        let accidentals = s[first.len_utf8()..]
            .chars()
            .take_while(|c| *c == '#' || *c == 'b')
            .count();
        let split = first.len_utf8() + accidentals;
        let root = s[..split].parse::<PitchClass>()?;
        let chord_type = s[split..].parse::<ChordType>()?;
        Ok(Chord::new(root, chord_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{NoteLetter, NOTES_PER_OCTAVE};

    #[test]
    fn test_root_is_first_note() {
        for root in pitches::CHROMATIC.iter() {
            for chord_type in BASE_CHORD_TYPES.iter() {
                let chord = Chord::new(*root, *chord_type);
                assert_eq!(chord.midi_notes(4)[0], root.midi_note(4));
            }
        }
    }

    #[test]
    fn test_midi_notes() {
        assert_eq!(Chord::new(pitches::C, ChordType::Major).midi_notes(4), vec![60, 64, 67]);
        assert_eq!(Chord::new(pitches::C, ChordType::Min7).midi_notes(4), vec![60, 63, 67, 70]);
        assert_eq!(Chord::new(pitches::FS, ChordType::Major).midi_notes(4), vec![66, 70, 73]);
        assert_eq!(Chord::new(pitches::B, ChordType::Dim7).midi_notes(3), vec![59, 62, 65, 68]);
        assert_eq!(
            Chord::new(pitches::C, ChordType::Maj9).midi_notes(4),
            vec![60, 64, 67, 71, 74]
        );
        assert_eq!(
            Chord::new(pitches::G, ChordType::Dom13).midi_notes(3),
            vec![55, 59, 62, 65, 69, 76]
        );
    }

    #[test]
    fn test_note_counts() {
        for chord_type in all::<ChordType>() {
            let expected = match chord_type {
                ChordType::Major | ChordType::Minor | ChordType::Diminished | ChordType::Augmented => 3,
                ChordType::Maj9 | ChordType::Min9 | ChordType::Dom9 => 5,
                ChordType::Maj11 | ChordType::Maj13 | ChordType::Min11 | ChordType::Min13
                | ChordType::Dom11 | ChordType::Dom13 => 6,
                _ => 4,
            };
            assert_eq!(chord_type.note_count(), expected, "{chord_type:?}");
            assert!(chord_type.note_count() <= MAX_CHORD_SIZE);
            let chord = Chord::new(pitches::D, chord_type);
            assert_eq!(chord.midi_notes(2).len(), expected);
        }
    }

    #[test]
    fn test_intervals_ascend() {
        for chord_type in all::<ChordType>() {
            let intervals = chord_type.intervals();
            assert_eq!(intervals[0], 0);
            assert!(intervals.windows(2).all(|w| w[0] < w[1]), "{chord_type:?}");
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(Chord::new(pitches::C, ChordType::Major).name(), "C");
        assert_eq!(Chord::new(pitches::C, ChordType::HalfDim7).name(), "Cm7b5");
        assert_eq!(Chord::new(pitches::FS, ChordType::Maj9).name(), "F#maj9");
        assert_eq!(Chord::new(pitches::BB, ChordType::Dom13).to_string(), "Bb13");
        for root in pitches::CHROMATIC.iter() {
            for chord_type in all::<ChordType>() {
                assert!(Chord::new(*root, chord_type).name().starts_with(&root.name()));
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for root in pitches::CHROMATIC.iter() {
            for chord_type in all::<ChordType>() {
                let chord = Chord::new(*root, chord_type);
                assert_eq!(chord.name().parse::<Chord>().unwrap(), chord);
            }
        }
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("Bbm7b5".parse::<Chord>().unwrap(), Chord::new(pitches::BB, ChordType::HalfDim7));
        assert_eq!(
            " Cbmaj7 ".parse::<Chord>().unwrap(),
            Chord::new(PitchClass::new(NoteLetter::C, -1), ChordType::Maj7)
        );
        assert!("Cmaj".parse::<Chord>().is_err());
        assert!("".parse::<Chord>().is_err());
        assert!("Xm".parse::<Chord>().is_err());
        assert!(format!("C{}m7", "#".repeat(200)).parse::<Chord>().is_err());
    }

    #[test]
    fn test_semitones() {
        let chord = Chord::new(pitches::A, ChordType::Minor);
        assert_eq!(chord.semitones().collect::<Vec<_>>(), vec![9, 0, 4]);
        for s in Chord::new(pitches::B, ChordType::Dom13).semitones() {
            assert!((0..NOTES_PER_OCTAVE).contains(&s));
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(ChordType::Dom7.family(), QualityFamily::Major);
        assert_eq!(ChordType::Min7.family(), QualityFamily::Minor);
        assert_eq!(ChordType::Augmented.family(), QualityFamily::Other);
        assert_eq!(ChordType::HalfDim7.family(), QualityFamily::Other);
        for extended in [ChordType::Maj9, ChordType::Min11, ChordType::Dom13] {
            assert_eq!(extended.family(), QualityFamily::Other);
        }
    }

    #[test]
    fn test_ordinals() {
        for (i, chord_type) in all::<ChordType>().enumerate() {
            assert_eq!(chord_type.ordinal(), i);
            assert_eq!(ChordType::from_ordinal(i), Some(chord_type));
        }
        assert_eq!(ChordType::from_ordinal(18), None);
    }
}
