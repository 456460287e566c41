use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::bail;
use enum_iterator::{all, Sequence};
use float_cmp::{ApproxEq, F64Margin};
use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::chord::{Chord, QualityFamily};
use crate::pitch::{interval_between, MidiNote, NOTES_PER_OCTAVE};
use crate::pitch_class_set::{ChordCatalog, PitchClassSet};
use crate::roman::roman_numeral;
use crate::scales::Mode;
use crate::voice_leader::voice_leading_distance;

/// Octave used to voice the reference chord when nothing is sounding.
pub const DEFAULT_OCTAVE: MidiNote = 4;

/// Distance at which the voice-leading score bottoms out at zero.
const VOICE_LEADING_SPAN: f64 = 24.0;

const NUM_FAMILIES: usize = <QualityFamily as Sequence>::CARDINALITY;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MorphWeights {
    pub diatonic: f64,
    pub common_tones: f64,
    pub voice_leading: f64,
}

impl Default for MorphWeights {
    fn default() -> Self {
        MorphWeights {
            diatonic: 0.40,
            common_tones: 0.25,
            voice_leading: 0.25,
        }
    }
}

impl MorphWeights {
    pub fn new(diatonic: f64, common_tones: f64, voice_leading: f64) -> Self {
        MorphWeights {
            diatonic,
            common_tones,
            voice_leading,
        }
    }

    pub fn sum(&self) -> f64 {
        self.diatonic + self.common_tones + self.voice_leading
    }

    /// Weighted mean of the three component scores. Non-positive weight sums
    /// leave the weighted sum unnormalised.
    pub fn composite(&self, diatonic: f64, common_tones: f64, voice_leading: f64) -> f64 {
        let weighted = self.diatonic * diatonic
            + self.common_tones * common_tones
            + self.voice_leading * voice_leading;
        let total = self.sum();
        if total > 0.0 {
            weighted / total
        } else {
            weighted
        }
    }
}

impl ApproxEq for MorphWeights {
    type Margin = F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        let margin = margin.into();
        self.diatonic.approx_eq(other.diatonic, margin)
            && self.common_tones.approx_eq(other.common_tones, margin)
            && self.voice_leading.approx_eq(other.voice_leading, margin)
    }
}

impl FromStr for MorphWeights {
    type Err = anyhow::Error;

    /// Parses `diatonic,common_tones,voice_leading`, e.g. `0.4,0.25,0.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()?;
        if parts.len() != 3 {
            bail!("Expected three comma-separated weights, got '{s}'");
        }
        Ok(MorphWeights::new(parts[0], parts[1], parts[2]))
    }
}

/// Size and variety parameters for one grid layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MorphConfig {
    pub slots: usize,
    pub pool_size: usize,
    pub min_per_category: usize,
    pub catalog: ChordCatalog,
}

impl MorphConfig {
    pub fn grid_32() -> Self {
        MorphConfig {
            slots: 32,
            pool_size: 36,
            min_per_category: 2,
            catalog: ChordCatalog::Basic,
        }
    }

    pub fn grid_64() -> Self {
        MorphConfig {
            slots: 64,
            pool_size: 72,
            min_per_category: 4,
            catalog: ChordCatalog::Extended,
        }
    }

    pub fn for_slots(slots: usize) -> anyhow::Result<Self> {
        match slots {
            32 => Ok(Self::grid_32()),
            64 => Ok(Self::grid_64()),
            _ => bail!("No grid with {slots} slots; choose 32 or 64"),
        }
    }
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self::grid_32()
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ScoredChord {
    chord: Chord,
    score: f64,
    roman_numeral: String,
}

impl ScoredChord {
    pub fn new(chord: Chord, score: f64, roman_numeral: String) -> Self {
        ScoredChord {
            chord,
            score,
            roman_numeral,
        }
    }

    pub fn chord(&self) -> Chord {
        self.chord
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn roman_numeral(&self) -> &str {
        self.roman_numeral.as_str()
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    scored: ScoredChord,
    interval: MidiNote,
}

impl Candidate {
    fn family(&self) -> QualityFamily {
        self.scored.chord.chord_type().family()
    }

    /// Best score first, then nearer roots, then simpler qualities.
    fn ranking(&self, other: &Self) -> Ordering {
        OrderedFloat(other.scored.score)
            .cmp(&OrderedFloat(self.scored.score))
            .then(self.interval.cmp(&other.interval))
            .then(self.scored.chord.chord_type().cmp(&other.scored.chord.chord_type()))
    }
}

/// Highest typicality among the modes on `tonic` in which `candidate` is a
/// diatonic triad or seventh; zero when it belongs to none.
pub fn score_diatonic(tonic: MidiNote, candidate: &Chord) -> f64 {
    Mode::modes_containing(tonic, candidate)
        .iter()
        .map(|mode| mode.typicality())
        .fold(0.0, f64::max)
}

pub fn score_common_tones(reference: &Chord, candidate: &Chord) -> f64 {
    let shared = PitchClassSet::of(reference).common_tone_count(&PitchClassSet::of(candidate));
    shared as f64 / reference.note_count().max(candidate.note_count()) as f64
}

/// Closeness of `candidate` in root position, an octave either side of
/// `baseline_octave`, to the sounding notes.
pub fn score_voice_leading(baseline: &[MidiNote], baseline_octave: MidiNote, candidate: &Chord) -> f64 {
    let distance = (baseline_octave - 1..=baseline_octave + 1)
        .map(|octave| voice_leading_distance(baseline, &candidate.midi_notes(octave)))
        .min()
        .unwrap_or(0);
    (1.0 - distance as f64 / VOICE_LEADING_SPAN).max(0.0)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct MorphEngine {
    config: MorphConfig,
}

impl MorphEngine {
    pub fn new(config: MorphConfig) -> Self {
        MorphEngine { config }
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    /// Ranks every catalog chord as a successor to `reference` and returns
    /// exactly `slots` suggestions, best first, with each quality family
    /// represented where the pool allows.
    pub fn morph(&self, reference: &Chord, voicing: &[MidiNote], weights: &MorphWeights) -> Vec<ScoredChord> {
        let baseline = if voicing.is_empty() {
            reference.midi_notes(DEFAULT_OCTAVE)
        } else {
            voicing.to_vec()
        };
        let centroid = baseline.iter().sum::<MidiNote>() / baseline.len() as MidiNote;
        let baseline_octave = centroid / NOTES_PER_OCTAVE - 1;
        let tonic = reference.root().semitone();

        let mut unique: BTreeMap<PitchClassSet, Candidate> = BTreeMap::new();
        for chord in self.config.catalog.chords() {
            let score = weights.composite(
                score_diatonic(tonic, chord),
                score_common_tones(reference, chord),
                score_voice_leading(&baseline, baseline_octave, chord),
            );
            let candidate = Candidate {
                scored: ScoredChord::new(*chord, score, roman_numeral(reference, chord)),
                interval: interval_between(tonic, chord.root().semitone()),
            };
            let pcs = PitchClassSet::of(chord);
            if unique.get(&pcs).map_or(true, |kept| candidate.interval < kept.interval) {
                unique.insert(pcs, candidate);
            }
        }

        let mut pool = unique.into_values().collect::<Vec<_>>();
        pool.sort_by(|a, b| a.ranking(b));
        pool.truncate(self.config.pool_size);
        let window = pool.len().min(self.config.slots);
        let swaps = self.balance_families(&mut pool, window);
        debug!(
            reference = %reference,
            pool = pool.len(),
            window,
            swaps,
            "morph ranked"
        );

        pool.truncate(window);
        pool.sort_by(|a, b| a.ranking(b));
        let mut result = pool.into_iter().map(|c| c.scored).collect::<Vec<_>>();
        result.resize(self.config.slots, ScoredChord::default());
        result
    }

    /// Swaps pool entries beyond `window` into it until every family has
    /// `min_per_category` members, taking slots from the most crowded family.
    /// A family stays short when the pool has no reserve for it.
    fn balance_families(&self, pool: &mut [Candidate], window: usize) -> usize {
        let threshold = self.config.min_per_category;
        let mut counts = [0; NUM_FAMILIES];
        for candidate in pool[..window].iter() {
            counts[candidate.family().index()] += 1;
        }

        let mut swaps = 0;
        for family in all::<QualityFamily>() {
            while counts[family.index()] < threshold {
                let Some(reserve) = (window..pool.len()).find(|&j| pool[j].family() == family) else {
                    break;
                };
                let donor = all::<QualityFamily>()
                    .filter(|f| counts[f.index()] > threshold)
                    .fold(None, |best: Option<QualityFamily>, f| match best {
                        Some(b) if counts[b.index()] >= counts[f.index()] => Some(b),
                        _ => Some(f),
                    });
                let Some(donor) = donor else {
                    break;
                };
                let Some(worst) = (0..window).rev().find(|&i| pool[i].family() == donor) else {
                    break;
                };
                trace!(
                    incoming = %pool[reserve].scored.chord,
                    outgoing = %pool[worst].scored.chord,
                    "family swap"
                );
                pool.swap(worst, reserve);
                counts[donor.index()] -= 1;
                counts[family.index()] += 1;
                swaps += 1;
            }
        }
        swaps
    }
}

pub fn morph(
    reference: &Chord,
    voicing: &[MidiNote],
    weights: &MorphWeights,
    config: &MorphConfig,
) -> Vec<ScoredChord> {
    MorphEngine::new(*config).morph(reference, voicing, weights)
}
