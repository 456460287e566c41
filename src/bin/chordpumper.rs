use std::path::PathBuf;

use anyhow::{anyhow, bail};
use chordpumper::midi_export::export_progression;
use chordpumper::state::{PersistentState, StateStore};
use chordpumper::{optimal_voicing, Chord, MidiNote, MorphConfig, MorphEngine, MorphWeights, DEFAULT_OCTAVE};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: chordpumper <chord> [--voicing 60,64,67] [--grid 32|64] [--weights d,c,v] [--state path] [--export path]";

/// Suggestions written when exporting.
const EXPORT_CHORDS: usize = 4;
const EXPORT_VELOCITY: f32 = 0.8;

#[derive(Debug)]
struct Args {
    chord: Chord,
    voicing: Vec<MidiNote>,
    config: MorphConfig,
    weights: Option<MorphWeights>,
    state: Option<PathBuf>,
    export: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut chord = None;
    let mut voicing = vec![];
    let mut config = MorphConfig::default();
    let mut weights = None;
    let mut state = None;
    let mut export = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| anyhow!("{arg} needs a value\n{USAGE}"));
        match arg.as_str() {
            "--voicing" => {
                voicing = value()?
                    .split(',')
                    .map(|n| n.trim().parse::<MidiNote>())
                    .collect::<Result<Vec<_>, _>>()?
            }
            "--grid" => config = MorphConfig::for_slots(value()?.parse()?)?,
            "--weights" => weights = Some(value()?.parse::<MorphWeights>()?),
            "--state" => state = Some(PathBuf::from(value()?)),
            "--export" => export = Some(PathBuf::from(value()?)),
            _ if chord.is_none() => chord = Some(arg.parse::<Chord>()?),
            _ => bail!("Unexpected argument '{arg}'\n{USAGE}"),
        }
    }

    let Some(chord) = chord else {
        bail!("{USAGE}");
    };
    Ok(Args {
        chord,
        voicing,
        config,
        weights,
        state,
        export,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args(&std::env::args().skip(1).collect::<Vec<_>>())?;
    let store = args.state.as_ref().map(StateStore::new);
    let mut state = match &store {
        Some(store) => store.load()?,
        None => PersistentState::default(),
    };
    let weights = args.weights.unwrap_or(state.weights);

    let voiced = optimal_voicing(&args.chord, &args.voicing, DEFAULT_OCTAVE);
    println!("{} voiced as {:?}", args.chord, voiced.midi_notes());

    let results = MorphEngine::new(args.config).morph(&args.chord, voiced.midi_notes(), &weights);
    for (rank, suggestion) in results.iter().enumerate() {
        println!(
            "{:>3} {:<8} {:<6} {:.3}",
            rank + 1,
            suggestion.chord().name(),
            suggestion.roman_numeral(),
            suggestion.score()
        );
    }

    if let Some(store) = store {
        state.weights = weights;
        state.apply_morph(&args.chord, voiced.midi_notes(), &results);
        state.progression.push(args.chord);
        store.save(&state)?;
    }

    if let Some(path) = args.export {
        let chords = results.iter().take(EXPORT_CHORDS).map(|s| s.chord()).collect::<Vec<_>>();
        export_progression(&chords, DEFAULT_OCTAVE, &path, EXPORT_VELOCITY)?;
    }
    Ok(())
}
