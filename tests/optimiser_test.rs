use spopt::engine::Engine;
use spopt::model::{
    Difficulty, FiveFretColour, Instrument, Note, NoteTrack, Song, StarPowerPhrase,
    SyncTrack, TrackType,
};
use spopt::optimiser::{optimise, score};
use spopt::processed::ProcessedSong;
use spopt::settings::{DrumSettings, SqueezeSettings};

fn processed(notes: Vec<Note>, phrases: Vec<StarPowerPhrase>) -> ProcessedSong {
    let mut song = Song::new(192, SyncTrack::default()).unwrap();
    let track = NoteTrack::new(TrackType::FiveFret, notes, phrases, vec![]).unwrap();
    song.add_note_track(Instrument::Guitar, Difficulty::Expert, track);
    ProcessedSong::build(
        &song,
        Instrument::Guitar,
        Difficulty::Expert,
        Engine::Ch,
        SqueezeSettings::optimal(),
        DrumSettings::default(),
        100,
    )
    .unwrap()
}

#[test]
fn test_no_sp_phrases_mean_no_activations() {
    let song = processed(
        vec![
            Note::five_fret(768, FiveFretColour::Green),
            Note::five_fret(1000, FiveFretColour::Green),
        ],
        vec![],
    );
    let path = optimise(&song).unwrap();

    assert!(path.activations.is_empty());
    assert_eq!(path.total_score, 100);
}

#[test]
fn test_a_short_sustain_cannot_fill_half_a_bar() {
    // One phrase is a quarter bar; fifty ticks of whammy come nowhere near
    // the other quarter, so no activation is possible.
    let song = processed(
        vec![
            Note::five_fret_sustain(0, 50, FiveFretColour::Green),
            Note::five_fret(192, FiveFretColour::Red),
        ],
        vec![StarPowerPhrase::new(0, 51)],
    );
    let path = optimise(&song).unwrap();

    assert!(path.activations.is_empty());
    assert_eq!(path.score_boost, 0);
}

#[test]
fn test_whammy_on_a_long_sustain_enables_an_activation() {
    // 1440 ticks is 7.5 beats of whammy, exactly the quarter bar needed on
    // top of the phrase award to reach the activation threshold.
    let song = processed(
        vec![
            Note::five_fret_sustain(0, 1440, FiveFretColour::Green),
            Note::five_fret(1536, FiveFretColour::Red),
        ],
        vec![StarPowerPhrase::new(0, 1441)],
    );
    let path = optimise(&song).unwrap();

    assert_eq!(path.activations.len(), 1);
    let act = path.activations[0];
    let points = song.points().points();

    // The activation runs through the final note.
    assert_eq!(act.act_end, points.len() - 1);
    assert!(path.score_boost >= 50);

    // The engaged beat sits inside the squeeze window of the start point.
    let start = &points[act.act_start];
    assert!(act.engage_beat.0 >= start.hit_window_start.beat.0 - 1e-6);
    assert!(act.engage_beat.0 <= start.hit_window_end.beat.0 + 1e-6);
}

#[test]
fn test_activation_ranges_are_strictly_increasing() {
    // Enough phrases for several activations.
    let mut notes = Vec::new();
    let mut phrases = Vec::new();
    for i in 0..40_u32 {
        notes.push(Note::five_fret(i * 192, FiveFretColour::Green));
        if i % 4 == 0 {
            phrases.push(StarPowerPhrase::new(i * 192, 50));
        }
    }
    let song = processed(notes, phrases);
    let path = optimise(&song).unwrap();

    assert!(!path.activations.is_empty());
    for pair in path.activations.windows(2) {
        assert!(
            pair[0].act_end < pair[1].act_start,
            "activations must not overlap"
        );
    }
}

#[test]
fn test_score_recomputes_the_optimiser_total() {
    let mut notes = Vec::new();
    let mut phrases = Vec::new();
    for i in 0..24_u32 {
        notes.push(Note::five_fret(i * 192, FiveFretColour::Green));
        if i % 3 == 0 {
            phrases.push(StarPowerPhrase::new(i * 192, 50));
        }
    }
    let song = processed(notes, phrases);
    let path = optimise(&song).unwrap();

    assert_eq!(score(&song, &path).unwrap(), path.total_score);
}

#[test]
fn test_optimised_path_beats_or_matches_the_empty_path() {
    let mut notes = Vec::new();
    let mut phrases = Vec::new();
    for i in 0..16_u32 {
        notes.push(Note::five_fret(i * 192, FiveFretColour::Green));
        if i % 5 == 0 {
            phrases.push(StarPowerPhrase::new(i * 192, 50));
        }
    }
    let song = processed(notes, phrases);
    let path = optimise(&song).unwrap();
    let empty_score = song.base_score().unwrap() + song.solo_total().unwrap();

    assert!(path.total_score >= empty_score);
}

#[test]
fn test_solo_bonuses_are_added_outside_the_search() {
    let mut song = Song::new(192, SyncTrack::default()).unwrap();
    let track = NoteTrack::new(
        TrackType::FiveFret,
        vec![
            Note::five_fret(0, FiveFretColour::Green),
            Note::five_fret(192, FiveFretColour::Red),
        ],
        vec![],
        vec![spopt::model::Solo {
            start: spopt::timing::Tick(0),
            end: spopt::timing::Tick(192),
            value: 200,
        }],
    )
    .unwrap();
    song.add_note_track(Instrument::Guitar, Difficulty::Expert, track);
    let processed = ProcessedSong::build(
        &song,
        Instrument::Guitar,
        Difficulty::Expert,
        Engine::Ch,
        SqueezeSettings::optimal(),
        DrumSettings::default(),
        100,
    )
    .unwrap();
    let path = optimise(&processed).unwrap();

    assert_eq!(path.total_score, 100 + 200);
}
