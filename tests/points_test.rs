use spopt::engine::Engine;
use spopt::model::{
    FiveFretColour, Note, NoteTrack, StarPowerPhrase, SyncTrack, TrackType,
};
use spopt::points::PointSet;
use spopt::settings::{DrumSettings, SqueezeSettings};
use spopt::timing::TimeConverter;

fn points_of(notes: Vec<Note>, resolution: u32) -> Vec<(u32, u32)> {
    let track = NoteTrack::new(TrackType::FiveFret, notes, vec![], vec![]).unwrap();
    let sync = SyncTrack::default();
    let converter = TimeConverter::new(&sync, resolution, Engine::Ch, 100);
    let set = PointSet::new(
        &track,
        &converter,
        resolution,
        Engine::Ch,
        &SqueezeSettings::optimal(),
        &DrumSettings::default(),
        &[],
    );
    set.points().iter().map(|p| (p.tick.0, p.value)).collect()
}

#[test]
fn test_single_notes_give_50_points() {
    let points = points_of(
        vec![
            Note::five_fret(768, FiveFretColour::Green),
            Note::five_fret(1000, FiveFretColour::Green),
        ],
        192,
    );
    assert_eq!(points, vec![(768, 50), (1000, 50)]);
}

#[test]
fn test_chords_give_multiples_of_50_points() {
    let points = points_of(
        vec![
            Note::five_fret(768, FiveFretColour::Green),
            Note::five_fret(768, FiveFretColour::Red),
        ],
        192,
    );
    assert_eq!(points, vec![(768, 100)]);
}

#[test]
fn test_hold_note_points_depend_on_resolution() {
    let note = vec![Note::five_fret_sustain(768, 15, FiveFretColour::Green)];

    assert_eq!(
        points_of(note.clone(), 192),
        vec![(768, 50), (775, 1), (782, 1), (789, 1)]
    );
    assert_eq!(points_of(note, 200), vec![(768, 50), (776, 1), (784, 1)]);
}

#[test]
fn test_hold_note_points_and_chords() {
    let points = points_of(
        vec![
            Note::five_fret_sustain(768, 7, FiveFretColour::Green),
            Note::five_fret_sustain(768, 8, FiveFretColour::Red),
        ],
        192,
    );
    assert_eq!(points, vec![(768, 100), (775, 1), (782, 1)]);
}

#[test]
fn test_resolutions_below_25_do_not_loop_forever() {
    let points = points_of(vec![Note::five_fret_sustain(768, 2, FiveFretColour::Green)], 1);
    assert_eq!(points, vec![(768, 50), (769, 1), (770, 1)]);
}

#[test]
fn test_points_are_sorted() {
    let points = points_of(
        vec![
            Note::five_fret_sustain(768, 15, FiveFretColour::Green),
            Note::five_fret(770, FiveFretColour::Red),
        ],
        192,
    );
    assert_eq!(
        points,
        vec![(768, 50), (770, 50), (775, 1), (782, 1), (789, 1)]
    );
}

#[test]
fn test_sustains_past_the_last_note_are_not_truncated() {
    let points = points_of(
        vec![
            Note::five_fret_sustain(0, 384, FiveFretColour::Green),
            Note::five_fret(96, FiveFretColour::Red),
        ],
        192,
    );
    let last = points.last().unwrap();
    assert!(last.0 > 96, "sustain should keep scoring past the last note");
}

#[test]
fn test_phrase_tail_point_grants_sp() {
    let track = NoteTrack::new(
        TrackType::FiveFret,
        vec![
            Note::five_fret(768, FiveFretColour::Green),
            Note::five_fret(1000, FiveFretColour::Red),
        ],
        vec![StarPowerPhrase::new(768, 300)],
        vec![],
    )
    .unwrap();
    let sync = SyncTrack::default();
    let converter = TimeConverter::new(&sync, 192, Engine::Ch, 100);
    let set = PointSet::new(
        &track,
        &converter,
        192,
        Engine::Ch,
        &SqueezeSettings::optimal(),
        &DrumSettings::default(),
        &[],
    );

    let granting: Vec<_> = set
        .points()
        .iter()
        .filter(|p| p.is_sp_granting)
        .map(|p| p.tick.0)
        .collect();
    assert_eq!(granting, vec![1000]);
}
