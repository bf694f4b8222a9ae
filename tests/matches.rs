//! Cross-video match tests.

use stillcut::{FrameHash, Sample, find_matches};

fn hash(label: &str) -> FrameHash {
    FrameHash::of(label.as_bytes())
}

#[test]
fn single_shared_frame() {
    let first = [Sample::new(0.0, hash("h1")), Sample::new(1.0, hash("h2"))];
    let second = [Sample::new(5.0, hash("h2"))];

    let matches = find_matches(&first, &second);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].first_time, matches[0].second_time), (1.0, 5.0));
    assert_eq!(matches[0].hash, hash("h2"));
}

#[test]
fn earliest_occurrence_in_second_video_wins() {
    let first = [Sample::new(2.0, hash("x"))];
    let second = [
        Sample::new(3.0, hash("x")),
        Sample::new(1.5, hash("x")),
        Sample::new(9.0, hash("x")),
    ];

    let matches = find_matches(&first, &second);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].second_time, 1.5);
}

#[test]
fn matches_follow_first_video_order() {
    let first = [
        Sample::new(0.0, hash("c")),
        Sample::new(0.5, hash("a")),
        Sample::new(1.0, hash("z")),
        Sample::new(1.5, hash("c")),
    ];
    let second = [Sample::new(0.0, hash("a")), Sample::new(4.0, hash("c"))];

    let pairs: Vec<(f64, f64)> = find_matches(&first, &second)
        .iter()
        .map(|found| (found.first_time, found.second_time))
        .collect();
    assert_eq!(pairs, vec![(0.0, 4.0), (0.5, 0.0), (1.5, 4.0)]);
}

#[test]
fn unresolved_samples_never_match() {
    let first = [Sample::unresolved(0.0), Sample::new(1.0, hash("a"))];
    let second = [Sample::unresolved(0.0), Sample::new(2.0, hash("b"))];
    assert!(find_matches(&first, &second).is_empty());
}

#[test]
fn empty_inputs() {
    let samples = [Sample::new(0.0, hash("a"))];
    assert!(find_matches(&[], &samples).is_empty());
    assert!(find_matches(&samples, &[]).is_empty());
}

#[test]
fn video_matched_against_itself() {
    let samples: Vec<Sample> = (0..10)
        .map(|i| Sample::new(f64::from(i), hash(&format!("{}", i % 3))))
        .collect();

    let matches = find_matches(&samples, &samples);
    assert_eq!(matches.len(), samples.len());
    for found in matches {
        assert!(found.second_time <= found.first_time);
        assert_eq!(found.second_time, found.first_time % 3.0);
    }
}
