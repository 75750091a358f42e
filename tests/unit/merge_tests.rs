/*!
 * Tests for the merge engine
 */

use extractsubs::cue::{Cue, Role, Track};
use extractsubs::merge::merge;

fn track(cues: &[(u64, u64, &str)]) -> Track {
    Track::from_cues(cues.iter().map(|(s, e, t)| Cue::from_millis(*s, *e, t)).collect()).unwrap()
}

/// The reference interleaving example
#[test]
fn test_merge_withOverlappingTracks_shouldInterleaveByStart() {
    let top = track(&[(0, 2_000, "Hello")]);
    let bottom = track(&[(500, 1_500, "Hola"), (3_000, 4_000, "Adios")]);

    let merged = merge(&top, &bottom);
    let result: Vec<(u64, Role, String)> = merged
        .iter()
        .map(|m| (m.cue.start.as_millis(), m.role, m.cue.text()))
        .collect();

    assert_eq!(
        result,
        vec![
            (0, Role::Top, "Hello".to_string()),
            (500, Role::Bottom, "Hola".to_string()),
            (3_000, Role::Bottom, "Adios".to_string()),
        ]
    );
}

#[test]
fn test_merge_withSameStart_shouldPutTopFirst() {
    let top = track(&[(1_000, 2_000, "top a"), (1_000, 1_500, "top b")]);
    let bottom = track(&[(1_000, 3_000, "bottom")]);

    let merged = merge(&top, &bottom);
    let roles: Vec<Role> = merged.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Top, Role::Top, Role::Bottom]);
    assert_eq!(merged.cues()[0].cue.text(), "top a");
}

#[test]
fn test_merge_shouldPreserveMembershipAndOrder() {
    let top = track(&[(0, 1_000, "1"), (4_000, 5_000, "2"), (9_000, 9_500, "3")]);
    let bottom = track(&[(200, 900, "a"), (4_000, 6_000, "b")]);

    let merged = merge(&top, &bottom);
    assert_eq!(merged.len(), 5);
    assert_eq!(merged.by_role(Role::Top), top);
    assert_eq!(merged.by_role(Role::Bottom), bottom);
    assert!(merged.cues().windows(2).all(|w| w[0].cue.start <= w[1].cue.start));
}

#[test]
fn test_merge_withEmptyInputs_shouldReturnOtherSideOrEmpty() {
    let bottom = track(&[(0, 1_000, "only")]);

    let merged = merge(&Track::new(), &bottom);
    assert_eq!(merged.count(Role::Bottom), 1);
    assert_eq!(merged.count(Role::Top), 0);

    assert!(merge(&Track::new(), &Track::new()).is_empty());
}
