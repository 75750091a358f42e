/*!
 * Merge engine: interleaves two subtitle tracks into one bilingual track.
 *
 * Every cue keeps its own timing. The top track is shown in the upper screen
 * region and the bottom track in the lower one, so overlapping cues from the
 * two languages never collide and are never combined.
 */

use log::debug;

use crate::cue::{MergedCue, MergedTrack, Role, Track};

/// Merge a top-language track and a bottom-language track.
///
/// The result holds every cue of both inputs, sorted by start time. On equal
/// start times Top cues come before Bottom cues, and cues of the same role keep
/// their input order.
pub fn merge(top: &Track, bottom: &Track) -> MergedTrack {
    let mut cues: Vec<MergedCue> = Vec::with_capacity(top.len() + bottom.len());

    cues.extend(tag(top, Role::Top));
    cues.extend(tag(bottom, Role::Bottom));

    // Stable: ties on (start, role) keep input order
    cues.sort_by_key(|merged| (merged.cue.start, merged.role));

    debug!(
        "Merged {} top cues and {} bottom cues",
        top.len(),
        bottom.len()
    );

    MergedTrack::from_ordered(cues)
}

fn tag(track: &Track, role: Role) -> impl Iterator<Item = MergedCue> + '_ {
    track.iter().map(move |cue| MergedCue {
        role,
        cue: cue.clone(),
    })
}
