//! Custom assertion helpers for snapshot sequences.

use cf_protocol::{ClipStatus, ProjectSnapshot, ProjectStatus};

/// Project statuses in the order observed, with consecutive repeats collapsed.
#[allow(dead_code)]
pub fn status_path(snapshots: &[ProjectSnapshot]) -> Vec<ProjectStatus> {
    let mut path: Vec<ProjectStatus> = Vec::new();
    for snapshot in snapshots {
        if path.last() != Some(&snapshot.status) {
            path.push(snapshot.status);
        }
    }
    path
}

/// Assert that `observed` is a subsequence of `expected`.
#[allow(dead_code)]
pub fn assert_status_subsequence(observed: &[ProjectStatus], expected: &[ProjectStatus]) {
    let mut remaining = expected.iter();
    for status in observed {
        assert!(
            remaining.any(|s| s == status),
            "Observed statuses {observed:?} are not a subsequence of {expected:?}"
        );
    }
}

/// Assert that revisions strictly increase and clip counters never go back.
#[allow(dead_code)]
pub fn assert_monotonic(snapshots: &[ProjectSnapshot]) {
    for pair in snapshots.windows(2) {
        assert!(
            pair[0].revision < pair[1].revision,
            "Revisions must increase: {} then {}",
            pair[0].revision,
            pair[1].revision
        );
        assert!(pair[0].completed_clips <= pair[1].completed_clips);
        for (before, after) in pair[0].clips.iter().zip(&pair[1].clips) {
            assert!(before.retry_count <= after.retry_count);
        }
    }
}

/// Statuses clip `index` went through, with consecutive repeats collapsed.
#[allow(dead_code)]
pub fn clip_status_path(snapshots: &[ProjectSnapshot], index: usize) -> Vec<ClipStatus> {
    let mut path: Vec<ClipStatus> = Vec::new();
    for clip in snapshots.iter().filter_map(|s| s.clips.get(index)) {
        if path.last() != Some(&clip.status) {
            path.push(clip.status);
        }
    }
    path
}

/// Assert that a clip path follows the success or the failure shape.
#[allow(dead_code)]
pub fn assert_clip_path(path: &[ClipStatus]) {
    const DONE: [ClipStatus; 4] = [
        ClipStatus::Pending,
        ClipStatus::ImageGenerating,
        ClipStatus::VideoGenerating,
        ClipStatus::Done,
    ];
    const FAILED: [ClipStatus; 4] = [
        ClipStatus::Pending,
        ClipStatus::ImageGenerating,
        ClipStatus::VideoGenerating,
        ClipStatus::Failed,
    ];
    let follows = |expected: &[ClipStatus]| {
        let mut remaining = expected.iter();
        path.iter().all(|status| remaining.any(|s| s == status))
    };
    assert!(
        follows(&DONE) || follows(&FAILED),
        "Clip statuses {path:?} follow neither {DONE:?} nor {FAILED:?}"
    );
}

/// Assert that no snapshot shows more than one clip in a generation stage.
#[allow(dead_code)]
pub fn assert_one_active_clip(snapshots: &[ProjectSnapshot]) {
    for snapshot in snapshots {
        let active = snapshot
            .clips
            .iter()
            .filter(|clip| {
                matches!(
                    clip.status,
                    ClipStatus::ImageGenerating | ClipStatus::VideoGenerating
                )
            })
            .count();
        assert!(
            active <= 1,
            "Revision {} has {active} clips generating at once",
            snapshot.revision
        );
    }
}
