use super::entry::AppEntry;

/// Result of comparing two entry snapshots. `changed` gates the UI rebuild;
/// `force_visible` additionally asks the dock to reveal itself because an
/// application appeared or went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOutcome {
    pub changed: bool,
    pub force_visible: bool,
}

/// Compares two entry lists for user-visible change. The comparison is
/// positional: reordering otherwise-identical entries counts as a change.
pub fn compare(previous: &[AppEntry], next: &[AppEntry]) -> DiffOutcome {
    if previous.len() != next.len() {
        return DiffOutcome {
            changed: true,
            force_visible: true,
        };
    }

    let changed = previous.iter().zip(next).any(|(a, b)| entry_differs(a, b));
    DiffOutcome {
        changed,
        force_visible: false,
    }
}

fn entry_differs(a: &AppEntry, b: &AppEntry) -> bool {
    if a.instance_count != b.instance_count || a.name != b.name {
        return true;
    }
    a.instances
        .iter()
        .zip(&b.instances)
        .any(|(x, y)| x.title != y.title || x.fullscreen != y.fullscreen)
}
