//! Process tree walker

use crate::probe::ProcessProbe;

/// All descendants of `root`, depth-first pre-order
///
/// A process whose children cannot be listed (usually because it exited
/// between the parent's listing and its own) contributes no descendants; its
/// siblings are still walked. `root` itself is not included.
pub fn descendants<P: ProcessProbe + ?Sized>(probe: &P, root: u32) -> Vec<u32> {
    let mut found = Vec::new();
    collect(probe, root, &mut found);
    found
}

fn collect<P: ProcessProbe + ?Sized>(probe: &P, pid: u32, found: &mut Vec<u32>) {
    let children = match probe.children(pid) {
        Ok(children) => children,
        Err(e) => {
            log::debug!("Not walking below {}: {}", pid, e);
            return;
        }
    };

    for child in children {
        found.push(child);
        collect(probe, child, found);
    }
}
