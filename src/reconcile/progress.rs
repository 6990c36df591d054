//! Status rendering.

use crate::catalog::Batch;
use crate::types::PartState;
use crate::utils::pretty_size;

/// Render overall progress plus one line per transferring part
///
/// ```text
/// Overall 41.67% 12.50 MB / 30.00 MB
/// Part 2 25.0% 2.50 MB / 10.00 MB
/// ```
pub fn render_status(batch: &Batch) -> String {
    let total = batch.total_bytes();
    let downloaded = batch.downloaded_bytes();

    let mut lines = vec![format!(
        "Overall {:.2}% {} / {}",
        percent(downloaded, total),
        pretty_size(downloaded),
        pretty_size(total)
    )];

    for part in batch
        .parts
        .iter()
        .filter(|part| part.state == PartState::InProgress)
    {
        let received = part.bytes_received.unwrap_or(0);
        lines.push(format!(
            "Part {} {:.1}% {} / {}",
            part.ordinal,
            percent(received, part.size_bytes),
            pretty_size(received),
            pretty_size(part.size_bytes)
        ));
    }

    lines.join("\n")
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Part;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_render_overall_and_active_parts() {
        let mut batch = Batch::staged(
            (1..=3)
                .map(|n| Part::new(n, 3, format!("https://example.com/{n}"), 10 * MB))
                .collect(),
        );
        batch.parts[0].state = PartState::Complete;
        batch.parts[1].state = PartState::InProgress;
        batch.parts[1].bytes_received = Some(5 * MB / 2);

        assert_eq!(
            render_status(&batch),
            "Overall 41.67% 12.50 MB / 30.00 MB\nPart 2 25.0% 2.50 MB / 10.00 MB"
        );
    }

    #[test]
    fn test_render_zero_sized_catalog() {
        let batch = Batch::staged(vec![Part::new(1, 1, "https://example.com/1", 0)]);
        assert_eq!(render_status(&batch), "Overall 0.00% 0.00 B / 0.00 B");
    }
}
