//! Export catalogs, URLs and recorded event logs

use takeout_dl::Part;

/// One mebibyte
pub const MB: u64 = 1024 * 1024;

/// Final URL of every download belonging to the fixture export
pub const EXPORT_URL: &str = "https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240315T101500.123Z?alt=media";

/// Final URL of a download from a second export
pub const OTHER_EXPORT_URL: &str = "https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240401T080000.000Z?alt=media";

/// Link the export page offers for a part
pub fn part_url(ordinal: u32) -> String {
    format!("https://takeout.google.com/takeout/download?j=fixture&i={}", ordinal - 1)
}

/// Filename the host settles on for a part
pub fn part_filename(ordinal: u32) -> String {
    format!("takeout-20240315T101500Z-{:03}.zip", ordinal)
}

/// Ordinal encoded in a part URL
pub fn ordinal_of(url: &str) -> Option<u32> {
    url.rsplit("i=").next()?.parse::<u32>().ok().map(|index| index + 1)
}

/// Catalog of `count` parts of `size` bytes each
pub fn catalog(count: u32, size: u64) -> Vec<Part> {
    (1..=count)
        .map(|n| Part::new(n, count, part_url(n), size))
        .collect()
}

/// Recorded host log: parts 1 and 2 start, part 1 finishes, part 2 is
/// renamed twice (the first name is a temporary one), and a download from
/// an unrelated site completes in between.
pub const RECORDED_LOG: &str = r#"
{"type":"created","id":101,"final_url":"https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240315T101500.123Z?alt=media"}
{"type":"changed","id":101,"filename":"/home/user/Downloads/takeout-20240315T101500Z-001.zip"}
{"type":"created","id":102,"final_url":"https://storage.googleusercontent.com/download/storage/v1/b/dataliberation/o/20240315T101500.123Z?alt=media"}
{"type":"changed","id":102,"filename":"/home/user/Downloads/Unconfirmed 613.crdownload"}
{"type":"created","id":7,"final_url":"https://example.com/cat.gif"}
{"type":"changed","id":7,"state":"complete"}
{"type":"changed","id":101,"state":"complete"}
{"type":"changed","id":102,"filename":"/home/user/Downloads/takeout-20240315T101500Z-002.zip"}
{"type":"changed","id":102,"paused":true,"can_resume":true}
"#;
