use std::sync::OnceLock;

use regex::Regex;

/// Separates the index and broadcaster fields inside a clip file name
pub const FIELD_DELIMITER: char = '$';

static CLIP_FILE: OnceLock<Regex> = OnceLock::new();

fn clip_file_regex() -> &'static Regex {
    CLIP_FILE.get_or_init(|| Regex::new(r"^(\d+)\$(.*)\$\.mp4$").unwrap())
}

/// Remove the field delimiter and other problematic characters from a broadcaster name
pub fn sanitize_broadcaster(name: &str) -> String {
    name.split(['\'', '"', '/', '\\', '|', '~', '$', '#'])
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Build the file name carrying a clip's download slot and broadcaster credit.
/// Both fields are recovered from the name when the reel is stitched.
pub fn clip_file_name(index: usize, broadcaster: &str) -> String {
    format!(
        "{index}{FIELD_DELIMITER}{}{FIELD_DELIMITER}.mp4",
        sanitize_broadcaster(broadcaster)
    )
}

/// Inverse of [`clip_file_name`]. `None` for files that were not produced by it.
pub fn parse_clip_file_name(name: &str) -> Option<(usize, String)> {
    let cap = clip_file_regex().captures(name)?;
    let index = cap[1].parse().ok()?;
    Some((index, cap[2].to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_expected_shape() {
        assert_eq!(clip_file_name(3, "ninja"), "3$ninja$.mp4");
        assert_eq!(clip_file_name(0, ""), "0$$.mp4");
    }

    #[test]
    fn round_trips_through_parse() {
        for (index, name) in [(0, "shroud"), (17, "loserfruit"), (120, "a b c")] {
            let file = clip_file_name(index, name);
            assert_eq!(parse_clip_file_name(&file), Some((index, name.to_owned())));
        }
    }

    #[test]
    fn sanitizes_the_delimiter_out_of_names() {
        assert_eq!(sanitize_broadcaster("na$me"), "name");
        assert_eq!(sanitize_broadcaster("a/b\\c"), "abc");
        assert_eq!(sanitize_broadcaster(" padded "), "padded");

        // A hostile name cannot break the file name contract
        let file = clip_file_name(2, "x$y$.mp4");
        assert_eq!(parse_clip_file_name(&file), Some((2, "xy.mp4".to_owned())));
    }

    #[test]
    fn rejects_foreign_files() {
        assert_eq!(parse_clip_file_name("readme.txt"), None);
        assert_eq!(parse_clip_file_name("3$name.mp4"), None);
        assert_eq!(parse_clip_file_name("name$3$.mp4"), None);
        assert_eq!(parse_clip_file_name("3$name$.webm"), None);
    }
}
