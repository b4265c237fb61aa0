use crate::song::Song;

/// HTML entities search providers leave in titles. `&amp;` comes last so an
/// escaped entity like `&amp;quot;` decodes to `&quot;` and no further.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&#39;", "'"),
    ("&quot;", "\""),
    ("&gt;", ">"),
    ("&lt;", "<"),
    ("&amp;", "&"),
];

/// Characters that can't appear in a filename, and their replacements
const INVALID_FILENAME_CHARS: &[(char, &str)] = &[('/', "_")];

/// Replace the HTML entities found in search result titles with plain text
pub fn html_to_ascii(s: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(s.to_string(), |acc, (entity, text)| acc.replace(entity, text))
}

pub fn sanitize_filename(s: &str) -> String {
    INVALID_FILENAME_CHARS
        .iter()
        .fold(s.to_string(), |acc, (invalid, replacement)| {
            acc.replace(*invalid, replacement)
        })
}

/// The name a downloaded song is stored under: `"{artist} - {title}.mp3"`
pub fn song_filename(song: &Song) -> String {
    sanitize_filename(&html_to_ascii(&format!(
        "{} - {}.mp3",
        song.artist, song.title
    )))
}

/// Song filename and the playlist folder it belongs to, for display
pub fn song_label(song: &Song, folder: &str) -> String {
    format!("{}\t\t{}", song_filename(song), folder)
}
