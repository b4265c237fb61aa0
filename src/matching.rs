//! Picks the search result that most likely is the studio recording of a song.
//!
//! Search results are free-text video titles, so the selector works as a chain
//! of exclusion rules: anything that looks like a cover, live recording, music
//! video, remix and so on is skipped unless the song itself carries the same
//! marker (e.g. a song literally called "Live Forever"). The first result that
//! survives every rule wins.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::config::MatchConfig;
use crate::song::{SearchResult, Song};

/// Reasons a search result is skipped, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionRule {
    Cover,
    Live,
    MusicVideo,
    Instrumental,
    Acoustic,
    Reaction,
    BehindTheScenes,
    Mix,
    Performance,
    MissingTitleOrArtist,
    OutsideTimeWindow,
}

/// Evaluation order matters: the first rule that fires decides.
pub const EXCLUSION_RULES: [ExclusionRule; 11] = [
    ExclusionRule::Cover,
    ExclusionRule::Live,
    ExclusionRule::MusicVideo,
    ExclusionRule::Instrumental,
    ExclusionRule::Acoustic,
    ExclusionRule::Reaction,
    ExclusionRule::BehindTheScenes,
    ExclusionRule::Mix,
    ExclusionRule::Performance,
    ExclusionRule::MissingTitleOrArtist,
    ExclusionRule::OutsideTimeWindow,
];

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExclusionRule::Cover => "cover",
            ExclusionRule::Live => "live",
            ExclusionRule::MusicVideo => "music video",
            ExclusionRule::Instrumental => "instrumental",
            ExclusionRule::Acoustic => "acoustic",
            ExclusionRule::Reaction => "reaction",
            ExclusionRule::BehindTheScenes => "behind the scenes",
            ExclusionRule::Mix => "mix",
            ExclusionRule::Performance => "performance",
            ExclusionRule::MissingTitleOrArtist => "missing title or artist",
            ExclusionRule::OutsideTimeWindow => "outside time window",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Whole-word matching
// =============================================================================

/// Case-insensitive match that must not touch a letter on either side.
///
/// Only letters block a match: "live2" and "(live)" both contain "live",
/// "liveband" does not.
struct WholeWord {
    patterns: Vec<Regex>,
}

impl WholeWord {
    /// One pattern per accepted spelling. Each spelling is checked on its own
    /// so that a longer spelling failing the boundary check doesn't hide a
    /// shorter one.
    fn new(patterns: &[&str]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .unwrap_or_else(|e| panic!("Invalid built-in pattern {pattern}: {e}"))
                })
                .collect(),
        }
    }

    fn words(words: &[&str]) -> Self {
        let escaped: Vec<String> = words.iter().map(|word| regex::escape(word)).collect();
        Self::new(&escaped.iter().map(String::as_str).collect::<Vec<_>>())
    }

    fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.find_iter(text).any(|m| {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                !before.is_some_and(|c| c.is_ascii_alphabetic())
                    && !after.is_some_and(|c| c.is_ascii_alphabetic())
            })
        })
    }
}

struct Patterns {
    cover: WholeWord,
    live: WholeWord,
    music_video: Regex,
    official: WholeWord,
    lyric: WholeWord,
    audio: WholeWord,
    instrumental: WholeWord,
    acoustic: WholeWord,
    reaction: WholeWord,
    behind_the_scenes: WholeWord,
    bts: WholeWord,
    mix: WholeWord,
    performance: WholeWord,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    cover: WholeWord::words(&["cover"]),
    live: WholeWord::words(&["live"]),
    music_video: RegexBuilder::new(r"music[^a-z]video")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("Invalid built-in pattern: {e}")),
    official: WholeWord::words(&["official"]),
    lyric: WholeWord::words(&["lyric", "lyrics"]),
    audio: WholeWord::words(&["audio"]),
    instrumental: WholeWord::words(&["instrumental"]),
    acoustic: WholeWord::words(&["acoustic"]),
    reaction: WholeWord::words(&["react", "reaction"]),
    behind_the_scenes: WholeWord::new(&[r"behind[^a-z\n]the[^a-z\n]scenes"]),
    bts: WholeWord::words(&["bts"]),
    mix: WholeWord::words(&["mix", "remix"]),
    performance: WholeWord::words(&["perform", "performs", "performance"]),
});

/// Case-insensitive literal substring check. Song titles can contain
/// characters like `(`, `?` or `+`, which must not act as regex syntax.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    match RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.is_match(haystack),
        Err(_) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

// =============================================================================
// Rule evaluation
// =============================================================================

/// A search result paired with the song it is being judged against.
struct Candidate<'a> {
    song: &'a Song,
    reference: String,
    title: &'a str,
    /// Results without a duration are treated as matching the song exactly
    time: u32,
}

impl Candidate<'_> {
    /// The result is marked with `word` but the song itself isn't.
    fn marked_only_by_result(&self, word: &WholeWord) -> bool {
        word.is_match(self.title) && !word.is_match(&self.reference)
    }
}

impl ExclusionRule {
    fn excludes(self, candidate: &Candidate<'_>, config: &MatchConfig) -> bool {
        let patterns = &*PATTERNS;
        match self {
            ExclusionRule::Cover => candidate.marked_only_by_result(&patterns.cover),
            ExclusionRule::Live => candidate.marked_only_by_result(&patterns.live),
            ExclusionRule::MusicVideo => {
                let music_video = patterns.music_video.is_match(candidate.title)
                    && !patterns.music_video.is_match(&candidate.reference);
                // "Official Lyric Video" and "Official Audio" are fine
                let official = candidate.marked_only_by_result(&patterns.official)
                    && !patterns.lyric.is_match(candidate.title)
                    && !patterns.audio.is_match(candidate.title)
                    && !patterns.audio.is_match(&candidate.reference);
                music_video || official
            }
            ExclusionRule::Instrumental => {
                candidate.marked_only_by_result(&patterns.instrumental)
            }
            ExclusionRule::Acoustic => candidate.marked_only_by_result(&patterns.acoustic),
            ExclusionRule::Reaction => candidate.marked_only_by_result(&patterns.reaction),
            ExclusionRule::BehindTheScenes => {
                patterns.behind_the_scenes.is_match(candidate.title)
                    || candidate.marked_only_by_result(&patterns.bts)
            }
            ExclusionRule::Mix => candidate.marked_only_by_result(&patterns.mix),
            ExclusionRule::Performance => candidate.marked_only_by_result(&patterns.performance),
            ExclusionRule::MissingTitleOrArtist => {
                !contains_ignore_case(candidate.title, &candidate.song.title)
                    || !contains_ignore_case(candidate.title, &candidate.song.artist)
            }
            ExclusionRule::OutsideTimeWindow => {
                let difference = i64::from(candidate.time) - i64::from(candidate.song.time);
                difference < config.time_lower_bound || difference > config.time_upper_bound
            }
        }
    }
}

/// Chooses the best search result for a song.
#[derive(Debug, Clone, Default)]
pub struct MatchSelector {
    config: MatchConfig,
}

impl MatchSelector {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// The first rule that rejects `result` for `song`, or `None` if it is acceptable.
    pub fn first_exclusion(&self, song: &Song, result: &SearchResult) -> Option<ExclusionRule> {
        let candidate = Candidate {
            song,
            reference: song.reference_text(),
            title: &result.title,
            time: result.time.unwrap_or(song.time),
        };

        EXCLUSION_RULES
            .into_iter()
            .find(|rule| rule.excludes(&candidate, &self.config))
    }

    /// Returns the first result, in the given order, that no rule excludes.
    pub fn select_best<'a>(
        &self,
        song: &Song,
        results: &'a [SearchResult],
    ) -> Option<&'a SearchResult> {
        let best = results
            .iter()
            .find(|result| match self.first_exclusion(song, result) {
                Some(rule) => {
                    log::debug!(
                        "Skipping '{}' for '{}' by '{}': {}",
                        result.title,
                        song.title,
                        song.artist,
                        rule
                    );
                    false
                }
                None => true,
            });

        match best {
            Some(result) => log::debug!(
                "Best match for '{}' by '{}': '{}' ({})",
                song.title,
                song.artist,
                result.title,
                result.url
            ),
            None => log::debug!(
                "No match for '{}' by '{}' among {} results",
                song.title,
                song.artist,
                results.len()
            ),
        }

        best
    }
}

// =============================================================================
// Tests
// =============================================================================
