#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeFormatError {
    #[error("Expected a time of the form mm:ss, got `{input}`")]
    WrongSegmentCount { input: String },

    #[error("Time segment `{segment}` in `{input}` is not a number")]
    NotANumber { input: String, segment: String },

    #[error("Time `{input}` is too long to count in seconds")]
    OutOfRange { input: String },
}

/// Parse a `mm:ss` duration into whole seconds.
pub fn parse_minutes_seconds(time: &str) -> Result<u32, TimeFormatError> {
    let segments: Vec<&str> = time.split(':').collect();
    let [minutes, seconds] = segments.as_slice() else {
        return Err(TimeFormatError::WrongSegmentCount {
            input: time.to_string(),
        });
    };

    let parse_segment = |segment: &str| {
        segment
            .trim()
            .parse::<u32>()
            .map_err(|_| TimeFormatError::NotANumber {
                input: time.to_string(),
                segment: segment.to_string(),
            })
    };

    let minutes = parse_segment(*minutes)?;
    let seconds = parse_segment(*seconds)?;
    minutes
        .checked_mul(60)
        .and_then(|minutes| minutes.checked_add(seconds))
        .ok_or_else(|| TimeFormatError::OutOfRange {
            input: time.to_string(),
        })
}
