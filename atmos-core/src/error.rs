use thiserror::Error;

/// Failures that can escape the I/O-adjacent layers.
///
/// The computation layers (units, metrics, condition classification) are
/// total over their inputs and never produce these; only fetching, geocoding
/// and cache reads can fail.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The payload is missing its hourly or daily section. The originating
    /// fetch must be treated as failed; the view builder refuses such input.
    #[error("forecast payload is missing required hourly/daily data")]
    InvalidPayload,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from a provider. The body is pre-truncated to a
    /// bounded length before it lands here.
    #[error("{provider} request failed with status {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode {context}: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },

    /// Geocoding search produced zero matches.
    #[error("no matching location found for \"{0}\"")]
    NoResults(String),

    /// The persisted cache slot fails the payload invariant. Boot-time reads
    /// discard it silently; explicit "use cached data" requests surface it as
    /// a warning.
    #[error("cached forecast is malformed or incomplete")]
    MalformedCache,
}

/// Bound the provider response body echoed into error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 220;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
