// ABOUTME: Compiles a strategy kind plus free-text canary step tokens into a Strategy.
// ABOUTME: Token grammar: pause | wait{<n>} | wait{<n><h|m|s>} | ratio{<0..100>}.

use super::{
    CanaryStep, DEFAULT_ACTIVE_SERVICE, DEFAULT_PREVIEW_SERVICE, PauseStep, Strategy, WaitDuration,
};
use thiserror::Error;

/// Errors raised while compiling a strategy. All are client-side validation
/// errors and are reported before anything is submitted.
#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("unknown strategy kind: {0} (expected update, bluegreen, or canary)")]
    UnknownKind(String),

    #[error("unrecognized canary step token: {0}")]
    UnknownToken(String),

    #[error("canary ratio must be a whole number, got ratio{{{0}}}")]
    NonNumericRatio(String),

    #[error("canary ratio must be between 0 and 100, got {0}")]
    RatioOutOfRange(i64),

    #[error("invalid wait step {0}: expected wait{{<seconds>}} or wait{{<n><h|m|s>}}")]
    InvalidWait(String),
}

/// Compile a named strategy kind and its step tokens into a [`Strategy`].
///
/// Tokens are matched independently, first match wins, in the order
/// `pause`, `wait{...}`, `ratio{...}`. Unrecognized tokens are rejected
/// rather than dropped. Step order is preserved exactly as declared.
///
/// `update` and `bluegreen` are fixed-shape and perform no step parsing;
/// `bluegreen` compiles with default service names the caller may override.
pub fn compile_strategy(kind: &str, tokens: &[String]) -> Result<Strategy, StrategyError> {
    match kind {
        "update" => Ok(Strategy::Update {}),
        "bluegreen" => Ok(Strategy::BlueGreen {
            active_service: DEFAULT_ACTIVE_SERVICE.to_string(),
            preview_service: DEFAULT_PREVIEW_SERVICE.to_string(),
        }),
        "canary" => {
            let steps = tokens
                .iter()
                .map(|token| parse_token(token))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Strategy::Canary { steps })
        }
        other => Err(StrategyError::UnknownKind(other.to_string())),
    }
}

fn parse_token(token: &str) -> Result<CanaryStep, StrategyError> {
    let token = token.trim();

    if token == "pause" {
        return Ok(CanaryStep::Pause(PauseStep::until_approved()));
    }
    if let Some(payload) = braced_payload(token, "wait") {
        return parse_wait(token, payload);
    }
    if let Some(payload) = braced_payload(token, "ratio") {
        return parse_ratio(payload);
    }

    Err(StrategyError::UnknownToken(token.to_string()))
}

/// Extract `<payload>` from `<keyword>{<payload>}`, or None if the token has
/// a different shape.
fn braced_payload<'a>(token: &'a str, keyword: &str) -> Option<&'a str> {
    token
        .strip_prefix(keyword)?
        .strip_prefix('{')?
        .strip_suffix('}')
}

fn parse_wait(token: &str, payload: &str) -> Result<CanaryStep, StrategyError> {
    // Bare integer: numeric wait, unit defaults to seconds.
    if let Ok(seconds) = payload.parse::<u64>() {
        return Ok(CanaryStep::Wait {
            duration: WaitDuration::Seconds(seconds),
        });
    }

    // <int><unit> with unit in {h, m, s}: kept verbatim as a duration string.
    if let Some(value) = payload.strip_suffix(['h', 'm', 's'])
        && !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
    {
        return Ok(CanaryStep::Wait {
            duration: WaitDuration::Spec(payload.to_string()),
        });
    }

    Err(StrategyError::InvalidWait(token.to_string()))
}

fn parse_ratio(payload: &str) -> Result<CanaryStep, StrategyError> {
    let value: i64 = payload
        .trim()
        .parse()
        .map_err(|_| StrategyError::NonNumericRatio(payload.to_string()))?;

    if !(0..=100).contains(&value) {
        return Err(StrategyError::RatioOutOfRange(value));
    }

    Ok(CanaryStep::SetWeight {
        percent: value as u8,
    })
}
