use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use grove_maze_core::{CellCoord, Level};
use serde::{Deserialize, Serialize};

const CODE_DOMAIN: &str = "grove";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const CODE_HEADER: &str = "grove:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Shareable description of a generated level: grid dimensions, seed and entrance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LevelCode {
    /// Number of cell columns of the grid.
    pub(crate) columns: u32,
    /// Number of cell rows of the grid.
    pub(crate) rows: u32,
    /// Seed the level was generated from.
    pub(crate) seed: u64,
    /// Border cell the player entered through.
    pub(crate) entrance: CellCoord,
}

impl LevelCode {
    /// Captures the code reproducing `level`.
    pub(crate) fn of_level(level: &Level) -> Self {
        Self {
            columns: level.grid().columns(),
            rows: level.grid().rows(),
            seed: level.report().seed,
            entrance: level.entrance(),
        }
    }

    /// Encodes the code into a single-line string suitable for sharing.
    pub(crate) fn encode(&self) -> Result<String, LevelCodeError> {
        let payload = Payload {
            seed: self.seed,
            entrance: self.entrance,
        };
        let json = serde_json::to_vec(&payload).map_err(LevelCodeError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{CODE_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a code from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LevelCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LevelCodeError::Empty);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LevelCodeError::MissingPrefix)?;
        let version = parts.next().ok_or(LevelCodeError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LevelCodeError::MissingDimensions)?;
        let payload = parts.next().ok_or(LevelCodeError::MissingPayload)?;

        if domain != CODE_DOMAIN {
            return Err(LevelCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != CODE_VERSION {
            return Err(LevelCodeError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LevelCodeError::InvalidEncoding)?;
        let decoded: Payload =
            serde_json::from_slice(&bytes).map_err(LevelCodeError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            seed: decoded.seed,
            entrance: decoded.entrance,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    seed: u64,
    entrance: CellCoord,
}

/// Errors that can occur while encoding or decoding level codes.
#[derive(Debug)]
pub(crate) enum LevelCodeError {
    /// The provided string was empty or contained only whitespace.
    Empty,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The code did not contain a version segment.
    MissingVersion,
    /// The code did not include grid dimensions.
    MissingDimensions,
    /// The code did not include the payload segment.
    MissingPayload,
    /// The code used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for LevelCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "level code was empty"),
            Self::MissingPrefix => write!(f, "level code is missing the prefix"),
            Self::MissingVersion => write!(f, "level code is missing the version"),
            Self::MissingDimensions => write!(f, "level code is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "level code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "level code prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "level code version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => write!(f, "could not decode level payload: {error}"),
            Self::InvalidPayload(error) => write!(f, "could not parse level payload: {error}"),
        }
    }
}

impl Error for LevelCodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelCodeError> {
    let invalid = || LevelCodeError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_carries_dimensions_seed_and_entrance() {
        let code = LevelCode {
            columns: 25,
            rows: 21,
            seed: u64::MAX - 7,
            entrance: CellCoord::new(0, 9),
        };

        let encoded = code.encode().expect("code encodes");
        assert!(encoded.starts_with(&format!("{CODE_HEADER}:25x21:")));
        assert!(!encoded.contains('='), "padding is stripped");

        let decoded = LevelCode::decode(&format!("  {encoded}\n")).expect("code decodes");
        assert_eq!(decoded, code);
    }

    #[test]
    fn decode_rejects_foreign_prefixes_and_versions() {
        assert!(matches!(
            LevelCode::decode("maze:v1:4x4:e30"),
            Err(LevelCodeError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            LevelCode::decode("grove:v2:4x4:e30"),
            Err(LevelCodeError::UnsupportedVersion(version)) if version == "v2"
        ));
    }

    #[test]
    fn decode_reports_missing_segments() {
        assert!(matches!(LevelCode::decode("   "), Err(LevelCodeError::Empty)));
        assert!(matches!(
            LevelCode::decode("grove"),
            Err(LevelCodeError::MissingVersion)
        ));
        assert!(matches!(
            LevelCode::decode("grove:v1"),
            Err(LevelCodeError::MissingDimensions)
        ));
        assert!(matches!(
            LevelCode::decode("grove:v1:9x9"),
            Err(LevelCodeError::MissingPayload)
        ));
    }

    #[test]
    fn decode_rejects_degenerate_dimensions() {
        for dimensions in ["0x9", "9x", "nine", "9x-1"] {
            let result = LevelCode::decode(&format!("grove:v1:{dimensions}:e30"));
            assert!(
                matches!(result, Err(LevelCodeError::InvalidDimensions(_))),
                "{dimensions} should be rejected"
            );
        }
    }

    #[test]
    fn decode_surfaces_payload_errors() {
        let error = LevelCode::decode("grove:v1:9x9:!!!").expect_err("bad base64");
        assert!(matches!(error, LevelCodeError::InvalidEncoding(_)));
        assert!(error.source().is_some());

        let not_a_payload = STANDARD_NO_PAD.encode(b"{\"seed\":1}");
        let error =
            LevelCode::decode(&format!("grove:v1:9x9:{not_a_payload}")).expect_err("no entrance");
        assert!(matches!(error, LevelCodeError::InvalidPayload(_)));
    }
}
