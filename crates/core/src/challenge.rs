//! Cipher challenge payload and solver
//!
//! The password is built by direct indexing: `vault[target]` for each target,
//! concatenated in target order. Any target outside the vault fails closed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// The `challenge` object returned by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub hint: String,
    pub vault: Vec<Value>,
    pub targets: Vec<i64>,
}

impl ChallengePayload {
    pub fn new(vault: Vec<Value>, targets: Vec<i64>) -> Self {
        Self {
            book_title: String::new(),
            hint: String::new(),
            vault,
            targets,
        }
    }

    /// Validate the shape of an untrusted challenge object.
    pub fn from_value(value: Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedChallenge("challenge is not an object".into()))?;

        for field in ["vault", "targets"] {
            match obj.get(field) {
                None | Some(Value::Null) => {
                    return Err(Error::MalformedChallenge(format!("missing `{}`", field)))
                }
                Some(Value::Array(_)) => {}
                Some(_) => {
                    return Err(Error::MalformedChallenge(format!("`{}` is not a sequence", field)))
                }
            }
        }

        serde_json::from_value(value).map_err(|e| Error::MalformedChallenge(e.to_string()))
    }

    /// Parse and validate a challenge from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::MalformedChallenge(e.to_string()))?;
        Self::from_value(value)
    }
}

/// Vault elements that are not strings contribute their JSON text.
fn token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the unlock password for a challenge.
pub fn solve(payload: &ChallengePayload) -> Result<String> {
    // An empty password would never unlock a manuscript; reject it up front.
    if payload.targets.is_empty() {
        return Err(Error::MalformedChallenge("no targets".into()));
    }

    let len = payload.vault.len();
    payload
        .targets
        .iter()
        .map(|&target| {
            usize::try_from(target)
                .ok()
                .and_then(|idx| payload.vault.get(idx))
                .map(token)
                .ok_or_else(|| {
                    Error::MalformedChallenge(format!(
                        "target {} outside vault of length {}",
                        target, len
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn letters() -> Vec<Value> {
        ["a", "b", "c", "d", "e"].iter().map(|s| json!(s)).collect()
    }

    #[test]
    fn test_solve_concatenates_in_target_order() {
        let payload = ChallengePayload::new(letters(), vec![2, 0, 3]);
        assert_eq!(solve(&payload).unwrap(), "cad");
    }

    #[test]
    fn test_target_past_end_fails_closed() {
        let payload = ChallengePayload::new(letters(), vec![5]);
        assert!(matches!(solve(&payload), Err(Error::MalformedChallenge(_))));
    }

    #[test]
    fn test_negative_target_fails_closed() {
        let payload = ChallengePayload::new(letters(), vec![1, -1]);
        assert!(matches!(solve(&payload), Err(Error::MalformedChallenge(_))));
    }

    #[test]
    fn test_empty_targets_rejected() {
        let payload = ChallengePayload::new(letters(), vec![]);
        assert!(matches!(solve(&payload), Err(Error::MalformedChallenge(_))));
    }

    #[test]
    fn test_non_string_tokens_are_coerced() {
        let payload = ChallengePayload::new(vec![json!(7), json!("x"), json!(true)], vec![0, 1, 2, 0]);
        assert_eq!(solve(&payload).unwrap(), "7xtrue7");
    }

    #[test]
    fn test_repeated_targets() {
        let payload = ChallengePayload::new(letters(), vec![4, 4, 0]);
        assert_eq!(solve(&payload).unwrap(), "eea");
    }

    #[test]
    fn test_from_value_wire_shape() {
        let payload = ChallengePayload::from_value(json!({
            "bookTitle": "Necronomicon",
            "hint": "Busca las posiciones en el vault",
            "vault": ["V", "S", "6", "7", "5", "Q"],
            "targets": [0, 1, 2, 3, 4, 5]
        }))
        .unwrap();
        assert_eq!(payload.book_title, "Necronomicon");
        assert_eq!(solve(&payload).unwrap(), "VS675Q");
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        let cases = [
            json!({ "targets": [0] }),
            json!({ "vault": ["a"] }),
            json!({ "vault": null, "targets": [0] }),
            json!({ "vault": "abc", "targets": [0] }),
            json!({ "vault": ["a"], "targets": 0 }),
            json!({ "vault": ["a"], "targets": [0.5] }),
            json!({ "vault": ["a"], "targets": ["0"] }),
            json!(["a"]),
        ];
        for case in cases {
            let err = ChallengePayload::from_value(case.clone()).unwrap_err();
            assert!(matches!(err, Error::MalformedChallenge(_)), "{case}");
        }
    }
}
