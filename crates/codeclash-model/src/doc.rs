//! The store-document boundary.
//!
//! Every write that leaves this subsystem goes through the functions here,
//! in one of two shapes:
//!
//! - **Full documents** ([`DuelRecord::to_doc`]) carry *every* schema
//!   field, with unset values normalized to explicit JSON `null` — the
//!   store never sees an absent key on a freshly created record.
//! - **Patches** (the `*_patch` builders) carry *only* the fields being
//!   changed. An omitted key means "leave unchanged" under the store's
//!   field-granular merge; it is not a null.
//!
//! Keeping both shapes in one module (rather than scattering `json!`
//! literals through the call sites) is what makes the serialization
//! contract checkable in one place.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::{DuelRecord, DuelStatus, ModelError, PlayerRole, PlayerSlot, ScoreUpdate};

/// Document field holding the lifecycle status. Used as the guard field
/// for conditional transition writes.
pub const STATUS_FIELD: &str = "status";

impl DuelRecord {
    /// Encodes the record as a complete store document.
    pub fn to_doc(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a store document back into a record.
    pub fn from_doc(doc: &Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(doc.clone())?)
    }
}

/// The wire form of a status, for guard comparisons.
pub fn status_value(status: DuelStatus) -> Value {
    Value::String(status.to_string())
}

/// Patch claiming the guest slot and moving the record to `READY`.
///
/// Applied conditionally on `status == "WAITING"` so the claim is
/// one-shot: of two concurrent joins, exactly one lands.
pub fn join_patch(guest: &PlayerSlot) -> Result<Value, ModelError> {
    Ok(json!({
        "guest": serde_json::to_value(guest)?,
        "status": status_value(DuelStatus::Ready),
    }))
}

/// Patch setting one player's ready flag.
pub fn ready_patch(role: PlayerRole) -> Value {
    json!({ role.field(): { "ready": true } })
}

/// Patch applying a partial score update to one player's slot.
///
/// Only the fields present in `update` appear in the patch; the opponent's
/// slot and all untouched fields are left alone by the merge.
pub fn score_patch(role: PlayerRole, update: &ScoreUpdate) -> Value {
    let mut slot = serde_json::Map::new();
    if let Some(correct) = update.correct_answers {
        slot.insert("correctAnswers".into(), json!(correct));
    }
    if let Some(errors) = update.errors {
        slot.insert("errors".into(), json!(errors));
    }
    if let Some(question) = update.current_question {
        slot.insert("currentQuestion".into(), json!(question));
    }
    if let Some(finished_at) = update.finished_at {
        slot.insert("finishedAt".into(), json!(finished_at));
    }
    json!({ role.field(): Value::Object(slot) })
}

/// Patch performing the `READY → PLAYING` convergence transition.
pub fn start_patch(started_at: DateTime<Utc>) -> Value {
    json!({
        "status": status_value(DuelStatus::Playing),
        "startedAt": started_at,
    })
}

/// Patch performing the `PLAYING → FINISHED` convergence transition.
pub fn finish_patch(finished_at: DateTime<Utc>) -> Value {
    json!({
        "status": status_value(DuelStatus::Finished),
        "finishedAt": finished_at,
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{DuelCode, EXERCISES_PER_DUEL, Exercise, PlayerId};

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn record() -> DuelRecord {
        DuelRecord::new(
            DuelCode::parse("AB23CD").unwrap(),
            99,
            PlayerSlot::new(PlayerId::new("host-1"), "ada"),
            (0..EXERCISES_PER_DUEL)
                .map(|i| Exercise {
                    id: format!("ex-{i}"),
                    prompt: "p".into(),
                    choices: vec![],
                    answer: 0,
                })
                .collect(),
            ts(),
        )
    }

    #[test]
    fn test_to_doc_from_doc_round_trip() {
        let original = record();
        let doc = original.to_doc().unwrap();
        let decoded = DuelRecord::from_doc(&doc).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_to_doc_contains_every_schema_field() {
        let doc = record().to_doc().unwrap();
        let map = doc.as_object().unwrap();
        for field in [
            "code",
            "seed",
            "status",
            "host",
            "guest",
            "exercises",
            "createdAt",
            "startedAt",
            "finishedAt",
        ] {
            assert!(map.contains_key(field), "missing field {field}");
        }
    }

    #[test]
    fn test_from_doc_rejects_wrong_shape() {
        let doc = json!({ "name": "not a duel" });
        assert!(DuelRecord::from_doc(&doc).is_err());
    }

    #[test]
    fn test_join_patch_claims_guest_and_sets_ready() {
        let guest = PlayerSlot::new(PlayerId::new("guest-1"), "grace");
        let patch = join_patch(&guest).unwrap();
        assert_eq!(patch["status"], "READY");
        assert_eq!(patch["guest"]["playerId"], "guest-1");
        assert_eq!(patch["guest"]["ready"], false);
        // The guest slot is a full value: unset fields are explicit nulls.
        assert!(patch["guest"]["finishedAt"].is_null());
    }

    #[test]
    fn test_ready_patch_touches_only_the_callers_slot() {
        let patch = ready_patch(PlayerRole::Guest);
        assert_eq!(patch, json!({ "guest": { "ready": true } }));
    }

    #[test]
    fn test_score_patch_omits_unset_fields() {
        let update = ScoreUpdate {
            correct_answers: Some(3),
            current_question: Some(4),
            ..ScoreUpdate::default()
        };
        let patch = score_patch(PlayerRole::Host, &update);
        let slot = patch["host"].as_object().unwrap();
        assert_eq!(slot["correctAnswers"], 3);
        assert_eq!(slot["currentQuestion"], 4);
        assert!(!slot.contains_key("errors"));
        assert!(!slot.contains_key("finishedAt"));
    }

    #[test]
    fn test_score_patch_carries_finish_time() {
        let update = ScoreUpdate {
            finished_at: Some(ts()),
            ..ScoreUpdate::default()
        };
        let patch = score_patch(PlayerRole::Guest, &update);
        assert!(patch["guest"]["finishedAt"].is_string());
    }

    #[test]
    fn test_transition_patches_write_status_and_timestamp() {
        let start = start_patch(ts());
        assert_eq!(start["status"], "PLAYING");
        assert!(start["startedAt"].is_string());

        let finish = finish_patch(ts());
        assert_eq!(finish["status"], "FINISHED");
        assert!(finish["finishedAt"].is_string());
    }

    #[test]
    fn test_status_value_matches_serde_form() {
        for status in [
            DuelStatus::Waiting,
            DuelStatus::Ready,
            DuelStatus::Playing,
            DuelStatus::Finished,
        ] {
            assert_eq!(
                status_value(status),
                serde_json::to_value(status).unwrap()
            );
        }
    }
}
