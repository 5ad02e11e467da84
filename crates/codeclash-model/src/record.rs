//! The duel session record and its status machine.
//!
//! One [`DuelRecord`] exists per duel, keyed by its code, shared by exactly
//! two clients through the document store. Each player only ever writes
//! their own [`PlayerSlot`] plus, conditionally, the top-level status
//! fields when performing a convergence transition (see [`next_status`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DuelCode, PlayerId};

/// Number of exercises materialized into every duel. A record with any
/// other exercise count is malformed.
pub const EXERCISES_PER_DUEL: usize = 5;

// ---------------------------------------------------------------------------
// DuelStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a duel record.
///
/// Strictly ordered and monotonically non-decreasing over the record's
/// lifetime:
///
/// ```text
/// Waiting → Ready → Playing → Finished
/// ```
///
/// - **Waiting**: created by the host, guest slot empty.
/// - **Ready**: a guest joined; waiting for both ready flags.
/// - **Playing**: both players flagged ready; the race is on.
/// - **Finished**: both players recorded a finish time.
///
/// The `Ord` derive follows declaration order, so "never goes backward"
/// is expressible as `new_status >= old_status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DuelStatus {
    Waiting,
    Ready,
    Playing,
    Finished,
}

impl DuelStatus {
    /// Returns `true` if a guest may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the duel has reached its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Ready => write!(f, "READY"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerSlot
// ---------------------------------------------------------------------------

/// One player's half of a duel record.
///
/// Written only by the player it belongs to; the opponent merely reads it.
/// This write partitioning is what lets the protocol get away without any
/// cross-client locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub player_id: PlayerId,
    pub username: String,
    pub ready: bool,
    pub correct_answers: u32,
    pub errors: u32,
    pub current_question: u32,
    /// Set once, when the player answers their last question.
    pub finished_at: Option<DateTime<Utc>>,
}

impl PlayerSlot {
    /// A fresh slot: not ready, no progress, not finished.
    pub fn new(player_id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player_id,
            username: username.into(),
            ready: false,
            correct_answers: 0,
            errors: 0,
            current_question: 0,
            finished_at: None,
        }
    }

    /// Returns `true` once the player has recorded a finish time.
    pub fn has_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

/// A single exercise descriptor, as consumed by the duel screen.
///
/// The protocol treats exercises as opaque payload: selection shuffles
/// them and materialization copies them, but nothing here ever inspects
/// the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

// ---------------------------------------------------------------------------
// PlayerRole
// ---------------------------------------------------------------------------

/// Which slot of the record a player occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    Host,
    Guest,
}

impl PlayerRole {
    /// The document field holding this role's slot.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Guest => "guest",
        }
    }
}

// ---------------------------------------------------------------------------
// ScoreUpdate
// ---------------------------------------------------------------------------

/// A partial per-player progress update.
///
/// `None` means "leave that field unchanged" — the update is merged into
/// the player's slot at field granularity, never replacing the whole slot.
/// Setting `finished_at` is what arms the `Playing → Finished` convergence
/// check in the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreUpdate {
    pub correct_answers: Option<u32>,
    pub errors: Option<u32>,
    pub current_question: Option<u32>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScoreUpdate {
    /// Returns `true` if the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.correct_answers.is_none()
            && self.errors.is_none()
            && self.current_question.is_none()
            && self.finished_at.is_none()
    }
}

// ---------------------------------------------------------------------------
// DuelRecord
// ---------------------------------------------------------------------------

/// The single shared mutable structure representing one duel's full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelRecord {
    /// Join code; immutable; also the store key.
    pub code: DuelCode,
    /// Seed the exercise list was materialized from. Retained for
    /// auditability only — the list is never recomputed from it.
    pub seed: u32,
    pub status: DuelStatus,
    pub host: PlayerSlot,
    pub guest: Option<PlayerSlot>,
    /// Materialized at creation; always [`EXERCISES_PER_DUEL`] long.
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DuelRecord {
    /// A freshly created record: Waiting, no guest, no transitions yet.
    pub fn new(
        code: DuelCode,
        seed: u32,
        host: PlayerSlot,
        exercises: Vec<Exercise>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            seed,
            status: DuelStatus::Waiting,
            host,
            guest: None,
            exercises,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Resolves a player to the slot they occupy, if any.
    pub fn role_of(&self, player: &PlayerId) -> Option<PlayerRole> {
        if self.host.player_id == *player {
            Some(PlayerRole::Host)
        } else if self
            .guest
            .as_ref()
            .is_some_and(|g| g.player_id == *player)
        {
            Some(PlayerRole::Guest)
        } else {
            None
        }
    }

    /// The slot for a role. `None` for an unclaimed guest slot.
    pub fn slot(&self, role: PlayerRole) -> Option<&PlayerSlot> {
        match role {
            PlayerRole::Host => Some(&self.host),
            PlayerRole::Guest => self.guest.as_ref(),
        }
    }

    /// Both ready flags set (implies a guest is present).
    pub fn both_ready(&self) -> bool {
        self.host.ready && self.guest.as_ref().is_some_and(|g| g.ready)
    }

    /// Both players recorded a finish time.
    pub fn both_finished(&self) -> bool {
        self.host.has_finished()
            && self.guest.as_ref().is_some_and(PlayerSlot::has_finished)
    }

    /// The winning slot of a finished duel: more correct answers, ties
    /// broken by the earlier finish time. `None` before both players
    /// finish, or on a dead heat.
    pub fn winner(&self) -> Option<&PlayerSlot> {
        if !self.both_finished() {
            return None;
        }
        let guest = self.guest.as_ref()?;
        match self.host.correct_answers.cmp(&guest.correct_answers) {
            std::cmp::Ordering::Greater => Some(&self.host),
            std::cmp::Ordering::Less => Some(guest),
            std::cmp::Ordering::Equal => {
                match (self.host.finished_at, guest.finished_at) {
                    (Some(h), Some(g)) if h < g => Some(&self.host),
                    (Some(h), Some(g)) if g < h => Some(guest),
                    _ => None,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

/// The status the record should advance to, given its current contents.
///
/// This is the guard every mutator evaluates against its own re-read after
/// writing: if the returned status differs from `record.status`, that
/// mutator performs the transition write. Pure and side-effect free, so
/// the whole convergence pattern is testable without a store.
///
/// Monotone by construction — the result is always `>= record.status`.
pub fn next_status(record: &DuelRecord) -> DuelStatus {
    match record.status {
        DuelStatus::Ready if record.both_ready() => DuelStatus::Playing,
        DuelStatus::Playing if record.both_finished() => DuelStatus::Finished,
        current => current,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn code() -> DuelCode {
        DuelCode::parse("AB23CD").unwrap()
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, secs).unwrap()
    }

    fn exercises() -> Vec<Exercise> {
        (0..EXERCISES_PER_DUEL)
            .map(|i| Exercise {
                id: format!("ex-{i}"),
                prompt: format!("question {i}"),
                choices: vec!["a".into(), "b".into()],
                answer: 0,
            })
            .collect()
    }

    fn record() -> DuelRecord {
        DuelRecord::new(
            code(),
            1234,
            PlayerSlot::new(PlayerId::new("host-1"), "ada"),
            exercises(),
            ts(0),
        )
    }

    fn joined_record() -> DuelRecord {
        let mut r = record();
        r.guest = Some(PlayerSlot::new(PlayerId::new("guest-1"), "grace"));
        r.status = DuelStatus::Ready;
        r
    }

    // =====================================================================
    // DuelStatus
    // =====================================================================

    #[test]
    fn test_status_order_is_strictly_increasing() {
        assert!(DuelStatus::Waiting < DuelStatus::Ready);
        assert!(DuelStatus::Ready < DuelStatus::Playing);
        assert!(DuelStatus::Playing < DuelStatus::Finished);
    }

    #[test]
    fn test_status_is_joinable_only_while_waiting() {
        assert!(DuelStatus::Waiting.is_joinable());
        assert!(!DuelStatus::Ready.is_joinable());
        assert!(!DuelStatus::Playing.is_joinable());
        assert!(!DuelStatus::Finished.is_joinable());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&DuelStatus::Waiting).unwrap(),
            "\"WAITING\""
        );
        assert_eq!(
            serde_json::to_string(&DuelStatus::Playing).unwrap(),
            "\"PLAYING\""
        );
    }

    #[test]
    fn test_status_display_matches_wire_form() {
        assert_eq!(DuelStatus::Ready.to_string(), "READY");
        assert_eq!(DuelStatus::Finished.to_string(), "FINISHED");
    }

    // =====================================================================
    // next_status
    // =====================================================================

    #[test]
    fn test_next_status_waiting_never_advances() {
        let r = record();
        assert_eq!(next_status(&r), DuelStatus::Waiting);
    }

    #[test]
    fn test_next_status_ready_with_one_flag_stays_ready() {
        let mut r = joined_record();
        r.host.ready = true;
        assert_eq!(next_status(&r), DuelStatus::Ready);
    }

    #[test]
    fn test_next_status_ready_with_both_flags_advances_to_playing() {
        let mut r = joined_record();
        r.host.ready = true;
        r.guest.as_mut().unwrap().ready = true;
        assert_eq!(next_status(&r), DuelStatus::Playing);
    }

    #[test]
    fn test_next_status_playing_with_one_finish_stays_playing() {
        let mut r = joined_record();
        r.status = DuelStatus::Playing;
        r.host.finished_at = Some(ts(30));
        assert_eq!(next_status(&r), DuelStatus::Playing);
    }

    #[test]
    fn test_next_status_playing_with_both_finishes_advances() {
        let mut r = joined_record();
        r.status = DuelStatus::Playing;
        r.host.finished_at = Some(ts(30));
        r.guest.as_mut().unwrap().finished_at = Some(ts(31));
        assert_eq!(next_status(&r), DuelStatus::Finished);
    }

    #[test]
    fn test_next_status_finished_is_terminal() {
        let mut r = joined_record();
        r.status = DuelStatus::Finished;
        assert_eq!(next_status(&r), DuelStatus::Finished);
    }

    #[test]
    fn test_next_status_is_monotone_for_all_states() {
        // Whatever the record contents, the suggested status never ranks
        // below the current one.
        for status in [
            DuelStatus::Waiting,
            DuelStatus::Ready,
            DuelStatus::Playing,
            DuelStatus::Finished,
        ] {
            let mut r = joined_record();
            r.status = status;
            r.host.ready = true;
            r.guest.as_mut().unwrap().ready = true;
            assert!(next_status(&r) >= status);
        }
    }

    // =====================================================================
    // Roles and slots
    // =====================================================================

    #[test]
    fn test_role_of_resolves_host_and_guest() {
        let r = joined_record();
        assert_eq!(r.role_of(&PlayerId::new("host-1")), Some(PlayerRole::Host));
        assert_eq!(
            r.role_of(&PlayerId::new("guest-1")),
            Some(PlayerRole::Guest)
        );
        assert_eq!(r.role_of(&PlayerId::new("stranger")), None);
    }

    #[test]
    fn test_role_of_without_guest_only_matches_host() {
        let r = record();
        assert_eq!(r.role_of(&PlayerId::new("host-1")), Some(PlayerRole::Host));
        assert_eq!(r.role_of(&PlayerId::new("guest-1")), None);
    }

    #[test]
    fn test_both_ready_requires_a_guest() {
        let mut r = record();
        r.host.ready = true;
        assert!(!r.both_ready());
    }

    // =====================================================================
    // winner
    // =====================================================================

    #[test]
    fn test_winner_none_before_both_finish() {
        let mut r = joined_record();
        r.host.finished_at = Some(ts(10));
        assert!(r.winner().is_none());
    }

    #[test]
    fn test_winner_prefers_more_correct_answers() {
        let mut r = joined_record();
        r.host.correct_answers = 3;
        r.host.finished_at = Some(ts(20));
        let guest = r.guest.as_mut().unwrap();
        guest.correct_answers = 5;
        guest.finished_at = Some(ts(25));
        assert_eq!(r.winner().unwrap().username, "grace");
    }

    #[test]
    fn test_winner_breaks_score_tie_on_earlier_finish() {
        let mut r = joined_record();
        r.host.correct_answers = 4;
        r.host.finished_at = Some(ts(20));
        let guest = r.guest.as_mut().unwrap();
        guest.correct_answers = 4;
        guest.finished_at = Some(ts(18));
        assert_eq!(r.winner().unwrap().username, "grace");
    }

    #[test]
    fn test_winner_dead_heat_is_a_draw() {
        let mut r = joined_record();
        r.host.correct_answers = 4;
        r.host.finished_at = Some(ts(20));
        let guest = r.guest.as_mut().unwrap();
        guest.correct_answers = 4;
        guest.finished_at = Some(ts(20));
        assert!(r.winner().is_none());
    }

    // =====================================================================
    // ScoreUpdate
    // =====================================================================

    #[test]
    fn test_score_update_default_is_empty() {
        assert!(ScoreUpdate::default().is_empty());
        let update = ScoreUpdate {
            errors: Some(1),
            ..ScoreUpdate::default()
        };
        assert!(!update.is_empty());
    }

    // =====================================================================
    // Record JSON shape — the persisted schema is a contract.
    // =====================================================================

    #[test]
    fn test_record_serializes_camel_case_with_explicit_nulls() {
        let json = serde_json::to_value(record()).unwrap();

        assert_eq!(json["code"], "AB23CD");
        assert_eq!(json["seed"], 1234);
        assert_eq!(json["status"], "WAITING");
        assert_eq!(json["host"]["playerId"], "host-1");
        assert_eq!(json["host"]["correctAnswers"], 0);
        assert_eq!(json["host"]["currentQuestion"], 0);
        // Unset values persist as explicit nulls, never absent keys.
        assert!(json["guest"].is_null());
        assert!(json["startedAt"].is_null());
        assert!(json["finishedAt"].is_null());
        assert!(json["host"]["finishedAt"].is_null());
        assert_eq!(json["exercises"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let mut original = joined_record();
        original.host.ready = true;
        original.started_at = Some(ts(5));

        let json = serde_json::to_value(&original).unwrap();
        let decoded: DuelRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, original);
    }
}
