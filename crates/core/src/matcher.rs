//! Resolve a free-text identifier typed at the front desk to one active member.
//!
//! Input and candidate keys (name, internal id, human-facing `user_id`) are
//! compared after removing all whitespace and lowercasing, so `" gm0002 "`
//! matches `GM0002` and `"janedoe"` matches `Jane Doe`.

use crate::member::{Member, MemberBrief};

/// Errors from [`match_member`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Member identifier must not be empty")]
    EmptyInput,

    /// Carries the active members so the operator can pick manually.
    #[error("No active member matches '{input}'")]
    NoMatchFound {
        input: String,
        active_members: Vec<MemberBrief>,
    },

    /// Two or more active members share the normalized key. Never resolved
    /// by picking one; the operator must use an unambiguous identifier.
    #[error("'{input}' matches {} active members", candidates.len())]
    AmbiguousMatch {
        input: String,
        candidates: Vec<MemberBrief>,
    },
}

/// Normalize an identifier for comparison: strip whitespace, lowercase.
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn matches_key(member: &Member, key: &str) -> bool {
    normalize_key(&member.name) == key
        || normalize_key(&member.user_id) == key
        || member.id.to_string() == key
}

/// Find the unique active member identified by `input`.
///
/// Inactive and pending members are never returned, even on an exact match.
pub fn match_member<'a>(input: &str, members: &'a [Member]) -> Result<&'a Member, MatchError> {
    let key = normalize_key(input);
    if key.is_empty() {
        return Err(MatchError::EmptyInput);
    }

    let active = || members.iter().filter(|m| m.is_active());
    let found: Vec<&Member> = active().filter(|m| matches_key(m, &key)).collect();

    match found.as_slice() {
        [single] => Ok(*single),
        [] => Err(MatchError::NoMatchFound {
            input: input.trim().to_string(),
            active_members: active().map(Member::brief).collect(),
        }),
        many => Err(MatchError::AmbiguousMatch {
            input: input.trim().to_string(),
            candidates: many.iter().map(|m| m.brief()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::member::fixtures::member;
    use crate::member::MemberStatus;

    fn roster() -> Vec<Member> {
        vec![
            member(101, 1, "GM0001", "Ravi Kumar"),
            member(102, 1, "GM0002", "Jane Doe"),
            member(103, 1, "GM0003", "Priya Shah"),
        ]
    }

    #[test]
    fn matches_user_id_with_stray_whitespace_and_case() {
        let members = roster();
        let found = match_member(" gm0002 ", &members).unwrap();
        assert_eq!(found.user_id, "GM0002");
    }

    #[test]
    fn matches_name_ignoring_spaces() {
        let members = roster();
        assert_eq!(match_member("janedoe", &members).unwrap().id, 102);
        assert_eq!(match_member("PRIYA  SHAH", &members).unwrap().id, 103);
    }

    #[test]
    fn matches_internal_id() {
        let members = roster();
        assert_eq!(match_member("101", &members).unwrap().name, "Ravi Kumar");
    }

    #[test]
    fn inactive_member_never_matches() {
        let mut members = roster();
        members[1].status = MemberStatus::Inactive;
        let err = match_member("GM0002", &members).unwrap_err();
        assert_matches!(err, MatchError::NoMatchFound { .. });

        members[1].status = MemberStatus::Pending;
        assert!(match_member("Jane Doe", &members).is_err());
        assert!(match_member("102", &members).is_err());
    }

    #[test]
    fn no_match_lists_active_members_only() {
        let mut members = roster();
        members[0].status = MemberStatus::Inactive;
        let err = match_member("nobody", &members).unwrap_err();
        assert_matches!(err, MatchError::NoMatchFound { input, active_members } => {
            assert_eq!(input, "nobody");
            let ids: Vec<_> = active_members.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![102, 103]);
        });
    }

    #[test]
    fn colliding_names_are_ambiguous() {
        let mut members = roster();
        members.push(member(104, 1, "GM0004", "jane doe"));
        let err = match_member("Jane Doe", &members).unwrap_err();
        assert_matches!(err, MatchError::AmbiguousMatch { candidates, .. } => {
            assert_eq!(candidates.len(), 2);
        });
    }

    #[test]
    fn collision_with_inactive_member_is_not_ambiguous() {
        let mut members = roster();
        let mut other = member(104, 1, "GM0004", "Jane Doe");
        other.status = MemberStatus::Inactive;
        members.push(other);
        assert_eq!(match_member("Jane Doe", &members).unwrap().id, 102);
    }

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(match_member("   ", &roster()), Err(MatchError::EmptyInput));
    }
}
