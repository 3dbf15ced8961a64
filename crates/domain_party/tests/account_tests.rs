//! Tests for account standing and actor roles

use core_kernel::{Classify, ErrorKind, PortError, UserId};
use domain_party::{AccountStatus, Actor, ActorRole, PartyError, PartyRole};

mod status_tests {
    use super::*;

    #[test]
    fn test_only_active_accounts_may_act() {
        assert!(AccountStatus::Active.is_active());
        for status in [AccountStatus::Suspended, AccountStatus::Banned, AccountStatus::Deleted] {
            assert!(!status.is_active(), "{status} must not act");
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&AccountStatus::Banned).unwrap();
        assert_eq!(json, "\"banned\"");
    }
}

mod actor_tests {
    use super::*;

    #[test]
    fn test_actor_constructors_set_role() {
        let id = UserId::new();
        assert_eq!(Actor::user(id).role, ActorRole::User);
        assert_eq!(Actor::moderator(id).role, ActorRole::Moderator);
        assert_eq!(Actor::admin(id).user_id, id);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_banned_client_acting_is_forbidden() {
        let err = PartyError::UserBannedOrDeleted {
            user_id: UserId::new(),
            role: PartyRole::Client,
            status: AccountStatus::Banned,
            acting: true,
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(err.to_string().contains("banned"));
    }

    #[test]
    fn test_suspended_counterpart_is_validation() {
        let err = PartyError::AccountSuspended {
            user_id: UserId::new(),
            role: PartyRole::Provider,
            acting: false,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_identity_failure_keeps_port_kind() {
        let err: PartyError = PortError::connection("identity down").into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
