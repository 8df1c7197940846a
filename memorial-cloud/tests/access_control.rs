//! Memorial visibility, grants, blacklist and access requests

mod common;

use common::Harness;
use shared::error::ErrorCode;
use shared::models::{AccessLevel, AccessRequestStatus, PermissionType, PrivacySettingsRequest};
use shared::request::PaginationQuery;

fn settings(memorial_id: &str, level: i16) -> PrivacySettingsRequest {
    PrivacySettingsRequest {
        memorial_id: memorial_id.to_string(),
        privacy_level: level,
        allowed_family_ids: vec![],
        allowed_user_ids: vec![],
        visitor_permissions: vec![],
        blocked_user_ids: vec![],
    }
}

#[tokio::test]
async fn public_memorial_is_visible_to_strangers() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let stranger = h.user("stranger").await;
    let memorial = h.memorial(&owner, 0).await;

    let access = h
        .services
        .access
        .can_access_memorial(&stranger, &memorial.id)
        .await
        .unwrap();
    assert!(access.allowed);
    assert_eq!(access.level, AccessLevel::None);

    let owner_access = h
        .services
        .access
        .can_access_memorial(&owner, &memorial.id)
        .await
        .unwrap();
    assert_eq!(owner_access.level, AccessLevel::Owner);
}

#[tokio::test]
async fn family_memorial_requires_linked_membership() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let relative = h.user("relative").await;
    let stranger = h.user("stranger").await;
    let memorial = h.memorial(&owner, 1).await;
    h.family_with_memorial(&owner, &memorial, &[&relative]).await;

    let access = h
        .services
        .access
        .can_access_memorial(&relative, &memorial.id)
        .await
        .unwrap();
    assert!(access.allowed);
    assert_eq!(access.level, AccessLevel::Family);

    let denied = h
        .services
        .access
        .can_access_memorial(&stranger, &memorial.id)
        .await
        .unwrap();
    assert!(!denied.allowed);

    let err = h
        .services
        .memorials
        .get_memorial(&stranger, &memorial.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialAccessDenied);
}

#[tokio::test]
async fn private_memorial_ignores_family_membership() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let relative = h.user("relative").await;
    let memorial = h.memorial(&owner, 2).await;
    let family = h.family_with_memorial(&owner, &memorial, &[&relative]).await;

    let mut req = settings(&memorial.id, 2);
    req.allowed_family_ids = vec![family.id.clone()];
    req.visitor_permissions = vec!["view".into()];
    h.services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap();

    let access = h
        .services
        .access
        .can_access_memorial(&relative, &memorial.id)
        .await
        .unwrap();
    assert!(!access.allowed);
}

#[tokio::test]
async fn user_grant_opens_private_memorial_for_that_permission_only() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let friend = h.user("friend").await;
    let memorial = h.memorial(&owner, 2).await;

    let mut req = settings(&memorial.id, 2);
    req.allowed_user_ids = vec![friend.clone()];
    req.visitor_permissions = vec!["view".into(), "view".into()];
    let stored = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap();
    assert_eq!(stored.permissions.len(), 1);

    let privacy = &h.services.privacy;
    assert!(
        privacy
            .check_user_access(&friend, &memorial.id, PermissionType::View)
            .await
            .unwrap()
    );
    assert!(
        !privacy
            .check_user_access(&friend, &memorial.id, PermissionType::Worship)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn family_grant_applies_at_family_level() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let cousin = h.user("cousin").await;
    let memorial = h.memorial(&owner, 1).await;

    // A family the memorial is not linked to
    let other = h.family(&cousin).await;

    let mut req = settings(&memorial.id, 1);
    req.allowed_family_ids = vec![other.id.clone()];
    req.visitor_permissions = vec!["view".into(), "worship".into()];
    h.services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap();

    assert!(
        h.services
            .privacy
            .check_user_access(&cousin, &memorial.id, PermissionType::Worship)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn blacklist_beats_public_and_family_but_not_owner() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let relative = h.user("relative").await;
    let memorial = h.memorial(&owner, 0).await;
    h.family_with_memorial(&owner, &memorial, &[&relative]).await;

    h.services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, &relative, Some("spam".into()))
        .await
        .unwrap();

    let access = h
        .services
        .access
        .can_access_memorial(&relative, &memorial.id)
        .await
        .unwrap();
    assert!(!access.allowed);

    let err = h
        .services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, &relative, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyBlacklisted);

    let err = h
        .services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, &owner, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotBlacklistOwner);

    h.services
        .privacy
        .remove_from_blacklist(&owner, &memorial.id, &relative)
        .await
        .unwrap();
    // Removing twice is fine
    h.services
        .privacy
        .remove_from_blacklist(&owner, &memorial.id, &relative)
        .await
        .unwrap();
    assert!(
        h.services
            .access
            .can_access_memorial(&relative, &memorial.id)
            .await
            .unwrap()
            .allowed
    );
}

#[tokio::test]
async fn privacy_settings_replace_previous_state() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let a = h.user("a").await;
    let b = h.user("b").await;
    let memorial = h.memorial(&owner, 1).await;

    let mut first = settings(&memorial.id, 2);
    first.allowed_user_ids = vec![a.clone()];
    first.visitor_permissions = vec!["view".into()];
    first.blocked_user_ids = vec![b.clone()];
    h.services
        .privacy
        .set_memorial_privacy(&owner, first)
        .await
        .unwrap();

    let second = settings(&memorial.id, 0);
    let stored = h
        .services
        .privacy
        .set_memorial_privacy(&owner, second)
        .await
        .unwrap();

    assert_eq!(stored.privacy_level, shared::models::PrivacyLevel::Public);
    assert!(stored.permissions.is_empty());
    assert!(stored.blacklist.is_empty());
}

#[tokio::test]
async fn privacy_settings_reject_bad_input() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let visitor = h.user("visitor").await;
    let memorial = h.memorial(&owner, 0).await;

    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, settings(&memorial.id, 7))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPrivacyLevel);

    let mut req = settings(&memorial.id, 1);
    req.visitor_permissions = vec!["edit".into()];
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPermissionType);

    let mut req = settings(&memorial.id, 1);
    req.blocked_user_ids = vec![owner.clone()];
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotBlacklistOwner);

    // Visible but not owned
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&visitor, settings(&memorial.id, 2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialOwnerRequired);
}

#[tokio::test]
async fn access_request_lifecycle() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let visitor = h.user("visitor").await;
    let memorial = h.memorial(&owner, 2).await;
    let privacy = &h.services.privacy;

    let err = privacy
        .request_access(&owner, &memorial.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OwnerCannotRequestAccess);

    let request = privacy
        .request_access(&visitor, &memorial.id, Some("I am her grandson".into()))
        .await
        .unwrap();
    assert_eq!(request.status, AccessRequestStatus::Pending);

    let err = privacy
        .request_access(&visitor, &memorial.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AccessRequestPending);

    let pending = privacy
        .list_access_requests(
            &owner,
            &memorial.id,
            Some(AccessRequestStatus::Pending),
            &PaginationQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 1);

    let approved = privacy
        .handle_access_request(
            &owner,
            &request.id,
            true,
            &["view".to_string(), "worship".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(approved.status, AccessRequestStatus::Approved);
    assert!(
        privacy
            .check_user_access(&visitor, &memorial.id, PermissionType::Worship)
            .await
            .unwrap()
    );

    let err = privacy
        .handle_access_request(&owner, &request.id, false, &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AccessRequestHandled);
}

#[tokio::test]
async fn only_the_owner_resolves_access_requests() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let visitor = h.user("visitor").await;
    let memorial = h.memorial(&owner, 2).await;

    let request = h
        .services
        .privacy
        .request_access(&visitor, &memorial.id, None)
        .await
        .unwrap();
    let err = h
        .services
        .privacy
        .handle_access_request(&visitor, &request.id, true, &["view".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialAccessDenied);

    let err = h
        .services
        .privacy
        .handle_access_request(&owner, "missing", true, &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AccessRequestNotFound);
}

#[tokio::test]
async fn blacklisted_users_cannot_request_access() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let troll = h.user("troll").await;
    let memorial = h.memorial(&owner, 2).await;

    h.services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, &troll, None)
        .await
        .unwrap();
    let err = h
        .services
        .privacy
        .request_access(&troll, &memorial.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserBlacklisted);
}

#[tokio::test]
async fn deleted_memorial_is_not_found() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let memorial = h.memorial(&owner, 0).await;

    h.services
        .memorials
        .delete_memorial(&owner, &memorial.id)
        .await
        .unwrap();
    let err = h
        .services
        .access
        .can_access_memorial(&owner, &memorial.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialNotFound);
}

#[tokio::test]
async fn memorial_list_covers_own_and_family_memorials() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let relative = h.user("relative").await;
    let linked = h.memorial(&owner, 1).await;
    let _unlinked = h.memorial(&owner, 2).await;
    h.family_with_memorial(&owner, &linked, &[&relative]).await;

    let mine = h
        .services
        .access
        .list_accessible_memorials(&owner, &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 2);

    let theirs = h
        .services
        .access
        .list_accessible_memorials(&relative, &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(theirs.total, 1);
    assert_eq!(theirs.data[0].id, linked.id);
}

#[tokio::test]
async fn owner_keeps_full_access_at_every_level() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let other = h.user("other").await;
    let memorial = h.memorial(&owner, 0).await;

    for level in [0, 1, 2] {
        let mut req = settings(&memorial.id, level);
        req.blocked_user_ids = vec![other.clone()];
        h.services
            .privacy
            .set_memorial_privacy(&owner, req)
            .await
            .unwrap();
        let access = h
            .services
            .access
            .can_access_memorial(&owner, &memorial.id)
            .await
            .unwrap();
        assert!(access.allowed);
        assert_eq!(access.level, AccessLevel::Owner);
        assert!(
            h.services
                .access
                .can_modify_memorial(&owner, &memorial.id)
                .await
                .unwrap()
        );
    }
    assert!(
        !h.services
            .access
            .can_modify_memorial(&other, &memorial.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn loosening_privacy_never_removes_access() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let friend = h.user("friend").await;
    let relative = h.user("relative").await;
    let memorial = h.memorial(&owner, 2).await;
    h.family_with_memorial(&owner, &memorial, &[&relative]).await;

    let mut allowed_at_private = Vec::new();
    for level in [2, 1, 0] {
        let mut req = settings(&memorial.id, level);
        req.allowed_user_ids = vec![friend.clone()];
        req.visitor_permissions = vec!["view".into()];
        h.services
            .privacy
            .set_memorial_privacy(&owner, req)
            .await
            .unwrap();

        for user in [&friend, &relative] {
            let allowed = h
                .services
                .privacy
                .check_user_access(user, &memorial.id, PermissionType::View)
                .await
                .unwrap();
            if level == 2 && allowed {
                allowed_at_private.push(user.clone());
            }
            if allowed_at_private.contains(user) {
                assert!(allowed, "{user} lost access at level {level}");
            }
        }
    }
    assert_eq!(allowed_at_private, vec![friend]);
}

#[tokio::test]
async fn blacklist_added_after_a_grant_still_wins() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let friend = h.user("friend").await;
    let memorial = h.memorial(&owner, 2).await;

    let mut req = settings(&memorial.id, 2);
    req.allowed_user_ids = vec![friend.clone()];
    req.visitor_permissions = vec!["view".into(), "worship".into()];
    h.services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap();
    h.services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, &friend, None)
        .await
        .unwrap();

    for permission in PermissionType::ALL {
        assert!(
            !h.services
                .privacy
                .check_user_access(&friend, &memorial.id, permission)
                .await
                .unwrap()
        );
    }
}

#[tokio::test]
async fn family_member_loses_view_once_blacklisted() {
    let h = Harness::new();
    let a = h.user("a").await;
    let b = h.user("b").await;
    let family = h.family(&a).await;
    h.services
        .families
        .join_family_by_code(&b, &family.invite_code)
        .await
        .unwrap();

    let memorial = h.memorial(&a, 0).await;
    h.services
        .privacy
        .set_memorial_privacy(&a, settings(&memorial.id, 1))
        .await
        .unwrap();
    h.services
        .families
        .add_memorial_to_family(&a, &family.id, &memorial.id)
        .await
        .unwrap();

    let access = h
        .services
        .access
        .can_access_memorial(&b, &memorial.id)
        .await
        .unwrap();
    assert_eq!((access.allowed, access.level), (true, AccessLevel::Family));

    h.services
        .privacy
        .add_to_blacklist(&a, &memorial.id, &b, None)
        .await
        .unwrap();
    assert!(
        !h.services
            .privacy
            .check_user_access(&b, &memorial.id, PermissionType::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn pending_request_blocks_a_second_one_until_approved() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let u = h.user("u").await;
    let memorial = h.memorial(&owner, 2).await;
    let privacy = &h.services.privacy;

    let request = privacy
        .request_access(&u, &memorial.id, Some("please".into()))
        .await
        .unwrap();
    let err = privacy
        .request_access(&u, &memorial.id, Some("again".into()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AccessRequestPending);

    privacy
        .handle_access_request(&owner, &request.id, true, &["view".to_string()])
        .await
        .unwrap();
    assert!(
        privacy
            .check_user_access(&u, &memorial.id, PermissionType::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn privacy_input_must_name_existing_users_and_families() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let friend = h.user("friend").await;
    let memorial = h.memorial(&owner, 2).await;

    let mut req = settings(&memorial.id, 2);
    req.allowed_family_ids = vec!["no-such-family".into()];
    req.visitor_permissions = vec!["view".into()];
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyNotFound);

    let mut req = settings(&memorial.id, 2);
    req.allowed_user_ids = vec![friend.clone(), "no-such-user".into()];
    req.visitor_permissions = vec!["view".into()];
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    let mut req = settings(&memorial.id, 0);
    req.blocked_user_ids = vec!["ghost".into()];
    let err = h
        .services
        .privacy
        .set_memorial_privacy(&owner, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    let err = h
        .services
        .privacy
        .add_to_blacklist(&owner, &memorial.id, "ghost", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    // Nothing was written by the rejected calls
    let stored = h
        .services
        .privacy
        .get_privacy_settings(&owner, &memorial.id)
        .await
        .unwrap();
    assert_eq!(stored.privacy_level, shared::models::PrivacyLevel::Private);
    assert!(stored.permissions.is_empty());
    assert!(stored.blacklist.is_empty());
}

#[tokio::test]
async fn repeat_visits_on_one_day_are_recorded_once() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let visitor = h.user("visitor").await;
    let memorial = h.memorial(&owner, 0).await;

    for _ in 0..3 {
        h.services
            .memorials
            .get_memorial(&visitor, &memorial.id, Some("198.51.100.4".into()))
            .await
            .unwrap();
    }
    h.services
        .memorials
        .get_memorial(&owner, &memorial.id, None)
        .await
        .unwrap();

    let visits = h
        .services
        .memorials
        .list_visitors(&owner, &memorial.id, &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(visits.total, 1);
    assert_eq!(visits.data[0].visitor_id, visitor);
}
