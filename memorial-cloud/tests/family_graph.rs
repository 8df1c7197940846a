//! Families, membership, invitations, genealogy and heritage

mod common;

use chrono::NaiveDate;
use common::Harness;
use memorial_cloud::db::{ActivityRepo, FamilyRepo, GenealogyRepo};
use shared::error::ErrorCode;
use shared::models::{
    ActivityType, FamilyInvitation, FamilyRole, GenealogyCreate, GenealogyUpdate,
    InvitationStatus, InviteMembersRequest, ReminderCreate, StoryCreate, StoryUpdate,
    TraditionCreate, WorshipCreate,
};
use shared::request::PaginationQuery;
use shared::util::{new_id, now_millis};

fn person(name: &str, generation: i32, parent_id: Option<&str>) -> GenealogyCreate {
    GenealogyCreate {
        person_name: name.into(),
        generation,
        parent_id: parent_id.map(str::to_string),
        gender: "male".into(),
        birth_date: None,
        death_date: None,
        biography: None,
        avatar_url: None,
        memorial_id: None,
        position: None,
        achievements: None,
    }
}

fn invite(user_ids: &[&str]) -> InviteMembersRequest {
    InviteMembersRequest {
        user_ids: user_ids.iter().map(|id| id.to_string()).collect(),
        message: Some("Welcome home".into()),
    }
}

#[tokio::test]
async fn creator_becomes_admin_with_well_formed_invite_code() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let family = h.family(&creator).await;

    assert_eq!(family.invite_code.len(), 8);
    assert!(
        family
            .invite_code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );

    let detail = h
        .services
        .families
        .get_family(&creator, &family.id)
        .await
        .unwrap();
    assert_eq!(detail.my_role, FamilyRole::Admin);
    assert_eq!(detail.members.len(), 1);
}

#[tokio::test]
async fn join_by_code_is_case_insensitive_and_once_only() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let joiner = h.user("joiner").await;
    let family = h.family(&creator).await;

    let code = format!("  {}  ", family.invite_code.to_lowercase());
    let joined = h
        .services
        .families
        .join_family_by_code(&joiner, &code)
        .await
        .unwrap();
    assert_eq!(joined.id, family.id);

    let err = h
        .services
        .families
        .join_family_by_code(&joiner, &family.invite_code)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyFamilyMember);

    let err = h
        .services
        .families
        .join_family_by_code(&joiner, "ZZZZZZZZ")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInviteCode);

    let activities = h
        .services
        .activities
        .list_activities(&creator, &family.id, &PaginationQuery::default())
        .await
        .unwrap();
    assert!(
        activities
            .data
            .iter()
            .any(|a| a.activity_type == ActivityType::Join && a.user_id == joiner)
    );
}

#[tokio::test]
async fn invitations_skip_members_and_open_invites() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let member = h.user("member").await;
    let guest = h.user("guest").await;
    let family = h.family(&creator).await;
    h.services
        .families
        .join_family_by_code(&member, &family.invite_code)
        .await
        .unwrap();

    let sent = h
        .services
        .families
        .invite_members(&creator, &family.id, invite(&[&member, &guest, &guest]))
        .await
        .unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].invitee_id, guest);

    let again = h
        .services
        .families
        .invite_members(&creator, &family.id, invite(&[&guest]))
        .await
        .unwrap();
    assert!(again.is_empty());

    let err = h
        .services
        .families
        .invite_members(&creator, &family.id, invite(&["nobody"]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    let err = h
        .services
        .families
        .invite_members(&member, &family.id, invite(&[&guest]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyAdminRequired);
}

#[tokio::test]
async fn accepting_an_invitation_joins_the_family() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let guest = h.user("guest").await;
    let family = h.family(&creator).await;

    let sent = h
        .services
        .families
        .invite_members(&creator, &family.id, invite(&[&guest]))
        .await
        .unwrap();
    let mine = h.services.families.list_my_invitations(&guest).await.unwrap();
    assert_eq!(mine.len(), 1);

    // Only the invitee sees it
    let err = h
        .services
        .families
        .respond_to_invitation(&creator, &sent[0].id, true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvitationNotFound);

    let answered = h
        .services
        .families
        .respond_to_invitation(&guest, &sent[0].id, true)
        .await
        .unwrap();
    assert_eq!(answered.status, InvitationStatus::Accepted);
    assert!(
        h.services
            .access
            .can_access_family(&guest, &family.id)
            .await
            .unwrap()
            .allowed
    );

    let err = h
        .services
        .families
        .respond_to_invitation(&guest, &sent[0].id, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvitationHandled);
}

#[tokio::test]
async fn accepting_after_joining_by_code_keeps_one_membership() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let guest = h.user("guest").await;
    let family = h.family(&creator).await;

    let sent = h
        .services
        .families
        .invite_members(&creator, &family.id, invite(&[&guest]))
        .await
        .unwrap();
    h.services
        .families
        .join_family_by_code(&guest, &family.invite_code)
        .await
        .unwrap();

    let answered = h
        .services
        .families
        .respond_to_invitation(&guest, &sent[0].id, true)
        .await
        .unwrap();
    assert_eq!(answered.status, InvitationStatus::Accepted);

    let members = h
        .services
        .families
        .list_members(&creator, &family.id, &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(members.total, 2);
    assert_eq!(
        members.data.iter().filter(|m| m.user_id == guest).count(),
        1
    );

    let feed = h
        .services
        .activities
        .list_activities(&creator, &family.id, &PaginationQuery::default())
        .await
        .unwrap();
    let joins = feed
        .data
        .iter()
        .filter(|a| a.activity_type == ActivityType::Join && a.user_id == guest)
        .count();
    assert_eq!(joins, 1);
}

#[tokio::test]
async fn creator_without_a_member_row_still_administers() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let outsider = h.user("outsider").await;
    let family = h.family(&creator).await;
    assert!(h.store.delete_member(&family.id, &creator).await.unwrap());

    let access = h
        .services
        .access
        .can_access_family(&creator, &family.id)
        .await
        .unwrap();
    assert!(access.allowed);
    assert_eq!(access.role, Some(FamilyRole::Admin));
    assert!(
        h.services
            .access
            .can_manage_family(&creator, &family.id)
            .await
            .unwrap()
    );
    h.services
        .access
        .require_family_admin(&creator, &family.id)
        .await
        .unwrap();

    // Admin-only operations keep working
    h.services
        .families
        .invite_members(&creator, &family.id, invite(&[&outsider]))
        .await
        .unwrap();

    let outsider_access = h
        .services
        .access
        .can_access_family(&outsider, &family.id)
        .await
        .unwrap();
    assert!(!outsider_access.allowed);
}

#[tokio::test]
async fn expired_invitation_is_refused_and_stays_pending() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let guest = h.user("guest").await;
    let family = h.family(&creator).await;

    let now = now_millis();
    let stale = FamilyInvitation {
        id: new_id(),
        family_id: family.id.clone(),
        inviter_id: creator.clone(),
        invitee_id: guest.clone(),
        message: None,
        status: InvitationStatus::Pending,
        expires_at: now - 1,
        created_at: now - 10_000,
        updated_at: now - 10_000,
    };
    h.store
        .insert_invitations(std::slice::from_ref(&stale))
        .await
        .unwrap();

    assert!(
        h.services
            .families
            .list_my_invitations(&guest)
            .await
            .unwrap()
            .is_empty()
    );
    let err = h
        .services
        .families
        .respond_to_invitation(&guest, &stale.id, true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvitationExpired);

    let stored = h.store.find_invitation(&stale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Pending);
    assert!(h.store.find_member(&family.id, &guest).await.unwrap().is_none());
}

#[tokio::test]
async fn creator_is_protected_from_removal_demotion_and_leaving() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let helper = h.user("helper").await;
    let family = h.family(&creator).await;
    h.services
        .families
        .join_family_by_code(&helper, &family.invite_code)
        .await
        .unwrap();

    let promoted = h
        .services
        .families
        .set_member_role(&creator, &family.id, &helper, "admin")
        .await
        .unwrap();
    assert_eq!(promoted.role, FamilyRole::Admin);

    let families = &h.services.families;
    let err = families
        .remove_member(&helper, &family.id, &creator)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotRemoveCreator);

    let err = families
        .set_member_role(&helper, &family.id, &creator, "member")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyCreatorRequired);

    let err = families
        .set_member_role(&creator, &family.id, &creator, "member")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotChangeCreatorRole);

    let err = families
        .set_member_role(&creator, &family.id, &helper, "owner")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidFamilyRole);

    let err = families.leave_family(&creator, &family.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CreatorCannotLeave);

    families.leave_family(&helper, &family.id).await.unwrap();
    let err = families.leave_family(&helper, &family.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFamilyMember);
}

#[tokio::test]
async fn members_listing_puts_admins_first() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let a = h.user("a").await;
    let b = h.user("b").await;
    let family = h.family(&creator).await;
    for user in [&a, &b] {
        h.services
            .families
            .join_family_by_code(user, &family.invite_code)
            .await
            .unwrap();
    }
    h.services
        .families
        .set_member_role(&creator, &family.id, &b, "admin")
        .await
        .unwrap();

    let members = h
        .services
        .families
        .list_members(&a, &family.id, &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(members.total, 3);
    assert_eq!(members.data[0].role, FamilyRole::Admin);
    assert_eq!(members.data[1].role, FamilyRole::Admin);
    assert_eq!(members.data[2].user_id, a);
}

#[tokio::test]
async fn memorial_links_require_creator_and_are_unique() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let other = h.user("other").await;
    let memorial = h.memorial(&creator, 1).await;
    let foreign = h.memorial(&other, 2).await;
    let family = h.family(&creator).await;

    h.services
        .families
        .add_memorial_to_family(&creator, &family.id, &memorial.id)
        .await
        .unwrap();
    let err = h
        .services
        .families
        .add_memorial_to_family(&creator, &family.id, &memorial.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialAlreadyLinked);

    let err = h
        .services
        .families
        .add_memorial_to_family(&creator, &family.id, &foreign.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialAccessDenied);

    let linked = h
        .services
        .families
        .list_family_memorials(&creator, &family.id)
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);

    h.services
        .families
        .remove_memorial_from_family(&creator, &family.id, &memorial.id)
        .await
        .unwrap();
    let err = h
        .services
        .families
        .remove_memorial_from_family(&creator, &family.id, &memorial.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialNotLinked);
}

#[tokio::test]
async fn deleting_a_family_removes_everything_scoped_to_it() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let relative = h.user("relative").await;
    let memorial = h.memorial(&creator, 1).await;
    let family = h.family_with_memorial(&creator, &memorial, &[&relative]).await;
    let root = h
        .services
        .genealogy
        .create_genealogy(&creator, &family.id, person("Ancestor", 1, None))
        .await
        .unwrap();

    let err = h
        .services
        .families
        .delete_family(&relative, &family.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyCreatorRequired);

    h.services
        .families
        .delete_family(&creator, &family.id)
        .await
        .unwrap();

    assert!(h.store.find_family(&family.id).await.unwrap().is_none());
    assert!(h.store.find_member(&family.id, &relative).await.unwrap().is_none());
    assert!(h.store.find_genealogy(&root.id).await.unwrap().is_none());
    let (activities, total) = h.store.list_activities(&family.id, 0, 100).await.unwrap();
    assert!(activities.is_empty());
    assert_eq!(total, 0);

    // The memorial itself survives, but family visibility is gone
    let access = h
        .services
        .access
        .can_access_memorial(&relative, &memorial.id)
        .await
        .unwrap();
    assert!(!access.allowed);
}

#[tokio::test]
async fn worship_is_mirrored_into_every_family_of_the_worshipper() {
    let h = Harness::new();
    let creator = h.user("creator").await;
    let relative = h.user("relative").await;
    let memorial = h.memorial(&creator, 1).await;
    let first = h.family_with_memorial(&creator, &memorial, &[&relative]).await;
    let second = h.family_with_memorial(&creator, &memorial, &[&relative]).await;
    // Linked but the worshipper is not a member
    let third = h.family_with_memorial(&creator, &memorial, &[]).await;

    h.services
        .memorials
        .worship(
            &relative,
            &memorial.id,
            WorshipCreate {
                worship_type: "candle".into(),
                content: serde_json::json!({"text": "miss you"}),
            },
        )
        .await
        .unwrap();

    for (family, expected) in [(&first, 1), (&second, 1), (&third, 0)] {
        let (rows, _) = h.store.list_activities(&family.id, 0, 100).await.unwrap();
        let worships = rows
            .iter()
            .filter(|a| a.activity_type == ActivityType::Worship)
            .count();
        assert_eq!(worships, expected);
    }

    let err = h
        .services
        .memorials
        .worship(
            &relative,
            &memorial.id,
            WorshipCreate {
                worship_type: "fireworks".into(),
                content: serde_json::Value::Null,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidWorshipType);
}

#[tokio::test]
async fn genealogy_tree_rejects_cycles_and_orphaning_deletes() {
    let h = Harness::new();
    let admin = h.user("admin").await;
    let family = h.family(&admin).await;
    let genealogy = &h.services.genealogy;

    let grandpa = genealogy
        .create_genealogy(&admin, &family.id, person("Grandpa", 1, None))
        .await
        .unwrap();
    let father = genealogy
        .create_genealogy(&admin, &family.id, person("Father", 2, Some(&grandpa.id)))
        .await
        .unwrap();
    let son = genealogy
        .create_genealogy(&admin, &family.id, person("Son", 3, Some(&father.id)))
        .await
        .unwrap();

    let tree = genealogy.genealogy_tree(&admin, &family.id).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].node.id, grandpa.id);
    assert_eq!(tree[0].children[0].children[0].node.id, son.id);

    let err = genealogy
        .update_genealogy(
            &admin,
            &family.id,
            &grandpa.id,
            GenealogyUpdate {
                parent_id: Some(son.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GenealogyCycle);

    let err = genealogy
        .delete_genealogy(&admin, &family.id, &father.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GenealogyHasChildren);

    // Detach the son, then the father can go
    genealogy
        .update_genealogy(
            &admin,
            &family.id,
            &son.id,
            GenealogyUpdate {
                parent_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    genealogy
        .delete_genealogy(&admin, &family.id, &father.id)
        .await
        .unwrap();

    let tree = genealogy.genealogy_tree(&admin, &family.id).await.unwrap();
    assert_eq!(tree.len(), 2);
}

#[tokio::test]
async fn genealogy_parent_and_memorial_must_belong_to_the_family() {
    let h = Harness::new();
    let admin = h.user("admin").await;
    let family = h.family(&admin).await;
    let other = h.family(&admin).await;
    let memorial = h.memorial(&admin, 1).await;

    let outsider = h
        .services
        .genealogy
        .create_genealogy(&admin, &other.id, person("Outsider", 1, None))
        .await
        .unwrap();
    let err = h
        .services
        .genealogy
        .create_genealogy(&admin, &family.id, person("Child", 2, Some(&outsider.id)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GenealogyParentInvalid);

    let mut linked = person("Grandma", 1, None);
    linked.memorial_id = Some(memorial.id.clone());
    let err = h
        .services
        .genealogy
        .create_genealogy(&admin, &family.id, linked)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialNotLinked);

    let mut bad_gender = person("Someone", 1, None);
    bad_gender.gender = "unknown".into();
    let err = h
        .services
        .genealogy
        .create_genealogy(&admin, &family.id, bad_gender)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGender);
}

#[tokio::test]
async fn stories_keep_their_lists_and_count_views() {
    let h = Harness::new();
    let admin = h.user("admin").await;
    let author = h.user("author").await;
    let reader = h.user("reader").await;
    let family = h.family(&admin).await;
    for user in [&author, &reader] {
        h.services
            .families
            .join_family_by_code(user, &family.invite_code)
            .await
            .unwrap();
    }

    let story = h
        .services
        .heritage
        .create_story(
            &author,
            &family.id,
            StoryCreate {
                title: "Crossing the river".into(),
                content: "In 1949 the family moved south.".into(),
                category: "migration".into(),
                period: Some("1949".into()),
                characters: vec!["Grandpa".into(), "Grandma".into()],
                location: None,
                media_files: vec![],
                tags: vec!["history".into()],
                is_public: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(story.characters, vec!["Grandpa", "Grandma"]);

    let read = h
        .services
        .heritage
        .get_story(&reader, &family.id, &story.id)
        .await
        .unwrap();
    assert_eq!(read.view_count, 1);
    assert_eq!(read.tags, vec!["history"]);

    let err = h
        .services
        .heritage
        .update_story(
            &reader,
            &family.id,
            &story.id,
            StoryUpdate {
                title: Some("Mine now".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyAdminRequired);

    let by_category = h
        .services
        .heritage
        .list_stories(&reader, &family.id, Some("migration"), &PaginationQuery::default())
        .await
        .unwrap();
    assert_eq!(by_category.total, 1);

    let err = h
        .services
        .heritage
        .list_stories(&reader, &family.id, Some("gossip"), &PaginationQuery::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStoryCategory);

    // Admins may delete any story
    h.services
        .heritage
        .delete_story(&admin, &family.id, &story.id)
        .await
        .unwrap();
    let err = h
        .services
        .heritage
        .get_story(&reader, &family.id, &story.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StoryNotFound);
}

#[tokio::test]
async fn traditions_are_admin_managed() {
    let h = Harness::new();
    let admin = h.user("admin").await;
    let member = h.user("member").await;
    let family = h.family(&admin).await;
    h.services
        .families
        .join_family_by_code(&member, &family.invite_code)
        .await
        .unwrap();

    let tradition = TraditionCreate {
        name: "Qingming visit".into(),
        description: None,
        category: "festival".into(),
        origin: None,
        practice: Some("Sweep the tombs".into()),
        meaning: None,
        media_files: vec![],
    };
    let err = h
        .services
        .heritage
        .create_tradition(&member, &family.id, tradition.clone())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FamilyAdminRequired);

    h.services
        .heritage
        .create_tradition(&admin, &family.id, tradition)
        .await
        .unwrap();
    let listed = h
        .services
        .heritage
        .list_traditions(&member, &family.id, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn reminders_need_a_linked_memorial_and_window_upcoming() {
    let h = Harness::new();
    let admin = h.user("admin").await;
    let memorial = h.memorial(&admin, 1).await;
    let unlinked = h.memorial(&admin, 1).await;
    let family = h.family_with_memorial(&admin, &memorial, &[]).await;
    let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    let reminder = |memorial_id: &str, date: NaiveDate| ReminderCreate {
        memorial_id: memorial_id.to_string(),
        reminder_type: "death_anniversary".into(),
        reminder_date: date,
        title: "Anniversary".into(),
        content: None,
    };

    let err = h
        .services
        .reminders
        .set_reminder(&admin, &family.id, reminder(&unlinked.id, today))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemorialNotLinked);

    let soon = h
        .services
        .reminders
        .set_reminder(&admin, &family.id, reminder(&memorial.id, today + chrono::Days::new(3)))
        .await
        .unwrap();
    h.services
        .reminders
        .set_reminder(&admin, &family.id, reminder(&memorial.id, today + chrono::Days::new(4)))
        .await
        .unwrap();

    let upcoming = h
        .services
        .reminders
        .upcoming_reminders(&admin, &family.id, today)
        .await
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, soon.id);

    h.services
        .reminders
        .delete_reminder(&admin, &family.id, &soon.id)
        .await
        .unwrap();
    let remaining = h
        .services
        .reminders
        .list_reminders(&admin, &family.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    let err = h
        .services
        .reminders
        .delete_reminder(&admin, &family.id, &soon.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ReminderNotFound);
}
