//! End-to-end access scenarios
//!
//! Drives `AccessService` against a real SQLite store for:
//! - Shared Space grants and listings (owner, grantee, unrelated user)
//! - Tenant-level delete by a different uploader
//! - Channel role requirements for move / remove / delete
//! - Tenant isolation of videos and channels

use vidspace_core::core_access::{
    AccessLevel, ChannelRole, ErrorKind, NewVideo, SpaceAccess, TenantId, UserId, VideoUpdate,
};
use vidspace_core::test_utils::{
    assert_allowed, assert_denied, assert_kind, assert_space_listed, assert_space_not_listed,
    AccessFixture,
};

#[test]
fn test_shared_space_scenario() {
    let fx = AccessFixture::new();
    let owner = fx.member("owner");
    let u2 = fx.member("u2");
    let u3 = fx.member("u3");
    let service = fx.service();

    // O creates "Shared Space" and adds U2 with view
    let space = assert_allowed(service.create_space(&fx.ctx(&owner), "Shared Space", None));
    assert_allowed(service.add_user_to_space(&fx.ctx(&owner), &space.id, &u2, AccessLevel::View));
    println!("✓ Space created and shared");

    let members = assert_allowed(service.list_space_members(&fx.ctx(&owner), &space.id));
    assert!(!members.is_empty());
    assert!(members.iter().any(|m| m.user_id == u2 && m.level == AccessLevel::View));

    let u2_spaces = assert_allowed(service.list_spaces(&fx.ctx(&u2)));
    let entry = assert_space_listed(&u2_spaces, &space.id, SpaceAccess::Member(AccessLevel::View));
    assert_eq!(entry.space.name, "Shared Space");
    assert_eq!(entry.access.as_str(), "view");

    let u3_spaces = assert_allowed(service.list_spaces(&fx.ctx(&u3)));
    assert_space_not_listed(&u3_spaces, &space.id);

    let owner_spaces = assert_allowed(service.list_spaces(&fx.ctx(&owner)));
    assert_space_listed(&owner_spaces, &space.id, SpaceAccess::Owner);
    println!("✓ Listings reflect grants");
}

#[test]
fn test_non_owner_cannot_grant_any_level() {
    let fx = AccessFixture::new();
    let owner = fx.member("owner");
    let admin = fx.member("admin");
    let target = fx.member("target");
    let service = fx.service();

    let space = assert_allowed(service.create_space(&fx.ctx(&owner), "Shared Space", None));
    assert_allowed(service.add_user_to_space(&fx.ctx(&owner), &space.id, &admin, AccessLevel::Admin));

    for level in [AccessLevel::View, AccessLevel::Edit, AccessLevel::Admin] {
        assert_denied(service.add_user_to_space(&fx.ctx(&admin), &space.id, &target, level));
        assert_denied(service.add_user_to_space(&fx.ctx(&target), &space.id, &target, level));
    }
    assert_denied(service.list_space_members(&fx.ctx(&admin), &space.id));
}

#[test]
fn test_regrant_overwrites_level() {
    let fx = AccessFixture::new();
    let owner = fx.member("owner");
    let bob = fx.member("bob");
    let service = fx.service();

    let space = assert_allowed(service.create_space(&fx.ctx(&owner), "Shared Space", None));
    assert_allowed(service.add_user_to_space(&fx.ctx(&owner), &space.id, &bob, AccessLevel::View));
    assert_allowed(service.add_user_to_space(&fx.ctx(&owner), &space.id, &bob, AccessLevel::Admin));

    let members = assert_allowed(service.list_space_members(&fx.ctx(&owner), &space.id));
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].level, AccessLevel::Admin);

    let spaces = assert_allowed(service.list_spaces(&fx.ctx(&bob)));
    assert_space_listed(&spaces, &space.id, SpaceAccess::Member(AccessLevel::Admin));
}

#[test]
fn test_tenant_level_delete_by_other_user() {
    let fx = AccessFixture::new();
    let a = fx.member("a");
    let b = fx.member("b");
    let service = fx.service();

    let video = assert_allowed(service.create_video(
        &fx.ctx(&a),
        NewVideo { title: "A's clip".to_string(), ..NewVideo::default() },
    ));

    assert_denied(service.delete_video(&fx.ctx(&b), &video.id));
    assert_allowed(service.get_video(&fx.ctx(&a), &video.id));

    assert_allowed(service.delete_video(&fx.ctx(&a), &video.id));
    assert_kind(service.get_video(&fx.ctx(&a), &video.id), ErrorKind::NotFound);
}

#[test]
fn test_super_admin_is_not_uploader() {
    let fx = AccessFixture::new();
    let a = fx.member("a");
    let root = fx.super_admin("root");
    let video = fx.video(&a, None);
    let service = fx.service();

    assert_denied(service.delete_video(&fx.ctx(&root), &video.id));
    assert_denied(service.update_video(
        &fx.ctx(&root),
        &video.id,
        VideoUpdate { title: Some("mine now".to_string()), ..VideoUpdate::default() },
    ));
}

#[test]
fn test_channel_video_lifecycle() {
    let fx = AccessFixture::new();
    let source = fx.channel("source");
    let target = fx.channel("target");
    let owner = fx.member("owner");
    let uploader = fx.member("uploader");
    fx.grant(&source, &owner, ChannelRole::Owner);
    fx.grant(&target, &owner, ChannelRole::Owner);
    fx.grant(&source, &uploader, ChannelRole::Uploader);
    fx.grant(&target, &uploader, ChannelRole::Uploader);
    let service = fx.service();

    // The uploader can bring a tenant-level video into a channel
    let video = assert_allowed(service.create_video(
        &fx.ctx(&uploader),
        NewVideo { title: "Trailer".to_string(), ..NewVideo::default() },
    ));
    let moved = assert_allowed(service.update_video(
        &fx.ctx(&uploader),
        &video.id,
        VideoUpdate { channel_id: Some(source.id.clone()), ..VideoUpdate::default() },
    ));
    assert_eq!(moved.channel_id, Some(source.id.clone()));

    // ...but cannot take it out again or move it on
    assert_denied(service.remove_video_from_channel(&fx.ctx(&uploader), &video.id));
    assert_denied(service.delete_video(&fx.ctx(&uploader), &video.id));
    assert_denied(service.update_video(
        &fx.ctx(&uploader),
        &video.id,
        VideoUpdate { channel_id: Some(target.id.clone()), ..VideoUpdate::default() },
    ));

    // The source owner can
    let moved = assert_allowed(service.update_video(
        &fx.ctx(&owner),
        &video.id,
        VideoUpdate { channel_id: Some(target.id.clone()), ..VideoUpdate::default() },
    ));
    assert_eq!(moved.channel_id, Some(target.id.clone()));

    let removed = assert_allowed(service.remove_video_from_channel(&fx.ctx(&owner), &video.id));
    assert_eq!(removed.channel_id, None);
    assert_kind(service.remove_video_from_channel(&fx.ctx(&owner), &video.id), ErrorKind::InvalidArgument);

    // Back at tenant level only the uploader may delete
    assert_denied(service.delete_video(&fx.ctx(&owner), &video.id));
    assert_allowed(service.delete_video(&fx.ctx(&uploader), &video.id));

    // Deleted is terminal
    assert_kind(
        service.update_video(
            &fx.ctx(&owner),
            &video.id,
            VideoUpdate { channel_id: Some(source.id.clone()), ..VideoUpdate::default() },
        ),
        ErrorKind::NotFound,
    );
}

#[test]
fn test_tenant_isolation() {
    let acme = AccessFixture::new();
    let globex = acme.sibling("globex");
    let alice = acme.member("alice");
    globex.member("alice");
    let foreign_channel = globex.channel("theirs");
    globex.grant(&foreign_channel, &alice, ChannelRole::Owner);
    let service = acme.service();

    let video = acme.video(&alice, None);

    // Same user, other tenant: the video does not exist there
    assert_kind(service.get_video(&globex.ctx(&alice), &video.id), ErrorKind::NotFound);
    assert_kind(service.delete_video(&globex.ctx(&alice), &video.id), ErrorKind::NotFound);

    // A channel of another tenant is never a valid move target
    assert_denied(service.update_video(
        &acme.ctx(&alice),
        &video.id,
        VideoUpdate { channel_id: Some(foreign_channel.id.clone()), ..VideoUpdate::default() },
    ));

    // Not a member of the tenant named in the request
    let mallory = UserId::from("mallory");
    assert_denied(service.list_videos(&acme.ctx(&mallory), 0, 1));

    let listed = assert_allowed(service.list_videos(&globex.ctx(&alice), 0, 1));
    assert!(listed.iter().all(|v| v.tenant_id == TenantId::from("globex")));
}

#[test]
fn test_list_videos_is_scoped_to_caller() {
    let fx = AccessFixture::new();
    let private_channel = fx.channel("private");
    let owner = fx.member("owner");
    let outsider = fx.member("outsider");
    fx.grant(&private_channel, &owner, ChannelRole::Owner);

    let tenant_level = fx.video(&owner, None);
    let hidden = fx.video(&owner, Some(&private_channel));
    let service = fx.service();

    let visible: Vec<_> = assert_allowed(service.list_videos(&fx.ctx(&outsider), 0, 1))
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert!(visible.contains(&tenant_level.id));
    assert!(!visible.contains(&hidden.id));

    assert_denied(service.get_video(&fx.ctx(&outsider), &hidden.id));

    let owner_view = assert_allowed(service.list_videos(&fx.ctx(&owner), 0, 1));
    assert_eq!(owner_view.len(), 2);
}
