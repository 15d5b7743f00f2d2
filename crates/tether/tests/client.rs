//! GameClient end to end: two clients in one room on the in-process
//! transport.

use std::sync::Arc;
use std::time::Duration;

use tether::GameClient;
use tether::movement::ScriptedInput;
use tether::protocol::{Authority, DisplayName, EntityId, InputSnapshot, Vec3};
use tether::session::{FixedProfile, Notification};
use tether::transport::{LocalNetwork, LocalTransport, Transport};
use tokio::time::sleep;

fn client(net: &LocalNetwork, name: &str, input: ScriptedInput) -> GameClient<LocalTransport> {
    let (transport, events) = net.connect();
    GameClient::builder(Arc::new(transport), events)
        .profile(Arc::new(FixedProfile::named(name)))
        .input(input)
        .build()
}

fn avatar(client: &GameClient<LocalTransport>) -> EntityId {
    let me = client.transport().player();
    client
        .transport()
        .player_object(me)
        .expect("local avatar registered")
}

/// Ada hosts, Bo joins, and both have seen each other's avatar.
async fn two_in_arena(
    net: &LocalNetwork,
    ada_input: ScriptedInput,
) -> (GameClient<LocalTransport>, GameClient<LocalTransport>) {
    let mut ada = client(net, "Ada", ada_input);
    ada.manager().create_or_join_room("arena").await.unwrap();
    ada.pump_events().await;

    let mut bo = client(net, "Bo", ScriptedInput::default());
    bo.manager().create_or_join_room("arena").await.unwrap();
    bo.pump_events().await;
    ada.pump_events().await;
    bo.pump_events().await;
    (ada, bo)
}

// =========================================================================
// Replication
// =========================================================================

#[tokio::test]
async fn test_tick_owner_publishes_and_peer_follows() {
    let net = LocalNetwork::new();
    let forward = ScriptedInput::default().hold(InputSnapshot::new(0.0, 1.0), 10);
    let (mut ada, mut bo) = two_in_arena(&net, forward).await;
    let ada_avatar = avatar(&ada);
    let start = ada.world().get(ada_avatar).unwrap().body().position();

    for _ in 0..10 {
        ada.tick(0.1);
        bo.tick(0.1);
    }

    let ada_view = ada.world().get(ada_avatar).unwrap();
    let end = ada_view.body().position();
    assert!((end.z - start.z - 5.0).abs() < 1e-4);
    assert_eq!(end.y, 0.0);
    assert_eq!(ada_view.cell().latest(), ada.transport().read_transform(ada_avatar));

    let bo_view = bo.world().get(ada_avatar).unwrap();
    assert_eq!(bo_view.authority(), Authority::Remote);
    assert_eq!(bo_view.body().position(), end);
    assert!(bo_view.cell().revision() > 0);
}

#[tokio::test]
async fn test_world_authority_follows_spawner() {
    let net = LocalNetwork::new();
    let (ada, bo) = two_in_arena(&net, ScriptedInput::default()).await;
    let ada_avatar = avatar(&ada);
    let bo_avatar = avatar(&bo);

    assert_eq!(ada.world().len(), 2);
    assert_eq!(ada.world().get(ada_avatar).unwrap().authority(), Authority::Local);
    assert_eq!(ada.world().get(bo_avatar).unwrap().authority(), Authority::Remote);
    assert_eq!(bo.world().local_entity(), Some(bo_avatar));
    assert_eq!(
        ada.roster().get(bo.transport().player()).unwrap().display_name.as_str(),
        "Bo"
    );
}

#[tokio::test]
async fn test_tick_idle_peer_keeps_spawn_position() {
    let net = LocalNetwork::new();
    let (mut ada, mut bo) = two_in_arena(&net, ScriptedInput::default()).await;
    let bo_avatar = avatar(&bo);
    let spawn = bo.world().get(bo_avatar).unwrap().body().position();

    for _ in 0..5 {
        bo.tick(0.1);
        ada.tick(0.1);
    }

    assert_eq!(ada.world().get(bo_avatar).unwrap().body().position(), spawn);
    assert_eq!(bo.world().get(bo_avatar).unwrap().body().position(), spawn);
}

#[tokio::test]
async fn test_tick_after_leave_does_not_move_stale_avatar() {
    let net = LocalNetwork::new();
    let forward = ScriptedInput::default().hold(InputSnapshot::new(0.0, 1.0), 10);
    let mut ada = client(&net, "Ada", forward);
    ada.manager().create_or_join_room("arena").await.unwrap();
    ada.pump_events().await;
    let ada_avatar = avatar(&ada);
    let start = ada.world().get(ada_avatar).unwrap().body().position();

    ada.manager().leave_room().await;
    assert!(!ada.transport().is_running());
    for _ in 0..3 {
        ada.tick(0.1);
    }

    let stale = ada.world().get(ada_avatar).expect("shutdown not handled yet");
    assert_eq!(stale.body().position(), start);
    assert_eq!(stale.cell().revision(), 0);

    ada.pump_events().await;
    assert!(ada.world().is_empty());
    assert!(ada.scheduler().is_paused());
}

// =========================================================================
// Movement collaborators
// =========================================================================

#[tokio::test]
async fn test_ceiling_probe_blocks_jump() {
    let jump = || ScriptedInput::default().hold(InputSnapshot::default().with_jump(true), 3);

    let net = LocalNetwork::new();
    let mut open = client(&net, "Ada", jump());
    open.manager().create_or_join_room("open").await.unwrap();
    open.pump_events().await;
    open.tick(0.1);
    let lifted = open.world().get(avatar(&open)).unwrap().body().position().y;
    assert!(lifted > 0.0);

    let (transport, events) = net.connect();
    let mut boxed_in = GameClient::builder(Arc::new(transport), events)
        .profile(Arc::new(FixedProfile::named("Bo")))
        .input(jump())
        .ceiling(|_: Vec3, _: f32| true)
        .build();
    boxed_in.manager().create_or_join_room("cellar").await.unwrap();
    boxed_in.pump_events().await;
    for _ in 0..3 {
        boxed_in.tick(0.1);
    }
    let slot = boxed_in.world().get(avatar(&boxed_in)).unwrap();
    assert!(!slot.state().is_jumping);
    assert_eq!(slot.body().position().y, 0.0);
}

#[tokio::test]
async fn test_tick_reports_run_animation_when_moving() {
    let net = LocalNetwork::new();
    let mut ada = client(
        &net,
        "Ada",
        ScriptedInput::default().hold(InputSnapshot::new(1.0, 0.0), 3),
    );
    ada.manager().create_or_join_room("arena").await.unwrap();
    ada.pump_events().await;

    ada.tick(0.1);
    ada.tick(0.1);

    let flags = ada.world().get(avatar(&ada)).unwrap().animation();
    assert!(flags.run);
    assert!(!flags.air);
    assert!(!flags.sprint);
}

// =========================================================================
// Loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_until_ticks_only_while_avatar_exists() {
    let net = LocalNetwork::new();
    let mut ada = client(&net, "Ada", ScriptedInput::default());
    assert!(ada.scheduler().is_paused());

    ada.run_until(sleep(Duration::from_millis(100))).await;
    assert_eq!(ada.scheduler().tick_count(), 0);

    ada.manager().create_or_join_room("arena").await.unwrap();
    ada.run_until(sleep(Duration::from_millis(500))).await;
    assert!(!ada.scheduler().is_paused());
    let ticks = ada.scheduler().tick_count();
    assert!((25..=31).contains(&ticks), "ticks = {ticks}");

    ada.manager().leave_room().await;
    ada.run_until(sleep(Duration::from_millis(100))).await;
    assert!(ada.scheduler().is_paused());
    assert!(ada.world().is_empty());

    ada.run_until(sleep(Duration::from_millis(500))).await;
    assert_eq!(ada.scheduler().tick_count(), ticks);
}

#[tokio::test]
async fn test_run_returns_when_event_stream_closes() {
    let net = LocalNetwork::new();
    let (transport, _events) = net.connect();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let mut client = GameClient::builder(Arc::new(transport), rx).build();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(1), client.run())
        .await
        .expect("run returns once the stream closes");
}

#[tokio::test]
async fn test_subscribe_sees_join_and_own_name() {
    let net = LocalNetwork::new();
    let mut ada = client(&net, "Ada", ScriptedInput::default());
    let mut notes = ada.subscribe();

    ada.manager().create_or_join_room("arena").await.unwrap();
    ada.pump_events().await;

    let notes = notes.drain();
    let me = ada.transport().player();
    assert!(notes.contains(&Notification::JoinedRoom {
        name: "arena".into()
    }));
    assert!(notes.contains(&Notification::DisplayNameSynced {
        player: me,
        name: DisplayName::new("Ada").unwrap(),
    }));
    assert!(notes.contains(&Notification::EntitySpawned {
        entity: avatar(&ada),
        owner: me,
    }));
}
