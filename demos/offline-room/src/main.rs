use std::sync::Arc;
use std::time::Duration;

use tether::prelude::*;
use tether::session::FixedProfile;
use tracing::info;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Walk forward, sprint to the right, jump, then crouch-walk back.
fn route() -> ScriptedInput {
    ScriptedInput::default()
        .hold(InputSnapshot::new(0.0, 1.0), 60)
        .hold(InputSnapshot::new(1.0, 0.0).with_sprint(true), 60)
        .hold(InputSnapshot::default().with_jump(true), 1)
        .hold(InputSnapshot::default(), 50)
        .hold(InputSnapshot::new(0.0, -1.0).with_crouch_edge(true), 40)
}

fn client(
    network: &LocalNetwork,
    config: &ClientConfig,
    name: &str,
    input: ScriptedInput,
) -> GameClient<LocalTransport> {
    let (transport, events) = network.connect();
    GameClient::builder(Arc::new(transport), events)
        .config(config.clone())
        .profile(Arc::new(FixedProfile::named(name)))
        .input(input)
        .build()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), TetherError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    tether::logging::init(&config.log_level);

    let network = LocalNetwork::new();
    let mut host = client(&network, &config, "Host", route());
    let mut guest = client(&network, &config, "Guest", ScriptedInput::default());

    host.manager().create_or_join_room("offline").await?;
    guest.manager().create_or_join_room("offline").await?;

    let run_for = || tokio::time::sleep(Duration::from_secs(4));
    tokio::join!(host.run_until(run_for()), guest.run_until(run_for()));

    for (entity, slot) in guest.world().iter() {
        let transform = slot.body().transform();
        info!(
            %entity,
            owner = %slot.owner(),
            authority = %slot.authority(),
            position = ?transform.position,
            rotation = ?transform.rotation,
            "final transform seen by guest"
        );
    }

    host.manager().leave_room().await;
    guest.manager().leave_room().await;
    Ok(())
}
