//! `GameClient` builder and client loop.
//!
//! This is the entry point for running a Tether client. It ties together
//! all the layers: transport events → session → world → movement →
//! replication, on one task.

use std::future::Future;
use std::sync::Arc;

use tether_movement::{
    AuthorityReplicator, CameraBasis, CeilingProbe, InputSampler, MovementSimulator, OpenSky,
    ReplicationOutcome, ScriptedInput,
};
use tether_protocol::TransportEvent;
use tether_session::{
    FixedProfile, NetworkEventDispatcher, Notifier, ProfileSource, RecordingSceneLoader,
    Roster, SceneLoader, SessionManager, Subscription, guest_name,
};
use tether_tick::TickScheduler;
use tether_transport::Transport;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

use crate::{BodyFactory, ClientConfig, World};

/// Builder for configuring a [`GameClient`].
///
/// # Example
///
/// ```rust,ignore
/// let (transport, events) = LocalNetwork::new().connect();
/// let mut client = GameClient::builder(Arc::new(transport), events)
///     .config(ClientConfig::load("client.json")?)
///     .input(my_gamepad)
///     .build();
/// client.manager().create_or_join_room("arena").await?;
/// client.run().await;
/// ```
pub struct GameClientBuilder<T: Transport> {
    transport: Arc<T>,
    events: UnboundedReceiver<TransportEvent>,
    config: ClientConfig,
    notifier: Notifier,
    scenes: Arc<dyn SceneLoader>,
    profile: Option<Arc<dyn ProfileSource>>,
    input: Box<dyn InputSampler>,
    probe: Box<dyn CeilingProbe + Send>,
    world: World,
}

impl<T: Transport> GameClientBuilder<T> {
    /// Creates a builder with default settings: neutral input, open sky,
    /// flat-floor bodies, and a random guest name.
    pub fn new(transport: Arc<T>, events: UnboundedReceiver<TransportEvent>) -> Self {
        Self {
            transport,
            events,
            config: ClientConfig::default(),
            notifier: Notifier::new(),
            scenes: Arc::new(RecordingSceneLoader::new()),
            profile: None,
            input: Box::new(ScriptedInput::default()),
            probe: Box::new(OpenSky),
            world: World::default(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing notifier, so subscribers can attach before the
    /// client is built.
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn scenes(mut self, scenes: Arc<dyn SceneLoader>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn profile(mut self, profile: Arc<dyn ProfileSource>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn input(mut self, input: impl InputSampler + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn ceiling(mut self, probe: impl CeilingProbe + Send + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn bodies(mut self, bodies: impl BodyFactory + 'static) -> Self {
        self.world = World::new(bodies);
        self
    }

    pub fn build(self) -> GameClient<T> {
        let config = self.config.validated();
        let manager = Arc::new(SessionManager::new(
            self.transport,
            config.session.clone(),
            self.notifier,
            self.scenes,
        ));
        let profile: Arc<dyn ProfileSource> = match self.profile {
            Some(profile) => profile,
            None => {
                let name = guest_name();
                debug!(%name, "no profile given, playing as guest");
                Arc::new(FixedProfile::named(name.as_str()))
            }
        };

        let mut scheduler = TickScheduler::new(config.tick.clone());
        scheduler.pause();

        GameClient {
            dispatcher: NetworkEventDispatcher::new(Arc::clone(&manager), profile),
            manager,
            events: self.events,
            world: self.world,
            simulator: MovementSimulator::new(config.movement.clone()),
            replicator: AuthorityReplicator,
            scheduler,
            input: self.input,
            probe: self.probe,
            camera: CameraBasis::from_yaw(config.camera_yaw),
        }
    }
}

/// One client process: session handling plus the fixed-rate simulation of
/// every entity in the room.
///
/// Call [`run()`](Self::run) to drive it. Room requests go through
/// [`manager()`](Self::manager), which can be cloned out and used from
/// elsewhere while the client runs.
pub struct GameClient<T: Transport> {
    manager: Arc<SessionManager<T>>,
    dispatcher: NetworkEventDispatcher<T>,
    events: UnboundedReceiver<TransportEvent>,
    world: World,
    simulator: MovementSimulator,
    replicator: AuthorityReplicator,
    scheduler: TickScheduler,
    input: Box<dyn InputSampler>,
    probe: Box<dyn CeilingProbe + Send>,
    camera: CameraBasis,
}

impl<T: Transport> GameClient<T> {
    /// Creates a new builder.
    pub fn builder(
        transport: Arc<T>,
        events: UnboundedReceiver<TransportEvent>,
    ) -> GameClientBuilder<T> {
        GameClientBuilder::new(transport, events)
    }

    pub fn manager(&self) -> &Arc<SessionManager<T>> {
        &self.manager
    }

    pub fn transport(&self) -> &Arc<T> {
        self.manager.transport()
    }

    pub fn subscribe(&self) -> Subscription {
        self.manager.notifier().subscribe()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn roster(&self) -> &Roster {
        self.dispatcher.roster()
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Movement input is interpreted relative to this camera.
    pub fn set_camera(&mut self, camera: CameraBasis) {
        self.camera = camera;
    }

    // -----------------------------------------------------------------------
    // Loop
    // -----------------------------------------------------------------------

    /// Serves transport events and simulation ticks until the transport's
    /// event stream closes.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Like [`run`](Self::run), but also returns once `stop` completes.
    pub async fn run_until(&mut self, stop: impl Future<Output = ()>) {
        tokio::pin!(stop);
        info!("tether client running");

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("transport event stream closed");
                        return;
                    }
                },
                tick = self.scheduler.wait_for_tick() => {
                    self.tick(tick.dt_secs());
                    self.scheduler.record_tick_end();
                }
                () = &mut stop => {
                    info!(ticks = self.scheduler.tick_count(), "tether client stopped");
                    return;
                }
            }
        }
    }

    /// Handles every event already queued, including ones raised while
    /// handling. Returns how many were handled.
    pub async fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Feeds one transport event to the world and the dispatcher, then
    /// pauses or resumes the simulation depending on whether this process
    /// still has an avatar.
    pub async fn handle_event(&mut self, event: TransportEvent) {
        let local = self.transport().local_player();
        self.world.observe(&event, local);
        self.dispatcher.handle(event).await;

        match (self.world.local_entity(), self.scheduler.is_paused()) {
            (Some(entity), true) => {
                info!(%entity, "local avatar present, simulation running");
                self.scheduler.resume();
            }
            (None, false) => {
                info!("no local avatar, simulation paused");
                self.scheduler.pause();
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one simulation step of `dt` seconds over every entity.
    ///
    /// Samples and broadcasts local input, simulates each entity with the
    /// input the transport delivered for it, then publishes or applies its
    /// replicated transform. Never blocks.
    ///
    /// Does nothing while the transport has no running session, even if
    /// the world still holds entities whose despawn or shutdown events
    /// have not been handled yet.
    pub fn tick(&mut self, dt: f32) {
        let transport = Arc::clone(self.manager.transport());
        if !transport.is_running() {
            trace!(entities = self.world.len(), "no running session, tick skipped");
            return;
        }
        if self.world.local_entity().is_some() {
            transport.provide_input(self.input.sample());
        }

        for (entity, slot) in self.world.iter_mut() {
            if !slot.cell.authority().is_local() {
                if let Some(transform) = transport.read_transform(entity) {
                    slot.cell.receive(transform);
                }
            }

            let input = transport.poll_input(entity);
            let step = self.simulator.step(
                &slot.state,
                input.as_ref(),
                slot.body.as_mut(),
                self.probe.as_ref(),
                self.camera,
                dt,
            );
            slot.state = step.state;
            slot.animation = step.animation;

            match self.replicator.tick(entity, &mut slot.cell, slot.body.as_mut()) {
                Ok(ReplicationOutcome::Published(transform)) => {
                    if let Err(e) = transport.write_transform(entity, transform) {
                        warn!(%entity, error = %e, "replicated transform not written");
                    }
                }
                Ok(ReplicationOutcome::Applied(_)) => {}
                Ok(ReplicationOutcome::Stale) => {
                    trace!(%entity, "no replicated transform yet");
                }
                Err(e) => warn!(%entity, error = %e, "replication failed"),
            }
        }
    }
}
