//! Race engine: routes decoded server messages into the race state and
//! produces the reply for each one.
//!
//! Reply policy: `yourCar` and `gameInit` are not answered; every other
//! message gets exactly one command, a decision for `carPositions` and a
//! keep-alive `ping` for the rest.

use racebot_protocol::{
    CarDimensions, CarId, CarPosition, Command, GameInit, InboundMessage, LapFinished, RaceSession,
};
use tracing::{debug, info, warn};

use crate::adaptive::LearningState;
use crate::config::{DriftStatsPolicy, EngineConfig};
use crate::decision::{Decision, Planners, TickContext, decide};
use crate::kinematics::{KinematicsEstimator, Position, tail_swing};
use crate::track::Track;

/// State that lives for one `gameInit` .. `gameEnd` session.
#[derive(Debug)]
pub struct RaceState {
    pub track: Track,
    pub session: RaceSession,
    /// Dimensions of the controlled car, when listed in `gameInit`.
    pub dimensions: Option<CarDimensions>,
    pub kinematics: KinematicsEstimator,
    pub planners: Planners,
}

/// The decision engine of one bot connection.
#[derive(Debug, Default)]
pub struct RaceEngine {
    config: EngineConfig,
    car: Option<CarId>,
    race: Option<RaceState>,
    learning: LearningState,
}

impl RaceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The controlled car, once `yourCar` arrived.
    pub fn car(&self) -> Option<&CarId> {
        self.car.as_ref()
    }

    pub fn race(&self) -> Option<&RaceState> {
        self.race.as_ref()
    }

    pub fn learning(&self) -> &LearningState {
        &self.learning
    }

    /// Handles one inbound message and returns the reply, if any.
    pub fn handle(&mut self, message: &InboundMessage) -> Option<Command> {
        match message {
            InboundMessage::YourCar(car) => {
                info!(name = %car.name, color = %car.color, "Controlling car");
                self.car = Some(car.clone());
                None
            }
            InboundMessage::GameInit(init) => {
                self.on_game_init(init);
                None
            }
            InboundMessage::CarPositions(positions) => Some(self.on_car_positions(positions)),
            InboundMessage::Crash(car) => {
                self.on_crash(car);
                Some(Command::ping())
            }
            InboundMessage::Spawn(car) => {
                if self.is_own(car) {
                    info!("Car back on track");
                } else {
                    debug!(color = %car.color, "Opponent respawned");
                }
                Some(Command::ping())
            }
            InboundMessage::LapFinished(lap) => {
                self.on_lap_finished(lap);
                Some(Command::ping())
            }
            InboundMessage::TurboAvailable(turbo) => {
                match self.race.as_mut() {
                    Some(race) => {
                        info!(
                            factor = turbo.turbo_factor,
                            ticks = turbo.turbo_duration_ticks,
                            "Turbo available"
                        );
                        race.planners.turbo.grant(*turbo);
                    }
                    None => debug!("Turbo offered before gameInit, ignoring"),
                }
                Some(Command::ping())
            }
            InboundMessage::Join => {
                info!("Joined");
                Some(Command::ping())
            }
            InboundMessage::GameStart => {
                info!("Race started");
                Some(Command::ping())
            }
            InboundMessage::GameEnd => {
                info!(
                    samples = self.race.as_ref().map_or(0, |race| race.kinematics.history().len()),
                    "Race ended"
                );
                Some(Command::ping())
            }
            InboundMessage::Error(text) => {
                warn!(error = %text, "Server reported an error");
                Some(Command::ping())
            }
            InboundMessage::Unknown(msg_type) => {
                debug!(msg_type = %msg_type, "Unhandled message type");
                Some(Command::ping())
            }
        }
    }

    fn is_own(&self, car: &CarId) -> bool {
        self.car.as_ref().is_some_and(|own| own.color == car.color)
    }

    fn on_game_init(&mut self, init: &GameInit) {
        let race = &init.race;
        let mut track = match Track::from_data(&race.track) {
            Ok(track) => track,
            Err(error) => {
                warn!(%error, track = %race.track.id, "Rejected track, racing without a model");
                self.race = None;
                return;
            }
        };

        if self.learning.prepare_for(&track) {
            debug!("Learning state reset");
        }
        // Under ResetEachLap every session starts with clean drift statistics.
        let carry_drift = self.config.drift_stats_policy == DriftStatsPolicy::Accumulate;
        if let Some(previous) = self.race.as_ref().filter(|_| carry_drift) {
            if track.inherit_drift(&previous.track) {
                debug!("Drift statistics carried over from the previous session");
            }
        }

        let dimensions = race
            .cars
            .iter()
            .find(|car| self.is_own(&car.id))
            .map(|car| car.dimensions);

        info!(
            track = track.id(),
            name = track.name(),
            pieces = track.piece_count(),
            lanes = track.lanes().len(),
            laps = ?race.race_session.laps,
            duration_ms = ?race.race_session.duration_ms,
            calibrated = self.learning.traction.is_calibrated(),
            "Track loaded"
        );

        let planners = Planners::new(&track);
        self.race = Some(RaceState {
            track,
            session: race.race_session.clone(),
            dimensions,
            kinematics: KinematicsEstimator::new(),
            planners,
        });
    }

    fn own_position<'a>(&self, positions: &'a [CarPosition]) -> Option<&'a CarPosition> {
        match self.car.as_ref() {
            Some(own) => positions.iter().find(|car| car.id.color == own.color),
            None if positions.len() == 1 => positions.first(),
            None => None,
        }
    }

    fn on_car_positions(&mut self, positions: &[CarPosition]) -> Command {
        let Some(own) = self.own_position(positions) else {
            debug!(cars = positions.len(), "Own car not in carPositions");
            return Command::ping();
        };
        let position = Position::from(own);

        let Some(race) = self.race.as_mut() else {
            debug!("carPositions before gameInit");
            return Command::ping();
        };

        let sample = race.kinematics.update(&race.track, position);
        if let Err(error) = race.track.record_drift(position.piece_index, position.angle) {
            warn!(%error, "Cannot record drift");
        }
        self.learning.traction.observe(
            &race.track,
            &position,
            &sample,
            self.config.traction_safety_factor,
        );

        let ctx = TickContext {
            config: &self.config,
            track: &race.track,
            position: &position,
            sample: &sample,
            learning: &self.learning,
        };
        let Decision { command, stage } = decide(&ctx, &mut race.planners);

        debug!(
            stage,
            piece = position.piece_index,
            lap = position.lap,
            v = sample.v,
            angle = position.angle,
            tail = race.dimensions.map(|d| tail_swing(&d, position.angle)),
            command = command.msg_type(),
            "Tick decided"
        );
        command
    }

    fn on_crash(&mut self, car: &CarId) {
        if !self.is_own(car) {
            debug!(color = %car.color, "Opponent crashed");
            return;
        }
        let Some(race) = self.race.as_mut() else {
            info!("Crashed");
            return;
        };
        race.planners.turbo.revoke();
        match race.kinematics.previous_position() {
            Some(position) => {
                info!(piece = position.piece_index, angle = position.angle, "Crashed");
                self.learning.corners.on_crash(position.piece_index, &self.config);
            }
            None => info!("Crashed before the first position"),
        }
    }

    fn on_lap_finished(&mut self, lap: &LapFinished) {
        if !self.is_own(&lap.car) {
            return;
        }
        info!(
            lap = lap.lap_time.lap,
            ticks = lap.lap_time.ticks,
            millis = lap.lap_time.millis,
            "Lap finished"
        );
        let Some(race) = self.race.as_mut() else {
            return;
        };
        let adjusted = self.learning.corners.on_lap_completed(&race.track, &self.config);
        debug!(adjusted, "Corner modifiers reviewed");
        if self.config.drift_stats_policy == DriftStatsPolicy::ResetEachLap {
            race.track.reset_drift();
        }
    }
}
