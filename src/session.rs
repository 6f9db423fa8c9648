// Session: glues the state machine to host time.
// The host supplies `now` and a geometry snapshot with every call; the session
// runs due tasks first, then the event, and returns one frame to render.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::animation::HelpApproach;
use crate::error::EngineError;
use crate::geometry::GeometryProvider;
use crate::interaction::{Directive, InteractionState, InteractionStateMachine};
use crate::schedule::TaskQueue;
use crate::types::*;

/// Result of one host call: the state to render and what changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub now: Millis,
    pub state: InteractionState,
    /// Presentation directives produced during this call, in order.
    /// Scheduling requests are consumed by the session and never appear here.
    pub directives: Vec<Directive>,
    /// Sampled help group position while it is mounted.
    pub help_render_position: Option<Position>,
    /// When the next scheduled task falls due, so the host can size its timer.
    pub next_due: Option<Millis>,
}

/// One page visit, from first render to the reward.
pub struct Session {
    machine: InteractionStateMachine,
    queue: TaskQueue,
    rng: StdRng,
    approach: Option<HelpApproach>,
    clock: Millis,
}

impl Session {
    pub fn new(config: &EngineConfig, viewport: Size) -> Result<Self, EngineError> {
        let machine = InteractionStateMachine::new(config, viewport)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Session {
            machine,
            queue: TaskQueue::new(),
            rng,
            approach: None,
            clock: Millis::default(),
        })
    }

    pub fn state(&self) -> &InteractionState {
        self.machine.state()
    }

    /// Primary control clicked.
    pub fn relocate<G: GeometryProvider + ?Sized>(&mut self, geometry: &G, now: Millis) -> Frame {
        let now = self.advance_clock(now);
        let mut out = Vec::new();
        self.run_due(geometry, now, &mut out);
        let directives = self.machine.relocate(geometry, &mut self.rng);
        self.absorb(directives, now, &mut out);
        self.frame(now, out)
    }

    /// Help control clicked.
    pub fn request_help<G: GeometryProvider + ?Sized>(&mut self, geometry: &G, now: Millis) -> Frame {
        let now = self.advance_clock(now);
        let mut out = Vec::new();
        self.run_due(geometry, now, &mut out);
        let directives = self.machine.request_help();
        self.absorb(directives, now, &mut out);
        self.frame(now, out)
    }

    /// Presentation layer reports the help group's transition finished.
    pub fn approach_complete<G: GeometryProvider + ?Sized>(&mut self, geometry: &G, now: Millis) -> Frame {
        let now = self.advance_clock(now);
        let mut out = Vec::new();
        self.run_due(geometry, now, &mut out);
        let directives = self.machine.approach_complete();
        self.absorb(directives, now, &mut out);
        self.frame(now, out)
    }

    /// Animation-frame tick: run whatever fell due since the last call.
    pub fn tick<G: GeometryProvider + ?Sized>(&mut self, geometry: &G, now: Millis) -> Frame {
        let now = self.advance_clock(now);
        let mut out = Vec::new();
        self.run_due(geometry, now, &mut out);
        self.frame(now, out)
    }

    /// Host clocks may jitter backwards; session time never does.
    fn advance_clock(&mut self, now: Millis) -> Millis {
        self.clock = self.clock.max(now);
        self.clock
    }

    /// Run due tasks (and the auto approach-complete, if enabled) in time order.
    /// Each runs at its own due time so follow-up delays chain correctly even
    /// when the host ticks late.
    fn run_due<G: GeometryProvider + ?Sized>(&mut self, geometry: &G, now: Millis, out: &mut Vec<Directive>) {
        loop {
            let task_due = self.queue.next_due().filter(|due| *due <= now);
            let approach_due = self.auto_completion_due().filter(|due| *due <= now);

            match (task_due, approach_due) {
                (Some(task_at), Some(approach_at)) if approach_at < task_at => {
                    self.complete_approach_at(approach_at, out);
                }
                (Some(_), _) => {
                    if let Some((due, task)) = self.queue.pop_due(now) {
                        log::trace!("running {:?} due at {}", task, due.as_millis());
                        let directives = self.machine.on_task(task, geometry);
                        self.absorb(directives, due, out);
                    }
                }
                (None, Some(approach_at)) => self.complete_approach_at(approach_at, out),
                (None, None) => break,
            }
        }
    }

    fn complete_approach_at(&mut self, at: Millis, out: &mut Vec<Directive>) {
        log::trace!("approach finished at {}, completing", at.as_millis());
        let directives = self.machine.approach_complete();
        // A guard rejection would leave the approach pending forever.
        if directives.is_empty() {
            self.approach = None;
        }
        self.absorb(directives, at, out);
    }

    /// End time of the running approach when the session should deliver
    /// approach-complete itself.
    fn auto_completion_due(&self) -> Option<Millis> {
        if !self.machine.config().auto_complete_approach
            || self.machine.state().help_phase != HelpPhase::Approaching
        {
            return None;
        }
        self.approach.map(|a| a.started_at.after(a.duration_ms))
    }

    /// Route machine output: schedules go to the queue, motion updates the
    /// sampled approach, everything else goes to the host.
    fn absorb(&mut self, directives: Vec<Directive>, at: Millis, out: &mut Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Schedule { delay_ms, task } => {
                    self.queue.schedule(at, delay_ms, task);
                }
                Directive::MountHelpGroup { .. } => {
                    self.approach = None;
                    out.push(directive);
                }
                Directive::MoveHelpGroup { position, duration_ms } => {
                    self.approach = Some(HelpApproach::new(
                        Position::origin(),
                        position,
                        at,
                        duration_ms,
                        self.machine.config().approach_easing,
                    ));
                    out.push(directive);
                }
                Directive::HideHelpGroup => {
                    self.approach = None;
                    out.push(directive);
                }
                other => out.push(other),
            }
        }
    }

    fn frame(&self, now: Millis, directives: Vec<Directive>) -> Frame {
        let state = self.machine.state().clone();
        let help_render_position = if !state.help_visible {
            None
        } else {
            match self.approach {
                Some(a) if state.help_phase == HelpPhase::Approaching && !a.is_finished(now) => {
                    Some(a.position_at(now))
                }
                // The group rests on its target once the approach is over, even
                // when the host reported the transition end early.
                Some(_) => Some(state.help_target.unwrap_or(state.help_position)),
                None => Some(state.help_position),
            }
        };
        Frame {
            now,
            help_render_position,
            next_due: self.queue.next_due(),
            directives,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySnapshot;
    use crate::interaction::Sound;

    fn config(auto: bool) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.seed = Some(17);
        config.interaction.auto_complete_approach = auto;
        config
    }

    fn geometry() -> GeometrySnapshot {
        GeometrySnapshot::new(Size::new(1280.0, 800.0))
            .with(ElementId::AnchorImage, Rect::new(50.0, 540.0, 200.0, 200.0))
            .with(ElementId::Header, Rect::new(400.0, 440.0, 400.0, 40.0))
            .with(ElementId::HelpControl, Rect::new(740.0, 560.0, 160.0, 40.0))
    }

    fn at(ms: u64) -> Millis {
        Millis::from_millis(ms)
    }

    fn reveal(session: &mut Session, geometry: &GeometrySnapshot) {
        for i in 0..5 {
            session.relocate(geometry, at(i * 10));
        }
        assert!(session.state().secondary_revealed);
    }

    #[test]
    fn schedules_never_reach_the_host() {
        let mut session = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);

        let frame = session.request_help(&geometry, at(1_000));
        assert!(frame
            .directives
            .iter()
            .all(|d| !matches!(d, Directive::Schedule { .. })));
        assert_eq!(frame.next_due, Some(at(1_100)));
        assert_eq!(frame.help_render_position, Some(Position::origin()));
    }

    #[test]
    fn retarget_waits_for_mount_delay() {
        let mut session = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);
        session.request_help(&geometry, at(1_000));

        let frame = session.tick(&geometry, at(1_099));
        assert!(frame.state.help_target.is_none());

        let frame = session.tick(&geometry, at(1_100));
        assert!(frame.state.help_target.is_some());
        assert!(frame
            .directives
            .iter()
            .any(|d| matches!(d, Directive::MoveHelpGroup { .. })));
        // Animation has only just started.
        assert_eq!(frame.help_render_position, Some(Position::origin()));
    }

    #[test]
    fn manual_sequence_reaches_reward_and_celebrates_once() {
        let mut session = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);
        session.request_help(&geometry, at(1_000));
        session.tick(&geometry, at(1_100));

        // Without auto completion the approach waits for the host.
        let frame = session.tick(&geometry, at(5_000));
        assert_eq!(frame.state.help_phase, HelpPhase::Approaching);

        let frame = session.approach_complete(&geometry, at(5_000));
        assert_eq!(frame.state.help_phase, HelpPhase::Struck);
        assert!(frame.directives.contains(&Directive::PlaySound {
            sound: Sound::Strike
        }));

        let frame = session.tick(&geometry, at(5_300));
        assert_eq!(frame.state.help_phase, HelpPhase::Settled);
        assert!(frame.state.reward_visible);
        assert_eq!(frame.help_render_position, None);
        assert_eq!(frame.next_due, Some(at(6_300)));

        let frame = session.tick(&geometry, at(6_299));
        assert!(!frame.state.celebrated);
        let frame = session.tick(&geometry, at(6_300));
        assert!(frame.directives.contains(&Directive::PlaySound {
            sound: Sound::Celebration
        }));

        let frame = session.tick(&geometry, at(9_000));
        assert!(frame.directives.is_empty());
        assert_eq!(frame.next_due, None);
    }

    #[test]
    fn late_tick_chains_every_stage() {
        let mut session = Session::new(&config(true), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);
        session.request_help(&geometry, at(1_000));

        // Retarget at 1100, approach ends at 2300, settle at 2600, celebrate at 3600.
        let frame = session.tick(&geometry, at(10_000));
        assert!(frame.state.reward_visible);
        assert!(frame.state.celebrated);

        let kinds: Vec<&str> = frame
            .directives
            .iter()
            .map(|d| match d {
                Directive::MoveHelpGroup { .. } => "move",
                Directive::StartStrike => "strike",
                Directive::ShowReward { .. } => "reward",
                Directive::PlaySound { sound: Sound::Celebration } => "clap",
                _ => "other",
            })
            .filter(|k| *k != "other")
            .collect();
        assert_eq!(kinds, vec!["move", "strike", "reward", "clap"]);
    }

    #[test]
    fn auto_completion_waits_for_approach_end() {
        let mut session = Session::new(&config(true), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);
        session.request_help(&geometry, at(1_000));
        session.tick(&geometry, at(1_100));

        let frame = session.tick(&geometry, at(1_700));
        let mid = frame.help_render_position.unwrap();
        let target = frame.state.help_target.unwrap();
        assert!((mid.top - target.top).abs() > 1.0 || (mid.left - target.left).abs() > 1.0);

        let frame = session.tick(&geometry, at(2_299));
        assert_eq!(frame.state.help_phase, HelpPhase::Approaching);

        let frame = session.tick(&geometry, at(2_300));
        assert_eq!(frame.state.help_phase, HelpPhase::Struck);
    }

    #[test]
    fn early_transition_end_snaps_to_target() {
        let mut session = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        reveal(&mut session, &geometry);
        session.request_help(&geometry, at(1_000));
        session.tick(&geometry, at(1_100));

        // The page reports the transition end well before the sampled approach ends.
        let frame = session.approach_complete(&geometry, at(1_300));
        assert_eq!(frame.state.help_phase, HelpPhase::Struck);
        assert_eq!(frame.help_render_position, frame.state.help_target);

        let frame = session.tick(&geometry, at(1_350));
        assert_eq!(frame.state.help_phase, HelpPhase::Struck);
        assert_eq!(frame.help_render_position, frame.state.help_target);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut session = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let geometry = geometry();
        let frame = session.tick(&geometry, at(500));
        assert_eq!(frame.now, at(500));
        let frame = session.tick(&geometry, at(100));
        assert_eq!(frame.now, at(500));
    }

    #[test]
    fn seeded_sessions_place_identically() {
        let geometry = geometry();
        let mut a = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        let mut b = Session::new(&config(false), Size::new(1280.0, 800.0)).unwrap();
        for i in 0..3 {
            let fa = a.relocate(&geometry, at(i));
            let fb = b.relocate(&geometry, at(i));
            assert_eq!(fa.state.primary_position, fb.state.primary_position);
        }
    }
}
