// Interaction state machine: relocation counting, help reveal, and the
// approach -> strike -> reward sequence.
// Every transition is phase-guarded. Tasks and presentation callbacks that
// arrive after their phase has passed leave the state untouched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::{forbidden_regions, GeometryProvider};
use crate::placement::PlacementEngine;
use crate::reward::RewardLink;
use crate::schedule::Task;
use crate::types::*;

/// Everything the presentation layer needs to render the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionState {
    /// Successful relocations of the primary control.
    pub move_count: u32,
    pub primary_position: Position,
    /// Once true, stays true.
    pub secondary_revealed: bool,
    pub help_phase: HelpPhase,
    pub help_position: Position,
    /// Help group mounted on the page.
    pub help_visible: bool,
    /// Strike target, set once the mounted group has been retargeted.
    pub help_target: Option<Position>,
    /// Terminal flag.
    pub reward_visible: bool,
    pub celebrated: bool,
}

impl InteractionState {
    /// Fresh session state. The primary control starts offset from the viewport center.
    pub fn new(viewport: Size, initial_offset: Position) -> Self {
        InteractionState {
            move_count: 0,
            primary_position: Position::new(
                viewport.height / 2.0 + initial_offset.top,
                viewport.width / 2.0 + initial_offset.left,
            ),
            secondary_revealed: false,
            help_phase: HelpPhase::Hidden,
            help_position: Position::origin(),
            help_visible: false,
            help_target: None,
            reward_visible: false,
            celebrated: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.reward_visible
    }
}

/// Media cues. Playback belongs to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    Strike,
    Celebration,
}

/// Instruction emitted by a transition for the presentation layer (or, for
/// `Schedule`, for the session's task queue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Directive {
    MovePrimary { position: Position },
    RevealHelpControl,
    /// Mount the help group at `position` without animating.
    MountHelpGroup { position: Position },
    /// Animate the help group to `position` over `duration_ms`.
    MoveHelpGroup { position: Position, duration_ms: u64 },
    StartStrike,
    EndStrike,
    HideHelpGroup,
    PlaySound { sound: Sound },
    ShowReward { reward: RewardLink },
    Schedule { delay_ms: u64, task: Task },
}

/// Owns the [`InteractionState`] and is the only thing that mutates it.
pub struct InteractionStateMachine {
    config: InteractionConfig,
    element_size: Size,
    placement: PlacementEngine,
    reward: RewardLink,
    state: InteractionState,
}

impl InteractionStateMachine {
    pub fn new(config: &EngineConfig, viewport: Size) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(InteractionStateMachine {
            config: config.interaction.clone(),
            element_size: config.placement.element_size,
            placement: PlacementEngine::new(config.placement.retry_budget),
            reward: RewardLink::build(&config.reward)?,
            state: InteractionState::new(viewport, config.interaction.initial_offset),
        })
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// The primary control was clicked: move it somewhere clear and count the miss.
    pub fn relocate<G, R>(&mut self, geometry: &G, rng: &mut R) -> Vec<Directive>
    where
        G: GeometryProvider + ?Sized,
        R: Rng + ?Sized,
    {
        if self.state.is_terminal() {
            log::trace!("relocate ignored: reward already shown");
            return Vec::new();
        }

        let forbidden = forbidden_regions(geometry, self.state.secondary_revealed);
        let viewport = geometry.viewport();
        let position = self
            .placement
            .compute_position(viewport, self.element_size, &forbidden, rng);

        self.state.primary_position = position;
        self.state.move_count = self.state.move_count.saturating_add(1);
        log::debug!("relocation #{} to {}", self.state.move_count, position);

        let mut directives = vec![Directive::MovePrimary { position }];
        if self.state.move_count >= self.config.reveal_threshold && !self.state.secondary_revealed {
            self.state.secondary_revealed = true;
            log::info!("help control revealed after {} relocations", self.state.move_count);
            directives.push(Directive::RevealHelpControl);
        }
        directives
    }

    /// The help control was clicked: mount the help group at the origin and
    /// schedule its retarget once the mount has rendered.
    pub fn request_help(&mut self) -> Vec<Directive> {
        if !self.state.secondary_revealed {
            log::trace!("help request ignored: help control not revealed");
            return Vec::new();
        }
        if self.state.help_phase != HelpPhase::Hidden {
            log::trace!("help request ignored: sequence already in {:?}", self.state.help_phase);
            return Vec::new();
        }

        self.state.help_phase = HelpPhase::Approaching;
        self.state.help_position = Position::origin();
        self.state.help_target = None;
        self.state.help_visible = true;
        log::debug!("help requested, approaching");

        vec![
            Directive::MountHelpGroup {
                position: Position::origin(),
            },
            Directive::Schedule {
                delay_ms: self.config.mount_delay_ms,
                task: Task::RetargetHelp,
            },
        ]
    }

    /// The presentation layer finished the approach transition.
    pub fn approach_complete(&mut self) -> Vec<Directive> {
        if self.state.help_phase != HelpPhase::Approaching || self.state.help_target.is_none() {
            log::trace!("approach-complete ignored in {:?}", self.state.help_phase);
            return Vec::new();
        }

        self.state.help_phase = HelpPhase::Struck;
        log::debug!("help group struck at {}", self.state.help_position);

        vec![
            Directive::StartStrike,
            Directive::PlaySound {
                sound: Sound::Strike,
            },
            Directive::Schedule {
                delay_ms: self.config.strike_delay_ms,
                task: Task::Settle,
            },
        ]
    }

    /// Run a scheduled task. Tasks whose phase has passed are no-ops.
    pub fn on_task<G>(&mut self, task: Task, geometry: &G) -> Vec<Directive>
    where
        G: GeometryProvider + ?Sized,
    {
        match task {
            Task::RetargetHelp => self.retarget(geometry),
            Task::Settle => self.settle(),
            Task::Celebrate => self.celebrate(),
        }
    }

    fn retarget<G: GeometryProvider + ?Sized>(&mut self, geometry: &G) -> Vec<Directive> {
        if self.state.help_phase != HelpPhase::Approaching || self.state.help_target.is_some() {
            log::trace!("stale retarget dropped");
            return Vec::new();
        }

        let primary = geometry
            .rect(ElementId::PrimaryControl)
            .unwrap_or_else(|| Rect::at(self.state.primary_position, self.element_size));
        let group = geometry
            .rect(ElementId::HelpGroup)
            .map(|r| r.size())
            .unwrap_or(self.config.help_group_size);

        let center = primary.center();
        let target = Position::new(center.top - group.height / 2.0, center.left - group.width / 2.0);

        self.state.help_target = Some(target);
        self.state.help_position = target;
        log::debug!("help group retargeted to {}", target);

        vec![Directive::MoveHelpGroup {
            position: target,
            duration_ms: self.config.approach_duration_ms,
        }]
    }

    fn settle(&mut self) -> Vec<Directive> {
        if self.state.help_phase != HelpPhase::Struck {
            log::trace!("stale settle dropped");
            return Vec::new();
        }

        self.state.help_phase = HelpPhase::Settled;
        self.state.help_visible = false;
        self.state.reward_visible = true;
        log::info!("reward shown");

        vec![
            Directive::EndStrike,
            Directive::HideHelpGroup,
            Directive::ShowReward {
                reward: self.reward.clone(),
            },
            Directive::Schedule {
                delay_ms: self.config.celebrate_delay_ms,
                task: Task::Celebrate,
            },
        ]
    }

    fn celebrate(&mut self) -> Vec<Directive> {
        if !self.state.reward_visible || self.state.celebrated {
            log::trace!("stale celebrate dropped");
            return Vec::new();
        }

        self.state.celebrated = true;
        vec![Directive::PlaySound {
            sound: Sound::Celebration,
        }]
    }
}
