// Strong typing over strings. Newtypes for host time, pixel geometry in viewport space,
// and the serde config handed over from JS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Host time in milliseconds (monotonic, as from `performance.now()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Millis(u64);

impl Millis {
    pub fn from_millis(ms: u64) -> Self {
        Millis(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn after(&self, delay_ms: u64) -> Self {
        Millis(self.0.saturating_add(delay_ms))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(&self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Top-left corner in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    pub fn new(top: f64, left: f64) -> Self {
        Position { top, left }
    }

    pub fn origin() -> Self {
        Position::default()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "top={}, left={}", self.top, self.left)
    }
}

/// Width/height pair in pixels. Used for viewports and element sizes alike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

/// Axis-aligned rectangle in viewport coordinates.
///
/// `right` and `bottom` are always derived from `left + width` and `top + height`;
/// deserialization reads only the four primary fields (so a serialized DOMRect
/// works) and recomputes the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectRepr")]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Deserialize)]
struct RectRepr {
    top: f64,
    left: f64,
    width: f64,
    height: f64,
}

impl From<RectRepr> for Rect {
    fn from(r: RectRepr) -> Self {
        Rect::new(r.top, r.left, r.width, r.height)
    }
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Rect {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Rectangle of an element of `size` whose top-left sits at `position`.
    pub fn at(position: Position, size: Size) -> Self {
        Rect::new(position.top, position.left, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Geometric center, as a point in `{top, left}` form.
    pub fn center(&self) -> Position {
        Position::new(self.top + self.height / 2.0, self.left + self.width / 2.0)
    }

    /// Inclusive overlap test: rectangles that only share an edge or a corner
    /// count as overlapping.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }
}

/// Elements whose geometry the presentation layer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementId {
    /// Decorative floating image above the title.
    AnchorImage,
    /// Page title.
    Header,
    /// The runaway prize button.
    PrimaryControl,
    /// The "ask for help" button revealed after enough misses.
    HelpControl,
    /// The animated group (character + hammer) that strikes the primary control.
    HelpGroup,
}

/// Phase of the help animation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HelpPhase {
    #[default]
    Hidden,
    Approaching,
    Struck,
    Settled,
}

/// Easing function for the help group's approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingType {
    Linear,
    EaseOut,
    EaseInOut,
}

/// Engine configuration passed from JS. Every field is optional in the JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    /// Fixed RNG seed. Without one the session seeds from OS/browser entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// `log` level filter name ("off", "error", ..., "trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            placement: PlacementConfig::default(),
            interaction: InteractionConfig::default(),
            reward: RewardConfig::default(),
            seed: None,
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.placement.element_size.is_valid() {
            return Err(EngineError::InvalidConfig(format!(
                "placement.element_size must be finite and non-negative, got {:?}",
                self.placement.element_size
            )));
        }
        if !self.interaction.help_group_size.is_valid() {
            return Err(EngineError::InvalidConfig(format!(
                "interaction.help_group_size must be finite and non-negative, got {:?}",
                self.interaction.help_group_size
            )));
        }
        let offset = self.interaction.initial_offset;
        if !(offset.top.is_finite() && offset.left.is_finite()) {
            return Err(EngineError::InvalidConfig(
                "interaction.initial_offset must be finite".to_string(),
            ));
        }
        if self.interaction.reveal_threshold == 0 {
            return Err(EngineError::InvalidConfig(
                "interaction.reveal_threshold must be at least 1".to_string(),
            ));
        }
        self.level_filter()?;
        self.reward.validate()
    }

    pub fn level_filter(&self) -> Result<log::LevelFilter, EngineError> {
        log::LevelFilter::from_str(&self.log_level)
            .map_err(|_| EngineError::InvalidConfig(format!("unknown log_level {:?}", self.log_level)))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Placement engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Fixed size of the movable primary control.
    #[serde(default = "default_element_size")]
    pub element_size: Size,
    /// Candidates sampled before accepting an overlapping one.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig {
            element_size: default_element_size(),
            retry_budget: default_retry_budget(),
        }
    }
}

fn default_element_size() -> Size {
    Size::new(200.0, 50.0)
}

fn default_retry_budget() -> u32 {
    100
}

/// Interaction sequencing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Relocations before the help control is revealed.
    #[serde(default = "default_reveal_threshold")]
    pub reveal_threshold: u32,
    /// Delay between mounting the help group and retargeting it.
    #[serde(default = "default_mount_delay")]
    pub mount_delay_ms: u64,
    /// Length of the strike before settling.
    #[serde(default = "default_strike_delay")]
    pub strike_delay_ms: u64,
    /// Delay between the reward appearing and the celebration cue.
    #[serde(default = "default_celebrate_delay")]
    pub celebrate_delay_ms: u64,
    /// Fallback size of the help group when geometry does not report it.
    #[serde(default = "default_help_group_size")]
    pub help_group_size: Size,
    #[serde(default = "default_approach_duration")]
    pub approach_duration_ms: u64,
    #[serde(default = "default_approach_easing")]
    pub approach_easing: EasingType,
    /// Let `tick` deliver approach-complete when the sampled approach ends,
    /// for hosts that do not forward transition-end events.
    #[serde(default)]
    pub auto_complete_approach: bool,
    /// Starting spot of the primary control relative to the viewport center.
    #[serde(default = "default_initial_offset")]
    pub initial_offset: Position,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        InteractionConfig {
            reveal_threshold: default_reveal_threshold(),
            mount_delay_ms: default_mount_delay(),
            strike_delay_ms: default_strike_delay(),
            celebrate_delay_ms: default_celebrate_delay(),
            help_group_size: default_help_group_size(),
            approach_duration_ms: default_approach_duration(),
            approach_easing: default_approach_easing(),
            auto_complete_approach: false,
            initial_offset: default_initial_offset(),
        }
    }
}

fn default_reveal_threshold() -> u32 {
    5
}

fn default_mount_delay() -> u64 {
    100
}

fn default_strike_delay() -> u64 {
    300
}

fn default_celebrate_delay() -> u64 {
    1000
}

fn default_help_group_size() -> Size {
    Size::new(100.0, 100.0)
}

fn default_approach_duration() -> u64 {
    1200
}

fn default_approach_easing() -> EasingType {
    EasingType::EaseOut
}

fn default_initial_offset() -> Position {
    Position::new(100.0, -100.0)
}

/// Static content of the reward modal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Messaging recipient, digits only (country code included).
    #[serde(default = "default_recipient")]
    pub recipient: String,
    /// Pre-filled message text; URL-encoded when the link is built.
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_headline")]
    pub headline: String,
    #[serde(default = "default_label")]
    pub label: String,
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.recipient.is_empty() || !self.recipient.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidConfig(format!(
                "reward.recipient must be digits only, got {:?}",
                self.recipient
            )));
        }
        Ok(())
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            recipient: default_recipient(),
            text: default_text(),
            headline: default_headline(),
            label: default_label(),
        }
    }
}

fn default_recipient() -> String {
    "5549999524735".to_string()
}

fn default_text() -> String {
    "Oi amor adorei o presente etc e tal quero resgatar meu vale cabana 💖🏕️".to_string()
}

fn default_headline() -> String {
    "🎉🎈 Parabéns, amor!!! Você ganhou um vale cabana 🏕️💖✨".to_string()
}

fn default_label() -> String {
    "📱 Resgatar meu vale".to_string()
}
