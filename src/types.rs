use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Id prefix that marks the single highlighted brief slot.
pub const FOCUS_ID_PREFIX: &str = "focus-";

/// Title that marks the accumulating checklist slot.
pub const PLANNER_TITLE: &str = "Your Planner Actions";

/// Stable id for the planner section.
pub const PLANNER_SECTION_ID: &str = "planner-actions";

/// Bullet used for every checklist line.
pub const CHECKLIST_BULLET: &str = "[·]";

/// What a broken legacy brief card renders as.
pub const LEGACY_CARD_FALLBACK: &str = "Error rendering CEO Card";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration stored in ~/.briefos/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_user_name")]
    pub user_name: String,
    /// IANA timezone used to resolve "today" and relative dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Pin the engine's random source (demos, screenshots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            timezone: default_timezone(),
            timing: TimingConfig::default(),
            rng_seed: None,
        }
    }
}

fn default_user_name() -> String {
    "Executive Officer".to_string()
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

impl Config {
    /// Parse the configured timezone, falling back to UTC.
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', using UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }

    /// Today's date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.tz()).date_naive()
    }
}

/// Reveal pacing, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    #[serde(default = "default_char_tick_ms")]
    pub char_tick_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_chat_tick_ms")]
    pub chat_tick_ms: u64,
    #[serde(default = "default_thinking_delay_ms")]
    pub thinking_delay_ms: u64,
    #[serde(default = "default_async_step_delay_ms")]
    pub async_step_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            char_tick_ms: default_char_tick_ms(),
            settle_ms: default_settle_ms(),
            chat_tick_ms: default_chat_tick_ms(),
            thinking_delay_ms: default_thinking_delay_ms(),
            async_step_delay_ms: default_async_step_delay_ms(),
        }
    }
}

fn default_char_tick_ms() -> u64 {
    20
}

fn default_settle_ms() -> u64 {
    400
}

fn default_chat_tick_ms() -> u64 {
    15
}

fn default_thinking_delay_ms() -> u64 {
    700
}

fn default_async_step_delay_ms() -> u64 {
    600
}

// =============================================================================
// Sections
// =============================================================================

/// Section display type. `Components` sections reveal atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Text,
    List,
    Steps,
    Components,
}

/// One labelled value on a highlight card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

impl CardField {
    pub fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// Structured payload of a focus brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightCard {
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub highlights: Vec<CardField>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl HighlightCard {
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            status: None,
            highlights: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn field(mut self, label: &str, value: impl Into<String>) -> Self {
        self.highlights.push(CardField::new(label, value));
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// What a section holds, decided when the section is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum SectionPayload {
    PlainText(String),
    HighlightCard(HighlightCard),
    Checklist(Vec<String>),
}

impl SectionPayload {
    /// Build a checklist from lines that may or may not carry the bullet.
    pub fn checklist_from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        SectionPayload::Checklist(
            lines
                .iter()
                .map(|l| strip_bullet(l.as_ref()).to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        )
    }

    /// Render the full target text the reveal works through.
    pub fn render(&self) -> String {
        match self {
            SectionPayload::PlainText(text) => text.clone(),
            SectionPayload::HighlightCard(card) => {
                serde_json::to_string(card).unwrap_or_else(|_| card.headline.clone())
            }
            SectionPayload::Checklist(items) => items
                .iter()
                .map(|item| format!("{} {}", CHECKLIST_BULLET, item))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Recover a payload from string content produced outside the engine.
    ///
    /// JSON that doesn't decode as a card degrades to the broken-card text;
    /// bulleted lines become a checklist; anything else is plain text.
    pub fn from_legacy(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.starts_with('{') {
            return match serde_json::from_str::<HighlightCard>(trimmed) {
                Ok(card) => SectionPayload::HighlightCard(card),
                Err(e) => {
                    log::warn!("Legacy card content failed to parse: {}", e);
                    SectionPayload::PlainText(LEGACY_CARD_FALLBACK.to_string())
                }
            };
        }

        let lines: Vec<&str> = trimmed.lines().filter(|l| !l.trim().is_empty()).collect();
        if !lines.is_empty() && lines.iter().all(|l| l.trim_start().starts_with(CHECKLIST_BULLET)) {
            return SectionPayload::checklist_from_lines(&lines);
        }

        SectionPayload::PlainText(content.to_string())
    }
}

/// Remove a leading "[·]" bullet and surrounding whitespace.
pub fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix(CHECKLIST_BULLET).map(str::trim).unwrap_or(line)
}

/// The unit of displayable content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub payload: SectionPayload,
    /// Full target text.
    pub content: String,
    /// Prefix of `content` currently exposed.
    pub visible_content: String,
    pub is_visible: bool,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: SectionKind, payload: SectionPayload) -> Self {
        let content = payload.render();
        Self {
            id: id.into(),
            title: title.into(),
            sub_title: None,
            kind,
            payload,
            content,
            visible_content: String::new(),
            is_visible: false,
        }
    }

    /// A highlighted brief; `slug` becomes `focus-<slug>`.
    pub fn focus(slug: &str, title: impl Into<String>, card: HighlightCard) -> Self {
        Self::new(
            format!("{}{}", FOCUS_ID_PREFIX, slug),
            title,
            SectionKind::Components,
            SectionPayload::HighlightCard(card),
        )
    }

    /// The accumulating checklist.
    pub fn planner<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::new(
            PLANNER_SECTION_ID,
            PLANNER_TITLE,
            SectionKind::List,
            SectionPayload::checklist_from_lines(lines),
        )
    }

    pub fn text(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, title, SectionKind::Text, SectionPayload::PlainText(body.into()))
    }

    /// Rebuild a section from raw string content, e.g. one handed over by
    /// the rendering layer.
    pub fn from_legacy(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: SectionKind,
        content: &str,
    ) -> Self {
        Self::new(id, title, kind, SectionPayload::from_legacy(content))
    }

    pub fn with_sub_title(mut self, sub_title: impl Into<String>) -> Self {
        self.sub_title = Some(sub_title.into());
        self
    }

    pub fn is_planner(&self) -> bool {
        self.title == PLANNER_TITLE
    }

    /// Focus-prefixed ids and component sections show in one step.
    pub fn is_atomic_reveal(&self) -> bool {
        self.id.starts_with(FOCUS_ID_PREFIX) || self.kind == SectionKind::Components
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.visible_content.len() == self.content.len()
    }

    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    /// Currently revealed prefix.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    pub is_typing: bool,
}

impl ChatMessage {
    fn revealed(role: ChatRole, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            role,
            full_text: Some(text.clone()),
            text,
            is_typing: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::revealed(ChatRole::User, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::revealed(ChatRole::System, text)
    }

    /// Starts empty and drains `full_text` through the typewriter.
    pub fn assistant(full_text: impl Into<String>) -> Self {
        let full_text = full_text.into();
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            role: ChatRole::Assistant,
            text: String::new(),
            is_typing: !full_text.is_empty(),
            full_text: Some(full_text),
        }
    }
}

// =============================================================================
// Handler output
// =============================================================================

/// Dashboard modules a query can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasModule {
    Finance,
    Appointments,
    Approvals,
    Assets,
    Staff,
    Events,
    Inventory,
    Calendar,
}

impl std::fmt::Display for CanvasModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasModule::Finance => write!(f, "Finance"),
            CanvasModule::Appointments => write!(f, "Appointments"),
            CanvasModule::Approvals => write!(f, "Approvals"),
            CanvasModule::Assets => write!(f, "Assets"),
            CanvasModule::Staff => write!(f, "Staff"),
            CanvasModule::Events => write!(f, "Events"),
            CanvasModule::Inventory => write!(f, "Inventory"),
            CanvasModule::Calendar => write!(f, "Calendar"),
        }
    }
}

impl std::str::FromStr for CanvasModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finance" | "accounts" => Ok(CanvasModule::Finance),
            "appointments" | "appointment" => Ok(CanvasModule::Appointments),
            "approvals" | "approval" => Ok(CanvasModule::Approvals),
            "assets" | "asset" => Ok(CanvasModule::Assets),
            "staff" | "hr" | "employees" => Ok(CanvasModule::Staff),
            "events" | "event" => Ok(CanvasModule::Events),
            "inventory" | "stores" => Ok(CanvasModule::Inventory),
            "calendar" => Ok(CanvasModule::Calendar),
            _ => Err(format!("Unknown module: {}", s)),
        }
    }
}

/// Whether a visitor exists in the record registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RegistrationStatus {
    Registered {
        #[serde(rename = "recordId")]
        record_id: String,
    },
    Unregistered,
}

impl RegistrationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered { .. } => "Registered",
            RegistrationStatus::Unregistered => "New / Unregistered",
        }
    }
}

/// A VIP visit parsed out of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipVisit {
    pub visitor: String,
    pub registration: RegistrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// The value every handler returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerResult {
    pub handled: bool,
    pub sections: Vec<Section>,
    pub message: Option<String>,
    pub vip_visit: Option<VipVisit>,
    pub module: Option<CanvasModule>,
    /// Apply the reply first and the sections one step later.
    pub needs_async_processing: bool,
}

impl HandlerResult {
    pub fn declined() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn vip_visit(mut self, visit: VipVisit) -> Self {
        self.vip_visit = Some(visit);
        self
    }

    pub fn module(mut self, module: CanvasModule) -> Self {
        self.module = Some(module);
        self
    }

    pub fn deferred(mut self) -> Self {
        self.needs_async_processing = true;
        self
    }
}

// =============================================================================
// Calendar facts
// =============================================================================

/// Which generator produced a calendar item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactSource {
    Rituals,
    Operations,
    Administration,
    Observance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    /// Display time, e.g. "6:30 AM" or "4PM".
    pub time: String,
    pub description: String,
    pub source: FactSource,
}

impl CalendarItem {
    pub fn new(time: &str, description: &str, source: FactSource) -> Self {
        Self {
            time: time.to_string(),
            description: description.to_string(),
            source,
        }
    }
}

// =============================================================================
// Engine state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Complete,
}

/// Read-only view handed to the rendering layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub status: GenerationStatus,
    pub sections: Vec<Section>,
    pub messages: Vec<ChatMessage>,
    pub current_section_index: Option<usize>,
}

/// Section counts per kind, for logging.
pub fn kind_histogram(sections: &[Section]) -> HashMap<SectionKind, usize> {
    let mut counts = HashMap::new();
    for s in sections {
        *counts.entry(s.kind).or_insert(0) += 1;
    }
    counts
}
