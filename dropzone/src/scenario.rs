use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use anyhow::Context;
use dropzone_session::{DragOutcome, DragParams, DropEffect, KeyState, Payload, PointerId, WindowId};
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Malformed scenario")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Window {0} is declared twice")]
    DuplicateWindow(u32),
    #[error("{referenced_by} refers to unknown window {id}")]
    UnknownWindow { id: u32, referenced_by: &'static str },
    #[error("Window {0} is its own ancestor")]
    ParentCycle(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Effect {
    Copy,
    Move,
    Link,
}

impl Effect {
    pub fn to_flags(effects: &[Effect]) -> DropEffect {
        effects
            .iter()
            .fold(DropEffect::empty(), |acc, effect| acc | DropEffect::from(*effect))
    }
}

impl From<Effect> for DropEffect {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Copy => DropEffect::COPY,
            Effect::Move => DropEffect::MOVE,
            Effect::Link => DropEffect::LINK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Key {
    Shift,
    Ctrl,
    Alt,
    Logo,
    ButtonLeft,
    ButtonMiddle,
    ButtonRight,
}

impl From<Key> for KeyState {
    fn from(key: Key) -> Self {
        match key {
            Key::Shift => KeyState::SHIFT,
            Key::Ctrl => KeyState::CTRL,
            Key::Alt => KeyState::ALT,
            Key::Logo => KeyState::LOGO,
            Key::ButtonLeft => KeyState::BUTTON_LEFT,
            Key::ButtonMiddle => KeyState::BUTTON_MIDDLE,
            Key::ButtonRight => KeyState::BUTTON_RIGHT,
        }
    }
}

/// How a simulated window answers each kind of event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Responses {
    pub enter: Vec<Effect>,
    pub over: Vec<Effect>,
    pub drop: Vec<Effect>,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSpec {
    pub id: u32,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default = "yes")]
    pub accepts_drops: bool,
    #[serde(default)]
    pub responses: Responses,
    /// Milliseconds the window takes to answer.
    #[serde(default)]
    pub delay_ms: u64,
    /// Never answers at all.
    #[serde(default)]
    pub unresponsive: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointerStep {
    pub x: f64,
    pub y: f64,
    /// Window hit by the pointer, if any.
    #[serde(default)]
    pub window: Option<u32>,
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl PointerStep {
    pub fn key_state(&self) -> KeyState {
        self.keys
            .iter()
            .fold(KeyState::empty(), |acc, key| acc | KeyState::from(*key))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Action {
    Motion(PointerStep),
    Press(PointerStep),
    Release(PointerStep),
    Destroy(u32),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Milliseconds since the scenario started.
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Expectation {
    pub success: bool,
    #[serde(default)]
    pub action: Option<Effect>,
}

impl Expectation {
    pub fn matches(&self, outcome: &DragOutcome) -> bool {
        self.success == outcome.success && self.action.map(DropEffect::from) == outcome.action
    }
}

fn default_pointer() -> u32 {
    1
}

fn default_settle_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_pointer")]
    pub pointer: u32,
    pub source: u32,
    pub offered: Vec<Effect>,
    /// Type identifier to UTF-8 content.
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    pub windows: Vec<WindowSpec>,
    pub steps: Vec<Step>,
    /// How long to wait after the last step for the drag to finish.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Self::from_ron(&text)
            .with_context(|| format!("Invalid scenario file {}", path.display()))
    }

    pub fn from_ron(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut parents = BTreeMap::new();
        for window in &self.windows {
            if parents.insert(window.id, window.parent).is_some() {
                return Err(ScenarioError::DuplicateWindow(window.id));
            }
        }

        let known = |id: u32, referenced_by: &'static str| {
            if parents.contains_key(&id) {
                Ok(())
            } else {
                Err(ScenarioError::UnknownWindow { id, referenced_by })
            }
        };

        known(self.source, "source")?;

        for parent in self.windows.iter().filter_map(|w| w.parent) {
            known(parent, "parent")?;
        }

        for step in &self.steps {
            match &step.action {
                Action::Motion(pointer) | Action::Press(pointer) | Action::Release(pointer) => {
                    if let Some(window) = pointer.window {
                        known(window, "pointer step")?;
                    }
                }
                Action::Destroy(window) => known(*window, "destroy step")?,
                Action::Cancel => {}
            }
        }

        for &start in parents.keys() {
            let mut seen = BTreeSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(ScenarioError::ParentCycle(start));
                }
                current = parents.get(&id).copied().flatten();
            }
        }

        Ok(())
    }

    pub fn drag_params(&self) -> DragParams {
        let payload: Payload = self
            .payload
            .iter()
            .map(|(type_id, text)| (type_id.clone(), text.as_bytes().to_vec()))
            .collect();

        DragParams {
            pointer_id: PointerId(self.pointer),
            source_window: WindowId(self.source),
            payload,
            offered: Effect::to_flags(&self.offered),
        }
    }

    /// Time of the last step.
    pub fn duration_ms(&self) -> u64 {
        self.steps.iter().map(|step| step.at_ms).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &[(&str, &str)] = &[
        ("move.ron", include_str!("../scenarios/move.ron")),
        ("rejected.ron", include_str!("../scenarios/rejected.ron")),
        ("nested.ron", include_str!("../scenarios/nested.ron")),
        ("slow_target.ron", include_str!("../scenarios/slow_target.ron")),
        ("unresponsive.ron", include_str!("../scenarios/unresponsive.ron")),
    ];

    fn scenario(windows: &str, steps: &str) -> String {
        format!("(source: 1, offered: [Copy], windows: [{}], steps: [{}])", windows, steps)
    }

    #[test]
    fn bundled_scenarios_are_valid() {
        for (name, text) in BUNDLED {
            let scenario = Scenario::from_ron(text)
                .unwrap_or_else(|err| panic!("{} does not load: {:?}", name, err));
            assert!(scenario.expect.is_some(), "{} has no expectation", name);
            assert!(!scenario.steps.is_empty(), "{} has no steps", name);
        }
    }

    #[test]
    fn defaults_are_filled_in() {
        let text = scenario("(id: 1), (id: 2, responses: (drop: [Copy]))", "");
        let scenario = Scenario::from_ron(&text).unwrap();

        assert_eq!(scenario.pointer, 1);
        assert_eq!(scenario.settle_ms, 10_000);
        assert!(scenario.windows[0].accepts_drops);
        assert!(!scenario.windows[1].unresponsive);
        assert!(scenario.windows[1].responses.enter.is_empty());
        assert_eq!(scenario.windows[1].responses.drop, vec![Effect::Copy]);
    }

    #[test]
    fn drag_params_carry_payload_and_effects() {
        let text = "(source: 1, offered: [Copy, Link], payload: {\"text/plain\": \"hi\"}, \
                    windows: [(id: 1)], steps: [])";
        let params = Scenario::from_ron(text).unwrap().drag_params();

        assert_eq!(params.offered, DropEffect::COPY | DropEffect::LINK);
        assert_eq!(params.payload.get("text/plain"), Some(&b"hi"[..]));
        assert_eq!(params.source_window, WindowId(1));
    }

    #[test]
    fn pointer_step_keys() {
        let step = PointerStep {
            x: 0.0,
            y: 0.0,
            window: None,
            keys: vec![Key::Ctrl, Key::ButtonLeft],
        };
        assert_eq!(step.key_state(), KeyState::CTRL | KeyState::BUTTON_LEFT);
    }

    #[test]
    fn duplicate_window_is_rejected() {
        let text = scenario("(id: 1), (id: 1)", "");
        assert!(matches!(
            Scenario::from_ron(&text),
            Err(ScenarioError::DuplicateWindow(1))
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let text = scenario("(id: 2)", "");
        assert!(matches!(
            Scenario::from_ron(&text),
            Err(ScenarioError::UnknownWindow {
                id: 1,
                referenced_by: "source"
            })
        ));

        let text = scenario(
            "(id: 1)",
            "(at_ms: 0, action: Motion((x: 0.0, y: 0.0, window: Some(5))))",
        );
        assert!(matches!(
            Scenario::from_ron(&text),
            Err(ScenarioError::UnknownWindow { id: 5, .. })
        ));

        let text = scenario("(id: 1), (id: 2, parent: Some(9))", "");
        assert!(matches!(
            Scenario::from_ron(&text),
            Err(ScenarioError::UnknownWindow {
                id: 9,
                referenced_by: "parent"
            })
        ));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let text = scenario(
            "(id: 1), (id: 2, parent: Some(3)), (id: 3, parent: Some(2))",
            "",
        );
        assert!(matches!(
            Scenario::from_ron(&text),
            Err(ScenarioError::ParentCycle(_))
        ));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(matches!(
            Scenario::from_ron("(source: \"one\")"),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn expectation_matching() {
        let expect = Expectation {
            success: true,
            action: Some(Effect::Move),
        };
        assert!(expect.matches(&DragOutcome {
            success: true,
            action: Some(DropEffect::MOVE)
        }));
        assert!(!expect.matches(&DragOutcome::failed()));
    }
}
