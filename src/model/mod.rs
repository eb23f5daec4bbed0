//! Action model side of the Tempo action
//!
//! [`TempoModel`] holds what a profile stores about a Tempo action: its
//! threshold, activation moment and the ids of the actions in each branch.
//! It persists to the profile XML format ([`xml`]) and to TOML
//! ([`document`]), notifies subscribers of changes through a
//! [`tokio::sync::watch`] channel and builds [`TempoDispatcher`]s for the
//! host.

pub mod document;
pub mod xml;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::TempoError;
use crate::input::InputType;
use crate::tempo::{ActivateOn, Branch, BranchKind, TempoConfig, TempoDispatcher};

pub use document::TempoDocument;

/// Identifier of an action inside the host's action tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Host capability to instantiate branch member actions by type name
pub trait ActionFactory {
    fn create_action(&self, action_type: &str, input_type: InputType)
        -> Result<ActionId, TempoError>;
}

/// Published to subscribers whenever the model changes
#[derive(Debug, Clone, PartialEq)]
pub struct TempoSnapshot {
    pub config: TempoConfig,
    pub short_actions: Vec<ActionId>,
    pub long_actions: Vec<ActionId>,
}

/// Persistent state of one Tempo action
#[derive(Debug)]
pub struct TempoModel {
    id: ActionId,
    input_type: InputType,
    config: TempoConfig,
    short_actions: Vec<ActionId>,
    long_actions: Vec<ActionId>,
    changes: watch::Sender<TempoSnapshot>,
}

impl TempoModel {
    pub const NAME: &'static str = "Tempo";
    pub const TAG: &'static str = "tempo";
    pub const VERSION: u32 = 1;

    /// Hats and axes are only usable through virtual buttons created upstream
    pub const INPUT_TYPES: [InputType; 4] = [
        InputType::JoystickAxis,
        InputType::JoystickButton,
        InputType::JoystickHat,
        InputType::Keyboard,
    ];

    pub fn new(id: ActionId, input_type: InputType) -> Self {
        Self::from_parts(
            id,
            input_type,
            TempoConfig::default(),
            Vec::new(),
            Vec::new(),
        )
    }

    pub(crate) fn from_parts(
        id: ActionId,
        input_type: InputType,
        config: TempoConfig,
        short_actions: Vec<ActionId>,
        long_actions: Vec<ActionId>,
    ) -> Self {
        let (changes, _) = watch::channel(TempoSnapshot {
            config,
            short_actions: short_actions.clone(),
            long_actions: long_actions.clone(),
        });
        Self {
            id,
            input_type,
            config,
            short_actions,
            long_actions,
            changes,
        }
    }

    /// Loads a Tempo action from an `.xml` or `.toml` file
    pub async fn load(path: impl AsRef<Path>, input_type: InputType) -> Result<Self, TempoError> {
        let path = path.as_ref();
        info!("Loading tempo action from {:?}", path);
        let text = tokio::fs::read_to_string(path).await?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("xml") => Self::from_xml(&text, input_type),
            Some("toml") => Self::from_toml_str(&text, input_type),
            other => Err(TempoError::Profile(format!(
                "Unsupported tempo action file type: {other:?}"
            ))),
        }
    }

    /// Writes the action to `path`, format chosen by extension
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), TempoError> {
        let path = path.as_ref();
        let text = match path.extension().and_then(|ext| ext.to_str()) {
            Some("xml") => self.to_xml(),
            Some("toml") => self.to_toml_string()?,
            other => {
                return Err(TempoError::Profile(format!(
                    "Unsupported tempo action file type: {other:?}"
                )))
            }
        };
        tokio::fs::write(path, text).await?;
        debug!("Saved tempo action {} to {:?}", self.id, path);
        Ok(())
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn config(&self) -> TempoConfig {
        self.config
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold()
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), TempoError> {
        if self.config.threshold() == threshold {
            return Ok(());
        }
        self.config.set_threshold(threshold)?;
        self.publish();
        Ok(())
    }

    pub fn activate_on(&self) -> ActivateOn {
        self.config.activate_on()
    }

    pub fn set_activate_on(&mut self, activate_on: &str) -> Result<(), TempoError> {
        let previous = self.config.activate_on();
        self.config.set_activate_on(activate_on)?;
        if self.config.activate_on() != previous {
            self.publish();
        }
        Ok(())
    }

    pub fn short_actions(&self) -> &[ActionId] {
        &self.short_actions
    }

    pub fn long_actions(&self) -> &[ActionId] {
        &self.long_actions
    }

    /// Creates an action of `action_type` and appends it to `branch`
    /// (`"short"` or `"long"`).
    ///
    /// The branch name is checked before anything is created, so a bad name
    /// leaves both the model and the host untouched.
    pub fn add_action(
        &mut self,
        action_type: &str,
        branch: &str,
        factory: &dyn ActionFactory,
    ) -> Result<ActionId, TempoError> {
        let kind: BranchKind = branch.parse()?;
        let action_id = factory.create_action(action_type, self.input_type)?;

        match kind {
            BranchKind::Short => self.short_actions.push(action_id.clone()),
            BranchKind::Long => self.long_actions.push(action_id.clone()),
        }
        info!(
            "Added {} action {} to {} branch of {}",
            action_type, action_id, kind, self.id
        );
        self.publish();
        Ok(action_id)
    }

    /// Empty branches are legal, so a Tempo action is always valid
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn snapshot(&self) -> TempoSnapshot {
        TempoSnapshot {
            config: self.config,
            short_actions: self.short_actions.clone(),
            long_actions: self.long_actions.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TempoSnapshot> {
        self.changes.subscribe()
    }

    /// Builds the dispatcher that runs this action for one input
    pub fn create_dispatcher(
        &self,
        short: Arc<dyn Branch>,
        long: Arc<dyn Branch>,
        runtime: Handle,
    ) -> TempoDispatcher {
        TempoDispatcher::new(self.config, short, long, runtime)
    }

    fn publish(&self) {
        self.changes.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingFactory {
        created: Cell<u32>,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                created: Cell::new(0),
            }
        }
    }

    impl ActionFactory for CountingFactory {
        fn create_action(
            &self,
            action_type: &str,
            _input_type: InputType,
        ) -> Result<ActionId, TempoError> {
            if action_type == "missing" {
                return Err(TempoError::ActionCreation(format!(
                    "no action plugin named {action_type}"
                )));
            }
            let next = self.created.get() + 1;
            self.created.set(next);
            Ok(ActionId::new(format!("{action_type}-{next}")))
        }
    }

    #[test]
    fn new_model_has_defaults() {
        let model = TempoModel::new("t1".into(), InputType::JoystickButton);
        assert_eq!(model.threshold(), 0.5);
        assert_eq!(model.activate_on(), ActivateOn::Release);
        assert!(model.short_actions().is_empty());
        assert!(model.long_actions().is_empty());
        assert!(model.is_valid());
        assert!(TempoModel::INPUT_TYPES.contains(&InputType::JoystickHat));
    }

    #[test]
    fn add_action_routes_by_branch() {
        let factory = CountingFactory::new();
        let mut model = TempoModel::new("t1".into(), InputType::JoystickButton);

        let a = model.add_action("remap", "short", &factory).unwrap();
        let b = model.add_action("macro", "long", &factory).unwrap();
        let c = model.add_action("remap", "short", &factory).unwrap();

        assert_eq!(model.short_actions(), &[a, c]);
        assert_eq!(model.long_actions(), &[b]);
    }

    #[test]
    fn add_action_with_bad_branch_creates_nothing() {
        let factory = CountingFactory::new();
        let mut model = TempoModel::new("t1".into(), InputType::JoystickButton);

        let err = model.add_action("remap", "medium", &factory).unwrap_err();
        assert!(matches!(err, TempoError::BranchRouting(_)));
        assert_eq!(factory.created.get(), 0);
        assert!(model.short_actions().is_empty());
        assert!(model.long_actions().is_empty());
    }

    #[test]
    fn add_action_surfaces_factory_failure() {
        let factory = CountingFactory::new();
        let mut model = TempoModel::new("t1".into(), InputType::Keyboard);

        let err = model.add_action("missing", "long", &factory).unwrap_err();
        assert!(matches!(err, TempoError::ActionCreation(_)));
        assert!(model.long_actions().is_empty());
    }

    #[test]
    fn setters_validate_and_notify_on_change_only() {
        let mut model = TempoModel::new("t1".into(), InputType::JoystickButton);
        let mut changes = model.subscribe();

        model.set_threshold(0.5).unwrap();
        assert!(!changes.has_changed().unwrap());

        model.set_threshold(0.9).unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().config.threshold(), 0.9);

        assert!(model.set_activate_on("sideways").is_err());
        assert!(!changes.has_changed().unwrap());

        model.set_activate_on("press").unwrap();
        assert_eq!(
            changes.borrow_and_update().config.activate_on(),
            ActivateOn::Press
        );

        assert!(model.set_threshold(-1.0).is_err());
        assert_eq!(model.threshold(), 0.9);
    }

    #[test]
    fn subscribers_see_new_actions() {
        let factory = CountingFactory::new();
        let mut model = TempoModel::new("t1".into(), InputType::JoystickButton);
        let changes = model.subscribe();

        model.add_action("remap", "long", &factory).unwrap();
        assert_eq!(changes.borrow().long_actions, vec![ActionId::new("remap-1")]);
    }
}
