use serde::{Deserialize, Serialize};

use super::{ActionId, TempoModel};
use crate::error::TempoError;
use crate::input::InputType;
use crate::tempo::{TempoConfig, DEFAULT_THRESHOLD};

/// TOML form of a Tempo action. Missing keys fall back to the defaults of a
/// freshly created action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoDocument {
    pub id: ActionId,
    pub threshold: f64,
    pub activate_on: String,
    pub short_actions: Vec<ActionId>,
    pub long_actions: Vec<ActionId>,
}

impl Default for TempoDocument {
    fn default() -> Self {
        Self {
            id: ActionId::from(TempoModel::TAG),
            threshold: DEFAULT_THRESHOLD,
            activate_on: "release".to_string(),
            short_actions: Vec::new(),
            long_actions: Vec::new(),
        }
    }
}

impl TempoDocument {
    pub fn into_model(self, input_type: InputType) -> Result<TempoModel, TempoError> {
        let config = TempoConfig::parse(self.threshold, &self.activate_on).map_err(|e| {
            TempoError::Profile(format!("Invalid tempo configuration in {}: {e}", self.id))
        })?;
        Ok(TempoModel::from_parts(
            self.id,
            input_type,
            config,
            self.short_actions,
            self.long_actions,
        ))
    }
}

impl From<&TempoModel> for TempoDocument {
    fn from(model: &TempoModel) -> Self {
        Self {
            id: model.id().clone(),
            threshold: model.threshold(),
            activate_on: model.activate_on().to_string(),
            short_actions: model.short_actions().to_vec(),
            long_actions: model.long_actions().to_vec(),
        }
    }
}

impl TempoModel {
    pub fn from_toml_str(text: &str, input_type: InputType) -> Result<Self, TempoError> {
        let document: TempoDocument = toml::from_str(text)?;
        document.into_model(input_type)
    }

    pub fn to_toml_string(&self) -> Result<String, TempoError> {
        Ok(toml::to_string_pretty(&TempoDocument::from(self))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::ActivateOn;

    #[test]
    fn reads_partial_document_with_defaults() {
        let model = TempoModel::from_toml_str(
            r#"
            activate_on = "press"
            long_actions = ["macro-1"]
            "#,
            InputType::JoystickButton,
        )
        .unwrap();

        assert_eq!(model.id().as_str(), "tempo");
        assert_eq!(model.threshold(), DEFAULT_THRESHOLD);
        assert_eq!(model.activate_on(), ActivateOn::Press);
        assert_eq!(model.long_actions(), &[ActionId::from("macro-1")]);
    }

    #[test]
    fn written_document_reads_back() {
        let mut model = TempoModel::new("hold-to-fire".into(), InputType::Keyboard);
        model.set_threshold(1.2).unwrap();

        let text = model.to_toml_string().unwrap();
        assert!(text.contains("threshold = 1.2"));

        let reread = TempoModel::from_toml_str(&text, InputType::Keyboard).unwrap();
        assert_eq!(reread.snapshot(), model.snapshot());
        assert_eq!(reread.id(), model.id());
    }

    #[test]
    fn invalid_values_are_profile_errors() {
        for text in ["threshold = -2.0", "activate_on = \"later\""] {
            assert!(matches!(
                TempoModel::from_toml_str(text, InputType::JoystickButton),
                Err(TempoError::Profile(_))
            ));
        }
        assert!(matches!(
            TempoModel::from_toml_str("threshold = [", InputType::JoystickButton),
            Err(TempoError::TomlDe(_))
        ));
    }
}
