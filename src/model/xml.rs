//! Profile XML form of a Tempo action
//!
//! ```xml
//! <action id="..." type="tempo">
//!     <short-actions><action-id>...</action-id></short-actions>
//!     <long-actions><action-id>...</action-id></long-actions>
//!     <property type="float"><name>threshold</name><value>0.5</value></property>
//!     <property type="string"><name>activate-on</name><value>release</value></property>
//! </action>
//! ```

use roxmltree::{Document, Node};
use std::borrow::Cow;

use super::{ActionId, TempoModel};
use crate::error::TempoError;
use crate::input::InputType;
use crate::tempo::TempoConfig;

const SHORT_ACTIONS: &str = "short-actions";
const LONG_ACTIONS: &str = "long-actions";
const THRESHOLD: &str = "threshold";
const ACTIVATE_ON: &str = "activate-on";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyType {
    Float,
    String,
}

impl PropertyType {
    fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Float => "float",
            PropertyType::String => "string",
        }
    }
}

impl TempoModel {
    /// Parses an `<action type="tempo">` element
    pub fn from_xml(text: &str, input_type: InputType) -> Result<Self, TempoError> {
        let doc = Document::parse(text)?;
        let node = doc.root_element();

        if node.tag_name().name() != "action" {
            return Err(TempoError::Profile(format!(
                "Expected <action> element, found <{}>",
                node.tag_name().name()
            )));
        }
        if let Some(kind) = node.attribute("type") {
            if kind != Self::TAG {
                return Err(TempoError::Profile(format!(
                    "Expected action of type {}, found {kind}",
                    Self::TAG
                )));
            }
        }
        let id = node
            .attribute("id")
            .map(ActionId::from)
            .ok_or_else(|| TempoError::Profile("Tempo action without id".into()))?;

        let short_actions = read_action_ids(node, SHORT_ACTIONS)?;
        let long_actions = read_action_ids(node, LONG_ACTIONS)?;

        let threshold_text = read_property(node, THRESHOLD, PropertyType::Float)?;
        let threshold: f64 = threshold_text.trim().parse().map_err(|_| {
            TempoError::Profile(format!("Invalid threshold value: {threshold_text}"))
        })?;
        let activate_on = read_property(node, ACTIVATE_ON, PropertyType::String)?;

        let config = TempoConfig::parse(threshold, activate_on.trim()).map_err(|e| {
            TempoError::Profile(format!("Invalid tempo configuration in {id}: {e}"))
        })?;

        Ok(Self::from_parts(
            id,
            input_type,
            config,
            short_actions,
            long_actions,
        ))
    }

    pub fn to_xml(&self) -> String {
        let mut out = format!(
            "<action id=\"{}\" type=\"{}\">\n",
            escape(self.id().as_str()),
            Self::TAG
        );
        write_action_ids(&mut out, SHORT_ACTIONS, self.short_actions());
        write_action_ids(&mut out, LONG_ACTIONS, self.long_actions());
        write_property(
            &mut out,
            THRESHOLD,
            &self.threshold().to_string(),
            PropertyType::Float,
        );
        write_property(
            &mut out,
            ACTIVATE_ON,
            self.activate_on().as_str(),
            PropertyType::String,
        );
        out.push_str("</action>\n");
        out
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn read_action_ids(node: Node, list: &str) -> Result<Vec<ActionId>, TempoError> {
    let list_node = child(node, list)
        .ok_or_else(|| TempoError::Profile(format!("Missing <{list}> element")))?;

    list_node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "action-id")
        .map(|c| match c.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(ActionId::from(text)),
            _ => Err(TempoError::Profile(format!("Empty action id in <{list}>"))),
        })
        .collect()
}

fn read_property(node: Node, name: &str, kind: PropertyType) -> Result<String, TempoError> {
    let property = node
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "property")
        .find(|c| child(*c, "name").and_then(|n| n.text()).map(str::trim) == Some(name))
        .ok_or_else(|| TempoError::Profile(format!("Missing property {name}")))?;

    if let Some(declared) = property.attribute("type") {
        if declared != kind.as_str() {
            return Err(TempoError::Profile(format!(
                "Property {name} has type {declared}, expected {}",
                kind.as_str()
            )));
        }
    }

    child(property, "value")
        .and_then(|v| v.text())
        .map(str::to_string)
        .ok_or_else(|| TempoError::Profile(format!("Property {name} has no value")))
}

fn write_action_ids(out: &mut String, list: &str, ids: &[ActionId]) {
    if ids.is_empty() {
        out.push_str(&format!("    <{list}/>\n"));
        return;
    }
    out.push_str(&format!("    <{list}>\n"));
    for id in ids {
        out.push_str(&format!(
            "        <action-id>{}</action-id>\n",
            escape(id.as_str())
        ));
    }
    out.push_str(&format!("    </{list}>\n"));
}

fn write_property(out: &mut String, name: &str, value: &str, kind: PropertyType) {
    out.push_str(&format!(
        "    <property type=\"{}\"><name>{}</name><value>{}</value></property>\n",
        kind.as_str(),
        name,
        escape(value)
    ));
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::ActivateOn;

    const PROFILE_ACTION: &str = r#"<action id="b3f1" type="tempo">
    <short-actions>
        <action-id>remap-1</action-id>
        <action-id>remap-2</action-id>
    </short-actions>
    <long-actions>
        <action-id>macro-9</action-id>
    </long-actions>
    <property type="float"><name>threshold</name><value>0.75</value></property>
    <property type="string"><name>activate-on</name><value>press</value></property>
</action>"#;

    #[test]
    fn reads_profile_action() {
        let model = TempoModel::from_xml(PROFILE_ACTION, InputType::JoystickButton).unwrap();

        assert_eq!(model.id().as_str(), "b3f1");
        assert_eq!(model.threshold(), 0.75);
        assert_eq!(model.activate_on(), ActivateOn::Press);
        assert_eq!(
            model.short_actions(),
            &[ActionId::from("remap-1"), ActionId::from("remap-2")]
        );
        assert_eq!(model.long_actions(), &[ActionId::from("macro-9")]);
    }

    #[test]
    fn written_xml_reads_back() {
        let model = TempoModel::from_xml(PROFILE_ACTION, InputType::JoystickButton).unwrap();
        let text = model.to_xml();

        assert!(text.starts_with("<action id=\"b3f1\" type=\"tempo\">"));
        let reread = TempoModel::from_xml(&text, InputType::JoystickButton).unwrap();
        assert_eq!(reread.snapshot(), model.snapshot());
    }

    #[test]
    fn writes_profile_layout() {
        let model = TempoModel::from_xml(PROFILE_ACTION, InputType::JoystickButton).unwrap();
        assert_eq!(model.to_xml(), format!("{PROFILE_ACTION}\n"));
    }

    #[test]
    fn empty_branches_are_written_as_empty_elements() {
        let model = TempoModel::new("a&b".into(), InputType::Keyboard);
        let text = model.to_xml();

        assert!(text.contains("id=\"a&amp;b\""));
        assert!(text.contains("<short-actions/>"));
        let reread = TempoModel::from_xml(&text, InputType::Keyboard).unwrap();
        assert_eq!(reread.id().as_str(), "a&b");
        assert!(reread.long_actions().is_empty());
    }

    #[test]
    fn rejects_invalid_activate_on() {
        let text = PROFILE_ACTION.replace("<value>press</value>", "<value>tap</value>");
        let err = TempoModel::from_xml(&text, InputType::JoystickButton).unwrap_err();
        assert!(matches!(err, TempoError::Profile(_)));
    }

    #[test]
    fn rejects_missing_pieces() {
        let no_long = PROFILE_ACTION.replace("long-actions", "other-actions");
        assert!(matches!(
            TempoModel::from_xml(&no_long, InputType::JoystickButton),
            Err(TempoError::Profile(_))
        ));

        let bad_float = PROFILE_ACTION.replace("0.75", "slow");
        assert!(matches!(
            TempoModel::from_xml(&bad_float, InputType::JoystickButton),
            Err(TempoError::Profile(_))
        ));

        let wrong_type = PROFILE_ACTION.replace("type=\"tempo\"", "type=\"chain\"");
        assert!(matches!(
            TempoModel::from_xml(&wrong_type, InputType::JoystickButton),
            Err(TempoError::Profile(_))
        ));

        assert!(matches!(
            TempoModel::from_xml("<action", InputType::JoystickButton),
            Err(TempoError::Xml(_))
        ));
    }
}
