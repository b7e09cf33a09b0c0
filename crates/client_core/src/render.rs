//! Roster projection onto a rendering sink.
//!
//! Every pass clears both regions and rebuilds them from one roster snapshot,
//! so the activity cards and the selectable activity index never drift apart.

use shared::domain::{Activity, Roster};

use crate::lock::ControlKey;

pub const SELECT_PLACEHOLDER: &str = "-- Select an activity --";
pub const NO_PARTICIPANTS: &str = "No participants yet";
pub const LOAD_FAILURE_NOTICE: &str = "Failed to load activities. Please try again later.";

pub const CARD_CLASS: &str = "activity-card";
pub const REMOVE_CONTROL_CLASS: &str = "participant-remove";
pub const DATA_ACTIVITY: &str = "data-activity";
pub const DATA_EMAIL: &str = "data-email";
const REMOVE_GLYPH: &str = "\u{1F5D1}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    ActivitiesList,
    ActivitySelect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.text_content(),
            Node::Text(text) => text.clone(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn is_disabled(&self) -> bool {
        self.attribute("disabled").is_some()
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// Depth-first, self included.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut found = vec![self];
        for child in &self.children {
            if let Node::Element(element) = child {
                found.extend(element.descendants());
            }
        }
        found
    }

    fn for_each_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        visit(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.for_each_mut(visit);
            }
        }
    }
}

/// The display surface the renderer and controller write to.
pub trait RenderSink: Send {
    fn clear(&mut self, region: Region);
    fn append(&mut self, region: Region, node: Node);
    fn set_control_disabled(&mut self, control: &ControlKey, disabled: bool);
    fn reset_form(&mut self);
}

pub fn render<S: RenderSink + ?Sized>(roster: &Roster, sink: &mut S) {
    sink.clear(Region::ActivitiesList);
    sink.clear(Region::ActivitySelect);
    sink.append(Region::ActivitySelect, option("", SELECT_PLACEHOLDER).into());

    for activity in roster {
        sink.append(Region::ActivitiesList, activity_card(activity).into());
        sink.append(
            Region::ActivitySelect,
            option(&activity.name, &activity.name).into(),
        );
    }
}

/// Leaves the activity index as it was; only the card list is replaced.
pub fn render_load_failure<S: RenderSink + ?Sized>(sink: &mut S) {
    sink.clear(Region::ActivitiesList);
    sink.append(
        Region::ActivitiesList,
        Element::new("p").text(LOAD_FAILURE_NOTICE).into(),
    );
}

pub fn activity_card(activity: &Activity) -> Element {
    Element::new("div")
        .class(CARD_CLASS)
        .child(Element::new("h4").text(&activity.name))
        .child(Element::new("p").text(&activity.description))
        .child(labelled_line("Schedule:", &activity.schedule))
        .child(labelled_line(
            "Availability:",
            &format!("{} spots left", activity.spots_left()),
        ))
        .child(participants_section(activity))
}

fn labelled_line(label: &str, value: &str) -> Element {
    Element::new("p")
        .child(Element::new("strong").text(label))
        .text(format!(" {value}"))
}

fn participants_section(activity: &Activity) -> Element {
    let mut list = Element::new("ul").class("participants-list");
    if activity.participants.is_empty() {
        list = list.child(
            Element::new("li")
                .class("participants-empty")
                .text(NO_PARTICIPANTS),
        );
    } else {
        for email in &activity.participants {
            list = list.child(participant_row(&activity.name, email));
        }
    }

    Element::new("div")
        .class("participants-section")
        .child(
            Element::new("p")
                .class("participants-title")
                .text("Participants"),
        )
        .child(list)
}

fn participant_row(activity: &str, email: &str) -> Element {
    Element::new("li")
        .class("participant-item")
        .child(Element::new("span").class("participant-email").text(email))
        .child(
            Element::new("button")
                .attr("type", "button")
                .class(REMOVE_CONTROL_CLASS)
                .attr(DATA_ACTIVITY, activity)
                .attr(DATA_EMAIL, email)
                .attr("aria-label", format!("Unregister {email} from {activity}"))
                .text(REMOVE_GLYPH),
        )
}

fn option(value: &str, label: &str) -> Element {
    Element::new("option").attr("value", value).text(label)
}

/// Identifiers carried by a rendered remove control, as found in its attributes.
pub fn control_target(control: &Element) -> (Option<String>, Option<String>) {
    (
        control.attribute(DATA_ACTIVITY).map(str::to_owned),
        control.attribute(DATA_EMAIL).map(str::to_owned),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub activity: String,
}

/// In-memory sink: keeps the node trees and form fields so they can be
/// inspected or printed.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    activities_list: Vec<Node>,
    activity_select: Vec<Node>,
    pub form: SignupForm,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self, region: Region) -> &[Node] {
        match region {
            Region::ActivitiesList => &self.activities_list,
            Region::ActivitySelect => &self.activity_select,
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut Vec<Node> {
        match region {
            Region::ActivitiesList => &mut self.activities_list,
            Region::ActivitySelect => &mut self.activity_select,
        }
    }

    pub fn cards(&self) -> Vec<&Element> {
        self.elements(Region::ActivitiesList)
            .into_iter()
            .filter(|element| element.has_class(CARD_CLASS))
            .collect()
    }

    /// `(value, label)` for every option in the activity index.
    pub fn options(&self) -> Vec<(String, String)> {
        self.elements(Region::ActivitySelect)
            .into_iter()
            .filter(|element| element.tag() == "option")
            .map(|option| {
                (
                    option.attribute("value").unwrap_or_default().to_owned(),
                    option.text_content(),
                )
            })
            .collect()
    }

    pub fn remove_controls(&self) -> Vec<&Element> {
        self.elements(Region::ActivitiesList)
            .into_iter()
            .filter(|element| element.has_class(REMOVE_CONTROL_CLASS))
            .collect()
    }

    pub fn remove_control(&self, activity: &str, email: &str) -> Option<&Element> {
        self.remove_controls().into_iter().find(|control| {
            control.attribute(DATA_ACTIVITY) == Some(activity)
                && control.attribute(DATA_EMAIL) == Some(email)
        })
    }

    pub fn list_text(&self) -> String {
        self.activities_list.iter().map(Node::text_content).collect()
    }

    /// Plain-text rendering of the activity list for terminals and logs.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.activities_list {
            match node {
                Node::Element(card) if card.has_class(CARD_CLASS) => write_card(card, &mut out),
                other => {
                    out.push_str(&other.text_content());
                    out.push('\n');
                }
            }
        }
        out
    }

    fn elements(&self, region: Region) -> Vec<&Element> {
        self.region(region)
            .iter()
            .filter_map(Node::as_element)
            .flat_map(Element::descendants)
            .collect()
    }
}

fn write_card(card: &Element, out: &mut String) {
    for child in card.children().iter().filter_map(Node::as_element) {
        match child.tag() {
            "h4" => out.push_str(&format!("{}\n", child.text_content())),
            "p" => out.push_str(&format!("  {}\n", child.text_content())),
            _ => {
                for item in child.descendants() {
                    if item.has_class("participants-title") {
                        out.push_str(&format!("  {}:\n", item.text_content()));
                    } else if item.has_class("participants-empty") {
                        out.push_str(&format!("    ({})\n", item.text_content()));
                    } else if item.has_class("participant-email") {
                        out.push_str(&format!("    - {}\n", item.text_content()));
                    }
                }
            }
        }
    }
}

impl RenderSink for MemorySurface {
    fn clear(&mut self, region: Region) {
        self.region_mut(region).clear();
    }

    fn append(&mut self, region: Region, node: Node) {
        self.region_mut(region).push(node);
    }

    fn set_control_disabled(&mut self, control: &ControlKey, disabled: bool) {
        for node in &mut self.activities_list {
            let Node::Element(root) = node else {
                continue;
            };
            root.for_each_mut(&mut |element: &mut Element| {
                if element.has_class(REMOVE_CONTROL_CLASS)
                    && element.attribute(DATA_ACTIVITY) == Some(control.activity.as_str())
                    && element.attribute(DATA_EMAIL) == Some(control.email.as_str())
                {
                    if disabled {
                        element.set_attribute("disabled", "");
                    } else {
                        element.remove_attribute("disabled");
                    }
                }
            });
        }
    }

    fn reset_form(&mut self) {
        self.form = SignupForm::default();
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
