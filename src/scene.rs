//! Scene model: diagram elements, relationships, and the in-memory store.
//!
//! This module defines what is on the canvas (`Element`, `ElementKind`), the
//! edges between elements (`Relationship`), a sparse-update type shared by both
//! (`PartialElement`), and the runtime store that owns them (`SceneModel`).
//!
//! Data arrives from the persistence collaborator as loosely shaped JSON. The
//! editor historically saved relationships as pseudo-elements inside the
//! `elements` array, so loading lifts any entry typed `relationship` into the
//! relationship collection. Entries that cannot be decoded are skipped with a
//! warning rather than failing the whole diagram.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::consts::{CHILD_OF_COLOR, RELATIONSHIP_COLOR};
use crate::geometry::{self, EdgeSegment, Point};

/// Error returned by [`SceneModel::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The input was not valid JSON.
    #[error("failed to decode diagram: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Identifier of an element or relationship.
///
/// Saved diagrams use both string and numeric ids; numbers are kept in their
/// decimal form so references from relationships still resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// A fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// The kind of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Character node; radius is half the width.
    Circle,
    /// Axis-aligned box with wrapped text, centered on `(x, y)`.
    Textbox,
    /// Horizontal segment from `(x, y)` to `(x + width, y)`.
    Line,
    /// Any kind this engine does not know; never drawn or hit.
    #[serde(other)]
    Unknown,
}

/// Role of a character node, used for its fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    Protagonist,
    Antagonist,
    Supporting,
    #[serde(other)]
    Other,
}

/// A diagram node as stored in the saved project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Center x in diagram space.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: f64,
    /// Center y in diagram space.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height: f64,
    /// Stroke color; black when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_type: Option<CharacterType>,
    /// Portrait URL drawn inside circle nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Attributes this engine does not interpret, kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// A visible element with no text or styling.
    #[must_use]
    pub fn new(id: impl Into<ElementId>, kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            x,
            y,
            width,
            height,
            color: None,
            text: None,
            font_size: None,
            font_color: None,
            hidden: false,
            character_type: None,
            profile_image: None,
            extra: Map::new(),
        }
    }

    /// A circle node of the given radius.
    #[must_use]
    pub fn circle(id: impl Into<ElementId>, x: f64, y: f64, radius: f64) -> Self {
        Self::new(id, ElementKind::Circle, x, y, radius * 2.0, radius * 2.0)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Text content, empty when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl From<String> for ElementId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&ElementId> for ElementId {
    fn from(id: &ElementId) -> Self {
        id.clone()
    }
}

/// Stroke pattern of a relationship line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Dashed,
    Dotted,
    Dashdot,
    /// Also what unrecognized `lineType` values decode to.
    #[default]
    #[serde(other)]
    Solid,
}

impl LineStyle {
    /// SVG `stroke-dasharray` value, `None` for a solid line.
    #[must_use]
    pub fn dash_array(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("8,4"),
            Self::Dotted => Some("2,2"),
            Self::Dashdot => Some("8,4,2,4"),
        }
    }
}

/// Semantic kind of a relationship; affects its default color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "child-of")]
    ChildOf,
    #[default]
    #[serde(other, rename = "generic")]
    Generic,
}

/// A directed or undirected edge between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Missing ids are filled in at load time from the endpoints.
    #[serde(default)]
    pub id: ElementId,
    #[serde(default, alias = "fromId", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<ElementId>,
    #[serde(default, alias = "toId", skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ElementId>,
    #[serde(default, alias = "label", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, rename = "lineType")]
    pub line_style: LineStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub directed: bool,
    #[serde(default, rename = "relationshipType")]
    pub kind: RelationKind,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hidden: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Relationship {
    #[must_use]
    pub fn new(id: impl Into<ElementId>, source: impl Into<ElementId>, target: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            source_id: Some(source.into()),
            target_id: Some(target.into()),
            text: None,
            line_style: LineStyle::Solid,
            color: None,
            directed: false,
            kind: RelationKind::Generic,
            hidden: false,
            extra: Map::new(),
        }
    }

    /// Explicit color, else the default for this relationship's kind.
    #[must_use]
    pub fn resolved_color(&self) -> &str {
        match (&self.color, self.kind) {
            (Some(color), _) if !color.is_empty() => color,
            (_, RelationKind::ChildOf) => CHILD_OF_COLOR,
            _ => RELATIONSHIP_COLOR,
        }
    }

    /// Label text, empty when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether `id` is one of this relationship's endpoints.
    #[must_use]
    pub fn touches(&self, id: &ElementId) -> bool {
        self.source_id.as_ref() == Some(id) || self.target_id.as_ref() == Some(id)
    }
}

/// Sparse update for an element or relationship. Only present fields are
/// applied; fields that do not apply to the target are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(rename = "lineType", skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_type: Option<CharacterType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(rename = "relationshipType", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationKind>,
    #[serde(alias = "fromId", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<ElementId>,
    #[serde(alias = "toId", skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ElementId>,
    /// Uninterpreted attributes, merged key by key into the target's `extra`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialElement {
    /// Move to a new center.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    fn apply_to_element(&self, el: &mut Element) {
        assign_finite(&mut el.x, self.x);
        assign_finite(&mut el.y, self.y);
        assign_finite(&mut el.width, self.width);
        assign_finite(&mut el.height, self.height);
        if let Some(ref text) = self.text {
            el.text = Some(text.clone());
        }
        if let Some(ref color) = self.color {
            el.color = Some(color.clone());
        }
        if let Some(size) = self.font_size.filter(|s| s.is_finite()) {
            el.font_size = Some(size);
        }
        if let Some(ref color) = self.font_color {
            el.font_color = Some(color.clone());
        }
        if let Some(hidden) = self.hidden {
            el.hidden = hidden;
        }
        if let Some(kind) = self.character_type {
            el.character_type = Some(kind);
        }
        if let Some(ref url) = self.profile_image {
            el.profile_image = Some(url.clone());
        }
        merge_extra(&mut el.extra, &self.extra);
    }

    fn apply_to_relationship(&self, rel: &mut Relationship) {
        if let Some(ref text) = self.text {
            rel.text = Some(text.clone());
        }
        if let Some(ref color) = self.color {
            rel.color = Some(color.clone());
        }
        if let Some(hidden) = self.hidden {
            rel.hidden = hidden;
        }
        if let Some(style) = self.line_style {
            rel.line_style = style;
        }
        if let Some(directed) = self.directed {
            rel.directed = directed;
        }
        if let Some(kind) = self.kind {
            rel.kind = kind;
        }
        if let Some(ref source) = self.source_id {
            rel.source_id = Some(source.clone());
        }
        if let Some(ref target) = self.target_id {
            rel.target_id = Some(target.clone());
        }
        merge_extra(&mut rel.extra, &self.extra);
    }
}

fn merge_extra(extra: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        // Identity and kind are fixed once an entry exists.
        if key == "id" || key == "type" {
            continue;
        }
        extra.insert(key.clone(), value.clone());
    }
}

fn assign_finite(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        *slot = v;
    }
}

/// Typed diagram contents, as handed back to the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
}

/// A relationship whose endpoints both resolve to visible elements, paired
/// with its attachment geometry.
#[derive(Debug, Clone, Copy)]
pub struct ValidRelationship<'a> {
    pub relationship: &'a Relationship,
    pub source: &'a Element,
    pub target: &'a Element,
    pub segment: EdgeSegment,
}

/// A relationship with whatever endpoints currently resolve.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipDetail<'a> {
    pub relationship: &'a Relationship,
    pub source: Option<&'a Element>,
    pub target: Option<&'a Element>,
}

/// In-memory store of elements and relationships, both kept in insertion
/// order (which is also draw order).
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    elements: IndexMap<ElementId, Element>,
    relationships: IndexMap<ElementId, Relationship>,
}

impl SceneModel {
    /// Build a scene from explicit collections. Later duplicates replace
    /// earlier entries in place.
    #[must_use]
    pub fn new(elements: Vec<Element>, relationships: Vec<Relationship>) -> Self {
        let mut scene = Self::default();
        for el in elements {
            scene.insert_element(el);
        }
        for rel in relationships {
            scene.insert_relationship(rel);
        }
        scene
    }

    #[must_use]
    pub fn from_data(data: DiagramData) -> Self {
        Self::new(data.elements, data.relationships)
    }

    /// Decode a `{ elements, relationships }` JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Decode`] when `raw` is not valid JSON. Individual
    /// entries that fail to decode are skipped, not reported.
    pub fn from_json(raw: &str) -> Result<Self, SceneError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }

    /// Build a scene from an already-parsed diagram value. Missing or
    /// non-array `elements` / `relationships` are treated as empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut scene = Self::default();
        for entry in array_field(value, "elements") {
            if entry.get("type").and_then(Value::as_str) == Some("relationship") {
                scene.load_relationship(entry);
            } else {
                scene.load_element(entry);
            }
        }
        for entry in array_field(value, "relationships") {
            scene.load_relationship(entry);
        }
        scene
    }

    fn load_element(&mut self, entry: &Value) {
        match Element::deserialize(entry) {
            Ok(el) => {
                self.insert_element(el);
            }
            Err(e) => log::warn!("skipping malformed element: {e}"),
        }
    }

    fn load_relationship(&mut self, entry: &Value) {
        match Relationship::deserialize(entry) {
            Ok(rel) => {
                self.insert_relationship(rel);
            }
            Err(e) => log::warn!("skipping malformed relationship: {e}"),
        }
    }

    /// Add or replace an element. Elements with non-finite geometry are
    /// rejected and `false` is returned.
    pub fn insert_element(&mut self, el: Element) -> bool {
        if !el.is_finite() {
            log::warn!("rejecting element {} with non-finite geometry", el.id);
            return false;
        }
        if self.relationships.contains_key(&el.id) {
            log::warn!("element id {} already names a relationship", el.id);
        }
        self.elements.insert(el.id.clone(), el);
        true
    }

    /// Add or replace a relationship. A relationship without an id gets one
    /// derived from its endpoints.
    pub fn insert_relationship(&mut self, mut rel: Relationship) {
        if rel.id.is_empty() {
            rel.id = ElementId::new(format!(
                "relationship_{}_{}",
                rel.source_id.as_ref().map_or("", ElementId::as_str),
                rel.target_id.as_ref().map_or("", ElementId::as_str),
            ));
        }
        self.relationships.insert(rel.id.clone(), rel);
    }

    /// Remove an element or relationship. Relationships pointing at a removed
    /// element are kept; they simply stop being valid.
    pub fn remove(&mut self, id: &ElementId) -> bool {
        self.elements.shift_remove(id).is_some() || self.relationships.shift_remove(id).is_some()
    }

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn relationship(&self, id: &ElementId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id) || self.relationships.contains_key(id)
    }

    /// All elements in insertion order, hidden ones included.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.values()
    }

    /// All relationships in insertion order, invalid ones included.
    pub fn relationships(&self) -> impl DoubleEndedIterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Elements that should be drawn, in draw order.
    pub fn visible_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.values().filter(|el| !el.hidden)
    }

    /// Relationships whose endpoints both resolve to visible elements, with
    /// their edge geometry. Dangling or hidden ones are left out silently.
    #[must_use]
    pub fn valid_relationships(&self) -> Vec<ValidRelationship<'_>> {
        self.relationships
            .values()
            .filter(|rel| !rel.hidden)
            .filter_map(|rel| {
                let source = self.visible_endpoint(rel.source_id.as_ref())?;
                let target = self.visible_endpoint(rel.target_id.as_ref())?;
                Some(ValidRelationship {
                    relationship: rel,
                    source,
                    target,
                    segment: geometry::edge_points(source, target),
                })
            })
            .collect()
    }

    fn visible_endpoint(&self, id: Option<&ElementId>) -> Option<&Element> {
        self.elements.get(id?).filter(|el| !el.hidden)
    }

    /// Relationships that start or end at `id`, valid or not.
    #[must_use]
    pub fn connected_relationships(&self, id: &ElementId) -> Vec<&Relationship> {
        self.relationships.values().filter(|rel| rel.touches(id)).collect()
    }

    #[must_use]
    pub fn relationship_detail(&self, id: &ElementId) -> Option<RelationshipDetail<'_>> {
        let relationship = self.relationships.get(id)?;
        Some(RelationshipDetail {
            relationship,
            source: relationship.source_id.as_ref().and_then(|s| self.elements.get(s)),
            target: relationship.target_id.as_ref().and_then(|t| self.elements.get(t)),
        })
    }

    /// Merge `partial` into the element or relationship named `id`.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown, which
    /// happens when a pending drag update races a deletion.
    pub fn update_element(&mut self, id: &ElementId, partial: &PartialElement) -> bool {
        if let Some(el) = self.elements.get_mut(id) {
            partial.apply_to_element(el);
            return true;
        }
        if let Some(rel) = self.relationships.get_mut(id) {
            partial.apply_to_relationship(rel);
            return true;
        }
        log::debug!("update for unknown id {id} ignored");
        false
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn to_data(&self) -> DiagramData {
        DiagramData {
            elements: self.elements.values().cloned().collect(),
            relationships: self.relationships.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len() + self.relationships.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.relationships.is_empty()
    }
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value.get(key).and_then(Value::as_array) {
        Some(items) => items.as_slice(),
        None => &[],
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
