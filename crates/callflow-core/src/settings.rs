//! Task metadata attached to a node (`customSettings`).
//!
//! Three incompatible shapes of the bag exist in saved data. Each is a typed
//! variant of [`NodeSettings`], tagged by `schema`. The store treats the value
//! as opaque; only [`NodeSettings::has_metadata`] looks inside it.
//! [`NodeSettings::into_task_rows`] migrates any version to the newest one.

use serde::de::value::StringDeserializer;
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer};
use serde::{Deserialize, Serialize};

use crate::error::{CallflowError, Result};

/// Newest schema version understood by this crate.
pub const LATEST_SCHEMA_VERSION: u32 = 3;

/// When the task attached to a node is due.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueDate {
    Immediately,
    Tomorrow,
    NextWeek,
    TwoWeeks,
    NextMonth,
}

impl DueDate {
    pub const ALL: [DueDate; 5] = [
        Self::Immediately,
        Self::Tomorrow,
        Self::NextWeek,
        Self::TwoWeeks,
        Self::NextMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Immediately => "Immediately",
            Self::Tomorrow => "Tomorrow",
            Self::NextWeek => "Next Week",
            Self::TwoWeeks => "In Two Weeks",
            Self::NextMonth => "Next Month",
        }
    }
}

/// A wiki page that can be attached to a node.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WikiAttachment {
    PatientGuide,
    TreatmentPlan,
    BillingInfo,
    Aftercare,
}

impl WikiAttachment {
    pub const ALL: [WikiAttachment; 4] = [
        Self::PatientGuide,
        Self::TreatmentPlan,
        Self::BillingInfo,
        Self::Aftercare,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PatientGuide => "Patient Guide",
            Self::TreatmentPlan => "Treatment Plan",
            Self::BillingInfo => "Billing Information",
            Self::Aftercare => "Aftercare Instructions",
        }
    }
}

/// Version 1: one value per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ScalarSettings {
    pub assigned_to: String,
    pub description: String,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DueDate>,
    pub code_reference: String,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment: Option<WikiAttachment>,
}

impl ScalarSettings {
    pub fn set_assigned_to(&mut self, name: impl Into<String>) {
        self.assigned_to = name.into();
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    pub fn set_due_date(&mut self, due: Option<DueDate>) {
        self.due_date = due;
    }

    pub fn set_code_reference(&mut self, reference: impl Into<String>) {
        self.code_reference = reference.into();
    }

    pub fn set_attachment(&mut self, attachment: Option<WikiAttachment>) {
        self.attachment = attachment;
    }

    fn has_metadata(&self) -> bool {
        !self.assigned_to.is_empty()
            || !self.description.is_empty()
            || !self.code_reference.is_empty()
            || self.due_date.is_some()
            || self.attachment.is_some()
    }
}

/// Version 2: assignees, code references and attachments become lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluralSettings {
    #[serde(deserialize_with = "one_or_many")]
    pub assigned_to: Vec<String>,
    pub description: String,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DueDate>,
    #[serde(alias = "codeReference", deserialize_with = "one_or_many")]
    pub code_references: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub attachments: Vec<WikiAttachment>,
}

impl PluralSettings {
    /// Add an assignee. Empty and already-present names are ignored.
    pub fn add_assignee(&mut self, name: impl Into<String>) -> bool {
        push_unique(&mut self.assigned_to, name.into(), |s| s.is_empty())
    }

    pub fn remove_assignee(&mut self, name: &str) -> bool {
        remove_item(&mut self.assigned_to, |a| a == name)
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    pub fn set_due_date(&mut self, due: Option<DueDate>) {
        self.due_date = due;
    }

    pub fn add_code_reference(&mut self, reference: impl Into<String>) -> bool {
        push_unique(&mut self.code_references, reference.into(), |s| s.is_empty())
    }

    pub fn remove_code_reference(&mut self, reference: &str) -> bool {
        remove_item(&mut self.code_references, |r| r == reference)
    }

    pub fn add_attachment(&mut self, attachment: WikiAttachment) -> bool {
        push_unique(&mut self.attachments, attachment, |_| false)
    }

    pub fn remove_attachment(&mut self, attachment: WikiAttachment) -> bool {
        remove_item(&mut self.attachments, |a| *a == attachment)
    }

    fn has_metadata(&self) -> bool {
        !self.assigned_to.is_empty()
            || !self.description.is_empty()
            || !self.code_references.is_empty()
            || !self.attachments.is_empty()
            || self.due_date.is_some()
    }
}

/// One task in the version 3 row list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TaskRow {
    pub assignee: String,
    pub description: String,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DueDate>,
    pub code_reference: String,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment: Option<WikiAttachment>,
}

impl TaskRow {
    pub fn new(assignee: impl Into<String>) -> Self {
        Self {
            assignee: assignee.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_due_date(mut self, due: DueDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_code_reference(mut self, reference: impl Into<String>) -> Self {
        self.code_reference = reference.into();
        self
    }

    pub fn with_attachment(mut self, attachment: WikiAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Version 3: a list of independent task rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRowSettings {
    pub rows: Vec<TaskRow>,
}

impl TaskRowSettings {
    pub fn push_row(&mut self, row: TaskRow) {
        self.rows.push(row);
    }

    /// Remove the row at `index`, if there is one.
    pub fn remove_row(&mut self, index: usize) -> Option<TaskRow> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut TaskRow> {
        self.rows.get_mut(index)
    }
}

/// The metadata bag attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum NodeSettings {
    Scalar(ScalarSettings),
    Plural(PluralSettings),
    TaskRows(TaskRowSettings),
}

impl Default for NodeSettings {
    /// The blank bag the settings panel opens with.
    fn default() -> Self {
        Self::Plural(PluralSettings::default())
    }
}

impl NodeSettings {
    pub fn schema_version(&self) -> u32 {
        match self {
            Self::Scalar(_) => 1,
            Self::Plural(_) => 2,
            Self::TaskRows(_) => 3,
        }
    }

    /// True if any string field is non-empty or any list is non-empty.
    pub fn has_metadata(&self) -> bool {
        match self {
            Self::Scalar(s) => s.has_metadata(),
            Self::Plural(p) => p.has_metadata(),
            Self::TaskRows(t) => !t.rows.is_empty(),
        }
    }

    /// Migrate to the newest schema.
    ///
    /// List fields of a version 2 bag are zipped into rows, so no entry is
    /// lost; description and due date are copied onto every row.
    pub fn into_task_rows(self) -> TaskRowSettings {
        match self {
            Self::Scalar(s) => {
                if !s.has_metadata() {
                    return TaskRowSettings::default();
                }
                TaskRowSettings {
                    rows: vec![TaskRow {
                        assignee: s.assigned_to,
                        description: s.description,
                        due_date: s.due_date,
                        code_reference: s.code_reference,
                        attachment: s.attachment,
                    }],
                }
            }
            Self::Plural(p) => {
                let mut count = p
                    .assigned_to
                    .len()
                    .max(p.code_references.len())
                    .max(p.attachments.len());
                if count == 0 && (!p.description.is_empty() || p.due_date.is_some()) {
                    count = 1;
                }
                let rows = (0..count)
                    .map(|i| TaskRow {
                        assignee: p.assigned_to.get(i).cloned().unwrap_or_default(),
                        description: p.description.clone(),
                        due_date: p.due_date,
                        code_reference: p.code_references.get(i).cloned().unwrap_or_default(),
                        attachment: p.attachments.get(i).copied(),
                    })
                    .collect();
                TaskRowSettings { rows }
            }
            Self::TaskRows(t) => t,
        }
    }

    /// Read a bag saved without a `schema` tag, guessing its version from its shape.
    ///
    /// `rows` means version 3. A plural-only key (`attachments`, `codeReferences`)
    /// or any list-valued field means version 2. Anything else is read as version 1,
    /// and keys version 1 does not know are an error.
    pub fn from_legacy_json(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| CallflowError::Settings("settings must be a JSON object".into()))?;

        let parsed = if obj.contains_key("schema") {
            serde_json::from_value(value.clone())
        } else if obj.contains_key("rows") {
            serde_json::from_value(value.clone()).map(Self::TaskRows)
        } else if PLURAL_ONLY_KEYS.iter().any(|k| obj.contains_key(*k))
            || obj.values().any(|v| v.is_array())
        {
            serde_json::from_value(value.clone()).map(Self::Plural)
        } else {
            serde_json::from_value(value.clone()).map(Self::Scalar)
        };

        parsed.map_err(|e| CallflowError::Settings(e.to_string()))
    }
}

const PLURAL_ONLY_KEYS: [&str; 2] = ["attachments", "codeReferences"];

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T, reject: impl Fn(&T) -> bool) -> bool {
    if reject(&item) || list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}

fn remove_item<T>(list: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = list.len();
    list.retain(|item| !pred(item));
    list.len() != before
}

/// Legacy bags store "no value" as an empty string.
fn empty_as_none<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_value::<T, D::Error>(s).map(Some),
    }
}

fn parse_value<T, E>(s: String) -> std::result::Result<T, E>
where
    T: DeserializeOwned,
    E: serde::de::Error,
{
    let de: StringDeserializer<E> = s.into_deserializer();
    T::deserialize(de)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either a single string or a list of strings; empty strings are dropped.
fn one_or_many<'de, D, T>(de: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = match Option::<OneOrMany>::deserialize(de)? {
        None => vec![],
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    };
    raw.into_iter()
        .filter(|s| !s.is_empty())
        .map(parse_value::<T, D::Error>)
        .collect()
}
