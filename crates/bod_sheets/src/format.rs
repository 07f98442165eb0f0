//! crates/bod_sheets/src/format.rs
//! Cell formatting vocabulary. A `CellFormat` only carries the fields it sets;
//! applying it leaves every other attribute of the target cells untouched, and
//! `merged` layers one format over another the way dict-merging formats would.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    pub fn as_api(&self) -> &'static str {
        match self {
            HorizontalAlignment::Left => "LEFT",
            HorizontalAlignment::Center => "CENTER",
            HorizontalAlignment::Right => "RIGHT",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumberFormatKind {
    Currency,
    Percent,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NumberFormat {
    pub kind: NumberFormatKind,
    pub pattern: String,
}

impl NumberFormat {
    /// Whole dollars with thousands separators.
    pub fn currency() -> Self {
        Self { kind: NumberFormatKind::Currency, pattern: "$#,##0".into() }
    }

    /// One or two decimals.
    pub fn percent() -> Self {
        Self { kind: NumberFormatKind::Percent, pattern: "#0.0#%".into() }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextFormat {
    pub font_size: Option<u32>,
    pub bold: Option<bool>,
}

/// RGB in 0.0..=1.0, as the API expects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellFormat {
    pub horizontal_alignment: Option<HorizontalAlignment>,
    pub text_format: Option<TextFormat>,
    pub number_format: Option<NumberFormat>,
    pub background_color: Option<Color>,
}

impl CellFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn align(mut self, a: HorizontalAlignment) -> Self {
        self.horizontal_alignment = Some(a);
        self
    }

    pub fn left() -> Self {
        Self::new().align(HorizontalAlignment::Left)
    }

    pub fn center() -> Self {
        Self::new().align(HorizontalAlignment::Center)
    }

    pub fn right() -> Self {
        Self::new().align(HorizontalAlignment::Right)
    }

    pub fn bold(mut self) -> Self {
        self.text_format.get_or_insert_with(TextFormat::default).bold = Some(true);
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.text_format.get_or_insert_with(TextFormat::default).font_size = Some(size);
        self
    }

    pub fn number(mut self, nf: NumberFormat) -> Self {
        self.number_format = Some(nf);
        self
    }

    pub fn background(mut self, c: Color) -> Self {
        self.background_color = Some(c);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `other`'s set fields win; text format merges field by field.
    pub fn merged(&self, other: &CellFormat) -> CellFormat {
        let text_format = match (self.text_format, other.text_format) {
            (Some(a), Some(b)) => Some(TextFormat {
                font_size: b.font_size.or(a.font_size),
                bold: b.bold.or(a.bold),
            }),
            (a, b) => b.or(a),
        };
        CellFormat {
            horizontal_alignment: other.horizontal_alignment.or(self.horizontal_alignment),
            text_format,
            number_format: other.number_format.clone().or_else(|| self.number_format.clone()),
            background_color: other.background_color.or(self.background_color),
        }
    }

    /// `(userEnteredFormat, field mask)` for a `repeatCell` request. The mask
    /// lists only the set leaves so unrelated attributes survive.
    pub fn to_api(&self) -> (Value, String) {
        let mut body = Map::new();
        let mut fields: Vec<&str> = Vec::new();

        if let Some(a) = self.horizontal_alignment {
            body.insert("horizontalAlignment".into(), json!(a.as_api()));
            fields.push("userEnteredFormat.horizontalAlignment");
        }
        if let Some(tf) = self.text_format {
            let mut t = Map::new();
            if let Some(size) = tf.font_size {
                t.insert("fontSize".into(), json!(size));
                fields.push("userEnteredFormat.textFormat.fontSize");
            }
            if let Some(bold) = tf.bold {
                t.insert("bold".into(), json!(bold));
                fields.push("userEnteredFormat.textFormat.bold");
            }
            body.insert("textFormat".into(), Value::Object(t));
        }
        if let Some(nf) = &self.number_format {
            body.insert("numberFormat".into(), json!({ "type": nf.kind, "pattern": nf.pattern }));
            fields.push("userEnteredFormat.numberFormat");
        }
        if let Some(c) = self.background_color {
            body.insert("backgroundColor".into(), json!({ "red": c.red, "green": c.green, "blue": c.blue }));
            fields.push("userEnteredFormat.backgroundColor");
        }
        (Value::Object(body), fields.join(","))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// Cell text equals the value exactly.
    TextEq(String),
}

/// Boolean conditional-format rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub condition: Condition,
    pub format: CellFormat,
}

impl ConditionalRule {
    pub fn text_eq(value: impl Into<String>, format: CellFormat) -> Self {
        Self { condition: Condition::TextEq(value.into()), format }
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.condition {
            Condition::TextEq(v) => v == text,
        }
    }

    /// `booleanRule` body (without ranges).
    pub fn to_api(&self) -> Value {
        let (format, _) = self.format.to_api();
        let condition = match &self.condition {
            Condition::TextEq(v) => json!({ "type": "TEXT_EQ", "values": [{ "userEnteredValue": v }] }),
        };
        json!({ "condition": condition, "format": format })
    }
}
