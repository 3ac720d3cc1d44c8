use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{StripChartError, StripChartResult};

/// Raw `key=value` options from a channel declaration, in declaration order.
pub type ChannelOptions = IndexMap<String, String>;

/// Channel type named in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKindTag {
    Line,
    Scatter,
    Text,
}

impl ChannelKindTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Scatter => "Scatter",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for ChannelKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKindTag {
    type Err = StripChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "line" => Ok(Self::Line),
            "scatter" => Ok(Self::Scatter),
            "text" => Ok(Self::Text),
            other => Err(StripChartError::UnknownChannelKind(other.to_owned())),
        }
    }
}

/// Line connection style between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawStyle {
    #[default]
    Default,
    Steps,
    StepsPre,
    StepsMid,
    StepsPost,
}

impl DrawStyle {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "steps" => Some(Self::Steps),
            "steps-pre" => Some(Self::StepsPre),
            "steps-mid" => Some(Self::StepsMid),
            "steps-post" => Some(Self::StepsPost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineStyle {
    pub draw_style: DrawStyle,
    pub marker: Option<String>,
    pub marker_size: Option<f64>,
    pub line_style: Option<String>,
    pub line_width: Option<f64>,
    pub color: Option<String>,
    pub alpha: Option<f64>,
    pub fill_style: Option<String>,
    /// Extend the last value to the stream's latest timestamp when rendering.
    pub repeat: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScatterStyle {
    pub marker: Option<String>,
    /// Marker area in points², i.e. the declared `size` squared.
    pub marker_area: Option<f64>,
    pub color: Option<String>,
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: Option<f64>,
    pub color: Option<String>,
    pub alpha: Option<f64>,
}

fn parse_float(kind: ChannelKindTag, key: &str, value: &str) -> StripChartResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| invalid(kind, key, value))
}

fn parse_bool(kind: ChannelKindTag, key: &str, value: &str) -> StripChartResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(kind, key, value)),
    }
}

fn invalid(kind: ChannelKindTag, key: &str, value: &str) -> StripChartError {
    StripChartError::InvalidChannelOption {
        kind: kind.as_str(),
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn unsupported(kind: ChannelKindTag, key: &str) -> StripChartError {
    StripChartError::UnsupportedChannelOption {
        kind: kind.as_str(),
        key: key.to_owned(),
    }
}

impl LineStyle {
    pub fn from_options(options: &ChannelOptions) -> StripChartResult<Self> {
        let kind = ChannelKindTag::Line;
        let mut style = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "drawstyle" => {
                    style.draw_style =
                        DrawStyle::parse(value).ok_or_else(|| invalid(kind, key, value))?;
                }
                "marker" => style.marker = Some(value.clone()),
                "markersize" => style.marker_size = Some(parse_float(kind, key, value)?),
                "linestyle" => style.line_style = Some(value.clone()),
                "linewidth" => style.line_width = Some(parse_float(kind, key, value)?),
                "color" => style.color = Some(value.clone()),
                "alpha" => style.alpha = Some(parse_float(kind, key, value)?),
                "fillstyle" => style.fill_style = Some(value.clone()),
                "repeat" => style.repeat = parse_bool(kind, key, value)?,
                // Stacking follows declaration order.
                "zorder" => {}
                _ => return Err(unsupported(kind, key)),
            }
        }
        Ok(style)
    }
}

impl ScatterStyle {
    pub fn from_options(options: &ChannelOptions) -> StripChartResult<Self> {
        let kind = ChannelKindTag::Scatter;
        let mut style = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "marker" => style.marker = Some(value.clone()),
                "size" => {
                    let size = parse_float(kind, key, value)?;
                    style.marker_area = Some(size * size);
                }
                "color" => style.color = Some(value.clone()),
                "alpha" => style.alpha = Some(parse_float(kind, key, value)?),
                "zorder" => {}
                _ => return Err(unsupported(kind, key)),
            }
        }
        Ok(style)
    }
}

impl TextStyle {
    /// Text channels tolerate unknown options and skip them.
    pub fn from_options(options: &ChannelOptions) -> StripChartResult<Self> {
        let kind = ChannelKindTag::Text;
        let mut style = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "size" => style.size = Some(parse_float(kind, key, value)?),
                "color" => style.color = Some(value.clone()),
                "alpha" => style.alpha = Some(parse_float(kind, key, value)?),
                _ => {}
            }
        }
        Ok(style)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelKindTag, ChannelOptions, DrawStyle, LineStyle, ScatterStyle, TextStyle};
    use crate::error::StripChartError;

    fn options(pairs: &[(&str, &str)]) -> ChannelOptions {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn kind_tags_parse_lowercase_names_only() {
        assert_eq!("line".parse::<ChannelKindTag>().ok(), Some(ChannelKindTag::Line));
        assert!(matches!(
            "Line".parse::<ChannelKindTag>(),
            Err(StripChartError::UnknownChannelKind(kind)) if kind == "Line"
        ));
    }

    #[test]
    fn line_style_parses_typed_fields() {
        let style = LineStyle::from_options(&options(&[
            ("drawstyle", "steps-pre"),
            ("linewidth", "1.5"),
            ("repeat", "1"),
        ]))
        .expect("valid line options");
        assert_eq!(style.draw_style, DrawStyle::StepsPre);
        assert_eq!(style.line_width, Some(1.5));
        assert!(style.repeat);
    }

    #[test]
    fn line_style_rejects_unknown_option() {
        let err = LineStyle::from_options(&options(&[("size", "3")])).expect_err("unknown arg");
        assert_eq!(err.to_string(), "Line: unknown arg 'size'");
    }

    #[test]
    fn scatter_size_becomes_marker_area() {
        let style = ScatterStyle::from_options(&options(&[("size", "3")])).expect("valid");
        assert_eq!(style.marker_area, Some(9.0));
    }

    #[test]
    fn text_style_ignores_unknown_options() {
        let style =
            TextStyle::from_options(&options(&[("font", "mono"), ("size", "8")])).expect("valid");
        assert_eq!(style.size, Some(8.0));
    }
}
