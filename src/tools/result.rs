use serde::{Deserialize, Serialize};

/// 一条归一化后的分析结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl ResultItem {
    pub fn new(time: impl Into<String>) -> Self {
        let time = time.into();
        Self {
            seconds: timecode_to_seconds(&time),
            time,
            text: None,
            labels: None,
            value: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// 将 `mm:ss` 或 `hh:mm:ss` 转换为秒，秒数允许小数
pub fn timecode_to_seconds(time: &str) -> Option<f64> {
    let parts = time
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return None;
    }
    match parts.as_slice() {
        [minutes, seconds] => Some(minutes * 60.0 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600.0 + minutes * 60.0 + seconds),
        _ => None,
    }
}

/// 模型有时会把撇号转义成 `\'`，这里还原
pub fn normalize_escaped_apostrophes(text: &str) -> String {
    text.replace("\\'", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_and_hour_timecodes() {
        assert_eq!(timecode_to_seconds("01:05"), Some(65.0));
        assert_eq!(timecode_to_seconds("1:02:03"), Some(3723.0));
        assert_eq!(timecode_to_seconds("00:01.5"), Some(1.5));
    }

    #[test]
    fn rejects_malformed_timecodes() {
        assert_eq!(timecode_to_seconds("12"), None);
        assert_eq!(timecode_to_seconds("ab:cd"), None);
        assert_eq!(timecode_to_seconds("1:2:3:4"), None);
        assert_eq!(timecode_to_seconds("-1:00"), None);
    }

    #[test]
    fn unescapes_apostrophes_only() {
        assert_eq!(normalize_escaped_apostrophes("it\\'s"), "it's");
        assert_eq!(normalize_escaped_apostrophes("a\\nb"), "a\\nb");
    }
}
