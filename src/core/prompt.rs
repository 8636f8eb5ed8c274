use crate::domain::model::Value;
use crate::utils::error::{EtlError, Result};

const VALUE_PLACEHOLDER: &str = "{value}";
const INSTRUCTION_PLACEHOLDER: &str = "{instruction}";

/// 將欄位值與指令套入模板，組成送給模型的 prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    /// legacy_http 版本的句型
    pub const CLASSIC: &'static str =
        "Please take this value {value} and do the following. {instruction}";
    pub const QUOTED: &'static str =
        "Take the data: '{value}' and respond after doing following: '{instruction}'.";

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// 接受預設名稱 (classic / quoted) 或自訂模板
    pub fn resolve_template(name_or_template: &str) -> Result<String> {
        match name_or_template.trim() {
            "classic" => return Ok(Self::CLASSIC.to_string()),
            "quoted" => return Ok(Self::QUOTED.to_string()),
            _ => {}
        }

        if !name_or_template.contains(INSTRUCTION_PLACEHOLDER) {
            return Err(EtlError::InvalidConfigValueError {
                field: "prompt_template".to_string(),
                value: name_or_template.to_string(),
                reason: "Template must be 'classic', 'quoted' or contain an {instruction} placeholder"
                    .to_string(),
            });
        }

        Ok(name_or_template.to_string())
    }

    /// 單次掃描替換，插入的文字不會再被當作佔位符
    pub fn build(&self, value: &Value, instruction: &str) -> String {
        let value_text = value.to_string();
        let mut prompt =
            String::with_capacity(self.template.len() + value_text.len() + instruction.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            prompt.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(VALUE_PLACEHOLDER) {
                prompt.push_str(&value_text);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(INSTRUCTION_PLACEHOLDER) {
                prompt.push_str(instruction);
                rest = after;
            } else {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
        prompt.push_str(rest);

        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Self::CLASSIC)
    }
}
