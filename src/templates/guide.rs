use super::template::{FieldKind, FormField, Template};
use crate::protocol::{FunctionDefinition, ParamType, ParameterSchema};
use chrono::{DateTime, Duration, Local};

/// One `update_<identifier>` function per template field
pub fn function_definitions(template: &Template) -> Vec<FunctionDefinition> {
    template.fields.iter().map(field_definition).collect()
}

fn field_definition(field: &FormField) -> FunctionDefinition {
    let mut description = format!("The value for {}", field.name);
    let options = field.options.clone().unwrap_or_default();

    let schema = match field.kind {
        FieldKind::Number | FieldKind::Duration => ParameterSchema::of(ParamType::Number, description),
        FieldKind::Checkbox => ParameterSchema::of(ParamType::Boolean, description),
        FieldKind::Select | FieldKind::RadioGroup => {
            let listed = if options.is_empty() {
                "-".to_string()
            } else {
                options.join(", ")
            };
            description.push_str(&format!(" (one of: {})", listed));
            ParameterSchema::enumeration(description, options)
        }
        kind => {
            match kind {
                FieldKind::Date => description.push_str(" (format: YYYY-MM-DD)"),
                FieldKind::Time => description.push_str(" (format: HH:MM)"),
                FieldKind::Email => description.push_str(" (valid e-mail)"),
                _ => {}
            }
            ParameterSchema::of(ParamType::String, description)
        }
    };

    let required = if field.required {
        vec![field.identifier.clone()]
    } else {
        Vec::new()
    };

    FunctionDefinition::new(
        format!("update_{}", field.identifier),
        format!(
            "Update the {} field. {}",
            field.name,
            field.description.as_deref().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        ParameterSchema::object()
            .with_property(field.identifier.clone(), schema)
            .with_required(required),
    )
}

/// Wall-clock context the extraction model uses to resolve relative dates
#[derive(Debug, Clone)]
pub struct TimeContext {
    pub now: DateTime<Local>,
}

impl TimeContext {
    pub fn now() -> Self {
        Self { now: Local::now() }
    }

    pub fn date(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }

    pub fn time(&self) -> String {
        self.now.format("%H:%M:%S").to_string()
    }

    pub fn weekday(&self) -> String {
        self.now.format("%A").to_string()
    }

    /// e.g. "Sunday, October 18, 2026"
    pub fn long_date(&self) -> String {
        self.now.format("%A, %B %-d, %Y").to_string()
    }

    pub fn tomorrow(&self) -> String {
        (self.now + Duration::days(1)).format("%Y-%m-%d").to_string()
    }
}

/// Extraction instructions sent as the session's parsing guide
pub fn parsing_guide(template: &Template, time: &TimeContext) -> String {
    let purpose = template
        .description
        .as_deref()
        .map(|d| format!("• **Purpose of speech**: {}\n", d))
        .unwrap_or_default();

    format!(
        r#"You are an intelligent **function-extraction** system.
Your job: turn spoken user input into *valid* function calls, **only** when the user provides clear, explicit data.

### Transcript context
• **Type of speech**: {name}
{purpose}
### Current context
• Date: **{date}** ({long_date})
• Time: **{time}** ({weekday})

---

## CRITICAL RULES

1. **Only extract when explicitly stated**
   - Never guess or fill missing values.
   - Skip vague or incomplete info.

2. **Confidence ≥ 95 %**: if unsure, extract nothing.

3. **Explicit value checks**
   • Names: must be said verbatim
   • Proper Nouns: may be spelled out within the transcript and MUST be adhered to intelligently
   • Dates: concrete ("tomorrow", "March 15" …)
   • Times: concrete ("7 PM", "at noon" …)
   • Numbers & selections: clearly stated or match valid options.

4. **Temporal conversions** (relative → absolute)
   - "tonight" ⇒ today's date
   - "tomorrow" ⇒ {tomorrow}
   - "in 2 hours" ⇒ now + 2h
   - Apply only when relevant to a function parameter.

5. **Validation**
   • Dates: YYYY-MM-DD | Times: HH:MM (24 h)
   • Emails & phone numbers: valid format
   • Selection fields: exact match to schema enum.

6. **Never output anything except valid function-call JSON.**

Remember: *better to output nothing than something wrong.*"#,
        name = template.name,
        purpose = purpose,
        date = time.date(),
        long_date = time.long_date(),
        time = time.time(),
        weekday = time.weekday(),
        tomorrow = time.tomorrow(),
    )
}
